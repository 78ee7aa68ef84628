use studio_viewport::camera::NavigationMode;
use studio_viewport::manip::ManipulatorKind;
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// What a mouse button press starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Navigate(NavigationMode),
    /// Pick under the cursor: press a handle, select an item, or start a
    /// region selection on empty space.
    Pick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Exit,
    FrameSelection,
    ToggleHidden,
    ResetCamera,
    SetKind(ManipulatorKind),
    Undo,
    Redo,
}

pub fn gesture_for(button: MouseButton, modifiers: ModifiersState) -> Option<Gesture> {
    match (button, modifiers.alt_key()) {
        (MouseButton::Left, true) => Some(Gesture::Navigate(NavigationMode::Rotate)),
        (MouseButton::Middle, true) => Some(Gesture::Navigate(NavigationMode::Track)),
        (MouseButton::Right, true) => Some(Gesture::Navigate(NavigationMode::Dolly)),
        (MouseButton::Left, false) => Some(Gesture::Pick),
        _ => None,
    }
}

pub fn handle_key(key: PhysicalKey, modifiers: ModifiersState) -> InputAction {
    let PhysicalKey::Code(code) = key else {
        return InputAction::None;
    };
    match (code, modifiers.control_key()) {
        (KeyCode::Escape, _) => InputAction::Exit,
        (KeyCode::KeyZ, true) => InputAction::Undo,
        (KeyCode::KeyY, true) => InputAction::Redo,
        (KeyCode::KeyF, false) => InputAction::FrameSelection,
        (KeyCode::KeyH, false) => InputAction::ToggleHidden,
        (KeyCode::Home, _) => InputAction::ResetCamera,
        (KeyCode::KeyW, false) => InputAction::SetKind(ManipulatorKind::Translate),
        (KeyCode::KeyE, false) => InputAction::SetKind(ManipulatorKind::Rotate),
        (KeyCode::KeyR, false) => InputAction::SetKind(ManipulatorKind::Scale),
        _ => InputAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_buttons_navigate() {
        let alt = ModifiersState::ALT;
        assert_eq!(
            gesture_for(MouseButton::Left, alt),
            Some(Gesture::Navigate(NavigationMode::Rotate))
        );
        assert_eq!(
            gesture_for(MouseButton::Right, alt),
            Some(Gesture::Navigate(NavigationMode::Dolly))
        );
        assert_eq!(
            gesture_for(MouseButton::Left, ModifiersState::empty()),
            Some(Gesture::Pick)
        );
        assert_eq!(gesture_for(MouseButton::Right, ModifiersState::empty()), None);
    }

    #[test]
    fn keys_map_to_actions() {
        let none = ModifiersState::empty();
        let ctrl = ModifiersState::CONTROL;
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyE), none),
            InputAction::SetKind(ManipulatorKind::Rotate)
        );
        assert_eq!(handle_key(PhysicalKey::Code(KeyCode::KeyZ), ctrl), InputAction::Undo);
        assert_eq!(handle_key(PhysicalKey::Code(KeyCode::KeyZ), none), InputAction::None);
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyF), none),
            InputAction::FrameSelection
        );
    }
}
