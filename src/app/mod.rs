mod input;
mod scene;

use input::{Gesture, InputAction};
use scene::DemoScene;

use glam::Vec2;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use studio_viewport::camera::{CameraPose, CameraScope};
use studio_viewport::config::ViewportPrefs;
use studio_viewport::draw::DrawList;
use studio_viewport::manip::{
    AttachedItems, ManipItem, Manipulator, ManipulatorError, ManipulatorKind, UndoStack,
};
use studio_viewport::math::Viewport;
use studio_viewport::pick::{PickBuffer, PickError, PickId, PickIdAllocator, Selectable, NO_PICK};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowAttributes, WindowId};

const TITLE: &str = "Studio Viewport";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("demo scene setup failed: {0}")]
    Scene(#[from] PickError),
    #[error("manipulator setup failed: {0}")]
    Manipulator(#[from] ManipulatorError),
}

/// Mouse gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Active {
    Navigate,
    Manipulate,
    Region { start: Vec2 },
}

pub struct App {
    window: Option<Arc<Window>>,
    ids: PickIdAllocator,
    camera: CameraScope,
    manipulator: Manipulator,
    undo: UndoStack<DemoScene>,
    pick: PickBuffer,
    pick_dirty: bool,
    selected: Vec<PickId>,
    modifiers: ModifiersState,
    mouse_pos: Option<Vec2>,
    active: Option<Active>,
}

impl App {
    fn new(prefs: ViewportPrefs) -> Result<Self, AppError> {
        let viewport = Viewport::from_size(1280, 720);
        let mut ids = PickIdAllocator::new();
        let scene = DemoScene::new(&mut ids)?;
        let manipulator = Manipulator::new(ManipulatorKind::Translate, &prefs, &mut ids)?;
        let mut params = prefs.camera_params();
        params.translate = glam::Vec3::new(0.0, 2.0, 12.0);
        let camera = CameraScope::new("persp", CameraPose::new(params, viewport), &prefs);
        Ok(Self {
            window: None,
            undo: UndoStack::new(scene, prefs.undo_depth),
            pick: PickBuffer::software(viewport),
            pick_dirty: true,
            ids,
            camera,
            manipulator,
            selected: Vec::new(),
            modifiers: ModifiersState::empty(),
            mouse_pos: None,
            active: None,
        })
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let viewport = Viewport::from_size(new_size.width, new_size.height);
        self.camera.resize(viewport);
        self.pick.resize(viewport);
        self.pick_dirty = true;
    }

    fn request_redraw(&mut self) {
        self.pick_dirty = true;
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Re-run the pick pass if anything moved since the last one.
    fn refresh_pick(&mut self) {
        if !self.pick_dirty {
            return;
        }
        let ctx = self.camera.view_context();
        let scene = self.undo.target();
        self.pick.render(
            &ctx,
            scene.items().iter().map(|i| &**i as &dyn Selectable),
            Some(&self.manipulator as &dyn Selectable),
        );
        self.pick_dirty = false;
    }

    fn set_selection(&mut self, ids: Vec<PickId>) {
        if self.manipulator.is_pressed() {
            return;
        }
        let scene = self.undo.target();
        let items: AttachedItems = ids
            .iter()
            .filter_map(|id| scene.item(*id))
            .map(|item| item.clone() as Rc<dyn ManipItem>)
            .collect();
        let names: Vec<&str> = ids
            .iter()
            .filter_map(|id| scene.item(*id))
            .map(|item| item.name())
            .collect();
        log::info!("Selection: {:?}", names);
        self.selected = items.ids();
        if let Err(err) = self.manipulator.attach(items) {
            log::warn!("{err}");
        }
        self.request_redraw();
    }

    fn mouse_down(&mut self, button: MouseButton) {
        let Some(pos) = self.mouse_pos else {
            return;
        };
        match input::gesture_for(button, self.modifiers) {
            Some(Gesture::Navigate(mode)) => {
                if self.camera.begin_navigation(mode, pos.x, pos.y) {
                    self.active = Some(Active::Navigate);
                }
            }
            Some(Gesture::Pick) => {
                self.refresh_pick();
                let id = self.pick.pick_point(pos.x, pos.y);
                let ctx = self.camera.view_context();
                if self.manipulator.mouse_press_id(id, pos.x, pos.y, &ctx) {
                    self.active = Some(Active::Manipulate);
                    self.request_redraw();
                } else if id != NO_PICK && self.undo.target().item(id).is_some() {
                    self.set_selection(vec![id]);
                } else {
                    self.active = Some(Active::Region { start: pos });
                }
            }
            None => {}
        }
    }

    fn mouse_up(&mut self) {
        match self.active.take() {
            Some(Active::Navigate) => self.camera.end_navigation(),
            Some(Active::Manipulate) => {
                self.manipulator.mouse_release();
                self.request_redraw();
            }
            Some(Active::Region { start }) => {
                let Some(end) = self.mouse_pos else {
                    return;
                };
                if start.distance(end) < 2.0 {
                    self.set_selection(Vec::new());
                    return;
                }
                self.refresh_pick();
                let picked = self.pick.pick_region(start, end);
                // Region picks add to the selection.
                let mut ids = self.selected.clone();
                let mut fresh: Vec<PickId> = picked
                    .into_iter()
                    .filter(|id| self.undo.target().item(*id).is_some() && !ids.contains(id))
                    .collect();
                fresh.sort_unstable();
                ids.extend(fresh);
                self.set_selection(ids);
            }
            None => {}
        }
    }

    fn mouse_moved(&mut self, pos: Vec2) {
        self.mouse_pos = Some(pos);
        match self.active {
            Some(Active::Navigate) => {
                if self.camera.navigate(pos.x, pos.y) {
                    self.request_redraw();
                }
            }
            Some(Active::Manipulate) => {
                let ctx = self.camera.view_context();
                if self.manipulator.mouse_drag(pos.x, pos.y, &ctx, &mut self.undo) {
                    self.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn frame_selection(&mut self) {
        let Some(bounds) = self.undo.target().bounds(&self.selected) else {
            return;
        };
        if self.camera.frame(&bounds) {
            log::info!("Framed {:?}..{:?}", bounds.min(), bounds.max());
            self.request_redraw();
        }
    }

    /// Hidden items keep their selection but drop out of picking and
    /// manipulation.
    fn toggle_hidden(&mut self) {
        if self.manipulator.is_pressed() {
            return;
        }
        for id in &self.selected {
            if let Some(item) = self.undo.target().item(*id) {
                item.set_visible(!ManipItem::is_visible(&**item));
            }
        }
        self.request_redraw();
    }

    fn handle_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::None => {}
            InputAction::Exit => {
                log::info!("Escape pressed, shutting down...");
                event_loop.exit();
            }
            InputAction::FrameSelection => self.frame_selection(),
            InputAction::ToggleHidden => self.toggle_hidden(),
            InputAction::ResetCamera => {
                self.camera.reset();
                self.request_redraw();
            }
            InputAction::SetKind(kind) => match self.manipulator.set_kind(kind) {
                Ok(()) => self.request_redraw(),
                Err(err) => log::warn!("{err}"),
            },
            InputAction::Undo => {
                if self.active.is_none() && self.undo.undo().is_some() {
                    self.request_redraw();
                }
            }
            InputAction::Redo => {
                if self.active.is_none() && self.undo.redo().is_some() {
                    self.request_redraw();
                }
            }
        }
    }

    /// Build this frame's overlay geometry. Nothing is rasterised on
    /// screen; the batches are what a renderer would consume.
    fn render(&mut self) {
        let ctx = self.camera.view_context();
        let mut overlay = DrawList::new();
        self.manipulator.draw(&ctx, &mut overlay);
        log::trace!(
            "Frame: camera at {:?}, {} overlay batches",
            self.camera.pose().world_pos(),
            overlay.batches().len()
        );
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.manipulator.release_ids(&mut self.ids);
        log::debug!("{} pick ids still allocated", self.ids.in_use());
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                log::info!(
                    "Window created: {}x{}",
                    window.inner_size().width,
                    window.inner_size().height
                );
                self.handle_resize(window.inner_size());
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                self.mouse_up();
                self.mouse_pos = None;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    let action = input::handle_key(event.physical_key, self.modifiers);
                    self.handle_action(action, event_loop);
                }
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                self.handle_resize(new_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.mouse_down(button),
                ElementState::Released => self.mouse_up(),
            },
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }
}

/// Preferences from the JSON file named on the command line, if any.
fn load_prefs() -> ViewportPrefs {
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        return ViewportPrefs::default();
    };
    match ViewportPrefs::load(&path) {
        Ok(prefs) => {
            log::info!("Loaded preferences from {}", path.display());
            prefs
        }
        Err(err) => {
            log::warn!("Using default preferences ({}): {err}", path.display());
            ViewportPrefs::default()
        }
    }
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("{TITLE}");
    log::info!("   Alt+LMB orbit, Alt+MMB track, Alt+RMB dolly, F frame, W/E/R gizmo");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(load_prefs())?;
    event_loop.run_app(&mut app)?;

    log::info!("Goodbye!");
    Ok(())
}
