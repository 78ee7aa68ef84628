//! Transform manipulators
//!
//! A [`Manipulator`] is a pivot handle plus three axis handles over a set of
//! attached items. Mouse gestures on a handle turn into batched parameter
//! commands submitted to a [`CommandSink`]; one press-drag-release gesture
//! is always exactly one undo step.

mod command;
mod component;
mod item;
mod rotate;
mod scale;
mod translate;

pub use command::{
    parse_vec3, CommandSink, EntryId, ParamCommand, ParamTarget, UndoEntry, UndoStack,
};
pub use component::{
    ComponentRole, ComponentState, DragOutput, GizmoFrame, ItemSnapshot, ManipulatorComponent,
    PlaneGrab, Press,
};
pub use item::{AttachedItems, ManipItem, RotationRepr, ScaleSemantics};
pub use rotate::RotateComponent;
pub use scale::ScaleComponent;
pub use translate::TranslateComponent;

use crate::camera::ViewContext;
use crate::config::ViewportPrefs;
use crate::draw::DrawList;
use crate::pick::{PickError, PickId, PickIdAllocator, Selectable, NO_PICK};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ManipulatorError {
    #[error("cannot change the manipulator while a gesture is in progress")]
    GestureInProgress,
    #[error("no pick ids left for the manipulator handles: {0}")]
    PickIds(#[from] PickError),
}

pub type Result<T> = std::result::Result<T, ManipulatorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManipulatorKind {
    Translate,
    Rotate,
    Scale,
}

impl ManipulatorKind {
    fn component(self, role: ComponentRole, pick_id: PickId) -> Box<dyn ManipulatorComponent> {
        match self {
            ManipulatorKind::Translate => Box::new(TranslateComponent::new(role, pick_id)),
            ManipulatorKind::Rotate => Box::new(RotateComponent::new(role, pick_id)),
            ManipulatorKind::Scale => Box::new(ScaleComponent::new(role, pick_id)),
        }
    }
}

pub struct Manipulator {
    kind: ManipulatorKind,
    pick_ids: [PickId; 4],
    /// Indexed by [`ComponentRole::index`].
    components: Vec<Box<dyn ManipulatorComponent>>,
    items: AttachedItems,
    prefs: ViewportPrefs,
    active: Option<ComponentRole>,
    first_drag: bool,
    /// Interactive roll of direction items; not part of any parameter.
    roll: HashMap<PickId, f32>,
    press_roll: HashMap<PickId, f32>,
}

impl Manipulator {
    pub fn new(
        kind: ManipulatorKind,
        prefs: &ViewportPrefs,
        ids: &mut PickIdAllocator,
    ) -> Result<Self> {
        let mut pick_ids = [NO_PICK; 4];
        for n in 0..pick_ids.len() {
            match ids.allocate() {
                Ok(id) => pick_ids[n] = id,
                Err(err) => {
                    for &id in &pick_ids[..n] {
                        ids.release(id);
                    }
                    return Err(err.into());
                }
            }
        }
        Ok(Self {
            kind,
            pick_ids,
            components: build_components(kind, &pick_ids),
            items: AttachedItems::new(),
            prefs: prefs.clone(),
            active: None,
            first_drag: false,
            roll: HashMap::new(),
            press_roll: HashMap::new(),
        })
    }

    pub fn kind(&self) -> ManipulatorKind {
        self.kind
    }

    /// Swap translate/rotate/scale behaviour. Pick ids are kept.
    pub fn set_kind(&mut self, kind: ManipulatorKind) -> Result<()> {
        if self.is_pressed() {
            return Err(ManipulatorError::GestureInProgress);
        }
        if kind != self.kind {
            log::debug!("Manipulator {:?} -> {:?}", self.kind, kind);
            self.kind = kind;
            self.components = build_components(kind, &self.pick_ids);
        }
        Ok(())
    }

    pub fn items(&self) -> &AttachedItems {
        &self.items
    }

    pub fn attach(&mut self, items: AttachedItems) -> Result<()> {
        if self.is_pressed() {
            return Err(ManipulatorError::GestureInProgress);
        }
        log::debug!("Manipulator attached to {:?}", items);
        let previous = std::mem::replace(&mut self.items, items);
        // Pick ids are recycled, so roll only survives for the same item
        // staying attached.
        self.roll.retain(|id, _| match (previous.get(*id), self.items.get(*id)) {
            (Some(a), Some(b)) => same_item(a, b),
            _ => false,
        });
        self.press_roll.clear();
        Ok(())
    }

    pub fn detach(&mut self) -> Result<()> {
        self.attach(AttachedItems::new())
    }

    pub fn is_pressed(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_role(&self) -> Option<ComponentRole> {
        self.active
    }

    pub fn component(&self, role: ComponentRole) -> &dyn ManipulatorComponent {
        self.components[role.index()].as_ref()
    }

    pub fn pick_ids(&self) -> [PickId; 4] {
        self.pick_ids
    }

    /// Which handle a picked id belongs to.
    pub fn component_for_id(&self, id: PickId) -> Option<ComponentRole> {
        let idx = self.pick_ids.iter().position(|&p| p == id)?;
        Some(ComponentRole::ALL[idx])
    }

    /// Hand the handle ids back when the manipulator goes away.
    pub fn release_ids(&self, ids: &mut PickIdAllocator) {
        for id in self.pick_ids {
            ids.release(id);
        }
    }

    /// Interactive roll of a direction item, degrees.
    pub fn roll_degrees(&self, id: PickId) -> f32 {
        self.roll.get(&id).copied().unwrap_or(0.0)
    }

    pub fn gizmo_frame(&self, ctx: &ViewContext) -> Option<GizmoFrame> {
        GizmoFrame::new(self.items.center()?, ctx, &self.prefs)
    }

    pub fn mouse_press(
        &mut self,
        role: ComponentRole,
        mx: f32,
        my: f32,
        ctx: &ViewContext,
    ) -> bool {
        if self.is_pressed() {
            return false;
        }
        if self.items.is_empty() {
            log::debug!("Manipulator press ignored: nothing attached");
            return false;
        }
        let Some(frame) = self.gizmo_frame(ctx) else {
            log::trace!("Manipulator press ignored: gizmo not on screen");
            return false;
        };
        let pressed = self.components[role.index()].mouse_press(mx, my, &frame, ctx, &self.items);
        if pressed {
            log::debug!("{:?} {:?} pressed at ({}, {})", self.kind, role, mx, my);
            self.active = Some(role);
            self.first_drag = true;
            self.press_roll = self.roll.clone();
        }
        pressed
    }

    /// Press whichever handle owns `id`.
    pub fn mouse_press_id(&mut self, id: PickId, mx: f32, my: f32, ctx: &ViewContext) -> bool {
        match self.component_for_id(id) {
            Some(role) => self.mouse_press(role, mx, my, ctx),
            None => false,
        }
    }

    /// Submit the commands for the live mouse position. The first submitted
    /// batch of a gesture opens a new undo entry; later ones merge into it.
    pub fn mouse_drag(
        &mut self,
        mx: f32,
        my: f32,
        ctx: &ViewContext,
        sink: &mut dyn CommandSink,
    ) -> bool {
        let Some(role) = self.active else {
            return false;
        };
        if self.items.is_empty() {
            return false;
        }
        let Some(out) = self.components[role.index()].mouse_drag(mx, my, ctx, &self.items) else {
            return false;
        };
        for (id, twist) in &out.roll {
            let base = self.press_roll.get(id).copied().unwrap_or(0.0);
            self.roll.insert(*id, base + twist);
        }
        if out.commands.is_empty() {
            return false;
        }
        sink.execute_undoable(out.commands, !self.first_drag);
        self.first_drag = false;
        true
    }

    pub fn mouse_release(&mut self) {
        if let Some(role) = self.active.take() {
            self.components[role.index()].mouse_release();
            log::debug!("{:?} {:?} released", self.kind, role);
        }
        self.first_drag = false;
    }

    /// Axis handles first, pivot last so it stays on top.
    fn draw_order(&self) -> impl Iterator<Item = &Box<dyn ManipulatorComponent>> {
        self.components.iter().rev()
    }

    pub fn draw(&self, ctx: &ViewContext, out: &mut DrawList) {
        let Some(frame) = self.gizmo_frame(ctx) else {
            return;
        };
        for component in self.draw_order() {
            component.draw(&frame, ctx, out);
        }
    }
}

impl Selectable for Manipulator {
    fn is_visible(&self) -> bool {
        !self.items.is_empty()
    }

    fn selection_draw(&self, ctx: &ViewContext, out: &mut DrawList) {
        let Some(frame) = self.gizmo_frame(ctx) else {
            return;
        };
        for component in self.draw_order() {
            component.selection_draw(&frame, ctx, out);
        }
    }
}

fn same_item(a: &Rc<dyn ManipItem>, b: &Rc<dyn ManipItem>) -> bool {
    Rc::as_ptr(a) as *const u8 == Rc::as_ptr(b) as *const u8
}

fn build_components(
    kind: ManipulatorKind,
    ids: &[PickId; 4],
) -> Vec<Box<dyn ManipulatorComponent>> {
    ComponentRole::ALL
        .iter()
        .zip(ids.iter())
        .map(|(&role, &id)| kind.component(role, id))
        .collect()
}
