//! Press/drag/release protocol shared by the translate, rotate and scale
//! handles.
//!
//! A component is idle until `mouse_press` succeeds. The press captures a
//! snapshot of every attached item plus whatever geometry the variant needs
//! (a drag plane, an arc point). `mouse_drag` is a pure function of that
//! snapshot and the live mouse position, so repeating a position repeats
//! the output. `mouse_release` drops the snapshot.

use super::command::ParamCommand;
use super::item::{AttachedItems, ManipItem, RotationRepr, ScaleSemantics};
use crate::camera::ViewContext;
use crate::config::ViewportPrefs;
use crate::draw::{DrawList, Rgba, HIGHLIGHT};
use crate::math::Axis;
use crate::pick::{id_to_rgba, PickId};
use glam::{Vec2, Vec3};

const DEGENERATE: f32 = 1e-6;

pub const PIVOT_COLOR: Rgba = [230, 230, 230, 255];

/// Which handle of a manipulator a component is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRole {
    Pivot,
    Axis(Axis),
}

impl ComponentRole {
    pub const ALL: [ComponentRole; 4] = [
        ComponentRole::Pivot,
        ComponentRole::Axis(Axis::X),
        ComponentRole::Axis(Axis::Y),
        ComponentRole::Axis(Axis::Z),
    ];

    pub fn index(self) -> usize {
        match self {
            ComponentRole::Pivot => 0,
            ComponentRole::Axis(axis) => axis.index() + 1,
        }
    }

    pub fn axis(self) -> Option<Axis> {
        match self {
            ComponentRole::Pivot => None,
            ComponentRole::Axis(axis) => Some(axis),
        }
    }

    pub fn color(self, pressed: bool) -> Rgba {
        match (pressed, self) {
            (true, _) => HIGHLIGHT,
            (false, ComponentRole::Pivot) => PIVOT_COLOR,
            (false, ComponentRole::Axis(axis)) => axis.color(),
        }
    }
}

/// World placement and screen-constant sizing of a gizmo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoFrame {
    pub center: Vec3,
    /// World units per pixel at `center`.
    pub pixel_size: f32,
    pub handle_length_px: f32,
    pub ring_radius_px: f32,
    pub pick_line_width_px: f32,
}

impl GizmoFrame {
    /// `None` when the center cannot be projected (behind the camera or a
    /// degenerate view).
    pub fn new(center: Vec3, ctx: &ViewContext, prefs: &ViewportPrefs) -> Option<Self> {
        let pixel_size = ctx.pixel_size(center)?;
        if !pixel_size.is_finite() || pixel_size <= 0.0 {
            return None;
        }
        Some(Self {
            center,
            pixel_size,
            handle_length_px: prefs.handle_length_px,
            ring_radius_px: prefs.rotate_ring_px,
            pick_line_width_px: prefs.pick_line_width_px,
        })
    }

    pub fn handle_length(&self) -> f32 {
        self.handle_length_px * self.pixel_size
    }

    pub fn ring_radius(&self) -> f32 {
        self.ring_radius_px * self.pixel_size
    }
}

/// An attached item's values at press time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub id: PickId,
    pub op: String,
    pub translate_param: String,
    pub rotate_param: String,
    pub scale_param: String,
    pub translate: Vec3,
    pub rotate: Vec3,
    pub scale: Vec3,
    pub rotation: RotationRepr,
    pub scale_semantics: ScaleSemantics,
}

impl ItemSnapshot {
    pub fn capture(item: &dyn ManipItem) -> Self {
        Self {
            id: item.id(),
            op: item.op_name().to_string(),
            translate_param: item.translate_param().to_string(),
            rotate_param: item.rotate_param().to_string(),
            scale_param: item.scale_param().to_string(),
            translate: item.translate(),
            rotate: item.rotate(),
            scale: item.scale(),
            rotation: item.rotation_repr(),
            scale_semantics: item.scale_semantics(),
        }
    }
}

/// Everything captured by a successful press.
#[derive(Debug, Clone)]
pub struct Press<T> {
    pub mouse: Vec2,
    pub frame: GizmoFrame,
    pub items: Vec<ItemSnapshot>,
    pub data: T,
}

impl<T> Press<T> {
    /// Snapshots whose item is still attached and visible right now.
    pub fn visible<'a>(
        &'a self,
        items: &'a AttachedItems,
    ) -> impl Iterator<Item = &'a ItemSnapshot> + 'a {
        self.items.iter().filter(|s| items.is_visible(s.id))
    }
}

/// Identity plus the optional press snapshot of one component.
#[derive(Debug, Clone)]
pub struct ComponentState<T> {
    role: ComponentRole,
    pick_id: PickId,
    press: Option<Press<T>>,
}

impl<T> ComponentState<T> {
    pub fn new(role: ComponentRole, pick_id: PickId) -> Self {
        Self {
            role,
            pick_id,
            press: None,
        }
    }

    pub fn role(&self) -> ComponentRole {
        self.role
    }

    pub fn pick_id(&self) -> PickId {
        self.pick_id
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn press(&self) -> Option<&Press<T>> {
        self.press.as_ref()
    }

    /// Replace any previous snapshot.
    pub fn begin(&mut self, mx: f32, my: f32, frame: GizmoFrame, items: &AttachedItems, data: T) {
        self.press = Some(Press {
            mouse: Vec2::new(mx, my),
            frame,
            items: items.iter().map(|i| ItemSnapshot::capture(i.as_ref())).collect(),
            data,
        });
    }

    pub fn release(&mut self) {
        self.press = None;
    }

    pub fn color(&self) -> Rgba {
        self.role.color(self.is_pressed())
    }
}

/// Commands (and roll updates for direction items) produced by one drag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragOutput {
    pub commands: Vec<ParamCommand>,
    /// `(item id, roll change in degrees since press)`.
    pub roll: Vec<(PickId, f32)>,
}

impl DragOutput {
    pub fn new(commands: Vec<ParamCommand>) -> Self {
        Self {
            commands,
            roll: Vec::new(),
        }
    }
}

/// Plane a mouse ray is intersected with while dragging, and the press hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGrab {
    /// Constraint axis, `None` for free movement in the plane.
    pub axis: Option<Vec3>,
    pub normal: Vec3,
    pub hit: Vec3,
}

impl PlaneGrab {
    /// Plane through `center` containing `axis` and facing the camera as
    /// much as possible: `n = a x (back x a)`.
    pub fn along_axis(
        ctx: &ViewContext,
        center: Vec3,
        axis: Vec3,
        mx: f32,
        my: f32,
    ) -> Option<Self> {
        let normal = axis.cross(ctx.back().cross(axis));
        if normal.length() <= DEGENERATE {
            log::trace!("Axis {:?} is parallel to the view direction", axis);
            return None;
        }
        Self::grab(ctx, center, Some(axis), normal.normalize(), mx, my)
    }

    /// Camera-facing plane through `center`.
    pub fn facing_camera(ctx: &ViewContext, center: Vec3, mx: f32, my: f32) -> Option<Self> {
        let normal = ctx.back().normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }
        Self::grab(ctx, center, None, normal, mx, my)
    }

    fn grab(
        ctx: &ViewContext,
        center: Vec3,
        axis: Option<Vec3>,
        normal: Vec3,
        mx: f32,
        my: f32,
    ) -> Option<Self> {
        let hit = hit_plane(ctx, center, normal, mx, my)?;
        Some(Self { axis, normal, hit })
    }

    /// Live intersection with the grabbed plane.
    pub fn hit_at(&self, ctx: &ViewContext, center: Vec3, mx: f32, my: f32) -> Option<Vec3> {
        hit_plane(ctx, center, self.normal, mx, my)
    }

    /// Signed distance of `p` from `center` along the constraint axis.
    pub fn distance(&self, center: Vec3, p: Vec3) -> f32 {
        match self.axis {
            Some(axis) => (p - center).dot(axis),
            None => (p - center).length(),
        }
    }
}

fn hit_plane(ctx: &ViewContext, center: Vec3, normal: Vec3, mx: f32, my: f32) -> Option<Vec3> {
    let hit = ctx.ray(mx, my)?.intersect_plane(center, normal);
    if hit.is_none() {
        log::trace!("Mouse ray misses the drag plane at ({}, {})", mx, my);
    }
    hit
}

/// Common interface of the gizmo handles.
pub trait ManipulatorComponent {
    fn role(&self) -> ComponentRole;

    fn pick_id(&self) -> PickId;

    fn is_pressed(&self) -> bool;

    fn draw(&self, frame: &GizmoFrame, ctx: &ViewContext, out: &mut DrawList);

    /// Same shapes as `draw`, flat in the pick colour with thick lines.
    fn selection_draw(&self, frame: &GizmoFrame, ctx: &ViewContext, out: &mut DrawList) {
        let mut list = DrawList::new();
        self.draw(frame, ctx, &mut list);
        out.append(list.recolored(id_to_rgba(self.pick_id()), frame.pick_line_width_px));
    }

    /// Capture the press snapshot. Returns false (and stays idle) when the
    /// geometry is degenerate or nothing is attached.
    fn mouse_press(
        &mut self,
        mx: f32,
        my: f32,
        frame: &GizmoFrame,
        ctx: &ViewContext,
        items: &AttachedItems,
    ) -> bool;

    /// Commands for the live mouse position, or `None` when idle or the
    /// geometry is degenerate this frame.
    fn mouse_drag(
        &self,
        mx: f32,
        my: f32,
        ctx: &ViewContext,
        items: &AttachedItems,
    ) -> Option<DragOutput>;

    fn mouse_release(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::camera::CameraPose;
    use crate::math::Viewport;

    /// Default perspective camera on a 400x300 viewport; the origin
    /// projects to (200, 150).
    pub fn ctx() -> ViewContext {
        CameraPose::perspective(Viewport::new(0.0, 0.0, 400.0, 300.0)).view_context()
    }

    pub fn frame(ctx: &ViewContext) -> GizmoFrame {
        GizmoFrame::new(Vec3::ZERO, ctx, &ViewportPrefs::default()).unwrap()
    }
}
