use super::command::ParamCommand;
use super::component::{
    ComponentRole, ComponentState, DragOutput, GizmoFrame, ManipulatorComponent, PlaneGrab,
};
use super::item::{AttachedItems, ScaleSemantics};
use crate::camera::ViewContext;
use crate::draw::{box_triangles, DrawList};
use crate::math::Axis;
use crate::pick::PickId;
use glam::Vec3;

const LINE_WIDTH: f32 = 2.0;
/// Smallest uniform ratio the pivot produces; keeps items from collapsing
/// or mirroring.
const MIN_PIVOT_RATIO: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGrab {
    plane: PlaneGrab,
    /// Press distance along the (possibly flipped) axis.
    press_distance: f32,
    /// World length of one handle, for the pivot's uniform ratio.
    handle_length: f32,
    right: Vec3,
}

/// Scales items along one axis, or uniformly (pivot).
#[derive(Debug, Clone)]
pub struct ScaleComponent {
    state: ComponentState<ScaleGrab>,
}

impl ScaleComponent {
    pub fn new(role: ComponentRole, pick_id: PickId) -> Self {
        Self {
            state: ComponentState::new(role, pick_id),
        }
    }

    /// Scale ratio for the live mouse position.
    fn ratio(
        &self,
        grab: &ScaleGrab,
        center: Vec3,
        ctx: &ViewContext,
        mx: f32,
        my: f32,
    ) -> Option<f32> {
        let hit = grab.plane.hit_at(ctx, center, mx, my)?;
        match self.role() {
            ComponentRole::Pivot => {
                let moved = (hit - grab.plane.hit).dot(grab.right);
                Some((1.0 + moved / grab.handle_length).max(MIN_PIVOT_RATIO))
            }
            ComponentRole::Axis(_) => {
                Some(grab.plane.distance(center, hit) / grab.press_distance)
            }
        }
    }
}

fn scaled(scale: Vec3, axis: Option<Axis>, ratio: f32) -> Vec3 {
    match axis {
        None => scale * ratio,
        Some(axis) => {
            let mut s = scale;
            s[axis.index()] *= ratio;
            s
        }
    }
}

impl ManipulatorComponent for ScaleComponent {
    fn role(&self) -> ComponentRole {
        self.state.role()
    }

    fn pick_id(&self) -> PickId {
        self.state.pick_id()
    }

    fn is_pressed(&self) -> bool {
        self.state.is_pressed()
    }

    fn draw(&self, frame: &GizmoFrame, _ctx: &ViewContext, out: &mut DrawList) {
        let color = self.state.color();
        let length = frame.handle_length();
        let c = frame.center;
        match self.role() {
            ComponentRole::Pivot => {
                out.push_triangles(box_triangles(c, Vec3::splat(length * 0.15)), color);
            }
            ComponentRole::Axis(axis) => {
                let tip = c + axis.unit() * length;
                out.line(c, tip, color, LINE_WIDTH);
                out.push_triangles(box_triangles(tip, Vec3::splat(length * 0.1)), color);
            }
        }
    }

    fn mouse_press(
        &mut self,
        mx: f32,
        my: f32,
        frame: &GizmoFrame,
        ctx: &ViewContext,
        items: &AttachedItems,
    ) -> bool {
        if items.is_empty() {
            return false;
        }
        let plane = match self.role() {
            ComponentRole::Pivot => PlaneGrab::facing_camera(ctx, frame.center, mx, my),
            ComponentRole::Axis(axis) => {
                // Drag against the item's own orientation when its scale is
                // mirrored on this axis.
                let flipped = items
                    .iter()
                    .find(|i| i.is_visible())
                    .is_some_and(|i| i.scale()[axis.index()] < 0.0);
                let dir = if flipped { -axis.unit() } else { axis.unit() };
                PlaneGrab::along_axis(ctx, frame.center, dir, mx, my)
            }
        };
        let Some(plane) = plane else {
            return false;
        };
        let press_distance = plane.distance(frame.center, plane.hit);
        if self.role() != ComponentRole::Pivot && press_distance.abs() <= frame.pixel_size {
            log::trace!("Scale press too close to the pivot");
            return false;
        }
        let grab = ScaleGrab {
            plane,
            press_distance,
            handle_length: frame.handle_length(),
            right: ctx.right(),
        };
        self.state.begin(mx, my, *frame, items, grab);
        true
    }

    fn mouse_drag(
        &self,
        mx: f32,
        my: f32,
        ctx: &ViewContext,
        items: &AttachedItems,
    ) -> Option<DragOutput> {
        let press = self.state.press()?;
        let ratio = self.ratio(&press.data, press.frame.center, ctx, mx, my)?;
        if !ratio.is_finite() {
            return None;
        }
        let axis = self.role().axis();
        let commands = press
            .visible(items)
            .map(|s| match &s.scale_semantics {
                ScaleSemantics::Vector => {
                    ParamCommand::vec3(&s.op, &s.scale_param, scaled(s.scale, axis, ratio))
                }
                ScaleSemantics::Scalar { param, value } => {
                    ParamCommand::float(&s.op, param, value * ratio)
                }
            })
            .collect();
        Some(DragOutput::new(commands))
    }

    fn mouse_release(&mut self) {
        self.state.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manip::component::testing::{ctx, frame};
    use crate::manip::item::testing::TestItem;

    fn single(item: TestItem) -> AttachedItems {
        [item.shared()].into_iter().collect()
    }

    #[test]
    fn axis_drag_scales_one_component() {
        let ctx = ctx();
        let mut item = TestItem::new(1, Vec3::ZERO);
        item.scale = Vec3::new(2.0, 3.0, 4.0);
        let items = single(item);
        let mut comp = ScaleComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(comp.mouse_press(240.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(280.0, 150.0, &ctx, &items).unwrap();
        let s = out.commands[0].as_vec3().unwrap();
        assert!((s.x - 4.0).abs() < 1e-3, "{s}");
        assert_eq!((s.y, s.z), (3.0, 4.0));
        assert_eq!(out.commands[0].param, "Scale");
    }

    #[test]
    fn mirrored_scale_flips_axis() {
        let ctx = ctx();
        let mut item = TestItem::new(1, Vec3::ZERO);
        item.scale = Vec3::new(-1.0, 1.0, 1.0);
        let items = single(item);
        let mut comp = ScaleComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(comp.mouse_press(160.0, 150.0, &frame(&ctx), &ctx, &items));
        let grab = comp.state.press().unwrap().data;
        assert!(grab.plane.axis.unwrap().x < 0.0);
        assert!(grab.press_distance > 0.0);
        let out = comp.mouse_drag(120.0, 150.0, &ctx, &items).unwrap();
        let s = out.commands[0].as_vec3().unwrap();
        assert!((s.x + 2.0).abs() < 1e-3, "{s}");
    }

    #[test]
    fn radius_items_get_single_float() {
        let ctx = ctx();
        let mut item = TestItem::new(1, Vec3::ZERO);
        item.semantics = ScaleSemantics::Scalar {
            param: "Radius".into(),
            value: 1.5,
        };
        let items = single(item);
        let mut comp = ScaleComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(comp.mouse_press(240.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(280.0, 150.0, &ctx, &items).unwrap();
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.commands[0].param, "Radius");
        assert!(out.commands[0].as_vec3().is_none());
        assert!((out.commands[0].as_float().unwrap() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn pivot_scales_uniformly() {
        let ctx = ctx();
        let items = single(TestItem::new(1, Vec3::ZERO));
        let mut comp = ScaleComponent::new(ComponentRole::Pivot, 1);
        assert!(comp.mouse_press(200.0, 150.0, &frame(&ctx), &ctx, &items));
        // One handle length to the right doubles the scale.
        let out = comp.mouse_drag(280.0, 150.0, &ctx, &items).unwrap();
        let s = out.commands[0].as_vec3().unwrap();
        assert!((s - Vec3::splat(2.0)).abs().max_element() < 1e-3, "{s}");
        // Far to the left clamps instead of mirroring.
        let out = comp.mouse_drag(0.0, 150.0, &ctx, &items).unwrap();
        let s = out.commands[0].as_vec3().unwrap();
        assert!(s.min_element() > 0.0);
    }

    #[test]
    fn press_at_pivot_is_degenerate_for_axis() {
        let ctx = ctx();
        let items = single(TestItem::new(1, Vec3::ZERO));
        let mut comp = ScaleComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(!comp.mouse_press(200.0, 150.0, &frame(&ctx), &ctx, &items));
        assert!(!comp.is_pressed());
    }
}
