use super::command::ParamCommand;
use super::component::{ComponentRole, ComponentState, DragOutput, GizmoFrame, ManipulatorComponent};
use super::item::{AttachedItems, RotationRepr};
use crate::camera::ViewContext;
use crate::draw::{ring_lines, DrawList};
use crate::math::{
    arc_point_axis, arc_point_cam, arc_point_in_ring, arc_quaternion, euler_quaternion,
    quaternion_euler,
};
use crate::pick::PickId;
use glam::{Mat3, Quat, Vec2, Vec3};

const LINE_WIDTH: f32 = 2.0;
const RING_SEGMENTS: usize = 64;
/// The free-rotate ring is drawn slightly outside the axis rings.
const PIVOT_RING_SCALE: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGrab {
    /// Press point on the arcball, camera space.
    arc: Vec3,
    /// Constraint axis in camera space.
    axis_cam: Option<Vec3>,
    ring_center: Vec2,
    ring_radius: f32,
    /// World to camera rotation at press.
    camera: Quat,
}

impl ArcGrab {
    fn arc_point(&self, mx: f32, my: f32) -> Vec3 {
        let p = arc_point_in_ring(mx, my, self.ring_center, self.ring_radius);
        match self.axis_cam {
            Some(axis) => arc_point_axis(p, axis),
            None => p,
        }
    }

    /// World-space rotation from the press point to `(mx, my)`.
    fn rotation(&self, mx: f32, my: f32) -> Option<Quat> {
        let q = arc_quaternion(self.arc, self.arc_point(mx, my));
        if q.length_squared() <= f32::EPSILON {
            log::trace!("Degenerate arc rotation at ({}, {})", mx, my);
            return None;
        }
        let q = q.normalize();
        Some((self.camera.inverse() * q * self.camera).normalize())
    }
}

/// Rotates items about one world axis, or freely (pivot) with an arcball
/// around the gizmo's on-screen ring.
#[derive(Debug, Clone)]
pub struct RotateComponent {
    state: ComponentState<ArcGrab>,
}

impl RotateComponent {
    pub fn new(role: ComponentRole, pick_id: PickId) -> Self {
        Self {
            state: ComponentState::new(role, pick_id),
        }
    }
}

/// Rotation of `q` about `dir` (swing-twist decomposition), in degrees.
fn twist_degrees(q: Quat, dir: Vec3) -> f32 {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return 0.0;
    }
    let along = Vec3::new(q.x, q.y, q.z).dot(dir);
    let angle = 2.0 * along.atan2(q.w);
    // Keep the shortest equivalent angle.
    let angle = if angle > std::f32::consts::PI {
        angle - std::f32::consts::TAU
    } else if angle < -std::f32::consts::PI {
        angle + std::f32::consts::TAU
    } else {
        angle
    };
    angle.to_degrees()
}

impl ManipulatorComponent for RotateComponent {
    fn role(&self) -> ComponentRole {
        self.state.role()
    }

    fn pick_id(&self) -> PickId {
        self.state.pick_id()
    }

    fn is_pressed(&self) -> bool {
        self.state.is_pressed()
    }

    fn draw(&self, frame: &GizmoFrame, ctx: &ViewContext, out: &mut DrawList) {
        let color = self.state.color();
        let radius = frame.ring_radius();
        let (axis, radius) = match self.role() {
            ComponentRole::Pivot => (ctx.back(), radius * PIVOT_RING_SCALE),
            ComponentRole::Axis(axis) => (axis.unit(), radius),
        };
        out.push_lines(
            ring_lines(frame.center, axis, radius, RING_SEGMENTS),
            color,
            LINE_WIDTH,
        );
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
        let Some(ring_center) = ctx.project(frame.center) else {
            return false;
        };
        let camera = Quat::from_mat3(&Mat3::from_mat4(ctx.modelview)).normalize();
        let axis_cam = self
            .role()
            .axis()
            .map(|axis| arc_point_cam(axis.unit(), &ctx.modelview).normalize_or_zero());
        if axis_cam == Some(Vec3::ZERO) {
            return false;
        }
        let mut grab = ArcGrab {
            arc: Vec3::Z,
            axis_cam,
            ring_center,
            ring_radius: frame.ring_radius_px,
            camera,
        };
        grab.arc = grab.arc_point(mx, my);
        self.state.begin(mx, my, *frame, items, grab);
        true
    }

    fn mouse_drag(
        &self,
        mx: f32,
        my: f32,
        _ctx: &ViewContext,
        items: &AttachedItems,
    ) -> Option<DragOutput> {
        let press = self.state.press()?;
        let rotation = press.data.rotation(mx, my)?;

        let mut out = DragOutput::default();
        for snap in press.visible(items) {
            match snap.rotation {
                RotationRepr::Euler => {
                    let q = rotation * euler_quaternion(snap.rotate);
                    out.commands.push(ParamCommand::vec3(
                        &snap.op,
                        &snap.rotate_param,
                        quaternion_euler(q),
                    ));
                }
                RotationRepr::Direction { vector } => {
                    out.commands.push(ParamCommand::vec3(
                        &snap.op,
                        &snap.rotate_param,
                        rotation * vector,
                    ));
                    out.roll.push((snap.id, twist_degrees(rotation, vector)));
                }
            }
        }
        Some(out)
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
    use crate::math::Axis;

    fn single(item: TestItem) -> AttachedItems {
        [item.shared()].into_iter().collect()
    }

    fn approx(a: Vec3, b: Vec3, eps: f32) -> bool {
        (a - b).abs().max_element() <= eps
    }

    #[test]
    fn pivot_drag_right_yaws() {
        let ctx = ctx();
        let items = single(TestItem::new(1, Vec3::ZERO));
        let mut comp = RotateComponent::new(ComponentRole::Pivot, 1);
        assert!(comp.mouse_press(200.0, 150.0, &frame(&ctx), &ctx, &items));

        let mut last_yaw = 0.0;
        for step in 1..=5 {
            let out = comp
                .mouse_drag(200.0 + 10.0 * step as f32, 150.0, &ctx, &items)
                .unwrap();
            let euler = out.commands[0].as_vec3().unwrap();
            assert!(euler.y > last_yaw, "step {step}: {euler}");
            assert!(euler.x.abs() <= 1.0 && euler.z.abs() <= 1.0, "{euler}");
            last_yaw = euler.y;
        }
    }

    #[test]
    fn off_center_pivot_press_also_rolls() {
        // The arc between two off-center points tilts out of the screen
        // plane, so a horizontal drag above the center yaws and rolls.
        let ctx = ctx();
        let items = single(TestItem::new(1, Vec3::ZERO));
        let mut comp = RotateComponent::new(ComponentRole::Pivot, 1);
        assert!(comp.mouse_press(200.0, 120.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(250.0, 120.0, &ctx, &items).unwrap();
        let euler = out.commands[0].as_vec3().unwrap();
        assert!(euler.y > 50.0 && euler.y < 75.0, "{euler}");
        assert!(euler.z < -25.0 && euler.z > -40.0, "{euler}");
    }

    #[test]
    fn axis_drag_keeps_other_axes() {
        let ctx = ctx();
        let items = single(TestItem::new(1, Vec3::ZERO));
        let mut comp = RotateComponent::new(ComponentRole::Axis(Axis::Z), 1);
        assert!(comp.mouse_press(245.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(245.0, 120.0, &ctx, &items).unwrap();
        let euler = out.commands[0].as_vec3().unwrap();
        assert!(euler.z > 0.0);
        assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3, "{euler}");
    }

    #[test]
    fn composes_with_press_rotation() {
        let ctx = ctx();
        let mut item = TestItem::new(1, Vec3::ZERO);
        item.rotate = Vec3::new(0.0, 0.0, 30.0);
        let items = single(item);
        let mut comp = RotateComponent::new(ComponentRole::Axis(Axis::Z), 1);
        assert!(comp.mouse_press(245.0, 150.0, &frame(&ctx), &ctx, &items));
        // Not moving reproduces the press rotation.
        let out = comp.mouse_drag(245.0, 150.0, &ctx, &items).unwrap();
        assert!(approx(out.commands[0].as_vec3().unwrap(), Vec3::new(0.0, 0.0, 30.0), 1e-3));
    }

    #[test]
    fn direction_items_keep_magnitude_and_report_roll() {
        let ctx = ctx();
        let mut item = TestItem::new(8, Vec3::ZERO);
        item.repr = RotationRepr::Direction {
            vector: Vec3::new(2.0, 0.0, 0.0),
        };
        let items = single(item);
        let mut comp = RotateComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(comp.mouse_press(200.0, 105.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(200.0, 195.0, &ctx, &items).unwrap();
        let v = out.commands[0].as_vec3().unwrap();
        assert!(approx(v, Vec3::new(2.0, 0.0, 0.0), 1e-4), "{v}");
        assert_eq!(out.roll.len(), 1);
        assert_eq!(out.roll[0].0, 8);
        assert!((out.roll[0].1 - 120.0).abs() < 1e-2, "{:?}", out.roll);
    }

    #[test]
    fn direction_rotates_about_axis() {
        let ctx = ctx();
        let mut item = TestItem::new(8, Vec3::ZERO);
        item.repr = RotationRepr::Direction {
            vector: Vec3::new(0.0, 3.0, 0.0),
        };
        let items = single(item);
        let mut comp = RotateComponent::new(ComponentRole::Axis(Axis::Z), 1);
        assert!(comp.mouse_press(245.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(245.0, 120.0, &ctx, &items).unwrap();
        let v = out.commands[0].as_vec3().unwrap();
        assert!((v.length() - 3.0).abs() < 1e-4);
        assert!(v.x < 0.0 && v.z.abs() < 1e-4, "{v}");
    }

    #[test]
    fn twist_of_pure_swing_is_zero() {
        let q = Quat::from_rotation_z(1.0);
        assert!(twist_degrees(q, Vec3::X).abs() < 1e-4);
        let q = Quat::from_rotation_x(0.5);
        assert!((twist_degrees(q, Vec3::X) - 0.5_f32.to_degrees()).abs() < 1e-3);
    }
}
