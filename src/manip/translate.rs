use super::command::ParamCommand;
use super::component::{
    ComponentRole, ComponentState, DragOutput, GizmoFrame, ManipulatorComponent, PlaneGrab,
};
use super::item::AttachedItems;
use crate::camera::ViewContext;
use crate::draw::{box_triangles, cone_triangles, DrawList};
use crate::pick::PickId;
use glam::Vec3;

const LINE_WIDTH: f32 = 2.0;

/// Moves items along one axis, or freely in the camera plane (pivot).
#[derive(Debug, Clone)]
pub struct TranslateComponent {
    state: ComponentState<PlaneGrab>,
}

impl TranslateComponent {
    pub fn new(role: ComponentRole, pick_id: PickId) -> Self {
        Self {
            state: ComponentState::new(role, pick_id),
        }
    }
}

impl ManipulatorComponent for TranslateComponent {
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
                out.push_triangles(box_triangles(c, Vec3::splat(length * 0.12)), color);
            }
            ComponentRole::Axis(axis) => {
                let dir = axis.unit();
                let tip = c + dir * length;
                out.line(c, tip - dir * length * 0.2, color, LINE_WIDTH);
                out.push_triangles(
                    cone_triangles(tip - dir * length * 0.2, tip, length * 0.06, 12),
                    color,
                );
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
        let grab = match self.role() {
            ComponentRole::Pivot => PlaneGrab::facing_camera(ctx, frame.center, mx, my),
            ComponentRole::Axis(axis) => {
                PlaneGrab::along_axis(ctx, frame.center, axis.unit(), mx, my)
            }
        };
        let Some(grab) = grab else {
            return false;
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
        let grab = &press.data;
        let hit = grab.hit_at(ctx, press.frame.center, mx, my)?;
        let delta = match grab.axis {
            Some(axis) => axis * (hit - grab.hit).dot(axis),
            None => hit - grab.hit,
        };
        let commands = press
            .visible(items)
            .map(|s| ParamCommand::vec3(&s.op, &s.translate_param, s.translate + delta))
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
    use crate::math::Axis;

    fn items() -> AttachedItems {
        [
            TestItem::new(1, Vec3::ZERO).shared(),
            TestItem::new(2, Vec3::new(0.0, 1.0, 0.0)).shared(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn axis_drag_moves_along_axis_only() {
        let ctx = ctx();
        let items = items();
        let mut comp = TranslateComponent::new(ComponentRole::Axis(Axis::X), 1);
        assert!(comp.mouse_press(240.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(280.0, 120.0, &ctx, &items).unwrap();
        assert_eq!(out.commands.len(), 2);
        let moved = out.commands[1].as_vec3().unwrap();
        assert!(moved.x > 0.0);
        assert!((moved.y - 1.0).abs() < 1e-5 && moved.z.abs() < 1e-5);
        // 40 px at 80 px per handle length.
        let expected = frame(&ctx).handle_length() * 0.5;
        assert!((moved.x - expected).abs() < 1e-3, "{moved}");
    }

    #[test]
    fn pivot_drag_follows_camera_plane() {
        let ctx = ctx();
        let items = items();
        let mut comp = TranslateComponent::new(ComponentRole::Pivot, 1);
        assert!(comp.mouse_press(200.0, 150.0, &frame(&ctx), &ctx, &items));
        let out = comp.mouse_drag(200.0, 110.0, &ctx, &items).unwrap();
        let moved = out.commands[0].as_vec3().unwrap();
        assert!(moved.y > 0.0 && moved.x.abs() < 1e-5 && moved.z.abs() < 1e-5);
    }

    #[test]
    fn press_without_items_is_refused() {
        let ctx = ctx();
        let mut comp = TranslateComponent::new(ComponentRole::Pivot, 1);
        assert!(!comp.mouse_press(200.0, 150.0, &frame(&ctx), &ctx, &AttachedItems::new()));
        assert!(comp.mouse_drag(210.0, 150.0, &ctx, &AttachedItems::new()).is_none());
    }

    #[test]
    fn release_drops_snapshot() {
        let ctx = ctx();
        let items = items();
        let mut comp = TranslateComponent::new(ComponentRole::Axis(Axis::Y), 1);
        assert!(comp.mouse_press(200.0, 140.0, &frame(&ctx), &ctx, &items));
        comp.mouse_release();
        assert!(!comp.is_pressed());
        assert!(comp.mouse_drag(200.0, 100.0, &ctx, &items).is_none());
    }

    #[test]
    fn selection_draw_uses_pick_colour() {
        let ctx = ctx();
        let comp = TranslateComponent::new(ComponentRole::Axis(Axis::Z), 0x0102);
        let mut list = DrawList::new();
        comp.selection_draw(&frame(&ctx), &ctx, &mut list);
        assert!(!list.is_empty());
        assert!(list.batches().iter().all(|b| b.color == [2, 1, 0, 0]));
    }
}
