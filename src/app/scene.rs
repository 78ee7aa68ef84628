//! Demo scene driven by the viewport shell.

use glam::Vec3;
use std::cell::Cell;
use std::rc::Rc;
use studio_viewport::camera::ViewContext;
use studio_viewport::draw::{box_triangles, DrawList};
use studio_viewport::manip::{
    parse_vec3, ManipItem, ParamCommand, ParamTarget, RotationRepr, ScaleSemantics,
};
use studio_viewport::math::AxisAlignedBBox;
use studio_viewport::pick::{id_to_rgba, PickError, PickId, PickIdAllocator, Selectable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    /// Scaled through its "Radius" parameter.
    Sphere,
    /// Oriented by a direction vector instead of Euler angles.
    Emitter,
}

#[derive(Debug)]
pub struct DemoItem {
    id: PickId,
    name: String,
    shape: Shape,
    translate: Cell<Vec3>,
    rotate: Cell<Vec3>,
    scale: Cell<Vec3>,
    radius: Cell<f32>,
    direction: Cell<Vec3>,
    visible: Cell<bool>,
}

impl DemoItem {
    fn new(id: PickId, name: &str, shape: Shape, translate: Vec3) -> Self {
        Self {
            id,
            name: name.to_string(),
            shape,
            translate: Cell::new(translate),
            rotate: Cell::new(Vec3::ZERO),
            scale: Cell::new(Vec3::ONE),
            radius: Cell::new(0.5),
            direction: Cell::new(Vec3::Y * 2.0),
            visible: Cell::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn half_extent(&self) -> Vec3 {
        match self.shape {
            Shape::Box => self.scale.get().abs() * 0.5,
            Shape::Sphere => Vec3::splat(self.radius.get().abs()),
            Shape::Emitter => Vec3::splat(0.25),
        }
    }

    pub fn bounds(&self) -> AxisAlignedBBox {
        let c = self.translate.get();
        let h = self.half_extent();
        AxisAlignedBBox::from_corners(c - h, c + h)
    }

    /// Encoded value of one of this item's parameters.
    fn value(&self, param: &str) -> Option<String> {
        let vec3 = |v: Vec3| Some(format!("{} {} {}", v.x, v.y, v.z));
        match param {
            "Translate" => vec3(self.translate.get()),
            "Rotate" => vec3(self.rotate.get()),
            "Scale" => vec3(self.scale.get()),
            "Radius" if self.shape == Shape::Sphere => Some(format!("{}", self.radius.get())),
            "Direction" if self.shape == Shape::Emitter => vec3(self.direction.get()),
            _ => None,
        }
    }

    fn set(&self, param: &str, value: &str) -> bool {
        match param {
            "Radius" => match value.trim().parse::<f32>() {
                Ok(r) => {
                    self.radius.set(r);
                    true
                }
                Err(_) => false,
            },
            _ => {
                let Some(v) = parse_vec3(value) else {
                    return false;
                };
                let cell = match param {
                    "Translate" => &self.translate,
                    "Rotate" => &self.rotate,
                    "Scale" => &self.scale,
                    "Direction" => &self.direction,
                    _ => return false,
                };
                cell.set(v);
                true
            }
        }
    }
}

impl ManipItem for DemoItem {
    fn id(&self) -> PickId {
        self.id
    }

    fn op_name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn translate(&self) -> Vec3 {
        self.translate.get()
    }

    fn rotate(&self) -> Vec3 {
        self.rotate.get()
    }

    fn scale(&self) -> Vec3 {
        self.scale.get()
    }

    fn rotate_param(&self) -> &str {
        match self.shape {
            Shape::Emitter => "Direction",
            _ => "Rotate",
        }
    }

    fn rotation_repr(&self) -> RotationRepr {
        match self.shape {
            Shape::Emitter => RotationRepr::Direction {
                vector: self.direction.get(),
            },
            _ => RotationRepr::Euler,
        }
    }

    fn scale_semantics(&self) -> ScaleSemantics {
        match self.shape {
            Shape::Sphere => ScaleSemantics::Scalar {
                param: "Radius".to_string(),
                value: self.radius.get(),
            },
            _ => ScaleSemantics::Vector,
        }
    }
}

impl Selectable for DemoItem {
    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn selection_draw(&self, _ctx: &ViewContext, out: &mut DrawList) {
        let bounds = self.bounds();
        let color = id_to_rgba(self.id);
        out.push_triangles(box_triangles(bounds.mid(), bounds.dims()), color);
        if self.shape == Shape::Emitter {
            let c = self.translate.get();
            out.line(c, c + self.direction.get(), color, 3.0);
        }
    }
}

/// The parameters every command refers to.
#[derive(Debug, Default)]
pub struct DemoScene {
    items: Vec<Rc<DemoItem>>,
}

impl DemoScene {
    pub fn new(ids: &mut PickIdAllocator) -> Result<Self, PickError> {
        let mut scene = Self::default();
        scene.add(ids, "box1", Shape::Box, Vec3::new(-2.0, 0.0, 0.0))?;
        scene.add(ids, "sphere1", Shape::Sphere, Vec3::new(2.0, 0.0, 0.0))?;
        scene.add(ids, "emitter1", Shape::Emitter, Vec3::new(0.0, 1.5, 0.0))?;
        Ok(scene)
    }

    pub fn add(
        &mut self,
        ids: &mut PickIdAllocator,
        name: &str,
        shape: Shape,
        at: Vec3,
    ) -> Result<Rc<DemoItem>, PickError> {
        let item = Rc::new(DemoItem::new(ids.allocate()?, name, shape, at));
        self.items.push(item.clone());
        Ok(item)
    }

    pub fn items(&self) -> &[Rc<DemoItem>] {
        &self.items
    }

    pub fn item(&self, id: PickId) -> Option<&Rc<DemoItem>> {
        self.items.iter().find(|i| i.id == id)
    }

    fn by_name(&self, name: &str) -> Option<&Rc<DemoItem>> {
        self.items.iter().find(|i| i.name == name)
    }

    /// Bounds of the given items, or of the whole scene when `ids` is empty.
    pub fn bounds(&self, ids: &[PickId]) -> Option<AxisAlignedBBox> {
        self.items
            .iter()
            .filter(|i| ids.is_empty() || ids.contains(&i.id))
            .map(|i| i.bounds())
            .reduce(|a, b| a.united(&b))
    }
}

impl ParamTarget for DemoScene {
    fn param_value(&self, op: &str, param: &str) -> Option<String> {
        self.by_name(op)?.value(param)
    }

    fn apply(&mut self, command: &ParamCommand) {
        let Some(item) = self.by_name(&command.op) else {
            log::warn!("Unknown operator {}", command.op);
            return;
        };
        if item.set(&command.param, &command.value) {
            log::info!("{}.{} = {}", command.op, command.param, command.value);
        } else {
            log::warn!(
                "Rejected {}.{} = {:?}",
                command.op,
                command.param,
                command.value
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_round_trip_through_items() {
        let mut ids = PickIdAllocator::new();
        let mut scene = DemoScene::new(&mut ids).unwrap();
        scene.apply(&ParamCommand::vec3("box1", "Translate", Vec3::new(1.0, 2.0, 3.0)));
        scene.apply(&ParamCommand::float("sphere1", "Radius", 2.5));
        assert_eq!(scene.param_value("box1", "Translate").as_deref(), Some("1 2 3"));
        assert_eq!(scene.param_value("sphere1", "Radius").as_deref(), Some("2.5"));
        assert_eq!(scene.param_value("box1", "Radius"), None);
        assert_eq!(scene.param_value("nope", "Translate"), None);
    }

    #[test]
    fn scene_bounds_cover_items() {
        let mut ids = PickIdAllocator::new();
        let scene = DemoScene::new(&mut ids).unwrap();
        let all = scene.bounds(&[]).unwrap();
        assert!(all.contains(Vec3::new(-2.0, 0.0, 0.0)));
        assert!(all.contains(Vec3::new(2.0, 0.0, 0.0)));
        let sphere = scene.items()[1].id();
        let only = scene.bounds(&[sphere]).unwrap();
        assert!(!only.contains(Vec3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn emitter_rotates_as_direction() {
        let mut ids = PickIdAllocator::new();
        let scene = DemoScene::new(&mut ids).unwrap();
        let emitter = &scene.items()[2];
        assert_eq!(emitter.rotate_param(), "Direction");
        assert!(matches!(
            emitter.rotation_repr(),
            RotationRepr::Direction { .. }
        ));
    }
}
