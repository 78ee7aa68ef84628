//! Items a manipulator can edit.

use crate::math::AxisAlignedBBox;
use crate::pick::PickId;
use glam::Vec3;
use std::fmt;
use std::rc::Rc;

/// How an item stores its orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationRepr {
    /// XYZ Euler angles in degrees.
    Euler,
    /// A direction vector (e.g. a velocity or emitter direction). Rotating
    /// keeps its magnitude; roll has no place to live in it.
    Direction { vector: Vec3 },
}

/// How an item stores its size.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleSemantics {
    /// Per-axis scale vector.
    Vector,
    /// A single float parameter such as "Radius" or "Length".
    Scalar { param: String, value: f32 },
}

/// A transformable scene item.
///
/// Items are read, never written, by the manipulator: edits leave as
/// parameter commands through a [`CommandSink`](super::CommandSink).
pub trait ManipItem {
    fn id(&self) -> PickId;

    /// Operator (node) name used in parameter commands.
    fn op_name(&self) -> &str;

    fn is_visible(&self) -> bool {
        true
    }

    fn translate(&self) -> Vec3;

    /// Euler angles in degrees.
    fn rotate(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn scale(&self) -> Vec3 {
        Vec3::ONE
    }

    fn translate_param(&self) -> &str {
        "Translate"
    }

    fn rotate_param(&self) -> &str {
        "Rotate"
    }

    fn scale_param(&self) -> &str {
        "Scale"
    }

    fn rotation_repr(&self) -> RotationRepr {
        RotationRepr::Euler
    }

    fn scale_semantics(&self) -> ScaleSemantics {
        ScaleSemantics::Vector
    }
}

/// The items a manipulator currently operates on. Ids are unique.
#[derive(Clone, Default)]
pub struct AttachedItems {
    items: Vec<Rc<dyn ManipItem>>,
}

impl fmt::Debug for AttachedItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter().map(|i| i.id())).finish()
    }
}

impl FromIterator<Rc<dyn ManipItem>> for AttachedItems {
    fn from_iter<I: IntoIterator<Item = Rc<dyn ManipItem>>>(iter: I) -> Self {
        let mut set = Self::default();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl AttachedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item; returns false if one with the same id is present.
    pub fn insert(&mut self, item: Rc<dyn ManipItem>) -> bool {
        if self.contains(item.id()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, id: PickId) -> Option<Rc<dyn ManipItem>> {
        let idx = self.items.iter().position(|i| i.id() == id)?;
        Some(self.items.remove(idx))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: PickId) -> bool {
        self.items.iter().any(|i| i.id() == id)
    }

    pub fn get(&self, id: PickId) -> Option<&Rc<dyn ManipItem>> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn ManipItem>> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<PickId> {
        self.items.iter().map(|i| i.id()).collect()
    }

    /// Whether `id` is attached and currently visible.
    pub fn is_visible(&self, id: PickId) -> bool {
        self.get(id).is_some_and(|i| i.is_visible())
    }

    /// Mean translation of the attached items; the gizmo sits here.
    pub fn center(&self) -> Option<Vec3> {
        if self.items.is_empty() {
            return None;
        }
        let sum: Vec3 = self.items.iter().map(|i| i.translate()).sum();
        Some(sum / self.items.len() as f32)
    }

    /// Bounds of the attached translations, for framing a selection.
    pub fn bounds(&self) -> Option<AxisAlignedBBox> {
        AxisAlignedBBox::from_points(self.items.iter().map(|i| i.translate()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;

    /// Minimal item with interior mutability so tests can flip visibility.
    pub struct TestItem {
        pub id: PickId,
        pub translate: Vec3,
        pub rotate: Vec3,
        pub scale: Vec3,
        pub visible: Cell<bool>,
        pub repr: RotationRepr,
        pub semantics: ScaleSemantics,
    }

    impl TestItem {
        pub fn new(id: PickId, translate: Vec3) -> Self {
            Self {
                id,
                translate,
                rotate: Vec3::ZERO,
                scale: Vec3::ONE,
                visible: Cell::new(true),
                repr: RotationRepr::Euler,
                semantics: ScaleSemantics::Vector,
            }
        }

        pub fn shared(self) -> Rc<dyn ManipItem> {
            Rc::new(self)
        }
    }

    impl ManipItem for TestItem {
        fn id(&self) -> PickId {
            self.id
        }

        fn op_name(&self) -> &str {
            "item"
        }

        fn is_visible(&self) -> bool {
            self.visible.get()
        }

        fn translate(&self) -> Vec3 {
            self.translate
        }

        fn rotate(&self) -> Vec3 {
            self.rotate
        }

        fn scale(&self) -> Vec3 {
            self.scale
        }

        fn rotation_repr(&self) -> RotationRepr {
            self.repr
        }

        fn scale_semantics(&self) -> ScaleSemantics {
            self.semantics.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestItem;
    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut set = AttachedItems::new();
        assert!(set.insert(TestItem::new(1, Vec3::ZERO).shared()));
        assert!(!set.insert(TestItem::new(1, Vec3::X).shared()));
        assert!(set.insert(TestItem::new(2, Vec3::X).shared()));
        assert_eq!(set.ids(), vec![1, 2]);
        assert!(set.remove(1).is_some());
        assert!(set.remove(1).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn center_and_bounds() {
        let set: AttachedItems = [
            TestItem::new(1, Vec3::new(-1.0, 0.0, 0.0)).shared(),
            TestItem::new(2, Vec3::new(3.0, 2.0, 0.0)).shared(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.center(), Some(Vec3::new(1.0, 1.0, 0.0)));
        let bounds = set.bounds().unwrap();
        assert_eq!(bounds.min(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bounds.max(), Vec3::new(3.0, 2.0, 0.0));
        assert!(AttachedItems::new().center().is_none());
    }

    #[test]
    fn visibility_is_live() {
        let item = Rc::new(TestItem::new(4, Vec3::ZERO));
        let mut set = AttachedItems::new();
        set.insert(item.clone());
        assert!(set.is_visible(4));
        item.visible.set(false);
        assert!(!set.is_visible(4));
        assert!(!set.is_visible(5));
    }
}
