use glam::Vec3;

/// Axis-aligned bounding box. Every mutator keeps `min <= max` per axis.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "BBoxCorners")]
pub struct AxisAlignedBBox {
    min: [f32; 3],
    max: [f32; 3],
}

/// Wire form of a box; deserialized corners are re-ordered on the way in.
#[derive(serde::Deserialize)]
struct BBoxCorners {
    min: [f32; 3],
    max: [f32; 3],
}

impl From<BBoxCorners> for AxisAlignedBBox {
    fn from(c: BBoxCorners) -> Self {
        Self::new(c.min[0], c.max[0], c.min[1], c.max[1], c.min[2], c.max[2])
    }
}

impl Default for AxisAlignedBBox {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [0.0; 3],
        }
    }
}

impl AxisAlignedBBox {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32, min_z: f32, max_z: f32) -> Self {
        let mut bbox = Self {
            min: [min_x, min_y, min_z],
            max: [max_x, max_y, max_z],
        };
        for axis in 0..3 {
            bbox.order(axis);
        }
        bbox
    }

    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self::new(a.x, b.x, a.y, b.y, a.z, b.z)
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self::from_corners(center - half, center + half)
    }

    /// Smallest box containing every point; `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_corners(first, first);
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    fn order(&mut self, axis: usize) {
        if self.min[axis] > self.max[axis] {
            std::mem::swap(&mut self.min[axis], &mut self.max[axis]);
        }
    }

    fn set_min(&mut self, axis: usize, value: f32) {
        self.min[axis] = value;
        self.order(axis);
    }

    fn set_max(&mut self, axis: usize, value: f32) {
        self.max[axis] = value;
        self.order(axis);
    }

    pub fn min_x(&self) -> f32 {
        self.min[0]
    }
    pub fn max_x(&self) -> f32 {
        self.max[0]
    }
    pub fn min_y(&self) -> f32 {
        self.min[1]
    }
    pub fn max_y(&self) -> f32 {
        self.max[1]
    }
    pub fn min_z(&self) -> f32 {
        self.min[2]
    }
    pub fn max_z(&self) -> f32 {
        self.max[2]
    }

    pub fn set_min_x(&mut self, v: f32) {
        self.set_min(0, v);
    }
    pub fn set_max_x(&mut self, v: f32) {
        self.set_max(0, v);
    }
    pub fn set_min_y(&mut self, v: f32) {
        self.set_min(1, v);
    }
    pub fn set_max_y(&mut self, v: f32) {
        self.set_max(1, v);
    }
    pub fn set_min_z(&mut self, v: f32) {
        self.set_min(2, v);
    }
    pub fn set_max_z(&mut self, v: f32) {
        self.set_max(2, v);
    }

    pub fn min(&self) -> Vec3 {
        Vec3::from_array(self.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::from_array(self.max)
    }

    pub fn mid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Extent along `axis` (0 = x, 1 = y, 2 = z).
    pub fn dim(&self, axis: usize) -> f32 {
        self.max[axis] - self.min[axis]
    }

    pub fn dims(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn diagonal(&self) -> f32 {
        self.dims().length()
    }

    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn include(&mut self, p: Vec3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn unite(&mut self, other: &Self) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
    }

    pub fn united(&self, other: &Self) -> Self {
        let mut out = *self;
        out.unite(other);
        out
    }

    /// Overlap of both boxes, or `None` when they are disjoint.
    pub fn intersected(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        let mut out = *self;
        for axis in 0..3 {
            out.min[axis] = self.min[axis].max(other.min[axis]);
            out.max[axis] = self.max[axis].min(other.max[axis]);
        }
        Some(out)
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min(), self.max());
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(b: &AxisAlignedBBox) -> bool {
        b.min_x() <= b.max_x() && b.min_y() <= b.max_y() && b.min_z() <= b.max_z()
    }

    #[test]
    fn constructor_orders_swapped_bounds() {
        let b = AxisAlignedBBox::new(5.0, -1.0, 2.0, 3.0, 9.0, -9.0);
        assert!(ordered(&b));
        assert_eq!(b.min(), Vec3::new(-1.0, 2.0, -9.0));
        assert_eq!(b.max(), Vec3::new(5.0, 3.0, 9.0));
    }

    #[test]
    fn setters_keep_invariant() {
        let mut b = AxisAlignedBBox::new(0.0, 1.0, 0.0, 1.0, 0.0, 1.0);
        b.set_min_x(4.0);
        b.set_max_y(-3.0);
        b.set_min_z(0.5);
        b.set_max_z(-2.0);
        assert!(ordered(&b));
        assert_eq!((b.min_x(), b.max_x()), (1.0, 4.0));
        assert_eq!((b.min_y(), b.max_y()), (-3.0, 0.0));
        assert_eq!((b.min_z(), b.max_z()), (-2.0, 0.5));
    }

    #[test]
    fn united_is_componentwise_and_commutative() {
        let a = AxisAlignedBBox::new(0.0, 1.0, -2.0, 0.0, 3.0, 4.0);
        let b = AxisAlignedBBox::new(-1.0, 0.5, -1.0, 5.0, 3.5, 3.6);
        let ab = a.united(&b);
        assert_eq!(ab, b.united(&a));
        assert_eq!(ab.min(), Vec3::new(-1.0, -2.0, 3.0));
        assert_eq!(ab.max(), Vec3::new(1.0, 5.0, 4.0));
    }

    #[test]
    fn intersection_and_disjoint() {
        let a = AxisAlignedBBox::new(0.0, 2.0, 0.0, 2.0, 0.0, 2.0);
        let b = AxisAlignedBBox::new(1.0, 3.0, 1.0, 3.0, 1.0, 3.0);
        let i = a.intersected(&b).unwrap();
        assert_eq!(i.min(), Vec3::ONE);
        assert_eq!(i.max(), Vec3::splat(2.0));
        let far = AxisAlignedBBox::new(10.0, 11.0, 0.0, 1.0, 0.0, 1.0);
        assert!(a.intersected(&far).is_none());
    }

    #[test]
    fn derived_measures() {
        let b = AxisAlignedBBox::new(-1.0, 1.0, 0.0, 4.0, 2.0, 2.0);
        assert_eq!(b.mid(), Vec3::new(0.0, 2.0, 2.0));
        assert_eq!(b.dim(1), 4.0);
        assert!((b.diagonal() - 20.0_f32.sqrt()).abs() < 1e-6);
        assert!(b.contains(Vec3::new(0.5, 3.0, 2.0)));
        assert!(!b.contains(Vec3::new(0.5, 3.0, 2.5)));
    }

    #[test]
    fn from_points_covers_all() {
        let b = AxisAlignedBBox::from_points([
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-1.0, 5.0, 0.0),
            Vec3::new(0.0, 0.0, 9.0),
        ])
        .unwrap();
        assert_eq!(b.min(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(b.max(), Vec3::new(1.0, 5.0, 9.0));
        assert!(AxisAlignedBBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn deserialized_bounds_are_ordered() {
        let b: AxisAlignedBBox = serde_json::from_str(r#"{"min":[5,0,0],"max":[-1,1,1]}"#).unwrap();
        assert!(ordered(&b));
        assert_eq!((b.min_x(), b.max_x()), (-1.0, 5.0));
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(serde_json::from_str::<AxisAlignedBBox>(&json).unwrap(), b);
    }
}
