pub mod arcball;
pub mod bbox;
pub mod ray;

pub use arcball::{
    arc_point, arc_point_axis, arc_point_cam, arc_point_in_ring, arc_quaternion, euler_angles,
    euler_quaternion, quaternion_euler,
};
pub use bbox::AxisAlignedBBox;
pub use ray::{pixel_world_size, project_to_screen, Ray, Viewport};

/// One of the three principal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> glam::Vec3 {
        match self {
            Axis::X => glam::Vec3::X,
            Axis::Y => glam::Vec3::Y,
            Axis::Z => glam::Vec3::Z,
        }
    }

    /// Handle colour, RGBA8.
    pub fn color(self) -> [u8; 4] {
        match self {
            Axis::X => [255, 80, 80, 255],
            Axis::Y => [80, 255, 80, 255],
            Axis::Z => [80, 160, 255, 255],
        }
    }
}
