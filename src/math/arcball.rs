//! Arcball and axis-constraint helpers.
//!
//! Everything here is a pure function of its inputs. Screen coordinates use
//! the window convention (origin top-left, y down); the returned sphere
//! points live in camera space (x right, y up, z towards the viewer).

use super::ray::Viewport;
use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

const DEGENERATE_LENGTH: f32 = 1e-6;
const GIMBAL_LIMIT: f32 = 1.0 - 1e-6;

/// Map a window position onto the unit hemisphere spanning the viewport.
pub fn arc_point(mx: f32, my: f32, viewport: &Viewport) -> Vec3 {
    if viewport.is_empty() {
        return Vec3::Z;
    }
    let x = (2.0 * (mx - viewport.x) - viewport.width) / viewport.width;
    let y = (viewport.height - 2.0 * (my - viewport.y)) / viewport.height;
    sphere_point(x, y)
}

/// Same as [`arc_point`] but for a ring of `radius` pixels around `center`
/// (the rotate pivot's on-screen circle).
pub fn arc_point_in_ring(mx: f32, my: f32, center: Vec2, radius: f32) -> Vec3 {
    if radius <= 0.0 {
        return Vec3::Z;
    }
    let x = (mx - center.x) / radius;
    let y = (center.y - my) / radius;
    sphere_point(x, y)
}

fn sphere_point(x: f32, y: f32) -> Vec3 {
    let r = x * x + y * y;
    if r > 1.0 {
        let s = 1.0 / r.sqrt();
        Vec3::new(x * s, y * s, 0.0)
    } else {
        Vec3::new(x, y, (1.0 - r).sqrt())
    }
}

/// Project `p` onto the plane perpendicular to `axis` and normalise.
///
/// When the projection vanishes (p parallel to axis) a canonical vector
/// perpendicular to the axis is returned instead.
pub fn arc_point_axis(p: Vec3, axis: Vec3) -> Vec3 {
    let projected = p - axis * p.dot(axis);
    let len = projected.length();
    if len > DEGENERATE_LENGTH {
        return projected / len;
    }
    if axis.z.abs() >= GIMBAL_LIMIT {
        Vec3::X
    } else {
        Vec3::new(-axis.y, axis.x, 0.0).normalize()
    }
}

/// Express a world-space direction in camera axes (rows of the modelview
/// rotation block).
pub fn arc_point_cam(p: Vec3, modelview: &Mat4) -> Vec3 {
    let rows = Mat3::from_mat4(*modelview).transpose();
    Vec3::new(rows.x_axis.dot(p), rows.y_axis.dot(p), rows.z_axis.dot(p))
}

/// Quaternion taking `p0` towards `p1`: scalar = dot, vector = cross.
///
/// Not normalised; callers compose it with a press-time rotation directly.
pub fn arc_quaternion(p0: Vec3, p1: Vec3) -> Quat {
    let v = p0.cross(p1);
    Quat::from_xyzw(v.x, v.y, v.z, p0.dot(p1))
}

#[inline]
fn at(m: &Mat3, row: usize, col: usize) -> f32 {
    m.col(col)[row]
}

/// XYZ Euler angles in degrees of `m = Rx * Ry * Rz` (row/column indexing).
pub fn euler_angles(m: &Mat3) -> Vec3 {
    let sy = at(m, 0, 2).clamp(-1.0, 1.0);
    if sy.abs() >= GIMBAL_LIMIT {
        // Y at +-90: only x +- z is observable, so z is pinned to zero.
        let x = if sy > 0.0 {
            at(m, 1, 0).atan2(at(m, 1, 1))
        } else {
            (-at(m, 1, 0)).atan2(at(m, 1, 1))
        };
        return Vec3::new(x.to_degrees(), 90.0_f32.copysign(sy), 0.0);
    }
    Vec3::new(
        (-at(m, 1, 2)).atan2(at(m, 2, 2)).to_degrees(),
        sy.asin().to_degrees(),
        (-at(m, 0, 1)).atan2(at(m, 0, 0)).to_degrees(),
    )
}

/// `qx * qy * qz` for Euler angles given in degrees.
pub fn euler_quaternion(euler_deg: Vec3) -> Quat {
    Quat::from_rotation_x(euler_deg.x.to_radians())
        * Quat::from_rotation_y(euler_deg.y.to_radians())
        * Quat::from_rotation_z(euler_deg.z.to_radians())
}

/// Euler angles (degrees) of a possibly unnormalised quaternion.
pub fn quaternion_euler(q: Quat) -> Vec3 {
    euler_angles(&Mat3::from_quat(q.normalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_vec(a: Vec3, b: Vec3, eps: f32) -> bool {
        (a - b).abs().max_element() <= eps
    }

    fn approx_mat(a: &Mat3, b: &Mat3, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn arc_point_center_is_pole() {
        let vp = Viewport::new(0.0, 0.0, 200.0, 100.0);
        let p = arc_point(100.0, 50.0, &vp);
        assert!(approx_vec(p, Vec3::Z, 1e-6));
    }

    #[test]
    fn arc_point_outside_lands_on_rim() {
        let vp = Viewport::new(0.0, 0.0, 100.0, 100.0);
        let p = arc_point(500.0, 50.0, &vp);
        assert!((p.length() - 1.0).abs() < 1e-5);
        assert_eq!(p.z, 0.0);
        assert!(p.x > 0.99);
    }

    #[test]
    fn arc_point_y_points_up() {
        let vp = Viewport::new(0.0, 0.0, 100.0, 100.0);
        let p = arc_point(50.0, 25.0, &vp);
        assert!(p.y > 0.0);
        assert!((p.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ring_overload_uses_center_and_radius() {
        let p = arc_point_in_ring(130.0, 40.0, Vec2::new(100.0, 40.0), 60.0);
        assert!((p.x - 0.5).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!((p.z - 0.75_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn axis_projection_is_perpendicular_and_unit() {
        let p = arc_point_axis(Vec3::new(0.3, 0.8, 0.5), Vec3::Y);
        assert!(p.dot(Vec3::Y).abs() < 1e-6);
        assert!((p.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn axis_projection_degenerate_fallbacks() {
        assert_eq!(arc_point_axis(Vec3::Z, Vec3::Z), Vec3::X);
        assert_eq!(arc_point_axis(Vec3::NEG_Z, Vec3::NEG_Z), Vec3::X);
        let p = arc_point_axis(Vec3::X, Vec3::X);
        assert!(approx_vec(p, Vec3::Y, 1e-6));
        let p = arc_point_axis(Vec3::Y * 2.0, Vec3::Y);
        assert!(approx_vec(p, Vec3::NEG_X, 1e-6));
    }

    #[test]
    fn cam_projection_reads_modelview_rows() {
        let mv = Mat4::look_at_rh(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y);
        // Camera looks down -X, so world -X is camera -Z.
        let p = arc_point_cam(Vec3::NEG_X, &mv);
        assert!(approx_vec(p, Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn arc_quaternion_rotates_by_twice_the_arc() {
        let a = 10.0_f32.to_radians();
        let p0 = Vec3::Z;
        let p1 = Vec3::new(a.sin(), 0.0, a.cos());
        let q = arc_quaternion(p0, p1);
        let (axis, angle) = q.normalize().to_axis_angle();
        assert!(approx_vec(axis, Vec3::Y, 1e-5));
        assert!((angle - 2.0 * a).abs() < 1e-5);
    }

    #[test]
    fn euler_round_trip_inside_pitch_limits() {
        let samples = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(30.0, -45.0, 60.0),
            Vec3::new(-170.0, 80.0, 10.0),
            Vec3::new(120.0, -89.0, -135.0),
            Vec3::new(5.0, 12.5, 179.0),
        ];
        for euler in samples {
            let m = Mat3::from_quat(euler_quaternion(euler));
            let back = euler_angles(&m);
            let m2 = Mat3::from_quat(euler_quaternion(back));
            assert!(approx_mat(&m, &m2, 1e-4), "{euler:?} -> {back:?}");
        }
    }

    #[test]
    fn euler_matches_reference_formula() {
        let euler = Vec3::new(20.0, 35.0, -50.0);
        let back = euler_angles(&Mat3::from_quat(euler_quaternion(euler)));
        assert!(approx_vec(back, euler, 1e-3));
    }

    #[test]
    fn euler_gimbal_lock_still_reconstructs() {
        for euler in [Vec3::new(25.0, 90.0, 0.0), Vec3::new(-40.0, -90.0, 0.0)] {
            let m = Mat3::from_quat(euler_quaternion(euler));
            let back = euler_angles(&m);
            let m2 = Mat3::from_quat(euler_quaternion(back));
            assert!(approx_mat(&m, &m2, 1e-3), "{euler:?} -> {back:?}");
        }
    }

    #[test]
    fn euler_quaternion_order_is_x_then_y_then_z() {
        let q = euler_quaternion(Vec3::new(90.0, 90.0, 0.0));
        let expected = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(q.abs_diff_eq(expected, 1e-6));
    }
}
