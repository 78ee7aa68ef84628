use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Viewport rectangle in window coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }

    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width / self.height
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Window position to normalised device coordinates.
    pub fn to_ndc(&self, mx: f32, my: f32) -> Vec2 {
        Vec2::new(
            2.0 * (mx - self.x) / self.width - 1.0,
            1.0 - 2.0 * (my - self.y) / self.height,
        )
    }

    pub fn from_ndc(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.x + (ndc.x + 1.0) * 0.5 * self.width,
            self.y + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Unproject a window position through the near and far planes.
    ///
    /// Returns `None` for an empty viewport or a singular view-projection.
    pub fn from_screen(
        mx: f32,
        my: f32,
        viewport: &Viewport,
        modelview: &Mat4,
        projection: &Mat4,
    ) -> Option<Self> {
        if viewport.is_empty() {
            return None;
        }
        let view_proj = *projection * *modelview;
        if view_proj.determinant().abs() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        let inv = view_proj.inverse();
        let ndc = viewport.to_ndc(mx, my);
        let near = inv * ndc.extend(-1.0).extend(1.0);
        let far = inv * ndc.extend(1.0).extend(1.0);
        if near.w.abs() <= f32::EPSILON || far.w.abs() <= f32::EPSILON {
            return None;
        }
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }
        Some(Self {
            origin: near,
            direction,
        })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the plane through `point` with normal `normal`.
    ///
    /// Parallel rays and hits behind the origin yield `None`.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = self.direction.dot(normal);
        if denom.abs() <= 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(self.at(t))
    }
}

/// World position to window coordinates. `None` when behind the camera.
pub fn project_to_screen(
    p: Vec3,
    viewport: &Viewport,
    modelview: &Mat4,
    projection: &Mat4,
) -> Option<Vec2> {
    let clip = *projection * *modelview * p.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    Some(viewport.from_ndc(clip.xy() / clip.w))
}

/// World-space length covered by one pixel at the depth of `p`.
pub fn pixel_world_size(
    p: Vec3,
    viewport: &Viewport,
    modelview: &Mat4,
    projection: &Mat4,
) -> Option<f32> {
    let screen = project_to_screen(p, viewport, modelview, projection)?;
    let right = Mat4::transpose(modelview).x_axis.xyz().normalize_or_zero();
    let probe = project_to_screen(p + right, viewport, modelview, projection)?;
    let pixels = (probe - screen).length();
    if pixels <= f32::EPSILON {
        return None;
    }
    Some(1.0 / pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> (Viewport, Mat4, Mat4) {
        let vp = Viewport::new(0.0, 0.0, 200.0, 100.0);
        let mv = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(45.0_f32.to_radians(), vp.aspect(), 0.1, 100.0);
        (vp, mv, proj)
    }

    #[test]
    fn ndc_round_trip() {
        let vp = Viewport::new(10.0, 20.0, 300.0, 150.0);
        let ndc = vp.to_ndc(85.0, 50.0);
        let back = vp.from_ndc(ndc);
        assert!((back - Vec2::new(85.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn empty_viewport_has_no_ray() {
        let (_, mv, proj) = camera();
        let vp = Viewport::new(0.0, 0.0, 0.0, 0.0);
        assert!(Ray::from_screen(0.0, 0.0, &vp, &mv, &proj).is_none());
        assert_eq!(vp.aspect(), 1.0);
    }

    #[test]
    fn center_ray_hits_origin_plane_at_origin() {
        let (vp, mv, proj) = camera();
        let ray = Ray::from_screen(100.0, 50.0, &vp, &mv, &proj).unwrap();
        let hit = ray.intersect_plane(Vec3::ZERO, Vec3::Z).unwrap();
        assert!(hit.length() < 1e-3);
    }

    #[test]
    fn parallel_ray_misses_plane() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(ray.intersect_plane(Vec3::new(0.0, 1.0, 0.0), Vec3::Y).is_none());
    }

    #[test]
    fn plane_behind_origin_is_rejected() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(ray.intersect_plane(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).is_none());
    }

    #[test]
    fn projection_inverts_unprojection() {
        let (vp, mv, proj) = camera();
        let p = Vec3::new(1.5, -0.5, 2.0);
        let screen = project_to_screen(p, &vp, &mv, &proj).unwrap();
        let ray = Ray::from_screen(screen.x, screen.y, &vp, &mv, &proj).unwrap();
        let hit = ray.intersect_plane(p, Vec3::Z).unwrap();
        assert!((hit - p).length() < 1e-3);
    }

    #[test]
    fn pixel_size_grows_with_distance() {
        let (vp, mv, proj) = camera();
        let near = pixel_world_size(Vec3::new(0.0, 0.0, 5.0), &vp, &mv, &proj).unwrap();
        let far = pixel_world_size(Vec3::new(0.0, 0.0, -20.0), &vp, &mv, &proj).unwrap();
        assert!(far > near);
    }
}
