use super::pose::{spherical_angles, spherical_position, CameraPose, MIN_ORTHO_ZOOM};
use crate::config::ViewportPrefs;
use crate::math::{euler_angles, AxisAlignedBBox, Ray, Viewport};
use glam::{Mat3, Mat4, Vec2, Vec3};

const PHI_LIMIT: f32 = 89.0;

/// Pose captured when a camera drag starts.
#[derive(Debug, Clone, Copy)]
struct DragStart {
    mouse: Vec2,
    position: Vec3,
    pivot: Vec3,
    orbit_radius: f32,
    zoom: Option<f32>,
    right: Vec3,
    up: Vec3,
    back: Vec3,
    modelview: Mat4,
    projection: Mat4,
}

/// Orbit / track / dolly / frame controller shared by perspective and
/// orthographic cameras.
///
/// Every drag call recomputes the pose from the snapshot taken by
/// [`NavigationController::init_drag`] and the current mouse position, so
/// repeated or out-of-order samples never accumulate.
#[derive(Debug, Clone)]
pub struct NavigationController {
    start: Option<DragStart>,
    rotate_degrees_per_pixel: f32,
    frame_distance_scale: f32,
    frame_ortho_padding: f32,
}

impl NavigationController {
    pub fn new(prefs: &ViewportPrefs) -> Self {
        Self {
            start: None,
            rotate_degrees_per_pixel: prefs.rotate_degrees_per_pixel,
            frame_distance_scale: prefs.frame_distance_scale,
            frame_ortho_padding: prefs.frame_ortho_padding,
        }
    }

    pub fn init_drag(&mut self, pose: &CameraPose, mx: f32, my: f32, _viewport: &Viewport) {
        self.start = Some(DragStart {
            mouse: Vec2::new(mx, my),
            position: pose.world_pos(),
            pivot: pose.pivot(),
            orbit_radius: pose.params().orbit_radius,
            zoom: pose.zoom(),
            right: pose.right(),
            up: pose.up(),
            back: pose.back(),
            modelview: *pose.modelview(),
            projection: *pose.projection(),
        });
    }

    pub fn end_drag(&mut self) {
        self.start = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Mouse position recorded by the last `init_drag`.
    pub fn drag_origin(&self) -> Option<Vec2> {
        self.start.map(|s| s.mouse)
    }

    /// Orbit around the drag-start pivot. Perspective cameras only.
    pub fn mouse_rotate_drag(
        &self,
        pose: &mut CameraPose,
        mx0: f32,
        my0: f32,
        mx1: f32,
        my1: f32,
        _viewport: &Viewport,
    ) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if pose.is_ortho() {
            return false;
        }
        let scale = pose.params().sensitivity * self.rotate_degrees_per_pixel;
        let (phi, theta) = spherical_angles(start.position, start.pivot);
        let phi = (phi + (my1 - my0) * scale).clamp(-PHI_LIMIT, PHI_LIMIT);
        let theta = theta - (mx1 - mx0) * scale;

        let position = spherical_position(phi, theta, start.orbit_radius, start.pivot);
        let look = Mat4::look_at_rh(position, start.pivot, Vec3::Y);
        let rotate = -euler_angles(&Mat3::from_mat4(look));
        pose.set_placement(position, rotate, start.orbit_radius);
        true
    }

    /// Pan so the point under the cursor on the pivot plane follows the mouse.
    pub fn mouse_track_drag(
        &self,
        pose: &mut CameraPose,
        mx0: f32,
        my0: f32,
        mx1: f32,
        my1: f32,
        viewport: &Viewport,
    ) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        let hit = |mx: f32, my: f32| {
            Ray::from_screen(mx, my, viewport, &start.modelview, &start.projection)
                .and_then(|ray| ray.intersect_plane(start.pivot, start.back))
        };
        let (Some(h0), Some(h1)) = (hit(mx0, my0), hit(mx1, my1)) else {
            log::trace!("track drag skipped: no pivot-plane intersection");
            return false;
        };
        let delta = h1 - h0;
        let offset = (start.right * delta.dot(start.right) + start.up * delta.dot(start.up))
            * pose.params().sensitivity;
        pose.set_translate(start.position - offset);
        true
    }

    /// Dolly (perspective) or zoom (orthographic) from the drag-start value.
    pub fn mouse_dolly_drag(
        &self,
        pose: &mut CameraPose,
        mx0: f32,
        my0: f32,
        mx1: f32,
        my1: f32,
        viewport: &Viewport,
    ) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if viewport.is_empty() {
            return false;
        }
        let extent = viewport.width.max(viewport.height);
        let delta = ((mx1 - mx0) - (my1 - my0)) / extent;
        let factor = (pose.params().sensitivity * delta).exp() - 1.0;

        if let Some(zoom) = start.zoom {
            pose.set_zoom((zoom - zoom * factor).max(MIN_ORTHO_ZOOM));
            return true;
        }

        let min_radius = 2.0 * pose.params().near;
        let radius = (start.orbit_radius - start.orbit_radius * factor).max(min_radius);
        let position = start.pivot + start.back * radius;
        let rotate = pose.params().rotate;
        pose.set_placement(position, rotate, radius);
        true
    }

    /// Fit `bbox` in view without changing the camera rotation.
    pub fn frame(&self, pose: &mut CameraPose, bbox: &AxisAlignedBBox) -> bool {
        let mid = bbox.mid();
        let back = pose.back();
        if let Some(view) = pose.ortho_view() {
            let (h, v) = view.screen_axes();
            let half_w = bbox.dim(h) * 0.5 * self.frame_ortho_padding;
            let half_h = bbox.dim(v) * 0.5 * self.frame_ortho_padding;
            let zoom = half_w.max(half_h * pose.viewport().aspect());
            if zoom > 0.0 {
                pose.set_zoom(zoom);
            }
            let radius = pose.params().orbit_radius;
            let rotate = pose.params().rotate;
            pose.set_placement(mid + back * radius, rotate, radius);
            return true;
        }

        let half = bbox.dims() * 0.5;
        let mut radius = self.frame_distance_scale * half.length();
        if radius <= 0.0 {
            radius = pose.params().orbit_radius;
        }
        let radius = radius.max(2.0 * pose.params().near);
        let rotate = pose.params().rotate;
        pose.set_placement(mid + back * radius, rotate, radius);
        true
    }
}
