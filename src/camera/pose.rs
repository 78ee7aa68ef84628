use super::CameraError;
use crate::math::{
    euler_angles, euler_quaternion, pixel_world_size, project_to_screen, Ray, Viewport,
};
use glam::{Mat3, Mat4, Vec2, Vec3};

const INCH_TO_MM: f32 = 25.4;
const MIN_NEAR_CLIP: f32 = 1e-4;
pub const MIN_ORTHO_ZOOM: f32 = 1e-3;
const BODY_TOLERANCE: f32 = 0.01;

/// Named orthographic view direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrthoView {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl OrthoView {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// (view direction, screen up) in world space.
    fn direction_up(self) -> (Vec3, Vec3) {
        match self {
            Self::Front => (Vec3::NEG_Z, Vec3::Y),
            Self::Back => (Vec3::Z, Vec3::Y),
            Self::Left => (Vec3::X, Vec3::Y),
            Self::Right => (Vec3::NEG_X, Vec3::Y),
            Self::Top => (Vec3::NEG_Y, Vec3::NEG_Z),
            Self::Bottom => (Vec3::Y, Vec3::Z),
        }
    }

    /// World-to-camera rotation for this view.
    pub fn view_rotation(self) -> Mat3 {
        let (dir, up) = self.direction_up();
        Mat3::from_mat4(Mat4::look_to_rh(Vec3::ZERO, dir, up))
    }

    /// World axis indices of the horizontal and vertical screen directions.
    pub fn screen_axes(self) -> (usize, usize) {
        match self {
            Self::Front | Self::Back => (0, 1),
            Self::Left | Self::Right => (2, 1),
            Self::Top | Self::Bottom => (0, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Lens {
    /// Focal length in millimetres, film aperture in inches.
    Perspective { focal_length: f32, aperture: Vec2 },
    /// `zoom` is the half-width of the visible region in world units.
    Orthographic { zoom: f32, view: OrthoView },
}

impl Lens {
    pub fn default_perspective() -> Self {
        Self::Perspective {
            focal_length: 35.0,
            aperture: Vec2::new(1.417, 0.945),
        }
    }
}

/// Source-of-truth camera parameters; matrices are derived from these.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraParams {
    pub translate: Vec3,
    /// Euler degrees; the negation of the view-matrix Euler angles.
    pub rotate: Vec3,
    pub scale: Vec3,
    pub orbit_radius: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub lens: Lens,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            translate: Vec3::new(0.0, 0.0, 10.0),
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
            orbit_radius: 10.0,
            near: 0.1,
            far: 10_000.0,
            sensitivity: 1.0,
            lens: Lens::default_perspective(),
        }
    }
}

impl CameraParams {
    pub fn orthographic(view: OrthoView, zoom: f32) -> Self {
        Self {
            lens: Lens::Orthographic { zoom, view },
            ..Self::default()
        }
    }

    fn sanitize(&mut self) {
        self.near = self.near.max(MIN_NEAR_CLIP);
        if !(self.far > self.near) {
            self.far = self.near * 1000.0;
        }
        self.orbit_radius = self.orbit_radius.max(2.0 * self.near);
        match &mut self.lens {
            Lens::Perspective { focal_length, .. } => {
                *focal_length = focal_length.max(1e-3);
            }
            Lens::Orthographic { zoom, view } => {
                *zoom = zoom.max(MIN_ORTHO_ZOOM);
                self.rotate = -euler_angles(&view.view_rotation());
            }
        }
    }
}

/// Matrices and viewport bundled for consumers of a camera pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    pub viewport: Viewport,
    pub modelview: Mat4,
    pub projection: Mat4,
}

impl ViewContext {
    pub fn ray(&self, mx: f32, my: f32) -> Option<Ray> {
        Ray::from_screen(mx, my, &self.viewport, &self.modelview, &self.projection)
    }

    pub fn project(&self, p: Vec3) -> Option<Vec2> {
        project_to_screen(p, &self.viewport, &self.modelview, &self.projection)
    }

    pub fn pixel_size(&self, p: Vec3) -> Option<f32> {
        pixel_world_size(p, &self.viewport, &self.modelview, &self.projection)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.modelview
    }

    pub fn right(&self) -> Vec3 {
        modelview_row(&self.modelview, 0)
    }

    pub fn up(&self) -> Vec3 {
        modelview_row(&self.modelview, 1)
    }

    pub fn back(&self) -> Vec3 {
        modelview_row(&self.modelview, 2)
    }

    pub fn world_pos(&self) -> Vec3 {
        modelview_world_pos(&self.modelview)
    }
}

fn modelview_row(modelview: &Mat4, row: usize) -> Vec3 {
    modelview.row(row).truncate()
}

fn modelview_world_pos(modelview: &Mat4) -> Vec3 {
    let rot = Mat3::from_mat4(*modelview);
    -(rot.transpose() * modelview.w_axis.truncate())
}

/// Point `radius` in front of the camera.
pub fn pivot(world_pos: Vec3, back: Vec3, radius: f32) -> Vec3 {
    world_pos - radius * back
}

/// Position at elevation `phi_deg` and azimuth `theta_deg` around `center`.
pub fn spherical_position(phi_deg: f32, theta_deg: f32, radius: f32, center: Vec3) -> Vec3 {
    let (sp, cp) = phi_deg.to_radians().sin_cos();
    let (st, ct) = theta_deg.to_radians().sin_cos();
    center + radius * Vec3::new(cp * st, sp, cp * ct)
}

/// Inverse of [`spherical_position`]: (phi, theta) in degrees.
pub fn spherical_angles(world_pos: Vec3, center: Vec3) -> (f32, f32) {
    let dx = world_pos - center;
    let horizontal = (dx.x * dx.x + dx.z * dx.z).sqrt();
    if horizontal <= f32::EPSILON && dx.y.abs() <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let phi = dx.y.atan2(horizontal).to_degrees();
    let theta = dx.x.atan2(dx.z).to_degrees();
    (phi, theta)
}

/// Camera parameters as carried by a camera body in the simulation data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraBody {
    pub translate: Vec3,
    pub rotate: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    pub focal_length: f32,
    pub aperture: Vec2,
    pub near: f32,
    pub far: f32,
    /// Column-major.
    pub modelview: [f32; 16],
    /// Column-major.
    pub projection: [f32; 16],
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl CameraBody {
    pub fn from_json(json: &str) -> Result<Self, CameraError> {
        let body: Self = serde_json::from_str(json)?;
        body.modelview_matrix()?;
        body.projection_matrix()?;
        Ok(body)
    }

    pub fn modelview_matrix(&self) -> Result<Mat4, CameraError> {
        if self.modelview.iter().all(|v| v.is_finite()) {
            Ok(Mat4::from_cols_array(&self.modelview))
        } else {
            Err(CameraError::InvalidMatrix("modelview"))
        }
    }

    pub fn projection_matrix(&self) -> Result<Mat4, CameraError> {
        if self.projection.iter().all(|v| v.is_finite()) {
            Ok(Mat4::from_cols_array(&self.projection))
        } else {
            Err(CameraError::InvalidMatrix("projection"))
        }
    }
}

/// Camera state: parameters plus the matrices derived from them.
///
/// Every parameter write recomputes the affected matrix before returning,
/// so readers never observe a stale modelview or projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    params: CameraParams,
    viewport: Viewport,
    modelview: Mat4,
    projection: Mat4,
}

impl CameraPose {
    pub fn new(params: CameraParams, viewport: Viewport) -> Self {
        let mut pose = Self {
            params,
            viewport,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        pose.params.sanitize();
        pose.update_modelview();
        pose.update_projection();
        pose
    }

    pub fn perspective(viewport: Viewport) -> Self {
        Self::new(CameraParams::default(), viewport)
    }

    pub fn orthographic(view: OrthoView, zoom: f32, viewport: Viewport) -> Self {
        Self::new(CameraParams::orthographic(view, zoom), viewport)
    }

    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn modelview(&self) -> &Mat4 {
        &self.modelview
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn is_ortho(&self) -> bool {
        matches!(self.params.lens, Lens::Orthographic { .. })
    }

    pub fn ortho_view(&self) -> Option<OrthoView> {
        match self.params.lens {
            Lens::Orthographic { view, .. } => Some(view),
            Lens::Perspective { .. } => None,
        }
    }

    pub fn zoom(&self) -> Option<f32> {
        match self.params.lens {
            Lens::Orthographic { zoom, .. } => Some(zoom),
            Lens::Perspective { .. } => None,
        }
    }

    pub fn set_params(&mut self, params: CameraParams) {
        self.params = params;
        self.params.sanitize();
        self.update_modelview();
        self.update_projection();
    }

    pub fn set_translate(&mut self, translate: Vec3) {
        self.params.translate = translate;
        self.update_modelview();
    }

    pub fn set_rotate(&mut self, rotate: Vec3) {
        if self.is_ortho() {
            return;
        }
        self.params.rotate = rotate;
        self.update_modelview();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.params.scale = scale;
    }

    pub fn set_orbit_radius(&mut self, radius: f32) {
        self.params.orbit_radius = radius.max(2.0 * self.params.near);
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.params.near = near;
        self.params.far = far;
        self.params.sanitize();
        self.update_projection();
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.params.sensitivity = sensitivity;
    }

    pub fn set_zoom(&mut self, value: f32) {
        if let Lens::Orthographic { zoom, .. } = &mut self.params.lens {
            *zoom = value.max(MIN_ORTHO_ZOOM);
            self.update_projection();
        }
    }

    pub fn set_view(&mut self, value: OrthoView) {
        if let Lens::Orthographic { view, .. } = &mut self.params.lens {
            *view = value;
            self.params.sanitize();
            self.update_modelview();
        }
    }

    pub fn set_focal_length(&mut self, value: f32) {
        if let Lens::Perspective { focal_length, .. } = &mut self.params.lens {
            *focal_length = value.max(1e-3);
            self.update_projection();
        }
    }

    pub fn set_aperture(&mut self, value: Vec2) {
        if let Lens::Perspective { aperture, .. } = &mut self.params.lens {
            *aperture = value;
            self.update_projection();
        }
    }

    /// Position, rotation and orbit radius in one write (orbit/dolly results).
    pub fn set_placement(&mut self, translate: Vec3, rotate: Vec3, orbit_radius: f32) {
        self.params.translate = translate;
        if !self.is_ortho() {
            self.params.rotate = rotate;
        }
        self.params.orbit_radius = orbit_radius.max(2.0 * self.params.near);
        self.update_modelview();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.update_projection();
    }

    /// Restore the default ("home") placement, keeping the lens kind.
    pub fn reset(&mut self) {
        let defaults = CameraParams::default();
        let lens = match self.params.lens {
            Lens::Orthographic { view, .. } => Lens::Orthographic { zoom: 10.0, view },
            Lens::Perspective { .. } => defaults.lens,
        };
        let mut params = CameraParams { lens, ..defaults };
        if let Lens::Orthographic { view, .. } = lens {
            let (dir, _) = view.direction_up();
            params.translate = -dir * params.orbit_radius;
        }
        params.sensitivity = self.params.sensitivity;
        self.set_params(params);
    }

    pub fn update_modelview(&mut self) {
        let rotation = match self.params.lens {
            Lens::Perspective { .. } => Mat3::from_quat(euler_quaternion(-self.params.rotate)),
            Lens::Orthographic { view, .. } => view.view_rotation(),
        };
        self.modelview =
            Mat4::from_mat3(rotation) * Mat4::from_translation(-self.params.translate);
    }

    pub fn update_projection(&mut self) {
        let aspect = self.viewport.aspect();
        let near = self.params.near;
        let far = self.params.far;
        self.projection = match self.params.lens {
            Lens::Perspective {
                focal_length,
                aperture,
            } => {
                let half_h = (aperture.x * INCH_TO_MM / (2.0 * focal_length)).atan();
                let half_v = (half_h.tan() / aspect).atan();
                Mat4::perspective_rh_gl(2.0 * half_v, aspect, near, far)
            }
            Lens::Orthographic { zoom, .. } => {
                let half_h = zoom / aspect;
                Mat4::orthographic_rh_gl(-zoom, zoom, -half_h, half_h, near, far)
            }
        };
    }

    /// Horizontal field of view in degrees (perspective only).
    pub fn horizontal_fov(&self) -> Option<f32> {
        match self.params.lens {
            Lens::Perspective {
                focal_length,
                aperture,
            } => Some(2.0 * (aperture.x * INCH_TO_MM / (2.0 * focal_length)).atan().to_degrees()),
            Lens::Orthographic { .. } => None,
        }
    }

    pub fn world_pos(&self) -> Vec3 {
        modelview_world_pos(&self.modelview)
    }

    pub fn right(&self) -> Vec3 {
        modelview_row(&self.modelview, 0)
    }

    pub fn up(&self) -> Vec3 {
        modelview_row(&self.modelview, 1)
    }

    /// Camera-local +Z; the view direction is `-back()`.
    pub fn back(&self) -> Vec3 {
        modelview_row(&self.modelview, 2)
    }

    pub fn view_dir(&self) -> Vec3 {
        -self.back()
    }

    pub fn pivot(&self) -> Vec3 {
        pivot(self.world_pos(), self.back(), self.params.orbit_radius)
    }

    /// Camera-to-world transform including the node scale.
    pub fn camera_to_world(&self) -> Mat4 {
        let rotation = Mat3::from_mat4(self.modelview).transpose();
        Mat4::from_translation(self.world_pos())
            * Mat4::from_mat3(rotation)
            * Mat4::from_scale(self.params.scale)
    }

    pub fn view_context(&self) -> ViewContext {
        ViewContext {
            viewport: self.viewport,
            modelview: self.modelview,
            projection: self.projection,
        }
    }

    /// Take parameters from a camera body and check the body's own matrices
    /// against the recomputed ones.
    pub fn apply_body(&mut self, body: &CameraBody) -> Result<BodyDeviation, CameraError> {
        let supplied_modelview = body.modelview_matrix()?;
        let supplied_projection = body.projection_matrix()?;
        let params = CameraParams {
            translate: body.translate,
            rotate: body.rotate,
            scale: body.scale,
            near: body.near,
            far: body.far,
            lens: Lens::Perspective {
                focal_length: body.focal_length,
                aperture: body.aperture,
            },
            ..self.params
        };
        self.set_params(params);

        let deviation = BodyDeviation {
            modelview: max_deviation(&self.modelview, &supplied_modelview),
            projection: max_deviation(&self.projection, &supplied_projection),
        };
        if deviation.modelview > BODY_TOLERANCE {
            log::warn!(
                "Camera body modelview differs from recomputed pose (max deviation {:.4})",
                deviation.modelview
            );
        }
        if deviation.projection > BODY_TOLERANCE {
            log::warn!(
                "Camera body projection differs from recomputed pose (max deviation {:.4})",
                deviation.projection
            );
        }
        Ok(deviation)
    }
}

/// Largest element difference between a camera body's matrices and the ones
/// recomputed from its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDeviation {
    pub modelview: f32,
    pub projection: f32,
}

impl BodyDeviation {
    pub fn exceeds_tolerance(&self) -> bool {
        self.modelview > BODY_TOLERANCE || self.projection > BODY_TOLERANCE
    }
}

fn max_deviation(a: &Mat4, b: &Mat4) -> f32 {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f32, f32::max)
}
