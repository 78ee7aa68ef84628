mod navigation;
mod pose;

pub use navigation::NavigationController;
pub use pose::{
    pivot, spherical_angles, spherical_position, BodyDeviation, CameraBody, CameraParams,
    CameraPose, Lens, OrthoView, ViewContext, MIN_ORTHO_ZOOM,
};

use crate::config::ViewportPrefs;
use crate::math::{AxisAlignedBBox, Viewport};

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera body JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("camera body {0} matrix contains non-finite values")]
    InvalidMatrix(&'static str),
}

/// Which camera drag a mouse gesture performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Rotate,
    Track,
    Dolly,
}

/// Per-node camera: the pose, its navigation controller and an optional
/// camera-body override that takes the pose from simulation data.
#[derive(Debug, Clone)]
pub struct CameraScope {
    node_name: String,
    pose: CameraPose,
    navigation: NavigationController,
    body: Option<CameraBody>,
    gesture: Option<NavigationMode>,
}

impl CameraScope {
    pub fn new(node_name: impl Into<String>, pose: CameraPose, prefs: &ViewportPrefs) -> Self {
        Self {
            node_name: node_name.into(),
            pose,
            navigation: NavigationController::new(prefs),
            body: None,
            gesture: None,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Direct parameter edits (e.g. from a parameter panel).
    pub fn set_params(&mut self, params: CameraParams) {
        if self.body.is_some() {
            log::debug!("{}: parameters are driven by a camera body", self.node_name);
            return;
        }
        self.pose.set_params(params);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.pose.resize(viewport);
    }

    pub fn view_context(&self) -> crate::camera::ViewContext {
        self.pose.view_context()
    }

    pub fn navigation_enabled(&self) -> bool {
        self.body.is_none()
    }

    pub fn body(&self) -> Option<&CameraBody> {
        self.body.as_ref()
    }

    /// Drive the pose from a camera body; `None` hands control back to the
    /// mouse. Returns the matrix deviation when a body was applied.
    pub fn set_body(
        &mut self,
        body: Option<CameraBody>,
    ) -> Result<Option<BodyDeviation>, CameraError> {
        self.gesture = None;
        self.navigation.end_drag();
        match body {
            Some(body) => {
                let deviation = self.pose.apply_body(&body)?;
                log::info!("{}: camera driven by body", self.node_name);
                self.body = Some(body);
                Ok(Some(deviation))
            }
            None => {
                self.body = None;
                Ok(None)
            }
        }
    }

    pub fn begin_navigation(&mut self, mode: NavigationMode, mx: f32, my: f32) -> bool {
        if !self.navigation_enabled() {
            return false;
        }
        let viewport = *self.pose.viewport();
        self.navigation.init_drag(&self.pose, mx, my, &viewport);
        self.gesture = Some(mode);
        true
    }

    pub fn navigate(&mut self, mx: f32, my: f32) -> bool {
        let (Some(mode), Some(origin)) = (self.gesture, self.navigation.drag_origin()) else {
            return false;
        };
        let viewport = *self.pose.viewport();
        let (mx0, my0) = (origin.x, origin.y);
        match mode {
            NavigationMode::Rotate => {
                self.navigation
                    .mouse_rotate_drag(&mut self.pose, mx0, my0, mx, my, &viewport)
            }
            NavigationMode::Track => {
                self.navigation
                    .mouse_track_drag(&mut self.pose, mx0, my0, mx, my, &viewport)
            }
            NavigationMode::Dolly => {
                self.navigation
                    .mouse_dolly_drag(&mut self.pose, mx0, my0, mx, my, &viewport)
            }
        }
    }

    pub fn end_navigation(&mut self) {
        self.gesture = None;
        self.navigation.end_drag();
    }

    pub fn is_navigating(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn frame(&mut self, bbox: &AxisAlignedBBox) -> bool {
        if !self.navigation_enabled() {
            return false;
        }
        self.navigation.frame(&mut self.pose, bbox)
    }

    pub fn reset(&mut self) {
        if self.navigation_enabled() {
            self.pose.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn scope() -> CameraScope {
        let viewport = Viewport::new(0.0, 0.0, 320.0, 240.0);
        CameraScope::new(
            "camera1",
            CameraPose::perspective(viewport),
            &ViewportPrefs::default(),
        )
    }

    fn body() -> CameraBody {
        CameraBody {
            translate: Vec3::new(0.0, 1.0, 8.0),
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
            focal_length: 50.0,
            aperture: Vec2::new(1.417, 0.945),
            near: 0.1,
            far: 100.0,
            modelview: glam::Mat4::from_translation(Vec3::new(0.0, -1.0, -8.0)).to_cols_array(),
            projection: glam::Mat4::IDENTITY.to_cols_array(),
        }
    }

    #[test]
    fn gesture_round_trip() {
        let mut scope = scope();
        assert!(scope.begin_navigation(NavigationMode::Rotate, 160.0, 120.0));
        assert!(scope.is_navigating());
        assert!(scope.navigate(200.0, 120.0));
        scope.end_navigation();
        assert!(!scope.navigate(220.0, 120.0));
    }

    #[test]
    fn camera_body_disables_navigation() {
        let mut scope = scope();
        let deviation = scope.set_body(Some(body())).unwrap().unwrap();
        assert!(deviation.modelview < 1e-5);
        // The identity projection does not match the body's lens.
        assert!(deviation.exceeds_tolerance());
        assert!(!scope.navigation_enabled());
        assert!(!scope.begin_navigation(NavigationMode::Track, 0.0, 0.0));
        let pos = scope.pose().world_pos();
        scope.set_params(CameraParams::default());
        assert_eq!(scope.pose().world_pos(), pos);

        scope.set_body(None).unwrap();
        assert!(scope.begin_navigation(NavigationMode::Track, 0.0, 0.0));
    }

    #[test]
    fn frame_through_scope() {
        let mut scope = scope();
        let bbox = AxisAlignedBBox::new(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        assert!(scope.frame(&bbox));
        assert!((scope.pose().pivot()).length() < 1e-4);
    }
}
