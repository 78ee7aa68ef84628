//! Viewport preferences.
//!
//! Preferences are plain data handed to the camera, manipulator and pick
//! buffer when they are built; nothing reads them through a global.

use glam::Vec2;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PrefsError>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewportPrefs {
    /// Global multiplier applied to every camera drag.
    pub mouse_sensitivity: f32,
    /// Orbit speed in degrees per pixel before sensitivity.
    pub rotate_degrees_per_pixel: f32,
    /// On-screen length of translate/scale handles.
    pub handle_length_px: f32,
    /// On-screen radius of the rotate manipulator ring.
    pub rotate_ring_px: f32,
    /// Line width used when drawing handles into the pick buffer.
    pub pick_line_width_px: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub focal_length: f32,
    /// Film aperture in inches.
    pub aperture: Vec2,
    /// Perspective framing distance as a multiple of the half-extent.
    pub frame_distance_scale: f32,
    /// Orthographic framing padding.
    pub frame_ortho_padding: f32,
    pub undo_depth: usize,
}

impl Default for ViewportPrefs {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            rotate_degrees_per_pixel: 0.5,
            handle_length_px: 80.0,
            rotate_ring_px: 90.0,
            pick_line_width_px: 6.0,
            near_clip: 0.1,
            far_clip: 10_000.0,
            focal_length: 35.0,
            aperture: Vec2::new(1.417, 0.945),
            frame_distance_scale: 5.0,
            frame_ortho_padding: 1.5,
            undo_depth: 100,
        }
    }
}

impl ViewportPrefs {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Perspective camera parameters seeded from these preferences.
    pub fn camera_params(&self) -> crate::camera::CameraParams {
        crate::camera::CameraParams {
            near: self.near_clip,
            far: self.far_clip,
            sensitivity: self.mouse_sensitivity,
            lens: crate::camera::Lens::Perspective {
                focal_length: self.focal_length,
                aperture: self.aperture,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let prefs = ViewportPrefs::from_json_str(r#"{ "mouse_sensitivity": 2.5 }"#).unwrap();
        assert_eq!(prefs.mouse_sensitivity, 2.5);
        assert_eq!(prefs.rotate_ring_px, ViewportPrefs::default().rotate_ring_px);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = ViewportPrefs::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PrefsError::Json(_)));
    }

    #[test]
    fn save_load_via_file() {
        let path = std::env::temp_dir().join(format!(
            "studio_viewport_prefs_{}.json",
            std::process::id()
        ));
        let mut prefs = ViewportPrefs::default();
        prefs.handle_length_px = 120.0;
        prefs.aperture = Vec2::new(0.98, 0.735);
        prefs.save(&path).unwrap();
        let loaded = ViewportPrefs::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewportPrefs::load(Path::new("/nonexistent/studio_viewport.json")).unwrap_err();
        assert!(matches!(err, PrefsError::Io(_)));
    }

    #[test]
    fn camera_params_follow_prefs() {
        let prefs = ViewportPrefs {
            near_clip: 0.5,
            mouse_sensitivity: 3.0,
            ..Default::default()
        };
        let params = prefs.camera_params();
        assert_eq!(params.near, 0.5);
        assert_eq!(params.sensitivity, 3.0);
    }
}
