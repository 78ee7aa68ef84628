//! Viewport core for an interactive 3D editor.
//!
//! - [`camera`]: camera pose, orbit/track/dolly navigation and framing
//! - [`manip`]: translate/rotate/scale manipulators and the undo stack they feed
//! - [`pick`]: id-coloured pick buffer for point and region selection
//! - [`math`]: arcball, rays, bounding boxes
//! - [`draw`]: flat geometry batches shared by the overlay and pick passes

pub mod camera;
pub mod config;
pub mod draw;
pub mod manip;
pub mod math;
pub mod pick;
