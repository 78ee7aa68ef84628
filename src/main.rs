//! Studio Viewport
//!
//! Opens a window over a small demo scene and drives the camera,
//! manipulators and picking from mouse and keyboard input.

mod app;

fn main() {
    if let Err(err) = app::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
