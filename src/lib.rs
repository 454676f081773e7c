//! `glyphsize` library crate root.
//!
//! A font rendering test: one window shows the string "AB1" in a vector font at
//! an adjustable em-height, with the current size in a label at the top. UP/DOWN
//! (auto-repeating while held) change the size by one pixel.
//!
//! Layout:
//! - `ui`: headless window toolkit (layers, click recognizers, the `Host`)
//! - `draw`: recorded drawing (`GContext`, fill scopes, `Frame`)
//! - `app`: the demo window handler and its size state
//! - `font`, `scene`, `render`: font loading and layout, meshes, winit/wgpu output
//!
//! The binary stays thin and calls `run_app`.

pub mod app;
pub mod draw;
pub mod font;
pub mod render;
pub mod scene;
pub mod ui;

/// Run the font test window with the default configuration.
///
/// Note: This function does **not** initialize logging; callers decide their own
/// logging setup.
pub fn run_app() -> anyhow::Result<()> {
    render::app::run_with_handler(render::app::AppConfig::default(), app::FontTestApp::new())
}
