//! Rendering module root.
//!
//! The `render` module owns the window/event-loop integration and the GPU side:
//! `raster` turns recorded frames into meshes, `mesh_renderer` draws them.
//!
//! Entrypoint: `render::app::run_with_handler()`.

pub mod app;

/// Common GPU types used across render submodules.
pub mod gpu;

/// Frame -> `scene::DrawItem2D` conversion (fonts, layout, caching).
pub mod raster;

/// Easing helpers.
pub mod util;

/// A solid-color mesh renderer for scene draw items.
pub mod mesh_renderer;
