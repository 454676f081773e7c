//! Headless window toolkit: geometry, layers, clicks, windows, and the host that
//! runs them.

pub mod click;
pub mod geometry;
pub mod host;
pub mod layer;
pub mod window;
