//! Thin binary wrapper: set up logging and run the font test window.
//!
//! Run:
//! - `cargo run`
//! - `RUST_LOG=debug cargo run` for lifecycle logs

fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    glyphsize::run_app()
}
