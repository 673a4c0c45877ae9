//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Host applications should call this once before creating the renderer.
/// Respects `RUST_LOG` for per-module filtering.
pub fn init() {
    env_logger::init();
}
