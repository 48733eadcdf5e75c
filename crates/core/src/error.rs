//! Error types for the fieldlines core.
//!
//! The numeric pipeline itself never fails: near-singular distances and
//! degenerate viewports are handled by thresholds. Errors only arise on the
//! fallible edges around it (configuration, scene loading).

use thiserror::Error;

/// Errors produced outside the per-frame numeric pipeline.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A configuration value was out of its valid range.
    #[error("invalid config value for '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// A scene description could not be interpreted.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(String),
}
