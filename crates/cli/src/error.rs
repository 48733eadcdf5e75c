//! Failure classes of the `fieldlines` binary and their exit codes.
//!
//! | code | meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | success                                          |
//! | 2    | bad command line (reported by clap)              |
//! | 10   | overlay rejected its configuration               |
//! | 11   | scene could not be read or output not written    |
//! | 12   | scene or `--config` JSON was malformed           |
//! | 13   | output could not be serialized                   |

use fieldlines_core::OverlayError;
use thiserror::Error;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The overlay refused the configuration.
    #[error(transparent)]
    Overlay(OverlayError),
    /// A scene file could not be read or the output could not be written.
    #[error("{0}")]
    Io(String),
    /// Malformed scene or `--config` input.
    #[error("{0}")]
    Input(String),
    /// The frame or report could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Overlay(_) => 10,
            Self::Io(_) => 11,
            Self::Input(_) => 12,
            Self::Serialization(_) => 13,
        }
    }
}

/// Scene and file failures surface under their own codes; everything else
/// the overlay reports is a configuration problem.
impl From<OverlayError> for CliError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::Io(msg) => Self::Io(msg),
            OverlayError::InvalidScene(msg) => Self::Input(format!("invalid scene: {msg}")),
            other => Self::Overlay(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_the_overlay_message() {
        let err = CliError::from(OverlayError::InvalidConfig {
            name: "levels".into(),
            reason: "must not be empty".into(),
        });
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("levels"));
        assert!(matches!(err, CliError::Overlay(_)));
    }

    #[test]
    fn file_errors_map_to_code_11() {
        let err = CliError::from(OverlayError::Io("disk full".into()));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn bad_scenes_map_to_code_12() {
        let err = CliError::from(OverlayError::InvalidScene("no particles key".into()));
        assert_eq!(err.exit_code(), 12);
        assert!(err.to_string().contains("no particles key"));
    }

    #[test]
    fn json_errors_map_to_code_13() {
        let parse = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
        assert_eq!(CliError::from(parse).exit_code(), 13);
    }
}
