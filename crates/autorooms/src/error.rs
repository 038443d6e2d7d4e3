//! Unified error type for the autorooms service.

use autorooms_model::ModelError;
use autorooms_room::DirectoryError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each wrapped variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum AutoroomsError {
    /// Invalid platform data (e.g. unknown permission bits).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A directory call failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The service configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed.
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}
