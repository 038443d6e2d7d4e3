//! Error types for the room layer.

use std::time::Duration;

/// Errors a [`RoomDirectory`](crate::RoomDirectory) operation can report.
///
/// None of these is fatal. The controller logs them and abandons the one
/// operation that failed; the next event re-attempts whatever is still
/// needed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The channel or member no longer exists. On delete and move this is
    /// the outcome the caller wanted anyway.
    #[error("not found: {0}")]
    NotFound(String),

    /// The bot lacks a permission for this specific operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The platform asked us to slow down. Retrying is the directory's
    /// job, not the controller's.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Network failure, platform 5xx, or a timed-out call.
    #[error("transient directory failure: {0}")]
    Transient(String),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
