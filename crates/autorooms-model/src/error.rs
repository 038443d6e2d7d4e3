//! Error types for the model layer.
//!
//! Each crate in Autorooms defines its own error enum. A `ModelError`
//! always means platform data could not be mapped onto the model, never
//! that a platform call failed.

/// Errors that can occur while building model values from raw platform data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A permission mask contained bits that no [`Permission`](crate::Permission)
    /// variant names.
    ///
    /// Masks are never truncated implicitly; callers that want to drop
    /// unknown bits use [`PermissionSet::from_bits_truncate`](crate::PermissionSet::from_bits_truncate).
    #[error("unknown permission bits: {0:#x}")]
    UnknownPermissionBits(u64),
}
