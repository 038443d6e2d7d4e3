//! Controller configuration and the cloned-room state machine.

use std::time::{Duration, SystemTime};

use autorooms_model::ChannelRef;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`LifecycleController`](crate::LifecycleController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Minimum age, in seconds, before an empty cloned room may be reaped.
    ///
    /// A voice event can carry a channel listing that predates the clone's
    /// first member; the grace period keeps us from deleting a room the
    /// actor is still being moved into.
    pub reap_grace_secs: u64,

    /// Upper bound on any single directory call. An elapsed call counts as
    /// a transient failure of that one operation.
    pub operation_timeout_secs: u64,

    /// Consult the spam guard before cloning a template.
    pub enforce_spam_guard: bool,

    /// Audit-log reason attached to reaping deletes.
    pub reap_reason: String,

    /// Audit-log reason attached to moving an actor into their new room.
    pub move_reason: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reap_grace_secs: 3,
            operation_timeout_secs: 10,
            enforce_spam_guard: true,
            reap_reason: "empty autoroom".to_string(),
            move_reason: "autoroom".to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn reap_grace(&self) -> Duration {
        Duration::from_secs(self.reap_grace_secs)
    }

    /// Never zero: a zero timeout would fail every call.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a cloned room.
///
/// ```text
/// Created ──→ Occupied ⇄ Empty ──(grace elapsed)──→ Deleted
/// ```
///
/// - **Created**: no members yet and younger than the grace period.
///   Protected from reaping.
/// - **Occupied**: at least one member connected.
/// - **Empty**: no members and at least the grace period old. Reapable.
/// - **Deleted**: the controller removed it.
///
/// Members joining and leaving drive `Occupied ⇄ Empty` from outside. The
/// only transition the controller makes itself is `Empty → Deleted`, and
/// only when some later event in the same guild triggers a reap pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Created,
    Occupied,
    Empty,
    Deleted,
}

impl RoomState {
    /// Classifies a channel snapshot as of `now`.
    ///
    /// A snapshot does not say whether the room was ever occupied, so an
    /// empty room younger than `grace` reads as `Created` either way.
    pub fn observe(channel: &ChannelRef, now: SystemTime, grace: Duration) -> Self {
        if !channel.is_empty() {
            Self::Occupied
        } else if channel.age(now) < grace {
            Self::Created
        } else {
            Self::Empty
        }
    }

    /// Returns `true` if a room in this state should be deleted.
    pub fn is_reapable(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Occupied => write!(f, "Occupied"),
            Self::Empty => write!(f, "Empty"),
            Self::Deleted => write!(f, "Deleted"),
        }
    }
}
