//! Core platform types: identities, channel snapshots, and voice events.
//!
//! Everything here is a read-only snapshot. The platform owns the real
//! channels and members; the controller reads these values and answers by
//! issuing commands through its directory.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::naming::{is_clone_name, is_template_name};
use crate::Overwrites;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a member of a guild (a person or a bot).
///
/// Newtype over the platform's `u64` snowflake, so an `ActorId` can never
/// be passed where a `ChannelId` is expected. Serialized as the bare
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a channel. Categories are channels too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A unique identifier for a guild (a server on the platform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ActorRef
// ---------------------------------------------------------------------------

/// The member whose voice state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: ActorId,
    /// Only used for log output.
    pub display_name: String,
}

impl ActorRef {
    pub fn new(id: ActorId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelRef
// ---------------------------------------------------------------------------

/// The flavor of an audio channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelKind {
    #[default]
    Voice,
    /// Stage channels carry voice state too but are never cloned.
    Stage,
}

/// A snapshot of a voice channel as the platform last reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
    pub guild_id: GuildId,
    /// The parent category, if the channel sits inside one.
    pub category_id: Option<ChannelId>,
    pub kind: ChannelKind,
    /// Audio bitrate in bits per second.
    pub bitrate: u32,
    /// Maximum concurrent members; 0 means unlimited.
    pub user_limit: u32,
    pub created_at: SystemTime,
    pub overwrites: Overwrites,
    /// Members connected at the time of the snapshot.
    pub member_count: usize,
}

impl ChannelRef {
    /// Returns `true` for voice channels named with the template marker.
    pub fn is_template(&self) -> bool {
        self.kind == ChannelKind::Voice && is_template_name(&self.name)
    }

    /// Returns `true` for channels named with the clone marker.
    pub fn is_clone(&self) -> bool {
        is_clone_name(&self.name)
    }

    pub fn is_empty(&self) -> bool {
        self.member_count == 0
    }

    /// Time elapsed since creation. A `created_at` in the future (clock
    /// skew between us and the platform) counts as age zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// VoiceTransitionEvent
// ---------------------------------------------------------------------------

/// A member's voice state changed.
///
/// ```text
/// previous: None,    next: Some(b)  → joined b
/// previous: Some(a), next: None     → left a
/// previous: Some(a), next: Some(b)  → moved from a to b
/// previous: Some(a), next: Some(a)  → mute/deafen update, nothing to do
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTransitionEvent {
    pub actor: ActorRef,
    pub previous: Option<ChannelRef>,
    pub next: Option<ChannelRef>,
}

impl VoiceTransitionEvent {
    /// Returns `true` if the actor stayed in the same channel.
    pub fn is_noop(&self) -> bool {
        matches!(
            (&self.previous, &self.next),
            (Some(before), Some(after)) if before.id == after.id
        )
    }

    /// The channel the actor vacated, if any.
    pub fn left(&self) -> Option<&ChannelRef> {
        self.previous.as_ref()
    }

    /// The channel the actor entered, if any.
    pub fn entered(&self) -> Option<&ChannelRef> {
        self.next.as_ref()
    }
}
