//! An in-memory [`RoomDirectory`] for simulations and tests.
//!
//! `MemoryDirectory` models just enough of the platform to exercise the
//! controller end to end: guilds with a bot capability mask, voice
//! channels, which member sits in which channel, and an audit trail of
//! every mutating call. Failures can be injected per operation.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{Duration, SystemTime};

use autorooms_model::{
    ActorId, ActorRef, ChannelId, ChannelKind, ChannelRef, GuildId, PermissionSet,
    VoiceTransitionEvent,
};
use tokio::sync::Mutex;

use crate::{DirectoryError, NewVoiceChannel, RoomDirectory};

/// Which directory operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    List,
    Create,
    Delete,
    Move,
    Capability,
}

/// A mutating call that reached the directory, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Create { guild: GuildId, name: String },
    Delete { channel: ChannelId, reason: String },
    Move { actor: ActorId, channel: ChannelId, reason: String },
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    capabilities: HashMap<GuildId, PermissionSet>,
    channels: BTreeMap<ChannelId, ChannelRef>,
    locations: HashMap<ActorId, ChannelId>,
    failures: HashMap<DirectoryOp, VecDeque<DirectoryError>>,
    calls: Vec<DirectoryCall>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> ChannelId {
        self.next_id += 1;
        ChannelId(self.next_id)
    }

    fn take_failure(&mut self, op: DirectoryOp) -> Result<(), DirectoryError> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// A channel as the platform would report it right now.
    fn snapshot(&self, id: ChannelId) -> Option<ChannelRef> {
        let mut channel = self.channels.get(&id)?.clone();
        channel.member_count = self.locations.values().filter(|c| **c == id).count();
        Some(channel)
    }

    fn guild_snapshots(&self, guild: GuildId) -> Vec<ChannelRef> {
        self.channels
            .values()
            .filter(|c| c.guild_id == guild)
            .filter_map(|c| self.snapshot(c.id))
            .collect()
    }

    /// Moves `actor` to `next` (or disconnects them) and returns the event
    /// the platform would emit.
    fn relocate(&mut self, actor: &ActorRef, next: Option<ChannelId>) -> VoiceTransitionEvent {
        let previous = match next {
            Some(target) => self.locations.insert(actor.id, target),
            None => self.locations.remove(&actor.id),
        };
        VoiceTransitionEvent {
            actor: actor.clone(),
            previous: previous.and_then(|id| self.snapshot(id)),
            next: next.and_then(|id| self.snapshot(id)),
        }
    }
}

/// An in-memory platform.
#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a guild in which the bot holds `capabilities`.
    pub async fn add_guild(&self, guild: GuildId, capabilities: PermissionSet) {
        self.state.lock().await.capabilities.insert(guild, capabilities);
    }

    /// Adds a voice channel created now and returns its snapshot.
    pub async fn add_voice_channel(&self, guild: GuildId, request: NewVoiceChannel) -> ChannelRef {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        let channel = ChannelRef {
            id,
            name: request.name,
            guild_id: guild,
            category_id: request.category_id,
            kind: ChannelKind::Voice,
            bitrate: request.bitrate,
            user_limit: request.user_limit,
            created_at: SystemTime::now(),
            overwrites: request.overwrites,
            member_count: 0,
        };
        state.channels.insert(id, channel.clone());
        channel
    }

    /// Inserts a fully specified channel. Its `member_count` is ignored;
    /// counts always come from member locations.
    pub async fn insert_channel(&self, channel: ChannelRef) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(channel.id.0);
        state.channels.insert(channel.id, channel);
    }

    /// Shifts a channel's creation time into the past, saturating at the
    /// Unix epoch.
    pub async fn backdate(&self, channel: ChannelId, by: Duration) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.channels.get_mut(&channel) {
            entry.created_at = entry
                .created_at
                .checked_sub(by)
                .unwrap_or(SystemTime::UNIX_EPOCH);
        }
    }

    /// Connects `actor` to `channel` (joining or switching) and returns the
    /// resulting event.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] if the channel does not exist.
    pub async fn join(
        &self,
        actor: &ActorRef,
        channel: ChannelId,
    ) -> Result<VoiceTransitionEvent, DirectoryError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(&channel) {
            return Err(DirectoryError::NotFound(format!("channel {channel}")));
        }
        Ok(state.relocate(actor, Some(channel)))
    }

    /// Disconnects `actor` from voice. Returns `None` if they were not
    /// connected.
    pub async fn leave(&self, actor: &ActorRef) -> Option<VoiceTransitionEvent> {
        let mut state = self.state.lock().await;
        if !state.locations.contains_key(&actor.id) {
            return None;
        }
        Some(state.relocate(actor, None))
    }

    /// Makes the next `op` call fail with `error`. Queued failures are
    /// consumed in order, one per call.
    pub async fn fail_next(&self, op: DirectoryOp, error: DirectoryError) {
        self.state
            .lock()
            .await
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    pub async fn channel(&self, id: ChannelId) -> Option<ChannelRef> {
        self.state.lock().await.snapshot(id)
    }

    pub async fn channels(&self, guild: GuildId) -> Vec<ChannelRef> {
        self.state.lock().await.guild_snapshots(guild)
    }

    /// The channel `actor` is connected to, if any.
    pub async fn location(&self, actor: ActorId) -> Option<ChannelId> {
        self.state.lock().await.locations.get(&actor).copied()
    }

    /// Every mutating call so far, oldest first.
    pub async fn calls(&self) -> Vec<DirectoryCall> {
        self.state.lock().await.calls.clone()
    }
}

impl RoomDirectory for MemoryDirectory {
    async fn list_voice_channels(&self, guild: GuildId) -> Result<Vec<ChannelRef>, DirectoryError> {
        let mut state = self.state.lock().await;
        state.take_failure(DirectoryOp::List)?;
        Ok(state.guild_snapshots(guild))
    }

    async fn create_voice_channel(
        &self,
        guild: GuildId,
        channel: NewVoiceChannel,
    ) -> Result<ChannelRef, DirectoryError> {
        let mut state = self.state.lock().await;
        state.take_failure(DirectoryOp::Create)?;
        if !state.capabilities.contains_key(&guild) {
            return Err(DirectoryError::NotFound(format!("guild {guild}")));
        }
        state.calls.push(DirectoryCall::Create {
            guild,
            name: channel.name.clone(),
        });

        let id = state.allocate_id();
        let created = ChannelRef {
            id,
            name: channel.name,
            guild_id: guild,
            category_id: channel.category_id,
            kind: ChannelKind::Voice,
            bitrate: channel.bitrate,
            user_limit: channel.user_limit,
            created_at: SystemTime::now(),
            overwrites: channel.overwrites,
            member_count: 0,
        };
        state.channels.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_channel(&self, channel: ChannelId, reason: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().await;
        state.take_failure(DirectoryOp::Delete)?;
        if state.channels.remove(&channel).is_none() {
            return Err(DirectoryError::NotFound(format!("channel {channel}")));
        }
        state.locations.retain(|_, location| *location != channel);
        state.calls.push(DirectoryCall::Delete {
            channel,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn move_member(
        &self,
        actor: ActorId,
        target: ChannelId,
        reason: &str,
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().await;
        state.take_failure(DirectoryOp::Move)?;
        if !state.locations.contains_key(&actor) {
            return Err(DirectoryError::NotFound(format!("member {actor} is not connected")));
        }
        if !state.channels.contains_key(&target) {
            return Err(DirectoryError::NotFound(format!("channel {target}")));
        }
        state.locations.insert(actor, target);
        state.calls.push(DirectoryCall::Move {
            actor,
            channel: target,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn has_capability(
        &self,
        guild: GuildId,
        required: PermissionSet,
    ) -> Result<bool, DirectoryError> {
        let mut state = self.state.lock().await;
        state.take_failure(DirectoryOp::Capability)?;
        Ok(state
            .capabilities
            .get(&guild)
            .is_some_and(|held| held.contains_all(required)))
    }
}
