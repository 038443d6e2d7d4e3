//! The lifecycle controller: reaps empty cloned rooms and clones templates.
//!
//! The controller is a stateless handler apart from its spam guard. Every
//! call receives the directory and the event explicitly, so events from
//! different guilds can be handled concurrently without sharing anything
//! but the guard's per-actor windows.

use std::future::Future;
use std::time::SystemTime;

use autorooms_guard::SpamGuard;
use autorooms_model::{
    clone_name, ActorId, ActorRef, ChannelId, ChannelRef, GuildId, Overwrites, PermissionSet,
    VoiceTransitionEvent,
};
use tokio::sync::Mutex;

use crate::{ControllerConfig, DirectoryError, NewVoiceChannel, RoomDirectory, RoomState};

/// What happened to a clone request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    /// A room was created. `moved` is `false` if moving the actor into it
    /// failed; the empty room is left for a later reap pass.
    Created { channel: ChannelId, moved: bool },
    /// The actor is spammy; nothing was created.
    Throttled,
    /// Creating the room failed.
    Failed,
}

/// Everything one voice transition caused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionReport {
    /// Cloned rooms deleted by the reap pass.
    pub reaped: Vec<ChannelId>,
    /// Set if the actor entered a template room and the bot could act.
    pub clone: Option<CloneOutcome>,
}

impl TransitionReport {
    /// Returns `true` if the event caused no action at all.
    pub fn is_empty(&self) -> bool {
        self.reaped.is_empty() && self.clone.is_none()
    }
}

/// A freshly cloned room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRoom {
    pub channel: ChannelRef,
    /// Whether the actor ended up inside it.
    pub moved: bool,
}

/// Decides, per voice transition, which rooms to reap and which to clone.
pub struct LifecycleController {
    /// The bot's own member id, granted elevated overwrites on every clone.
    own_id: ActorId,
    config: ControllerConfig,
    /// Locked only around a single guard call, never across a directory
    /// request.
    spam: Mutex<SpamGuard>,
}

impl LifecycleController {
    pub fn new(own_id: ActorId, config: ControllerConfig, spam: SpamGuard) -> Self {
        Self {
            own_id,
            config,
            spam: Mutex::new(spam),
        }
    }

    pub fn own_id(&self) -> ActorId {
        self.own_id
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Handles one voice transition against the wall clock.
    pub async fn handle_voice_transition<D: RoomDirectory>(
        &self,
        directory: &D,
        event: &VoiceTransitionEvent,
    ) -> TransitionReport {
        self.handle_voice_transition_at(directory, event, SystemTime::now())
            .await
    }

    /// Handles one voice transition as of `now`.
    ///
    /// 1. Same channel before and after → nothing to do.
    /// 2. Actor left a channel → reap pass over that guild.
    /// 3. Actor entered a template room → clone it for them.
    ///
    /// Never fails: every directory error is logged and absorbed here.
    pub async fn handle_voice_transition_at<D: RoomDirectory>(
        &self,
        directory: &D,
        event: &VoiceTransitionEvent,
        now: SystemTime,
    ) -> TransitionReport {
        let mut report = TransitionReport::default();

        if event.is_noop() {
            tracing::trace!(actor_id = %event.actor.id, "voice state update within one channel");
            return report;
        }

        if let Some(left) = event.left() {
            report.reaped = self.reap_empty_rooms_at(directory, left.guild_id, now).await;
        }

        if let Some(entered) = event.entered() {
            if entered.is_template() && self.has_capability(directory, entered.guild_id).await {
                report.clone = Some(self.clone_for(directory, &event.actor, entered).await);
            }
        }

        report
    }

    /// Runs a reap pass over `guild` against the wall clock.
    pub async fn reap_empty_rooms<D: RoomDirectory>(
        &self,
        directory: &D,
        guild: GuildId,
    ) -> Vec<ChannelId> {
        self.reap_empty_rooms_at(directory, guild, SystemTime::now())
            .await
    }

    /// Deletes every cloned room in `guild` that is empty and at least the
    /// grace period old as of `now`. Returns the ids actually deleted.
    ///
    /// Without the capability the pass is skipped silently. Each deletion
    /// is independent: a failure is logged and the pass moves on.
    pub async fn reap_empty_rooms_at<D: RoomDirectory>(
        &self,
        directory: &D,
        guild: GuildId,
        now: SystemTime,
    ) -> Vec<ChannelId> {
        if !self.has_capability(directory, guild).await {
            return Vec::new();
        }

        let channels = match self
            .call("list_voice_channels", directory.list_voice_channels(guild))
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                tracing::warn!(%guild, error = %e, "could not list voice channels, skipping reap");
                return Vec::new();
            }
        };

        let grace = self.config.reap_grace();
        let mut reaped = Vec::new();

        for channel in channels.iter().filter(|c| c.is_clone()) {
            let state = RoomState::observe(channel, now, grace);
            if !state.is_reapable() {
                continue;
            }

            let result = self
                .call(
                    "delete_channel",
                    directory.delete_channel(channel.id, &self.config.reap_reason),
                )
                .await;

            match result {
                Ok(()) => {
                    tracing::info!(
                        %guild,
                        channel_id = %channel.id,
                        name = %channel.name,
                        from = %state,
                        to = %RoomState::Deleted,
                        "reaped empty autoroom"
                    );
                    reaped.push(channel.id);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(%guild, channel_id = %channel.id, "autoroom already deleted");
                }
                Err(e) => {
                    tracing::warn!(
                        %guild,
                        channel_id = %channel.id,
                        error = %e,
                        "failed to reap autoroom"
                    );
                }
            }
        }

        reaped
    }

    /// Builds the overwrites for a clone of `template` owned by `actor`.
    ///
    /// Starts from a copy of the template's overwrites, then grants
    /// [`PermissionSet::ROOM_OWNER`] to the bot and to the actor. Existing
    /// entries are merged, so any other flags on them survive.
    pub fn autoroom_overwrites(&self, actor: ActorId, template: &ChannelRef) -> Overwrites {
        let mut overwrites = template.overwrites.clone();
        for subject in [self.own_id, actor] {
            overwrites.elevate(subject, PermissionSet::ROOM_OWNER);
        }
        overwrites
    }

    /// Clones `template` for `actor` and moves them into the new room.
    ///
    /// The clone lives in the template's category and inherits its bitrate
    /// and user limit. No spam check happens here; see
    /// [`handle_voice_transition`](Self::handle_voice_transition).
    ///
    /// # Errors
    /// Returns the directory error if the room could not be created. A
    /// failed move is not an error: the result reports `moved: false` and
    /// the orphaned room is reaped once its grace period has passed.
    pub async fn make_auto_room<D: RoomDirectory>(
        &self,
        directory: &D,
        actor: &ActorRef,
        template: &ChannelRef,
    ) -> Result<AutoRoom, DirectoryError> {
        let request = NewVoiceChannel {
            name: clone_name(&template.name),
            category_id: template.category_id,
            bitrate: template.bitrate,
            user_limit: template.user_limit,
            overwrites: self.autoroom_overwrites(actor.id, template),
        };

        let channel = self
            .call(
                "create_voice_channel",
                directory.create_voice_channel(template.guild_id, request),
            )
            .await?;

        tracing::info!(
            guild = %template.guild_id,
            template_id = %template.id,
            channel_id = %channel.id,
            actor_id = %actor.id,
            actor = %actor.display_name,
            name = %channel.name,
            "autoroom created"
        );

        let moved = match self
            .call(
                "move_member",
                directory.move_member(actor.id, channel.id, &self.config.move_reason),
            )
            .await
        {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                tracing::debug!(
                    actor_id = %actor.id,
                    channel_id = %channel.id,
                    "actor left before being moved into autoroom"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    actor_id = %actor.id,
                    channel_id = %channel.id,
                    error = %e,
                    "failed to move actor into autoroom"
                );
                false
            }
        };

        Ok(AutoRoom { channel, moved })
    }

    /// Evicts spam windows with no recent activity. Returns how many.
    pub async fn sweep_spam_windows(&self) -> usize {
        self.spam.lock().await.evict_idle()
    }

    /// Spam check, then clone. Errors end here as a `Failed` outcome.
    async fn clone_for<D: RoomDirectory>(
        &self,
        directory: &D,
        actor: &ActorRef,
        template: &ChannelRef,
    ) -> CloneOutcome {
        let throttled = self.config.enforce_spam_guard
            && self.spam.lock().await.record_and_check(actor.id);
        if throttled {
            tracing::info!(
                guild = %template.guild_id,
                actor_id = %actor.id,
                actor = %actor.display_name,
                "clone request dropped, actor is spammy"
            );
            return CloneOutcome::Throttled;
        }

        match self.make_auto_room(directory, actor, template).await {
            Ok(room) => CloneOutcome::Created {
                channel: room.channel.id,
                moved: room.moved,
            },
            Err(e) => {
                tracing::warn!(
                    guild = %template.guild_id,
                    template_id = %template.id,
                    actor_id = %actor.id,
                    error = %e,
                    "failed to create autoroom"
                );
                CloneOutcome::Failed
            }
        }
    }

    /// Whether the bot may reap and clone in `guild`. Errors count as no.
    async fn has_capability<D: RoomDirectory>(&self, directory: &D, guild: GuildId) -> bool {
        let result = self
            .call(
                "has_capability",
                directory.has_capability(guild, PermissionSet::AUTOROOM_CAPABILITY),
            )
            .await;
        match result {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(%guild, "missing autoroom capability, skipping");
                false
            }
            Err(e) => {
                tracing::warn!(%guild, error = %e, "capability check failed, skipping");
                false
            }
        }
    }

    /// Runs one directory call under the configured timeout. An elapsed
    /// timeout becomes [`DirectoryError::Transient`].
    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, DirectoryError>>,
    ) -> Result<T, DirectoryError> {
        let timeout = self.config.operation_timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Transient(format!(
                "{operation} timed out after {timeout:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use autorooms_guard::SpamConfig;
    use autorooms_model::{
        ChannelKind, OverwriteValue, Permission, PermissionOverwrite, RoleId, SubjectKind,
        SubjectRef,
    };

    use super::*;

    const BOT: ActorId = ActorId(1000);

    fn controller() -> LifecycleController {
        LifecycleController::new(BOT, ControllerConfig::default(), SpamGuard::new(SpamConfig::default()))
    }

    fn template(overwrites: Overwrites) -> ChannelRef {
        ChannelRef {
            id: ChannelId(10),
            name: "\u{231B} General".into(),
            guild_id: GuildId(1),
            category_id: Some(ChannelId(5)),
            kind: ChannelKind::Voice,
            bitrate: 96_000,
            user_limit: 4,
            created_at: SystemTime::UNIX_EPOCH,
            overwrites,
            member_count: 1,
        }
    }

    #[test]
    fn test_autoroom_overwrites_grants_bot_and_actor() {
        let ctl = controller();
        let overwrites = ctl.autoroom_overwrites(ActorId(7), &template(Overwrites::new()));

        assert_eq!(overwrites.len(), 2);
        for subject in [BOT, ActorId(7)] {
            let ow = overwrites.get(subject).expect("entry present");
            assert_eq!(*ow, PermissionOverwrite::allowing(PermissionSet::ROOM_OWNER));
        }
    }

    #[test]
    fn test_autoroom_overwrites_merges_existing_bot_entry() {
        let mut existing = Overwrites::new();
        existing.insert(
            BOT,
            PermissionOverwrite::new()
                .with(Permission::Connect, OverwriteValue::Deny)
                .with(Permission::Speak, OverwriteValue::Deny)
                .with(Permission::PrioritySpeaker, OverwriteValue::Allow),
        );
        let ctl = controller();

        let overwrites = ctl.autoroom_overwrites(ActorId(7), &template(existing));

        let ow = overwrites.get(BOT).unwrap();
        assert_eq!(ow.get(Permission::Connect), OverwriteValue::Allow);
        assert_eq!(ow.get(Permission::ManageChannels), OverwriteValue::Allow);
        assert_eq!(ow.get(Permission::ManageRoles), OverwriteValue::Allow);
        assert_eq!(ow.get(Permission::Speak), OverwriteValue::Deny);
        assert_eq!(ow.get(Permission::PrioritySpeaker), OverwriteValue::Allow);
    }

    #[test]
    fn test_autoroom_overwrites_matches_reference_form_of_actor() {
        let mut existing = Overwrites::new();
        let reference = SubjectRef::Reference {
            kind: SubjectKind::Member,
            id: 7,
        };
        existing.insert(
            &reference,
            PermissionOverwrite::new().with(Permission::Stream, OverwriteValue::Deny),
        );
        let ctl = controller();

        let overwrites = ctl.autoroom_overwrites(ActorId(7), &template(existing));

        assert_eq!(overwrites.len(), 2, "bot + actor, no duplicate actor entry");
        let ow = overwrites.get(ActorId(7)).unwrap();
        assert_eq!(ow.get(Permission::Stream), OverwriteValue::Deny);
        assert_eq!(ow.get(Permission::Connect), OverwriteValue::Allow);
    }

    #[test]
    fn test_autoroom_overwrites_keeps_role_entries_and_template_untouched() {
        let mut existing = Overwrites::new();
        existing.insert(
            RoleId(1),
            PermissionOverwrite::new().with(Permission::Connect, OverwriteValue::Deny),
        );
        let tpl = template(existing);
        let ctl = controller();

        let overwrites = ctl.autoroom_overwrites(ActorId(7), &tpl);

        assert_eq!(
            overwrites.get(RoleId(1)).unwrap().get(Permission::Connect),
            OverwriteValue::Deny
        );
        assert_eq!(tpl.overwrites.len(), 1, "template copy is deep");
    }

    #[test]
    fn test_transition_report_is_empty() {
        assert!(TransitionReport::default().is_empty());
        let report = TransitionReport {
            reaped: vec![],
            clone: Some(CloneOutcome::Throttled),
        };
        assert!(!report.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_times_out_as_transient() {
        let ctl = controller();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), DirectoryError>(())
        };

        let result = ctl.call("slow_op", slow).await;

        assert!(matches!(result, Err(DirectoryError::Transient(msg)) if msg.contains("slow_op")));
    }
}
