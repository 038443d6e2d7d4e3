//! `AutoroomsService` builder and event loop.
//!
//! The service owns the controller and the directory, and turns a stream of
//! voice transitions into controller calls.

use std::sync::Arc;
use std::time::Duration;

use autorooms_guard::SpamGuard;
use autorooms_model::{ActorId, VoiceTransitionEvent};
use autorooms_room::{LifecycleController, RoomDirectory, TransitionReport};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::ServiceConfig;

/// Builder for an [`AutoroomsService`].
///
/// # Example
///
/// ```rust,ignore
/// use autorooms::prelude::*;
///
/// let service = AutoroomsServiceBuilder::new()
///     .config(ServiceConfig::from_json(&raw)?)
///     .build(http_directory, bot_user_id);
/// service.run(events).await;
/// ```
pub struct AutoroomsServiceBuilder {
    config: ServiceConfig,
}

impl AutoroomsServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Sets the service configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the service around `directory`. `own_id` is the bot's own
    /// member id on the platform.
    pub fn build<D: RoomDirectory>(self, directory: D, own_id: ActorId) -> AutoroomsService<D> {
        let sweep_interval = self.config.sweep_interval();
        let spam = SpamGuard::new(self.config.spam);
        let controller = LifecycleController::new(own_id, self.config.controller, spam);
        AutoroomsService {
            controller: Arc::new(controller),
            directory: Arc::new(directory),
            sweep_interval,
        }
    }
}

impl Default for AutoroomsServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the lifecycle controller over a stream of voice transitions.
pub struct AutoroomsService<D: RoomDirectory> {
    controller: Arc<LifecycleController>,
    directory: Arc<D>,
    sweep_interval: Duration,
}

impl<D: RoomDirectory> AutoroomsService<D> {
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Handles one event inline and returns what it caused.
    pub async fn handle(&self, event: &VoiceTransitionEvent) -> TransitionReport {
        self.controller
            .handle_voice_transition(self.directory.as_ref(), event)
            .await
    }

    /// Runs the event loop until `events` closes.
    ///
    /// Each event is handled in its own task, so a slow directory call in
    /// one guild never holds up another. Idle spam windows are evicted
    /// every `sweep_interval_secs`. Once the channel closes, in-flight
    /// events are allowed to finish before this returns.
    pub async fn run(&self, mut events: mpsc::Receiver<VoiceTransitionEvent>) {
        tracing::info!(own_id = %self.controller.own_id(), "autorooms service running");

        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        sweep.tick().await;

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                received = events.recv() => {
                    let Some(event) = received else {
                        break;
                    };
                    let controller = Arc::clone(&self.controller);
                    let directory = Arc::clone(&self.directory);
                    in_flight.spawn(async move {
                        controller
                            .handle_voice_transition(directory.as_ref(), &event)
                            .await
                    });
                }
                _ = sweep.tick() => {
                    let evicted = self.controller.sweep_spam_windows().await;
                    if evicted > 0 {
                        tracing::debug!(evicted, "evicted idle spam windows");
                    }
                }
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_finished(finished);
                }
            }
        }

        tracing::debug!(pending = in_flight.len(), "event stream closed, draining");
        while let Some(finished) = in_flight.join_next().await {
            log_finished(finished);
        }
        tracing::info!("autorooms service stopped");
    }
}

fn log_finished(finished: Result<TransitionReport, JoinError>) {
    match finished {
        Ok(report) if !report.is_empty() => {
            tracing::debug!(
                reaped = report.reaped.len(),
                clone = ?report.clone,
                "voice transition handled"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "event task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use autorooms_model::{ActorRef, ChannelId, GuildId, PermissionSet};
    use autorooms_room::{CloneOutcome, MemoryDirectory, NewVoiceChannel};

    use super::*;

    const BOT: ActorId = ActorId(77);

    #[test]
    fn test_builder_infers_directory_from_build() {
        let service = AutoroomsServiceBuilder::new().build(MemoryDirectory::new(), BOT);

        assert_eq!(service.controller().own_id(), BOT);
        assert_eq!(service.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builder_default_applies_config() {
        let config = ServiceConfig {
            sweep_interval_secs: 30,
            ..ServiceConfig::default()
        };

        let service = AutoroomsServiceBuilder::default()
            .config(config)
            .build(MemoryDirectory::new(), BOT);

        assert_eq!(service.sweep_interval, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_built_service_handles_template_join() {
        let dir = MemoryDirectory::new();
        dir.add_guild(GuildId(1), PermissionSet::AUTOROOM_CAPABILITY)
            .await;
        let template = dir
            .add_voice_channel(
                GuildId(1),
                NewVoiceChannel {
                    name: "\u{231B} Lobby".into(),
                    category_id: Some(ChannelId(3)),
                    bitrate: 64_000,
                    user_limit: 0,
                    overwrites: Default::default(),
                },
            )
            .await;
        let service = AutoroomsServiceBuilder::new().build(dir, BOT);
        let alice = ActorRef::new(ActorId(1), "alice");

        let event = service.directory().join(&alice, template.id).await.unwrap();
        let report = service.handle(&event).await;

        assert!(matches!(
            report.clone,
            Some(CloneOutcome::Created { moved: true, .. })
        ));
    }
}
