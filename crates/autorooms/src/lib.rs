//! # Autorooms
//!
//! Temporary voice rooms on demand.
//!
//! Members join a *template* room (its name starts with `⌛`) and are moved
//! into a fresh clone of it (`♻: ...`) that they co-own. Clones are deleted
//! once empty. A per-member spam guard keeps anyone from spawning rooms in
//! a loop.
//!
//! The platform itself stays outside: an adapter decodes gateway events
//! into [`VoiceTransitionEvent`](autorooms_model::VoiceTransitionEvent)s and
//! implements [`RoomDirectory`](autorooms_room::RoomDirectory).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autorooms::prelude::*;
//!
//! # async fn start(directory: MemoryDirectory) -> Result<(), AutoroomsError> {
//! let config = ServiceConfig::from_json(r#"{ "log": { "filter": "autorooms=debug" } }"#)?;
//! init_tracing(&config.log)?;
//!
//! let (events, rx) = tokio::sync::mpsc::channel(256);
//! let service = AutoroomsServiceBuilder::new()
//!     .config(config)
//!     .build(directory, ActorId(42));
//! // hand `events` to the gateway adapter, then:
//! service.run(rx).await;
//! # drop(events);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod invite;
mod service;
mod telemetry;

pub use config::{LogConfig, ServiceConfig};
pub use error::AutoroomsError;
pub use invite::{invite_link, INVITE_BASE_URL};
pub use service::{AutoroomsService, AutoroomsServiceBuilder};
pub use telemetry::init_tracing;

pub mod prelude {
    pub use crate::{
        init_tracing, invite_link, AutoroomsError, AutoroomsService, AutoroomsServiceBuilder,
        LogConfig, ServiceConfig,
    };
    pub use autorooms_guard::{SpamConfig, SpamGuard, SpamThreshold};
    pub use autorooms_model::{
        ActorId, ActorRef, ChannelId, ChannelKind, ChannelRef, GuildId, Overwrites, Permission,
        PermissionSet, VoiceTransitionEvent,
    };
    pub use autorooms_room::{
        CloneOutcome, ControllerConfig, DirectoryError, LifecycleController, MemoryDirectory,
        NewVoiceChannel, RoomDirectory, TransitionReport,
    };
}
