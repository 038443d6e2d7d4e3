//! Data model for Autorooms.
//!
//! This crate defines the platform-facing vocabulary the rest of the
//! workspace speaks:
//!
//! - **Types** ([`ChannelRef`], [`VoiceTransitionEvent`], the id newtypes):
//!   read-only snapshots of platform state handed to the controller.
//! - **Permissions** ([`Permission`], [`PermissionSet`],
//!   [`PermissionOverwrite`], [`Overwrites`]): named capability flags and
//!   per-subject tri-state overwrites.
//! - **Naming** ([`naming`]): the marker glyphs that classify template
//!   rooms and cloned rooms.
//!
//! # Architecture
//!
//! The model owns no state and performs no I/O. The platform adapter
//! (gateway connection, REST client) decodes its payloads into these types;
//! the room layer reads them and issues commands through its directory
//! trait.
//!
//! ```text
//! Platform adapter (decoded events) → Model (ChannelRef, events) → Room layer
//! ```

mod error;
pub mod naming;
mod permissions;
mod types;

pub use error::ModelError;
pub use naming::{clone_name, is_clone_name, is_template_name, CLONE_MARKER, TEMPLATE_MARKER};
pub use permissions::{
    OverwriteValue, Overwrites, Permission, PermissionOverwrite, PermissionSet, SubjectKey,
    SubjectKind, SubjectRef,
};
pub use types::{
    ActorId, ActorRef, ChannelId, ChannelKind, ChannelRef, GuildId, RoleId, VoiceTransitionEvent,
};
