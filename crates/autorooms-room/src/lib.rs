//! Autoroom lifecycle management.
//!
//! The controller reacts to voice transitions: it reaps empty cloned rooms
//! in the guild an actor just left, and clones a template room when an
//! actor joins one. All platform access goes through the
//! [`RoomDirectory`] trait.
//!
//! # Key types
//!
//! - [`LifecycleController`]: decides what to reap and what to clone
//! - [`RoomDirectory`]: the platform operations the controller needs
//! - [`RoomState`]: lifecycle of a cloned room
//! - [`ControllerConfig`]: grace period, timeouts, audit reasons
//! - [`MemoryDirectory`]: an in-memory directory for simulations and tests

mod config;
mod controller;
mod directory;
mod error;
mod memory;

pub use config::{ControllerConfig, RoomState};
pub use controller::{AutoRoom, CloneOutcome, LifecycleController, TransitionReport};
pub use directory::{NewVoiceChannel, RoomDirectory};
pub use error::DirectoryError;
pub use memory::{DirectoryCall, DirectoryOp, MemoryDirectory};
