//! Anti-spam rate limiting for Autorooms.
//!
//! Creating a voice channel is an expensive, rate-limited platform call.
//! This crate decides whether an actor is asking for rooms too often:
//!
//! 1. **Recording**: every clone request appends a timestamp to the
//!    actor's [`SpamWindow`]
//! 2. **Checking**: [`SpamGuard`] evaluates each [`SpamThreshold`]
//!    against that window; any one exceeded marks the actor spammy
//! 3. **Pruning**: stamps older than the longest threshold window are
//!    dropped on every stamp, and idle actors are evicted periodically
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← consults the guard before cloning a template
//!     ↕
//! Guard Layer (this crate)  ← per-actor windows, volatile, in-memory
//!     ↕
//! Model Layer (below)  ← provides ActorId
//! ```
//!
//! All state is volatile. A restart resets every window, which at worst
//! relaxes rate limiting for one window length.

mod config;
mod guard;
mod window;

pub use config::{SpamConfig, SpamThreshold};
pub use guard::SpamGuard;
pub use window::SpamWindow;
