//! The `RoomDirectory` trait: everything the controller asks of the
//! platform.
//!
//! Autorooms doesn't talk to the platform itself. The gateway adapter that
//! owns the HTTP client, retries, and rate-limit buckets implements this
//! trait, and the controller only ever sees its results.

use std::future::Future;

use autorooms_model::{ActorId, ChannelId, ChannelRef, GuildId, Overwrites, PermissionSet};

use crate::DirectoryError;

/// Parameters for a voice channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVoiceChannel {
    pub name: String,
    pub category_id: Option<ChannelId>,
    pub bitrate: u32,
    pub user_limit: u32,
    pub overwrites: Overwrites,
}

/// Channel and member operations within the platform's guilds.
///
/// # Trait bounds
///
/// - `Send + Sync` → one directory is shared by every in-flight event task.
/// - `'static` → it lives as long as the service.
///
/// Every method returns a `Send` future so the service can spawn event
/// handling onto Tokio's multi-threaded runtime. Implementations can still
/// write plain `async fn`.
///
/// # Example
///
/// ```rust,ignore
/// use autorooms_room::{DirectoryError, NewVoiceChannel, RoomDirectory};
///
/// struct HttpDirectory { client: PlatformClient }
///
/// impl RoomDirectory for HttpDirectory {
///     async fn delete_channel(
///         &self,
///         channel: ChannelId,
///         reason: &str,
///     ) -> Result<(), DirectoryError> {
///         self.client.delete_channel(channel.0, reason).await.map_err(into_directory_error)
///     }
///     // ...
/// }
/// ```
pub trait RoomDirectory: Send + Sync + 'static {
    /// Lists every voice channel in `guild`, with current member counts.
    fn list_voice_channels(
        &self,
        guild: GuildId,
    ) -> impl Future<Output = Result<Vec<ChannelRef>, DirectoryError>> + Send;

    /// Creates a voice channel and returns its snapshot.
    ///
    /// # Errors
    /// [`DirectoryError::Forbidden`] on insufficient capability, or whatever
    /// the platform reports when it rejects the request.
    fn create_voice_channel(
        &self,
        guild: GuildId,
        channel: NewVoiceChannel,
    ) -> impl Future<Output = Result<ChannelRef, DirectoryError>> + Send;

    /// Deletes a channel, recording `reason` in the audit log.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] if the channel is already gone.
    fn delete_channel(
        &self,
        channel: ChannelId,
        reason: &str,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    /// Moves a connected member into `target`.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] if the member disconnected meanwhile or
    /// the target no longer exists.
    fn move_member(
        &self,
        actor: ActorId,
        target: ChannelId,
        reason: &str,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    /// Returns `true` if the bot holds every permission in `required`
    /// guild-wide.
    fn has_capability(
        &self,
        guild: GuildId,
        required: PermissionSet,
    ) -> impl Future<Output = Result<bool, DirectoryError>> + Send;
}
