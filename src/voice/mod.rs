//! The voice side of a session: one connection per guild and at most one
//! track playing on it.

pub mod songbird;

use std::time::Duration;

use async_trait::async_trait;

pub use self::songbird::SongbirdTransport;
use crate::{
    common::{
        errors::{RadioResult, VoiceJoinError},
        types::{ChannelId, GuildId},
    },
    player::events::StreamTicket,
};

#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Connects to `channel_id`, or moves an existing connection there.
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceJoinError>;

    /// Disconnects. Safe to call when not connected.
    async fn leave(&self, guild_id: GuildId);

    /// Replaces whatever is playing with `url`. Progress is reported later
    /// as `SessionEvent::Stream` tagged with `ticket`.
    async fn play(&self, ticket: StreamTicket, url: &str) -> RadioResult<()>;

    async fn stop(&self, guild_id: GuildId);

    /// Playback position of the current track, `None` when there is none.
    async fn position(&self, guild_id: GuildId) -> Option<Duration>;

    async fn is_connected(&self, guild_id: GuildId) -> bool;
}
