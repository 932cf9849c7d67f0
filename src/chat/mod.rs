//! Outbound messages to text channels.

pub mod discord;

use async_trait::async_trait;

pub use discord::DiscordChat;
use crate::common::{
    errors::RadioResult,
    types::{ChannelId, MessageRef, UserId},
};

/// Contents of the "Now Playing" card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCard {
    pub stream_name: String,
    pub source_url: String,
    pub requester: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    NowPlaying(StatusCard),
    /// What a status card becomes once it no longer reflects live playback.
    Retired,
}

#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn send(&self, channel_id: ChannelId, message: Outgoing) -> RadioResult<MessageRef>;
    async fn edit(&self, message: &MessageRef, content: Outgoing) -> RadioResult<()>;
    async fn delete(&self, message: &MessageRef) -> RadioResult<()>;
    async fn react(&self, message: &MessageRef, glyph: &str) -> RadioResult<()>;
}
