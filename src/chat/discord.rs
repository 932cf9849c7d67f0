use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelId as DiscordChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage,
    Http, MessageId as DiscordMessageId, ReactionType, Timestamp,
};

use super::{ChatSurface, Outgoing, StatusCard};
use crate::common::{
    errors::{RadioError, RadioResult},
    types::{ChannelId, MessageId, MessageRef},
};

const NOW_PLAYING_COLOUR: u32 = 0x1DB954;
const RETIRED_COLOUR: u32 = 0x747F8D;

/// Posts through serenity's REST client.
pub struct DiscordChat {
    http: Arc<Http>,
}

impl DiscordChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

pub(crate) fn now_playing_embed(card: &StatusCard) -> CreateEmbed {
    let requester = card
        .requester
        .map(|user| format!("<@{}>", user))
        .unwrap_or_else(|| "Unknown".to_string());

    CreateEmbed::new()
        .title("\u{25B6}\u{FE0F} Now Playing")
        .description(format!("Streaming from `{}`", card.source_url))
        .color(NOW_PLAYING_COLOUR)
        .field("Stream", format!("`{}`", card.stream_name), false)
        .field("Requested By", requester, false)
        .field("Playback Position", "\u{1F535} **LIVE**", false)
        .footer(CreateEmbedFooter::new("Airwave Radio"))
        .timestamp(Timestamp::now())
}

fn retired_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("\u{23F9}\u{FE0F} Stream ended")
        .color(RETIRED_COLOUR)
}

fn create_message(message: Outgoing) -> CreateMessage {
    match message {
        Outgoing::Text(text) => CreateMessage::new().content(text),
        Outgoing::NowPlaying(card) => CreateMessage::new().embed(now_playing_embed(&card)),
        Outgoing::Retired => CreateMessage::new().embed(retired_embed()),
    }
}

fn edit_message(content: Outgoing) -> EditMessage {
    match content {
        Outgoing::Text(text) => EditMessage::new().content(text).embeds(Vec::new()),
        Outgoing::NowPlaying(card) => EditMessage::new().content("").embed(now_playing_embed(&card)),
        Outgoing::Retired => EditMessage::new().content("").embed(retired_embed()),
    }
}

fn channel(id: ChannelId) -> DiscordChannelId {
    DiscordChannelId::new(id.get())
}

fn message_id(id: MessageId) -> DiscordMessageId {
    DiscordMessageId::new(id.get())
}

fn chat_error(err: serenity::Error) -> RadioError {
    RadioError::Chat(err.to_string())
}

#[async_trait]
impl ChatSurface for DiscordChat {
    async fn send(&self, channel_id: ChannelId, message: Outgoing) -> RadioResult<MessageRef> {
        let sent = channel(channel_id)
            .send_message(&self.http, create_message(message))
            .await
            .map_err(chat_error)?;
        Ok(MessageRef::new(channel_id, MessageId(sent.id.get())))
    }

    async fn edit(&self, message: &MessageRef, content: Outgoing) -> RadioResult<()> {
        channel(message.channel_id)
            .edit_message(&self.http, message_id(message.message_id), edit_message(content))
            .await
            .map(|_| ())
            .map_err(chat_error)
    }

    async fn delete(&self, message: &MessageRef) -> RadioResult<()> {
        channel(message.channel_id)
            .delete_message(&self.http, message_id(message.message_id))
            .await
            .map_err(chat_error)
    }

    async fn react(&self, message: &MessageRef, glyph: &str) -> RadioResult<()> {
        channel(message.channel_id)
            .create_reaction(
                &self.http,
                message_id(message.message_id),
                ReactionType::Unicode(glyph.to_string()),
            )
            .await
            .map_err(chat_error)
    }
}
