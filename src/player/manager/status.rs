use tracing::{debug, warn};

use super::{STOP_GLYPH, SessionManager};
use crate::{
    chat::{Outgoing, StatusCard},
    common::types::{GuildId, MessageRef},
    player::{events::StreamTicket, state::SessionState},
};

impl SessionManager {
    /// Posts a fresh "Now Playing" card for the attempt behind `ticket`
    /// and retires whichever card it replaces.
    pub(super) async fn post_status(&self, ticket: StreamTicket) {
        let guild_id = ticket.guild_id;
        let card = self
            .registry
            .with_current(guild_id, ticket.generation, |s| {
                if s.state != SessionState::Playing {
                    return None;
                }
                let stream = s.current_stream.as_ref()?;
                let card = StatusCard {
                    stream_name: stream.display_name.clone(),
                    source_url: stream.resolved_url.clone(),
                    requester: s.requester,
                };
                Some((s.text_channel?, card))
            })
            .flatten();

        let Some((channel_id, card)) = card else {
            return;
        };

        let message = match self.chat.send(channel_id, Outgoing::NowPlaying(card)).await {
            Ok(message) => message,
            Err(err) => {
                warn!("[{}] Could not post status card: {}", guild_id, err);
                return;
            }
        };

        let replaced = self
            .registry
            .with_current(guild_id, ticket.generation, |s| {
                (s.state == SessionState::Playing).then(|| s.status_message.replace(message))
            })
            .flatten();

        match replaced {
            None => {
                debug!("[{}] Status card {} outlived its attempt", guild_id, message);
                self.retire_status(guild_id, &message).await;
                return;
            }
            Some(Some(old)) => self.retire_status(guild_id, &old).await,
            Some(None) => {}
        }

        if let Err(err) = self.chat.react(&message, STOP_GLYPH).await {
            warn!("[{}] Could not add stop reaction: {}", guild_id, err);
        }
    }

    /// Deletes a status card, or blanks it out when deletion is refused.
    pub(super) async fn retire_status(&self, guild_id: GuildId, message: &MessageRef) {
        let Err(err) = self.chat.delete(message).await else {
            debug!("[{}] Deleted status card {}", guild_id, message);
            return;
        };

        debug!("[{}] Could not delete {} ({}), editing instead", guild_id, message, err);
        if let Err(err) = self.chat.edit(message, Outgoing::Retired).await {
            warn!("[{}] Could not retire status card {}: {}", guild_id, message, err);
        }
    }
}
