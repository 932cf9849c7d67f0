//! Production transport on top of songbird. Audio is pulled over HTTP by
//! songbird's `HttpRequest` input and decoded by symphonia.

use std::{num::NonZeroU64, sync::Arc, time::Duration};

use async_trait::async_trait;
use dashmap::DashMap;
use songbird::{
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
    error::JoinError,
    input::HttpRequest,
    tracks::{PlayMode, TrackHandle},
};
use tracing::{debug, warn};

use super::VoiceTransport;
use crate::{
    common::{
        errors::{RadioError, RadioResult, VoiceJoinError},
        types::{ChannelId, GuildId},
    },
    player::events::{EventSender, SessionEvent, StreamSignal, StreamTicket},
};

pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    events: EventSender,
    tracks: DashMap<GuildId, TrackHandle>,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>, http: reqwest::Client, events: EventSender) -> Self {
        Self {
            songbird,
            http,
            events,
            tracks: DashMap::new(),
        }
    }
}

fn guild_key(guild_id: GuildId) -> Option<songbird::id::GuildId> {
    NonZeroU64::new(guild_id.get()).map(songbird::id::GuildId::from)
}

fn channel_key(channel_id: ChannelId) -> Option<songbird::id::ChannelId> {
    NonZeroU64::new(channel_id.get()).map(songbird::id::ChannelId::from)
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceJoinError> {
        let (Some(guild), Some(channel)) = (guild_key(guild_id), channel_key(channel_id)) else {
            return Err(VoiceJoinError::Transport("invalid snowflake".into()));
        };

        match self.songbird.join(guild, channel).await {
            Ok(_) => {
                debug!("[{}] Joined voice channel {}", guild_id, channel_id);
                Ok(())
            }
            Err(JoinError::TimedOut) => Err(VoiceJoinError::Timeout),
            Err(err) => Err(VoiceJoinError::Transport(err.to_string())),
        }
    }

    async fn leave(&self, guild_id: GuildId) {
        self.tracks.remove(&guild_id);
        let Some(guild) = guild_key(guild_id) else {
            return;
        };
        if self.songbird.get(guild).is_none() {
            return;
        }
        if let Err(err) = self.songbird.remove(guild).await {
            debug!("[{}] Leaving voice: {}", guild_id, err);
        }
    }

    async fn play(&self, ticket: StreamTicket, url: &str) -> RadioResult<()> {
        let call = guild_key(ticket.guild_id)
            .and_then(|guild| self.songbird.get(guild))
            .ok_or_else(|| RadioError::Stream("not connected to voice".into()))?;

        let input = HttpRequest::new(self.http.clone(), url.to_string());
        let handle = {
            let mut call = call.lock().await;
            call.stop();
            call.play_input(input.into())
        };

        let forwarder = SignalForwarder {
            ticket,
            events: self.events.clone(),
        };
        for event in [TrackEvent::Playable, TrackEvent::Error, TrackEvent::End] {
            handle
                .add_event(Event::Track(event), forwarder.clone())
                .map_err(|e| RadioError::Stream(e.to_string()))?;
        }

        if let Some(old) = self.tracks.insert(ticket.guild_id, handle) {
            if let Err(err) = old.stop() {
                debug!("[{}] Previous track already gone: {}", ticket.guild_id, err);
            }
        }
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) {
        if let Some((_, handle)) = self.tracks.remove(&guild_id) {
            if let Err(err) = handle.stop() {
                debug!("[{}] Track already stopped: {}", guild_id, err);
            }
        }
    }

    async fn position(&self, guild_id: GuildId) -> Option<Duration> {
        let handle = self.tracks.get(&guild_id).map(|h| h.clone())?;
        handle.get_info().await.ok().map(|state| state.position)
    }

    async fn is_connected(&self, guild_id: GuildId) -> bool {
        let Some(call) = guild_key(guild_id).and_then(|guild| self.songbird.get(guild)) else {
            return false;
        };
        call.lock().await.current_channel().is_some()
    }
}

/// Turns songbird track events into session events for one attempt.
#[derive(Clone)]
struct SignalForwarder {
    ticket: StreamTicket,
    events: EventSender,
}

#[async_trait]
impl VoiceEventHandler for SignalForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };
        let (state, _) = tracks.first()?;

        let signal = match &state.playing {
            PlayMode::Errored(err) => StreamSignal::Failed(err.to_string()),
            PlayMode::End | PlayMode::Stop => StreamSignal::Ended,
            _ => StreamSignal::Started,
        };

        if self
            .events
            .send(SessionEvent::Stream {
                ticket: self.ticket,
                signal,
            })
            .is_err()
        {
            warn!("[{}] Session event loop is gone", self.ticket.guild_id);
        }
        None
    }
}
