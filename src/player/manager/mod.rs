//! Per-guild playback lifecycle.
//!
//! Command handlers call straight into [`SessionManager`]; everything that
//! happens later (stream signals, watchdog trips, retry timers, voice
//! disconnects) arrives as a [`SessionEvent`] and is handled by the event
//! loop. Each continuation carries the generation it was started for and is
//! dropped once the session has moved on.

pub mod monitor;
pub mod reconnect;
pub mod start;
pub mod status;


use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use monitor::WatchdogConfig;
pub use reconnect::ReconnectPolicy;

use super::{
    events::{EventReceiver, EventSender, SessionEvent, StreamSignal, StreamTicket},
    intent::{CommandContext, Intent, Reply},
    registry::SessionRegistry,
    state::{SessionSnapshot, SessionState, Teardown},
};
use crate::{
    catalog::StreamCatalog,
    chat::ChatSurface,
    common::{
        errors::{RadioError, RadioResult, VoiceJoinError},
        types::{ChannelId, GuildId, MessageId, UserId},
    },
    configs::PlayerConfig,
    voice::VoiceTransport,
};

/// Reaction that stops playback when added to the live status card.
pub const STOP_GLYPH: &str = "\u{23F9}\u{FE0F}";

/// Matches the stop glyph with or without the emoji variation selector.
pub fn is_stop_glyph(glyph: &str) -> bool {
    glyph.trim_end_matches('\u{FE0F}') == "\u{23F9}"
}

/// Serialises connect and disconnect calls for one guild, so a teardown's
/// leave can never land on top of a newer join.
type VoiceLane = Arc<Mutex<()>>;

pub struct SessionManager {
    registry: SessionRegistry,
    catalog: StreamCatalog,
    voice: Arc<dyn VoiceTransport>,
    chat: Arc<dyn ChatSurface>,
    policy: ReconnectPolicy,
    watchdog: WatchdogConfig,
    join_timeout: Duration,
    events: EventSender,
    generations: AtomicU64,
    voice_lanes: DashMap<GuildId, VoiceLane>,
}

impl SessionManager {
    pub fn new(
        config: &PlayerConfig,
        catalog: StreamCatalog,
        voice: Arc<dyn VoiceTransport>,
        chat: Arc<dyn ChatSurface>,
        events: EventSender,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            catalog,
            voice,
            chat,
            policy: ReconnectPolicy::from(config),
            watchdog: WatchdogConfig::from(config),
            join_timeout: config.join_timeout(),
            events,
            generations: AtomicU64::new(0),
            voice_lanes: DashMap::new(),
        }
    }

    pub fn catalog(&self) -> &StreamCatalog {
        &self.catalog
    }

    pub fn session(&self, guild_id: GuildId) -> Option<SessionSnapshot> {
        self.registry.get(guild_id)
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Queues an event for the event loop.
    pub fn submit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event loop is gone, dropping event");
        }
    }

    pub(crate) fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn voice_lane(&self, guild_id: GuildId) -> VoiceLane {
        self.voice_lanes.entry(guild_id).or_default().clone()
    }

    pub async fn dispatch(&self, ctx: &CommandContext, intent: Intent) -> RadioResult<Reply> {
        debug!(
            "[{}] {} requested by {} in {}",
            ctx.guild_id,
            intent.name(),
            ctx.requester,
            ctx.text_channel
        );

        match intent {
            Intent::Play(token) => self.play(ctx, &token).await,
            Intent::Stop => self.stop(ctx.guild_id).await,
            Intent::Now => self.now(ctx).await,
            Intent::List => Ok(Reply::Stations(self.catalog.names())),
            Intent::Leave => self.leave(ctx.guild_id).await,
            Intent::Join => self.join(ctx).await,
            // Only the gateway adapter can measure this.
            Intent::Ping => Ok(Reply::Latency(None)),
            Intent::Help => Ok(Reply::Help),
        }
    }

    /// Starts `token` in the requester's voice channel, replacing whatever
    /// the guild was playing.
    pub async fn play(&self, ctx: &CommandContext, token: &str) -> RadioResult<Reply> {
        let descriptor = self.catalog.resolve(token)?;
        let channel_id = ctx.voice_channel.ok_or(VoiceJoinError::NotInVoice)?;
        let guild_id = ctx.guild_id;
        let generation = self.next_generation();

        let (created, previous_channel, old_status) =
            self.registry.get_or_create(guild_id, |s, created| {
                let previous = s.voice_channel.replace(channel_id);
                let old_status = s.status_message.take();
                s.begin_attempt(generation);
                s.current_stream = Some(descriptor.clone());
                s.text_channel = Some(ctx.text_channel);
                s.requester = Some(ctx.requester);
                s.retry_count = 0;
                (created, previous, old_status)
            });

        if created {
            info!("[{}] New playback session for {}", guild_id, descriptor.display_name);
        } else {
            info!("[{}] Replacing stream with {}", guild_id, descriptor.display_name);
        }

        if let Some(message) = old_status {
            self.retire_status(guild_id, &message).await;
        }

        let lane = self.voice_lane(guild_id);
        let held = lane.lock().await;
        let needs_join =
            previous_channel != Some(channel_id) || !self.voice.is_connected(guild_id).await;
        if needs_join {
            if let Err(err) = self.connect(guild_id, channel_id).await {
                warn!("[{}] Could not join {}: {}", guild_id, channel_id, err);
                if self.registry.remove_if_current(guild_id, generation) {
                    self.voice.stop(guild_id).await;
                    self.voice.leave(guild_id).await;
                }
                return Err(err.into());
            }
        }
        drop(held);

        if needs_join && !self.registry.is_current(guild_id, generation) {
            return Ok(self.superseded_join(guild_id).await);
        }

        self.start_attempt(StreamTicket::new(guild_id, generation), &descriptor.resolved_url)
            .await;

        Ok(Reply::Text(format!(
            "\u{25B6}\u{FE0F} Now playing: `{}`",
            descriptor.display_name
        )))
    }

    /// Stops playback and disconnects.
    pub async fn stop(&self, guild_id: GuildId) -> RadioResult<Reply> {
        let teardown = self
            .begin_teardown(guild_id)
            .ok_or(RadioError::NothingPlaying)?;
        self.finish_teardown(guild_id, teardown).await;
        Ok(Reply::Text("\u{23F9}\u{FE0F} Playback stopped.".into()))
    }

    /// Like `stop`, but also disconnects a voice connection that has no
    /// session behind it.
    pub async fn leave(&self, guild_id: GuildId) -> RadioResult<Reply> {
        if let Some(teardown) = self.begin_teardown(guild_id) {
            self.finish_teardown(guild_id, teardown).await;
        } else {
            let lane = self.voice_lane(guild_id);
            let _held = lane.lock().await;
            if !self.voice.is_connected(guild_id).await {
                return Err(RadioError::NotConnected);
            }
            info!("[{}] Leaving voice without an active session", guild_id);
            self.voice.leave(guild_id).await;
        }
        Ok(Reply::Text("\u{1F44B} Left the voice channel.".into()))
    }

    /// Connects to the requester's voice channel without starting a stream.
    /// A running session follows the bot to the new channel.
    pub async fn join(&self, ctx: &CommandContext) -> RadioResult<Reply> {
        let channel_id = ctx.voice_channel.ok_or(VoiceJoinError::NotInVoice)?;
        let guild_id = ctx.guild_id;

        let lane = self.voice_lane(guild_id);
        let _held = lane.lock().await;

        let session_channel = self
            .registry
            .with_session(guild_id, |s| s.voice_channel)
            .flatten();
        let in_place =
            session_channel == Some(channel_id) && self.voice.is_connected(guild_id).await;
        if !in_place {
            self.connect(guild_id, channel_id).await?;
            self.registry.with_session(guild_id, |s| {
                if s.state != SessionState::Stopping {
                    s.voice_channel = Some(channel_id);
                }
            });
            info!("[{}] Joined {} on request of {}", guild_id, channel_id, ctx.requester);
        }

        Ok(Reply::Text(format!("Joined <#{}>.", channel_id)))
    }

    /// Re-posts the status card in the channel `now` was issued from.
    pub async fn now(&self, ctx: &CommandContext) -> RadioResult<Reply> {
        let playing = self
            .registry
            .with_session(ctx.guild_id, |s| {
                (s.state == SessionState::Playing).then(|| {
                    s.text_channel = Some(ctx.text_channel);
                    s.generation
                })
            })
            .flatten()
            .ok_or(RadioError::NothingPlaying)?;

        self.post_status(StreamTicket::new(ctx.guild_id, playing)).await;
        Ok(Reply::StatusPosted)
    }

    /// Handles a reaction on any message in `guild_id`. Returns the notice
    /// to post when it stopped playback.
    pub async fn on_reaction(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
        user_id: UserId,
        glyph: &str,
    ) -> Option<Reply> {
        if !is_stop_glyph(glyph) {
            return None;
        }

        let generation = self.next_generation();
        let teardown = self
            .registry
            .with_session(guild_id, |s| {
                let live = s.state != SessionState::Stopping
                    && s.status_message.is_some_and(|m| m.message_id == message_id);
                live.then(|| s.begin_stopping(generation))
            })
            .flatten()?;

        info!("[{}] Stop reaction from {} on {}", guild_id, user_id, message_id);
        self.finish_teardown(guild_id, teardown).await;

        Some(Reply::Text(format!(
            "\u{23F9}\u{FE0F} Playback stopped by <@{}>.",
            user_id
        )))
    }

    pub async fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Stream { ticket, signal } => match signal {
                StreamSignal::Started => self.on_stream_started(ticket).await,
                StreamSignal::Failed(reason) => self.on_stream_failure(ticket, reason).await,
                StreamSignal::Ended => {
                    self.on_stream_failure(ticket, "stream ended unexpectedly".into())
                        .await
                }
            },
            SessionEvent::RetryDue(ticket) => self.on_retry_due(ticket).await,
            SessionEvent::VoiceDisconnected {
                guild_id,
                channel_id,
            } => self.on_voice_disconnected(guild_id, channel_id).await,
        }
    }

    pub fn spawn_event_loop(self: Arc<Self>, events: EventReceiver) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Ok(event) = events.recv_async().await {
                self.handle_event(event).await;
            }
            debug!("Session event loop stopped");
        })
    }

    /// Gateway says the bot is out of voice. The report may be the echo of
    /// our own earlier leave, so it only ends a session that really lost
    /// its connection.
    async fn on_voice_disconnected(&self, guild_id: GuildId, channel_id: Option<ChannelId>) {
        let Some(session) = self.registry.get(guild_id) else {
            return;
        };
        match session.state {
            SessionState::Stopping => return,
            // The join or the stream failure path deals with it.
            SessionState::Connecting => {
                debug!("[{}] Voice drop while connecting, ignored", guild_id);
                return;
            }
            _ => {}
        }
        if channel_id.is_some() && channel_id != session.voice_channel {
            debug!(
                "[{}] Disconnect from {:?} does not match session channel {:?}",
                guild_id, channel_id, session.voice_channel
            );
            return;
        }
        if self.voice.is_connected(guild_id).await {
            debug!("[{}] Still connected, ignoring stale voice disconnect", guild_id);
            return;
        }

        let generation = self.next_generation();
        let Some(teardown) = self
            .registry
            .with_current(guild_id, session.generation, |s| s.begin_stopping(generation))
        else {
            return;
        };
        warn!("[{}] Disconnected from voice externally, ending session", guild_id);
        self.finish_teardown(guild_id, teardown).await;
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceJoinError> {
        tokio::time::timeout(self.join_timeout, self.voice.join(guild_id, channel_id))
            .await
            .unwrap_or(Err(VoiceJoinError::Timeout))
    }

    /// A join finished after the session moved on. If nobody owns the
    /// guild any more, the connection we just made must not linger.
    async fn superseded_join(&self, guild_id: GuildId) -> Reply {
        let lane = self.voice_lane(guild_id);
        let _held = lane.lock().await;
        let orphaned = self
            .registry
            .get(guild_id)
            .is_none_or(|s| s.state == SessionState::Stopping);
        if orphaned {
            debug!("[{}] Join outlived its session, disconnecting", guild_id);
            self.voice.leave(guild_id).await;
        }
        Reply::Private("That request was superseded by a newer command.".into())
    }

    /// Moves the session into `Stopping` under a fresh generation, which
    /// invalidates every pending continuation.
    pub(crate) fn begin_teardown(&self, guild_id: GuildId) -> Option<Teardown> {
        let generation = self.next_generation();
        self.registry
            .with_session(guild_id, |s| {
                (s.state != SessionState::Stopping).then(|| s.begin_stopping(generation))
            })
            .flatten()
    }

    /// Disconnects unless a newer command claimed the guild in the meantime,
    /// then retires the card and drops the session.
    pub(crate) async fn finish_teardown(&self, guild_id: GuildId, teardown: Teardown) {
        let lane = self.voice_lane(guild_id);
        let held = lane.lock().await;
        if self.registry.is_current(guild_id, teardown.generation) {
            self.voice.stop(guild_id).await;
            self.voice.leave(guild_id).await;
        } else {
            debug!("[{}] Teardown superseded, keeping the voice connection", guild_id);
        }
        drop(held);

        if let Some(message) = teardown.status_message {
            self.retire_status(guild_id, &message).await;
        }
        if self.registry.remove_if_current(guild_id, teardown.generation) {
            info!(
                "[{}] Session ended ({})",
                guild_id,
                teardown.stream_name.as_deref().unwrap_or("no stream")
            );
        }
    }
}
