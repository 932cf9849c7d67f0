use tokio::task::JoinHandle;

use crate::{
    catalog::StreamDescriptor,
    common::types::{ChannelId, GuildId, MessageRef, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Playing,
    Reconnecting,
    Stopping,
}

impl SessionState {
    /// States in which a track is (or is about to be) running on the transport.
    pub fn has_live_track(self) -> bool {
        matches!(self, Self::Connecting | Self::Playing)
    }
}

/// Per-guild playback state. Only ever touched inside a registry critical
/// section, so nothing here is synchronised on its own.
pub struct PlaybackSession {
    pub guild_id: GuildId,
    pub state: SessionState,
    pub generation: u64,
    pub voice_channel: Option<ChannelId>,
    pub current_stream: Option<StreamDescriptor>,
    pub status_message: Option<MessageRef>,
    pub text_channel: Option<ChannelId>,
    pub requester: Option<UserId>,
    pub retry_count: u32,
    pub(crate) watchdog: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            state: SessionState::Idle,
            generation: 0,
            voice_channel: None,
            current_stream: None,
            status_message: None,
            text_channel: None,
            requester: None,
            retry_count: 0,
            watchdog: None,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Starts a new playback attempt under `generation`.
    pub(crate) fn begin_attempt(&mut self, generation: u64) {
        self.cancel_watchdog();
        self.generation = generation;
        self.state = SessionState::Connecting;
    }

    /// `Connecting -> Playing`. Refuses without a stream so the session can
    /// never claim to play nothing.
    pub(crate) fn enter_playing(&mut self) -> bool {
        if self.state != SessionState::Connecting || self.current_stream.is_none() {
            return false;
        }
        self.state = SessionState::Playing;
        self.retry_count = 0;
        true
    }

    /// Moves to `Stopping` under `generation` and hands back what the caller
    /// must clean up outside the critical section.
    pub(crate) fn begin_stopping(&mut self, generation: u64) -> Teardown {
        self.cancel_watchdog();
        let teardown = Teardown {
            generation,
            status_message: self.status_message.take(),
            stream_name: self.current_stream.take().map(|s| s.display_name),
            text_channel: self.text_channel,
        };
        self.generation = generation;
        self.state = SessionState::Stopping;
        self.voice_channel = None;
        self.retry_count = 0;
        teardown
    }

    pub(crate) fn cancel_watchdog(&mut self) {
        if let Some(task) = self.watchdog.take() {
            task.abort();
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: self.guild_id,
            state: self.state,
            generation: self.generation,
            voice_channel: self.voice_channel,
            current_stream: self.current_stream.clone(),
            status_message: self.status_message,
            text_channel: self.text_channel,
            requester: self.requester,
            retry_count: self.retry_count,
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel_watchdog();
    }
}

/// Work left over after a session entered `Stopping`.
#[derive(Debug)]
pub(crate) struct Teardown {
    pub generation: u64,
    pub status_message: Option<MessageRef>,
    pub stream_name: Option<String>,
    pub text_channel: Option<ChannelId>,
}

/// Read-only copy of a session, safe to hold across awaits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub guild_id: GuildId,
    pub state: SessionState,
    pub generation: u64,
    pub voice_channel: Option<ChannelId>,
    pub current_stream: Option<StreamDescriptor>,
    pub status_message: Option<MessageRef>,
    pub text_channel: Option<ChannelId>,
    pub requester: Option<UserId>,
    pub retry_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor {
            source_token: "jazz".into(),
            resolved_url: "https://radio.example.com/jazz.mp3".into(),
            display_name: "jazz".into(),
        }
    }

    #[test]
    fn cannot_play_without_a_stream() {
        let mut session = PlaybackSession::new(GuildId(1));
        session.begin_attempt(7);
        assert!(!session.enter_playing());
        assert_eq!(session.state, SessionState::Connecting);
    }

    #[test]
    fn entering_playing_resets_retries() {
        let mut session = PlaybackSession::new(GuildId(1));
        session.current_stream = Some(descriptor());
        session.retry_count = 2;
        session.begin_attempt(3);
        assert!(session.enter_playing());
        assert_eq!(session.state, SessionState::Playing);
        assert_eq!(session.retry_count, 0);
        assert!(!session.enter_playing(), "already playing");
    }

    #[test]
    fn stopping_releases_stream_and_status() {
        let mut session = PlaybackSession::new(GuildId(1));
        session.current_stream = Some(descriptor());
        session.voice_channel = Some(ChannelId(20));
        session.status_message = Some(MessageRef::new(ChannelId(10), crate::common::MessageId(99)));
        session.begin_attempt(1);
        session.enter_playing();

        let teardown = session.begin_stopping(2);
        assert_eq!(teardown.generation, 2);
        assert_eq!(teardown.stream_name.as_deref(), Some("jazz"));
        assert!(teardown.status_message.is_some());
        assert_eq!(session.state, SessionState::Stopping);
        assert!(session.current_stream.is_none());
        assert!(session.status_message.is_none());
        assert!(session.voice_channel.is_none());
        assert!(session.is_current(2));
    }
}
