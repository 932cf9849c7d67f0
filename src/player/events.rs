use crate::common::types::{ChannelId, GuildId};

/// Identifies one playback attempt. Signals carrying a ticket whose
/// generation no longer matches the session are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTicket {
    pub guild_id: GuildId,
    pub generation: u64,
}

impl StreamTicket {
    pub fn new(guild_id: GuildId, generation: u64) -> Self {
        Self {
            guild_id,
            generation,
        }
    }
}

/// What the decoding side reports about a running stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// Input was opened and audio is flowing.
    Started,
    /// Decode or I/O failure, or the watchdog saw no progress.
    Failed(String),
    /// The input finished. For a live radio feed this means the remote hung up.
    Ended,
}

/// Everything asynchronous that can change a session, funnelled into one
/// event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Stream {
        ticket: StreamTicket,
        signal: StreamSignal,
    },
    /// The reconnect delay scheduled for `ticket` has elapsed.
    RetryDue(StreamTicket),
    /// The gateway reported the bot out of voice. `channel_id` is the
    /// channel it was in before, when the cache knew it.
    VoiceDisconnected {
        guild_id: GuildId,
        channel_id: Option<ChannelId>,
    },
}

pub type EventSender = flume::Sender<SessionEvent>;
pub type EventReceiver = flume::Receiver<SessionEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    flume::unbounded()
}
