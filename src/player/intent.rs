use std::time::Duration;

use crate::common::{
    errors::{RadioError, RadioResult},
    types::{ChannelId, GuildId, UserId},
};

/// A control request, independent of the surface it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Play(String),
    Stop,
    Now,
    List,
    Leave,
    Join,
    Ping,
    Help,
}

impl Intent {
    /// Maps a command word and its argument to an intent. `None` means the
    /// word is not one of ours.
    pub fn parse(command: &str, argument: &str) -> Option<RadioResult<Self>> {
        let intent = match command.to_ascii_lowercase().as_str() {
            "play" | "p" | "stream" => {
                let token = argument.trim();
                if token.is_empty() {
                    return Some(Err(RadioError::MissingArgument("stream")));
                }
                Self::Play(token.to_string())
            }
            "stop" => Self::Stop,
            "now" | "np" => Self::Now,
            "list" => Self::List,
            "leave" | "disconnect" | "dc" => Self::Leave,
            "join" => Self::Join,
            "ping" => Self::Ping,
            "help" => Self::Help,
            _ => return None,
        };
        Some(Ok(intent))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Play(_) => "play",
            Self::Stop => "stop",
            Self::Now => "now",
            Self::List => "list",
            Self::Leave => "leave",
            Self::Join => "join",
            Self::Ping => "ping",
            Self::Help => "help",
        }
    }
}

/// Who asked, and from where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub text_channel: ChannelId,
    pub requester: UserId,
    /// The requester's current voice channel, if any.
    pub voice_channel: Option<ChannelId>,
}

/// Result of a handled intent; each surface renders it its own way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Visible to everyone in the channel.
    Text(String),
    /// Only the requester needs to see it (ephemeral on slash commands).
    Private(String),
    /// The status card was re-posted; nothing else to say.
    StatusPosted,
    Stations(Vec<String>),
    /// Gateway heartbeat round trip, when the shard has measured one.
    Latency(Option<Duration>),
    Help,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_the_same_intent() {
        for word in ["play", "p", "stream", "PLAY"] {
            assert_eq!(
                Intent::parse(word, " jazz "),
                Some(Ok(Intent::Play("jazz".into())))
            );
        }
        assert_eq!(Intent::parse("np", ""), Some(Ok(Intent::Now)));
        assert_eq!(Intent::parse("dc", ""), Some(Ok(Intent::Leave)));
        assert_eq!(Intent::parse("disconnect", "ignored"), Some(Ok(Intent::Leave)));
    }

    #[test]
    fn play_needs_an_argument() {
        assert_eq!(
            Intent::parse("play", "   "),
            Some(Err(RadioError::MissingArgument("stream")))
        );
    }

    #[test]
    fn unknown_words_are_not_ours() {
        assert_eq!(Intent::parse("pong", ""), None);
        assert_eq!(Intent::parse("", ""), None);
    }

    #[test]
    fn join_and_ping_take_no_argument() {
        assert_eq!(Intent::parse("JOIN", "jazz"), Some(Ok(Intent::Join)));
        assert_eq!(Intent::parse("ping", ""), Some(Ok(Intent::Ping)));
        assert_eq!(Intent::Join.name(), "join");
    }
}
