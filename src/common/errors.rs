use thiserror::Error;

/// Why the bot could not get into the requester's voice channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoiceJoinError {
    #[error("You are not connected to a voice channel.")]
    NotInVoice,
    #[error("I need permission to connect and speak in that voice channel.")]
    MissingPermissions,
    #[error("Timed out trying to connect to the voice channel.")]
    Timeout,
    #[error("Could not connect to the voice channel: {0}")]
    Transport(String),
}

/// Errors surfaced by the session manager and the command surfaces.
///
/// The `Display` text of every non-fatal variant is what the user sees in
/// the channel the command came from.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RadioError {
    #[error("`{0}` is not a valid URL or predefined stream name.")]
    UnknownStream(String),
    #[error(transparent)]
    VoiceJoin(#[from] VoiceJoinError),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Stream `{0}` is unavailable, giving up after {1} reconnect attempts.")]
    RetriesExhausted(String, u32),
    #[error("Nothing is currently playing.")]
    NothingPlaying,
    #[error("I'm not currently in a voice channel.")]
    NotConnected,
    #[error("Missing argument: `{0}`.")]
    MissingArgument(&'static str),
    #[error("Chat request failed: {0}")]
    Chat(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RadioError {
    /// Fatal errors stop the process; everything else is reported inline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Config(_))
    }
}

pub type RadioResult<T> = Result<T, RadioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_errors_keep_their_user_facing_text() {
        let err: RadioError = VoiceJoinError::NotInVoice.into();
        assert_eq!(err.to_string(), "You are not connected to a voice channel.");
        assert!(!err.is_fatal());
    }

    #[test]
    fn only_startup_errors_are_fatal() {
        assert!(RadioError::Auth("bad token".into()).is_fatal());
        assert!(RadioError::Config("no token".into()).is_fatal());
        assert!(!RadioError::UnknownStream("x".into()).is_fatal());
        assert!(!RadioError::RetriesExhausted("jazz".into(), 3).is_fatal());
    }
}
