use serenity::all::Permissions;

use crate::{
    catalog::StreamCatalog,
    common::{
        errors::{RadioResult, VoiceJoinError},
        types::ChannelId,
    },
    player::intent::Intent,
};

/// Where a voice command may go, given the requester's voice channel and
/// the bot's permissions there. `None` permissions means the cache could
/// not tell, and the join itself will report any refusal.
pub fn voice_target(
    channel: Option<ChannelId>,
    permissions: Option<Permissions>,
) -> Result<ChannelId, VoiceJoinError> {
    let channel = channel.ok_or(VoiceJoinError::NotInVoice)?;
    match permissions {
        Some(granted) if !granted.contains(Permissions::CONNECT | Permissions::SPEAK) => {
            Err(VoiceJoinError::MissingPermissions)
        }
        _ => Ok(channel),
    }
}

/// Voice channel to hand to the manager along with `intent`.
///
/// A refused `play` is answered here and never reaches the session
/// registry. Its token is resolved first so that an unknown stream is
/// reported ahead of missing permissions. Commands that do not need voice
/// go through with no channel.
pub fn admit(
    intent: &Intent,
    target: Result<ChannelId, VoiceJoinError>,
    catalog: &StreamCatalog,
) -> RadioResult<Option<ChannelId>> {
    match (intent, target) {
        (_, Ok(channel)) => Ok(Some(channel)),
        (_, Err(VoiceJoinError::NotInVoice)) => Ok(None),
        (Intent::Play(token), Err(err)) => {
            catalog.resolve(token)?;
            Err(err.into())
        }
        (Intent::Join, Err(err)) => Err(err.into()),
        (_, Err(_)) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::common::errors::RadioError;

    const VOICE: ChannelId = ChannelId(20);

    fn catalog() -> StreamCatalog {
        let mut stations = BTreeMap::new();
        stations.insert("jazz".to_string(), "https://radio.example.com/jazz.mp3".to_string());
        StreamCatalog::new(stations)
    }

    fn refused() -> Result<ChannelId, VoiceJoinError> {
        voice_target(Some(VOICE), Some(Permissions::VIEW_CHANNEL | Permissions::CONNECT))
    }

    #[test]
    fn connect_and_speak_are_both_required() {
        let both = Permissions::CONNECT | Permissions::SPEAK;
        assert_eq!(voice_target(Some(VOICE), Some(both)), Ok(VOICE));
        assert_eq!(refused(), Err(VoiceJoinError::MissingPermissions));
        assert_eq!(
            voice_target(Some(VOICE), Some(Permissions::SPEAK)),
            Err(VoiceJoinError::MissingPermissions)
        );
    }

    #[test]
    fn unknown_permissions_are_left_to_the_join() {
        assert_eq!(voice_target(Some(VOICE), None), Ok(VOICE));
        assert_eq!(voice_target(None, None), Err(VoiceJoinError::NotInVoice));
        assert_eq!(
            voice_target(None, Some(Permissions::empty())),
            Err(VoiceJoinError::NotInVoice)
        );
    }

    #[test]
    fn refused_play_reports_missing_permissions() {
        let catalog = catalog();
        assert_eq!(
            admit(&Intent::Play("jazz".into()), refused(), &catalog),
            Err(RadioError::VoiceJoin(VoiceJoinError::MissingPermissions))
        );
        assert_eq!(
            admit(&Intent::Join, refused(), &catalog),
            Err(RadioError::VoiceJoin(VoiceJoinError::MissingPermissions))
        );
    }

    #[test]
    fn unknown_stream_wins_over_missing_permissions() {
        assert_eq!(
            admit(&Intent::Play("not-a-real-url".into()), refused(), &catalog()),
            Err(RadioError::UnknownStream("not-a-real-url".into()))
        );
    }

    #[test]
    fn commands_without_voice_pass_through() {
        let catalog = catalog();
        for intent in [Intent::Stop, Intent::Leave, Intent::List, Intent::Now] {
            assert_eq!(admit(&intent, refused(), &catalog), Ok(None));
        }
        assert_eq!(
            admit(&Intent::Play("jazz".into()), Err(VoiceJoinError::NotInVoice), &catalog),
            Ok(None)
        );
        assert_eq!(
            admit(&Intent::Play("jazz".into()), Ok(VOICE), &catalog),
            Ok(Some(VOICE))
        );
    }
}
