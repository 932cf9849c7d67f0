use crate::{common::errors::RadioResult, player::intent::Intent};

/// Parses a chat message addressed to the bot. `None` for anything that is
/// not a known command behind `prefix`.
pub fn parse(content: &str, prefix: &str) -> Option<RadioResult<Intent>> {
    let rest = content.trim().strip_prefix(prefix)?.trim_start();
    let (command, argument) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    Intent::parse(command, argument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::RadioError;

    #[test]
    fn parses_play_with_argument() {
        assert_eq!(
            parse(",,play jazz", ",,"),
            Some(Ok(Intent::Play("jazz".into())))
        );
        assert_eq!(
            parse(",,p <https://radio.example.com/a.mp3>", ",,"),
            Some(Ok(Intent::Play("<https://radio.example.com/a.mp3>".into())))
        );
    }

    #[test]
    fn argument_keeps_inner_spaces() {
        assert_eq!(
            parse(",,stream  smooth jazz ", ",,"),
            Some(Ok(Intent::Play("smooth jazz".into())))
        );
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(parse("play jazz", ",,"), None);
        assert_eq!(parse(",,", ",,"), None);
        assert_eq!(parse(",,pong", ",,"), None);
        assert_eq!(parse("!stop", ",,"), None);
    }

    #[test]
    fn missing_stream_is_reported() {
        assert_eq!(
            parse(",,play", ",,"),
            Some(Err(RadioError::MissingArgument("stream")))
        );
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(parse("!r np", "!r"), Some(Ok(Intent::Now)));
        assert_eq!(parse("!rdc", "!r"), Some(Ok(Intent::Leave)));
        assert_eq!(parse("!r ping", "!r"), Some(Ok(Intent::Ping)));
        assert_eq!(parse(",,join", ",,"), Some(Ok(Intent::Join)));
    }
}
