use std::time::Duration;

use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::{
    common::errors::RadioError,
    player::{intent::Reply, manager::STOP_GLYPH},
};

const HELP_COLOUR: u32 = 0x3498DB;
const LIST_COLOUR: u32 = 0xE67E22;

pub enum Rendered {
    Text(String),
    Embed(CreateEmbed),
    /// Already visible in the channel, nothing more to say.
    Nothing,
}

pub fn reply(reply: Reply, prefix: &str) -> Rendered {
    match reply {
        Reply::Text(text) | Reply::Private(text) => Rendered::Text(text),
        Reply::StatusPosted => Rendered::Nothing,
        Reply::Latency(latency) => Rendered::Text(latency_text(latency)),
        Reply::Stations(names) => Rendered::Embed(
            CreateEmbed::new()
                .title("\u{1F4FB} Predefined Radio Streams")
                .description(station_list(&names, prefix))
                .color(LIST_COLOUR),
        ),
        Reply::Help => {
            let embed = help_fields(prefix).into_iter().fold(
                CreateEmbed::new()
                    .title("Airwave Help")
                    .description(format!(
                        "Hi! I'm a simple radio bot. My command prefix is `{prefix}`.\n\
                         You can also use slash commands (e.g. `/play`)."
                    ))
                    .color(HELP_COLOUR),
                |embed, (name, value)| embed.field(name, value, false),
            );
            Rendered::Embed(embed.footer(CreateEmbedFooter::new("Enjoy the music!")))
        }
    }
}

pub fn help_fields(prefix: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "\u{1F50A} Voice Commands",
            format!(
                "`{prefix}play <URL or Name>` or `/play stream:<URL or Name>`\n\
                 Plays a live radio stream. Use a direct URL or a name from `{prefix}list`.\n\n\
                 `{prefix}stop` or `/stop`\n\
                 Stops the current playback and leaves the voice channel.\n\n\
                 `{prefix}join` or `/join`\n\
                 Joins your voice channel without playing anything.\n\n\
                 `{prefix}leave` or `{prefix}dc`\n\
                 Disconnects the bot from the voice channel.\n\n\
                 `{prefix}now` or `/now`\n\
                 Shows the currently playing stream again."
            ),
        ),
        (
            "\u{2139}\u{FE0F} Utility Commands",
            format!(
                "`{prefix}help` or `/help`\n\
                 Shows this help message.\n\n\
                 `{prefix}list` or `/list`\n\
                 Shows the predefined radio stream names.\n\n\
                 `{prefix}ping` or `/ping`\n\
                 Shows the bot's gateway latency."
            ),
        ),
        (
            "\u{25B6}\u{FE0F} Playback Control",
            format!("React with {STOP_GLYPH} on the 'Now Playing' message to stop playback."),
        ),
    ]
}

pub fn station_list(names: &[String], prefix: &str) -> String {
    if names.is_empty() {
        return "No predefined streams are currently configured.".to_string();
    }

    let mut out = format!(
        "Use these names with `{prefix}play <Name>` or `/play stream:<Name>`:"
    );
    for name in names {
        out.push_str(&format!("\n- `{name}`"));
    }
    out
}

pub fn latency_text(latency: Option<Duration>) -> String {
    match latency {
        Some(latency) => format!(
            "Pong! Latency: {:.2} ms",
            latency.as_secs_f64() * 1000.0
        ),
        None => "Pong! Latency has not been measured yet.".to_string(),
    }
}

/// User-facing text for a failed command. `list_hint` is how the user
/// would ask for the station list on the surface the command came from.
pub fn error_text(err: &RadioError, list_hint: &str) -> String {
    match err {
        RadioError::UnknownStream(_) => format!("{err} See `{list_hint}`."),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_list_mentions_every_name() {
        let text = station_list(&["jazz".into(), "Lofi".into()], ",,");
        assert!(text.starts_with("Use these names with `,,play <Name>`"));
        assert!(text.ends_with("- `jazz`\n- `Lofi`"));
    }

    #[test]
    fn empty_station_list() {
        assert_eq!(
            station_list(&[], ",,"),
            "No predefined streams are currently configured."
        );
    }

    #[test]
    fn help_uses_the_configured_prefix() {
        let fields = help_fields("!r");
        assert_eq!(fields.len(), 3);
        assert!(fields[0].1.contains("`!rplay <URL or Name>`"));
        assert!(fields[1].1.contains("`!rlist`"));
        assert!(fields[2].1.contains(STOP_GLYPH));
    }

    #[test]
    fn latency_in_milliseconds() {
        assert_eq!(
            latency_text(Some(Duration::from_micros(42_500))),
            "Pong! Latency: 42.50 ms"
        );
        assert_eq!(
            latency_text(None),
            "Pong! Latency has not been measured yet."
        );
    }

    #[test]
    fn unknown_stream_points_at_the_list() {
        let err = RadioError::UnknownStream("not-a-real-url".into());
        assert_eq!(
            error_text(&err, ",,list"),
            "`not-a-real-url` is not a valid URL or predefined stream name. See `,,list`."
        );
        assert_eq!(
            error_text(&RadioError::NothingPlaying, "/list"),
            "Nothing is currently playing."
        );
    }
}
