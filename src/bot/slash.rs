use serenity::all::{CommandDataOption, CommandOptionType, CreateCommand, CreateCommandOption};

use crate::player::intent::Intent;

pub const STREAM_OPTION: &str = "stream";

/// Name and description of every slash command, in registration order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("play", "Plays a live radio stream"),
    ("stop", "Stops playback and leaves the voice channel"),
    ("now", "Shows what is currently playing"),
    ("list", "Lists the predefined radio streams"),
    ("leave", "Disconnects from the voice channel"),
    ("join", "Joins your current voice channel"),
    ("ping", "Shows the gateway latency"),
    ("help", "Shows how to use the bot"),
];

pub fn definitions() -> Vec<CreateCommand> {
    COMMANDS
        .iter()
        .map(|(name, description)| {
            let command = CreateCommand::new(*name).description(*description);
            if *name == "play" {
                command.add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        STREAM_OPTION,
                        "Stream URL or predefined stream name",
                    )
                    .required(true),
                )
            } else {
                command
            }
        })
        .collect()
}

pub fn stream_argument(options: &[CommandDataOption]) -> &str {
    options
        .iter()
        .find(|option| option.name == STREAM_OPTION)
        .and_then(|option| option.value.as_str())
        .unwrap_or_default()
}

/// Replies only the invoking user should see.
pub fn is_private(intent: &Intent) -> bool {
    matches!(
        intent,
        Intent::Now | Intent::List | Intent::Ping | Intent::Help
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_command_has_an_intent() {
        for (name, _) in COMMANDS {
            assert!(
                matches!(Intent::parse(name, "jazz"), Some(Ok(_))),
                "{name} has no intent"
            );
        }
        assert_eq!(definitions().len(), COMMANDS.len());
    }

    #[test]
    fn informational_commands_are_private() {
        assert!(is_private(&Intent::List));
        assert!(is_private(&Intent::Help));
        assert!(is_private(&Intent::Ping));
        assert!(!is_private(&Intent::Join));
        assert!(!is_private(&Intent::Play("jazz".into())));
        assert!(!is_private(&Intent::Stop));
    }
}
