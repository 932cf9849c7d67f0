use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    common::errors::RadioError,
    configs::{BotConfig, LoggingConfig, PlayerConfig},
};

pub const TOKEN_ENV: &str = "DISCORD_TOKEN";
pub const PREFIX_ENV: &str = "COMMAND_PREFIX";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    /// Station name -> stream URL.
    #[serde(default)]
    pub stations: BTreeMap<String, String>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reads `config.toml` (or `config.default.toml`), then overlays the
    /// environment. A missing file is fine, a missing token is not.
    pub fn load() -> Result<Self, RadioError> {
        let _ = dotenvy::dotenv();

        let config_path = ["config.toml", "config.default.toml"]
            .into_iter()
            .find(|p| std::path::Path::new(p).exists());

        let mut config = match config_path {
            Some(path) => {
                println!("Loading configuration from: {}", path);
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| RadioError::Config(format!("{path}: {e}")))?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RadioError> {
        toml::from_str(raw).map_err(|e| RadioError::Config(e.to_string()))
    }

    /// Applies environment overrides through `lookup` so tests need not touch
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), RadioError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RadioError::Config(format!("{TOKEN_ENV} environment variable not set or empty"))
            })?;
        self.bot.token = token;

        if let Some(prefix) = lookup(PREFIX_ENV).filter(|p| !p.trim().is_empty()) {
            debug!("Command prefix overridden from environment: {}", prefix);
            self.bot.prefix = prefix.trim().to_string();
        }

        if self.bot.prefix.is_empty() {
            return Err(RadioError::Config("command prefix must not be empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::BackoffKind;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| owned.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.bot.prefix, ",,");
        assert_eq!(config.player.max_retries, 3);
        assert_eq!(config.player.retry_delay_ms, 5000);
        assert_eq!(config.player.backoff, BackoffKind::Fixed);
        assert!(config.stations.is_empty());
    }

    #[test]
    fn parses_stations_and_player_section() {
        let raw = r#"
            [bot]
            prefix = "!r"

            [player]
            max_retries = 5
            retry_delay_ms = 2500
            backoff = "exponential"

            [stations]
            jazz = "https://radio.example.com/jazz.mp3"
            lofi = "https://radio.example.com/lofi.aac"
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.bot.prefix, "!r");
        assert_eq!(config.player.max_retries, 5);
        assert_eq!(config.player.backoff, BackoffKind::Exponential);
        assert_eq!(
            config.stations.get("jazz").map(String::as_str),
            Some("https://radio.example.com/jazz.mp3")
        );
    }

    #[test]
    fn token_is_required() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[])).unwrap_err();
        assert!(err.is_fatal());

        let err = config.apply_env(env(&[(TOKEN_ENV, "   ")])).unwrap_err();
        assert!(matches!(err, RadioError::Config(_)));
    }

    #[test]
    fn env_sets_token_and_prefix() {
        let mut config = Config::default();
        config
            .apply_env(env(&[(TOKEN_ENV, " abc.def.ghi "), (PREFIX_ENV, "??")]))
            .unwrap();
        assert_eq!(config.bot.token, "abc.def.ghi");
        assert_eq!(config.bot.prefix, "??");
    }

    #[test]
    fn token_is_never_read_from_the_file() {
        let config = Config::from_toml_str("[bot]\ntoken = \"leaked\"\n").unwrap();
        assert!(config.bot.token.is_empty());
    }
}
