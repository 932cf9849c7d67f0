//! Maps play tokens to playable streams.
//!
//! A token is either a direct stream URL or the name of a station from the
//! `[stations]` table. Station names match case-insensitively but keep their
//! configured spelling for display.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use crate::common::errors::RadioError;

/// Resolved, playable identity of a requested stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub source_token: String,
    pub resolved_url: String,
    pub display_name: String,
}

pub struct StreamCatalog {
    stations: BTreeMap<String, String>,
    url_regex: Regex,
}

impl StreamCatalog {
    pub fn new(stations: BTreeMap<String, String>) -> Self {
        Self {
            stations,
            url_regex: Regex::new(r"(?i)^(?:https?|icy)://\S+$").expect("static regex"),
        }
    }

    /// Resolves `token` to a descriptor. Surrounding `<...>` (Discord's
    /// embed suppression) and whitespace are ignored.
    pub fn resolve(&self, token: &str) -> Result<StreamDescriptor, RadioError> {
        let input = token.trim().trim_start_matches('<').trim_end_matches('>').trim();
        if input.is_empty() {
            return Err(RadioError::MissingArgument("stream"));
        }

        if let Some((name, url)) = self
            .stations
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(input))
        {
            debug!("Matched predefined stream: {}", name);
            return Ok(StreamDescriptor {
                source_token: input.to_string(),
                resolved_url: url.clone(),
                display_name: name.clone(),
            });
        }

        if self.url_regex.is_match(input) {
            return Ok(StreamDescriptor {
                source_token: input.to_string(),
                resolved_url: input.to_string(),
                display_name: input.to_string(),
            });
        }

        Err(RadioError::UnknownStream(input.to_string()))
    }

    /// Station names in display order.
    pub fn names(&self) -> Vec<String> {
        self.stations.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StreamCatalog {
        let mut stations = BTreeMap::new();
        stations.insert("Jazz".to_string(), "https://radio.example.com/jazz.mp3".to_string());
        stations.insert("lofi".to_string(), "http://radio.example.com/lofi".to_string());
        StreamCatalog::new(stations)
    }

    #[test]
    fn station_names_match_case_insensitively() {
        let descriptor = catalog().resolve("jazz").unwrap();
        assert_eq!(descriptor.display_name, "Jazz");
        assert_eq!(descriptor.resolved_url, "https://radio.example.com/jazz.mp3");
        assert_eq!(descriptor.source_token, "jazz");
    }

    #[test]
    fn direct_urls_pass_through() {
        let descriptor = catalog()
            .resolve("<http://example.com/stream.mp3>")
            .unwrap();
        assert_eq!(descriptor.resolved_url, "http://example.com/stream.mp3");
        assert_eq!(descriptor.display_name, "http://example.com/stream.mp3");
    }

    #[test]
    fn icy_scheme_is_accepted() {
        assert!(catalog().resolve("icy://stream.example.org:8000/live").is_ok());
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let err = catalog().resolve("not-a-real-url").unwrap_err();
        assert_eq!(err, RadioError::UnknownStream("not-a-real-url".into()));

        let err = catalog().resolve("ftp://example.com/stream").unwrap_err();
        assert!(matches!(err, RadioError::UnknownStream(_)));
    }

    #[test]
    fn blank_token_is_a_missing_argument() {
        assert_eq!(
            catalog().resolve("  <> ").unwrap_err(),
            RadioError::MissingArgument("stream")
        );
    }

    #[test]
    fn names_are_sorted() {
        assert_eq!(catalog().names(), vec!["Jazz".to_string(), "lofi".to_string()]);
    }
}
