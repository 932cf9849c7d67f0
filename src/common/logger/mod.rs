use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::LoggingConfig;

/// Builds the filter string from config; `RUST_LOG` wins when set.
pub fn filter_directives(config: Option<&LoggingConfig>) -> String {
    let level = config.and_then(|l| l.level.as_deref()).unwrap_or("info");
    let filters = config.and_then(|l| l.filters.as_deref()).unwrap_or("");

    // serenity and songbird are chatty at info; keep them at warn unless asked.
    let base = format!("{level},serenity=warn,songbird=warn,tracing::span=warn");
    if filters.is_empty() {
        base
    } else {
        format!("{base},{filters}")
    }
}

pub fn init(config: Option<&LoggingConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let use_ansi = config.map(|l| l.ansi).unwrap_or(true);
    let stdout_layer = fmt::layer()
        .event_format(CustomFormatter::new(use_ansi))
        .with_ansi(use_ansi);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}
