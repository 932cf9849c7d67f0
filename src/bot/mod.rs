//! Discord glue: gateway client, command surfaces and reaction listener.

pub mod access;
pub mod handler;
pub mod prefix;
pub mod render;
pub mod slash;

use std::sync::Arc;

use serenity::{
    Client,
    all::{GatewayIntents, Http},
    gateway::GatewayError,
};
use songbird::{SerenityInit, Songbird};
use tracing::{info, warn};

pub use handler::{Handler, ShardManagerKey};

use crate::{
    catalog::StreamCatalog,
    chat::DiscordChat,
    common::{errors::RadioError, http::HttpClient},
    configs::Config,
    player::{SessionManager, events},
    voice::SongbirdTransport,
};

fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
}

fn client_error(err: serenity::Error) -> RadioError {
    match err {
        serenity::Error::Gateway(GatewayError::InvalidAuthentication) => {
            RadioError::Auth("Discord rejected the bot token".into())
        }
        other => RadioError::Chat(other.to_string()),
    }
}

/// Connects to Discord and serves until the gateway closes or Ctrl-C.
pub async fn run(config: Config) -> Result<(), RadioError> {
    serenity::utils::validate_token(&config.bot.token)
        .map_err(|e| RadioError::Auth(e.to_string()))?;

    let songbird = Songbird::serenity();
    let http = Arc::new(Http::new(&config.bot.token));
    let streams = HttpClient::for_streams().map_err(|e| RadioError::Config(e.to_string()))?;

    let (events_tx, events_rx) = events::channel();
    let voice = Arc::new(SongbirdTransport::new(
        songbird.clone(),
        streams,
        events_tx.clone(),
    ));
    let chat = Arc::new(DiscordChat::new(http));
    let manager = Arc::new(SessionManager::new(
        &config.player,
        StreamCatalog::new(config.stations.clone()),
        voice,
        chat,
        events_tx,
    ));
    let event_loop = manager.clone().spawn_event_loop(events_rx);

    let mut client = Client::builder(&config.bot.token, intents())
        .event_handler(Handler::new(manager, config.bot.prefix.clone()))
        .register_songbird_with(songbird)
        .await
        .map_err(client_error)?;

    let shard_manager = client.shard_manager.clone();
    client
        .data
        .write()
        .await
        .insert::<ShardManagerKey>(shard_manager.clone());
    info!("Connecting to Discord...");

    let result = tokio::select! {
        res = client.start() => res.map_err(client_error),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    };

    event_loop.abort();
    if let Err(err) = &result {
        warn!("Discord client stopped: {}", err);
    }
    result
}
