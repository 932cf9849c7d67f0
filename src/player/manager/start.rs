use tracing::{info, warn};

use super::{SessionManager, monitor};
use crate::player::events::StreamTicket;

impl SessionManager {
    /// Hands `url` to the transport and arms the watchdog for this attempt.
    /// A transport that refuses the input counts as a stream failure.
    pub(super) async fn start_attempt(&self, ticket: StreamTicket, url: &str) {
        if let Err(err) = self.voice.play(ticket, url).await {
            warn!("[{}] Failed to start {}: {}", ticket.guild_id, url, err);
            self.on_stream_failure(ticket, err.to_string()).await;
            return;
        }

        let mut watchdog = Some(monitor::spawn(
            self.voice.clone(),
            self.events.clone(),
            ticket,
            self.watchdog,
        ));
        self.registry
            .with_current(ticket.guild_id, ticket.generation, |s| {
                s.cancel_watchdog();
                s.watchdog = watchdog.take();
            });
        if let Some(orphan) = watchdog {
            orphan.abort();
        }
    }

    /// `Connecting -> Playing` once audio actually flows, then posts the card.
    pub(super) async fn on_stream_started(&self, ticket: StreamTicket) {
        let entered = self
            .registry
            .with_current(ticket.guild_id, ticket.generation, |s| {
                s.enter_playing()
                    .then(|| s.current_stream.as_ref().map(|d| d.display_name.clone()))
                    .flatten()
            })
            .flatten();

        let Some(name) = entered else {
            return;
        };
        info!("[{}] Now playing {}", ticket.guild_id, name);
        self.post_status(ticket).await;
    }
}
