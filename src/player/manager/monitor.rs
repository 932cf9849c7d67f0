use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, warn};

use crate::{
    configs::PlayerConfig,
    player::events::{EventSender, SessionEvent, StreamSignal, StreamTicket},
    voice::VoiceTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&PlayerConfig> for WatchdogConfig {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            interval: config.watchdog_interval(),
            timeout: config.watchdog_timeout(),
        }
    }
}

pub(super) fn spawn(
    voice: Arc<dyn VoiceTransport>,
    events: EventSender,
    ticket: StreamTicket,
    config: WatchdogConfig,
) -> JoinHandle<()> {
    tokio::spawn(watch(voice, events, ticket, config))
}

/// Reports a failure once the track position has not moved for
/// `config.timeout`. Covers inputs that never start as well as ones that
/// stall mid-stream. Aborted by the session when the attempt ends.
async fn watch(
    voice: Arc<dyn VoiceTransport>,
    events: EventSender,
    ticket: StreamTicket,
    config: WatchdogConfig,
) {
    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    let mut last_pos: Option<Duration> = None;
    let mut stalled_for = Duration::ZERO;

    loop {
        interval.tick().await;

        let pos = voice.position(ticket.guild_id).await;
        let advanced = match (last_pos, pos) {
            (_, None) => false,
            (None, Some(p)) => p > Duration::ZERO,
            (Some(last), Some(p)) => p > last,
        };

        if advanced {
            stalled_for = Duration::ZERO;
            last_pos = pos;
            continue;
        }

        stalled_for += config.interval;
        if stalled_for >= config.timeout {
            warn!(
                "[{}] No audio for {}ms, treating stream as failed",
                ticket.guild_id,
                stalled_for.as_millis()
            );
            let failed = SessionEvent::Stream {
                ticket,
                signal: StreamSignal::Failed(format!(
                    "no audio received for {}s",
                    stalled_for.as_secs()
                )),
            };
            if events.send(failed).is_err() {
                debug!("[{}] Event loop gone, watchdog report dropped", ticket.guild_id);
            }
            break;
        }
    }
}
