use std::time::Duration;

use tracing::{debug, info, warn};

use super::SessionManager;
use crate::{
    chat::Outgoing,
    common::{
        errors::{RadioError, VoiceJoinError},
        types::MessageRef,
    },
    configs::{BackoffKind, PlayerConfig},
    player::{
        events::{SessionEvent, StreamTicket},
        state::{SessionState, Teardown},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub backoff: BackoffKind,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.retry_delay,
            BackoffKind::Exponential => {
                self.retry_delay * 2u32.pow(attempt.saturating_sub(1).min(3))
            }
        }
    }

    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

impl From<&PlayerConfig> for ReconnectPolicy {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            backoff: config.backoff,
        }
    }
}

enum Failure {
    Retry {
        attempt: u32,
        status: Option<MessageRef>,
    },
    Exhausted {
        teardown: Teardown,
        attempts: u32,
    },
}

impl SessionManager {
    /// A running or starting stream died. Either schedules a reconnect
    /// with the same descriptor or gives up and ends the session.
    pub(super) async fn on_stream_failure(&self, ticket: StreamTicket, reason: String) {
        let guild_id = ticket.guild_id;
        let stop_generation = self.next_generation();
        let policy = self.policy;

        let failure = self
            .registry
            .with_current(guild_id, ticket.generation, |s| {
                if !s.state.has_live_track() {
                    return None;
                }
                s.cancel_watchdog();
                s.retry_count += 1;

                if policy.allows(s.retry_count) {
                    s.state = SessionState::Reconnecting;
                    Some(Failure::Retry {
                        attempt: s.retry_count,
                        status: s.status_message.take(),
                    })
                } else {
                    let attempts = s.retry_count - 1;
                    Some(Failure::Exhausted {
                        teardown: s.begin_stopping(stop_generation),
                        attempts,
                    })
                }
            })
            .flatten();

        match failure {
            None => {}
            Some(Failure::Retry { attempt, status }) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "[{}] Stream failed ({}), reconnect {}/{} in {}ms",
                    guild_id,
                    reason,
                    attempt,
                    policy.max_retries,
                    delay.as_millis()
                );
                self.voice.stop(guild_id).await;
                if let Some(message) = status {
                    self.retire_status(guild_id, &message).await;
                }
                self.schedule_retry(ticket, delay);
            }
            Some(Failure::Exhausted { teardown, attempts }) => {
                warn!(
                    "[{}] Stream failed ({}), giving up after {} reconnect attempts",
                    guild_id, reason, attempts
                );
                let name = teardown.stream_name.clone().unwrap_or_default();
                let notice_channel = teardown.text_channel;
                self.finish_teardown(guild_id, teardown).await;

                if let Some(channel_id) = notice_channel {
                    let notice = RadioError::RetriesExhausted(name, attempts).to_string();
                    if let Err(err) = self.chat.send(channel_id, Outgoing::Text(notice)).await {
                        warn!("[{}] Could not post give-up notice: {}", guild_id, err);
                    }
                }
            }
        }
    }

    fn schedule_retry(&self, ticket: StreamTicket, delay: Duration) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(SessionEvent::RetryDue(ticket)).is_err() {
                debug!("[{}] Event loop gone, retry dropped", ticket.guild_id);
            }
        });
    }

    /// `Reconnecting -> Connecting` with the same descriptor, unless a
    /// stop or replace got there first.
    pub(super) async fn on_retry_due(&self, ticket: StreamTicket) {
        let guild_id = ticket.guild_id;
        let generation = self.next_generation();

        let attempt = self
            .registry
            .with_current(guild_id, ticket.generation, |s| {
                if s.state != SessionState::Reconnecting {
                    return None;
                }
                let url = s.current_stream.as_ref()?.resolved_url.clone();
                s.begin_attempt(generation);
                Some((url, s.voice_channel, s.retry_count))
            })
            .flatten();

        let Some((url, channel, retry)) = attempt else {
            return;
        };
        let next = StreamTicket::new(guild_id, generation);
        info!("[{}] Reconnect attempt {} for {}", guild_id, retry, url);

        let lane = self.voice_lane(guild_id);
        let held = lane.lock().await;
        let rejoined = if self.voice.is_connected(guild_id).await {
            Ok(false)
        } else {
            match channel {
                Some(channel_id) => self.connect(guild_id, channel_id).await.map(|()| true),
                None => Err(VoiceJoinError::NotInVoice),
            }
        };
        drop(held);

        match rejoined {
            Err(err) => {
                self.on_stream_failure(next, format!("voice reconnect failed: {err}"))
                    .await;
                return;
            }
            Ok(true) if !self.registry.is_current(guild_id, generation) => {
                self.superseded_join(guild_id).await;
                return;
            }
            Ok(_) => {}
        }

        self.start_attempt(next, &url).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(backoff: BackoffKind) -> ReconnectPolicy {
        ReconnectPolicy {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            backoff,
        }
    }

    #[test]
    fn fixed_delay_never_grows() {
        let p = policy(BackoffKind::Fixed);
        assert_eq!(p.delay_for(1), Duration::from_secs(5));
        assert_eq!(p.delay_for(7), Duration::from_secs(5));
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let p = policy(BackoffKind::Exponential);
        let delays: Vec<_> = (1..=6).map(|n| p.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 40, 40]);
    }

    #[test]
    fn allows_exactly_max_retries() {
        let p = policy(BackoffKind::Fixed);
        assert!(p.allows(3));
        assert!(!p.allows(4));

        let none = ReconnectPolicy {
            max_retries: 0,
            ..p
        };
        assert!(!none.allows(1));
    }
}
