use dashmap::DashMap;

use super::state::{PlaybackSession, SessionSnapshot};
use crate::common::types::GuildId;

/// Guild -> session map. Every accessor runs its closure while holding the
/// shard lock and returns before any `.await` can happen.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, PlaybackSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the guild's session, creating it first if needed. The
    /// flag tells `f` whether the session was just created.
    pub fn get_or_create<R>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut PlaybackSession, bool) -> R,
    ) -> R {
        let mut created = false;
        let mut entry = self.sessions.entry(guild_id).or_insert_with(|| {
            created = true;
            PlaybackSession::new(guild_id)
        });
        f(entry.value_mut(), created)
    }

    pub fn with_session<R>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&mut PlaybackSession) -> R,
    ) -> Option<R> {
        self.sessions.get_mut(&guild_id).map(|mut s| f(s.value_mut()))
    }

    /// Like `with_session`, but only if the session is still on `generation`.
    pub fn with_current<R>(
        &self,
        guild_id: GuildId,
        generation: u64,
        f: impl FnOnce(&mut PlaybackSession) -> R,
    ) -> Option<R> {
        let mut session = self.sessions.get_mut(&guild_id)?;
        if !session.is_current(generation) {
            return None;
        }
        Some(f(session.value_mut()))
    }

    pub fn is_current(&self, guild_id: GuildId, generation: u64) -> bool {
        self.sessions
            .get(&guild_id)
            .is_some_and(|s| s.is_current(generation))
    }

    /// Idempotent.
    pub fn remove(&self, guild_id: GuildId) -> Option<PlaybackSession> {
        self.sessions.remove(&guild_id).map(|(_, s)| s)
    }

    /// Removes the session only if nothing newer has claimed it.
    pub fn remove_if_current(&self, guild_id: GuildId, generation: u64) -> bool {
        self.sessions
            .remove_if(&guild_id, |_, s| s.is_current(generation))
            .is_some()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SessionSnapshot> {
        self.sessions.get(&guild_id).map(|s| s.snapshot())
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::state::SessionState;

    #[test]
    fn get_or_create_reports_creation_once() {
        let registry = SessionRegistry::new();
        assert!(registry.get_or_create(GuildId(1), |_, created| created));
        assert!(!registry.get_or_create(GuildId(1), |_, created| created));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_generation_is_rejected() {
        let registry = SessionRegistry::new();
        registry.get_or_create(GuildId(1), |s, _| s.begin_attempt(5));

        assert!(registry.with_current(GuildId(1), 4, |_| ()).is_none());
        assert_eq!(
            registry.with_current(GuildId(1), 5, |s| s.state),
            Some(SessionState::Connecting)
        );
        assert!(!registry.remove_if_current(GuildId(1), 4));
        assert!(registry.contains(GuildId(1)));
        assert!(registry.remove_if_current(GuildId(1), 5));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.get_or_create(GuildId(9), |_, _| ());
        assert!(registry.remove(GuildId(9)).is_some());
        assert!(registry.remove(GuildId(9)).is_none());
        assert!(registry.get(GuildId(9)).is_none());
    }
}
