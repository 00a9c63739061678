//! The live session record.
use std::time::{Duration, Instant};

use super::token::SessionToken;

/// A live association between a peer and the tracker.
///
/// Sessions exist only in memory: they are created by login or resume,
/// refreshed by heartbeats, and destroyed by disconnect, reaper eviction or
/// process exit.
#[derive(Debug, Clone)]
pub struct Session {
    user_name: String,
    token: SessionToken,
    /// Monotonic instant of the last heartbeat (or creation).
    last_active: Instant,
}

impl Session {
    #[must_use]
    pub fn new(user_name: &str, token: SessionToken) -> Self {
        Self {
            user_name: user_name.to_string(),
            token,
            last_active: Instant::now(),
        }
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// It marks the session as just seen. `last_active` is monotonic
    /// non-decreasing because it comes from [`Instant::now`].
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// It swaps in a fresh token, refreshing the liveness stamp.
    pub fn rotate_token(&mut self, token: SessionToken) {
        self.token = token;
        self.touch();
    }

    /// Time since the last heartbeat.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Session;
    use crate::core::sessions::token::SessionToken;

    #[test]
    fn it_should_start_with_a_fresh_liveness_stamp() {
        let session = Session::new("alice", SessionToken::random());

        assert!(session.idle_for() < Duration::from_secs(1));
    }

    #[test]
    fn it_should_carry_the_new_token_after_rotation() {
        let mut session = Session::new("alice", SessionToken::from("old"));

        session.rotate_token(SessionToken::from("new"));

        assert_eq!(session.token(), &SessionToken::from("new"));
    }
}
