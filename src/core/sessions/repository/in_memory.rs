//! The active peer table.
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::core::sessions::session::Session;
use crate::core::sessions::token::SessionToken;

/// Error returned when a session cannot be inserted: either every slot is
/// taken or the user name is already present.
#[derive(Debug, Error)]
#[error("no free session slot for {user_name}")]
pub struct SlotRejected {
    pub user_name: String,
}

/// In-memory bounded table of logged-in peers.
///
/// The table holds at most `capacity` sessions in a fixed slot vector, all
/// guarded by a single mutex. Snapshots returned by [`list`](Self::list)
/// are deep copies, safe to iterate after the lock is released.
#[derive(Debug)]
pub struct ActivePeerTable {
    slots: Mutex<Vec<Option<Session>>>,
}

impl ActivePeerTable {
    /// It creates a table with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; capacity]),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<Session>>> {
        self.slots.lock().expect("it should be able to lock the active peer table")
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn has_space(&self) -> bool {
        self.lock().iter().any(|slot| slot.is_none())
    }

    /// It inserts the session into the first free slot.
    ///
    /// # Errors
    ///
    /// Will return [`SlotRejected`] if every slot is occupied or a session
    /// under the same name is already present.
    pub fn add(&self, session: Session) -> Result<(), SlotRejected> {
        let mut slots = self.lock();

        if slots
            .iter()
            .flatten()
            .any(|occupant| occupant.user_name() == session.user_name())
        {
            return Err(SlotRejected {
                user_name: session.user_name().to_string(),
            });
        }

        match slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(session);
                Ok(())
            }
            None => Err(SlotRejected {
                user_name: session.user_name().to_string(),
            }),
        }
    }

    /// It removes the session only if both name and token match, returning
    /// the removed record.
    pub fn remove(&self, user_name: &str, token: &SessionToken) -> Option<Session> {
        let mut slots = self.lock();

        for slot in slots.iter_mut() {
            if let Some(session) = slot {
                if session.user_name() == user_name && session.token() == token {
                    return slot.take();
                }
            }
        }

        None
    }

    #[must_use]
    pub fn find(&self, user_name: &str) -> Option<Session> {
        self.lock()
            .iter()
            .flatten()
            .find(|session| session.user_name() == user_name)
            .cloned()
    }

    /// It accepts the credentials iff a session under `user_name` exists
    /// and the supplied token equals the stored one byte for byte.
    #[must_use]
    pub fn verify(&self, user_name: &str, token: &SessionToken) -> bool {
        self.lock()
            .iter()
            .flatten()
            .any(|session| session.user_name() == user_name && session.token() == token)
    }

    #[must_use]
    pub fn contains_token(&self, token: &SessionToken) -> bool {
        self.lock().iter().flatten().any(|session| session.token() == token)
    }

    /// It refreshes the liveness stamp of the named session.
    pub fn touch(&self, user_name: &str) -> bool {
        let mut slots = self.lock();

        for session in slots.iter_mut().flatten() {
            if session.user_name() == user_name {
                session.touch();
                return true;
            }
        }

        false
    }

    /// It swaps the token of the matching session in one atomic step, so a
    /// concurrent login cannot steal the slot between removal and
    /// re-insertion.
    pub fn rotate_token(&self, user_name: &str, old_token: &SessionToken, new_token: SessionToken) -> bool {
        let mut slots = self.lock();

        for session in slots.iter_mut().flatten() {
            if session.user_name() == user_name && session.token() == old_token {
                session.rotate_token(new_token);
                return true;
            }
        }

        false
    }

    /// Deep-copied snapshot of the live sessions.
    #[must_use]
    pub fn list(&self) -> Vec<Session> {
        self.lock().iter().flatten().cloned().collect()
    }

    /// It evicts every session idle for longer than `threshold` and
    /// returns the evicted records. Snapshot, comparison and removal happen
    /// under one lock acquisition.
    pub fn remove_stale(&self, threshold: Duration) -> Vec<Session> {
        let mut slots = self.lock();
        let mut evicted = Vec::new();

        for slot in slots.iter_mut() {
            let stale = slot.as_ref().is_some_and(|session| session.idle_for() > threshold);
            if stale {
                if let Some(session) = slot.take() {
                    evicted.push(session);
                }
            }
        }

        evicted
    }
}
