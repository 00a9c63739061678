//! Session management.
//!
//! The [`SessionManager`] is the authentication gate of the tracker. It
//! issues session tokens on login, rotates them on resume, tracks liveness
//! through heartbeats and removes sessions on disconnect. Every other
//! tracker operation authenticates against the live session table before
//! doing anything else.
//!
//! A user name may have at most one live session at a time. Sessions are
//! ephemeral: they live in the [`ActivePeerTable`] and die with the
//! process; only the account row (name, password verifier, last known
//! ip/port) is durable.
pub mod password;
pub mod repository;
pub mod session;
pub mod token;

use std::sync::Arc;

use repository::in_memory::ActivePeerTable;
use repository::persisted::DatabaseUserRepository;
use session::Session;
use token::SessionToken;

use super::databases::UserRecord;
use super::error::OperationError;

/// How a successful login was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    /// A new account row was created. Wire tag `NEW`.
    New,
    /// The account existed and its ip or port was brought up to date.
    /// Wire tag `UPDATE`.
    Updated,
    /// The account existed and nothing had changed. Wire tag `OK`.
    Unchanged,
}

/// A successful login: the issued token plus its classification.
#[derive(Debug)]
pub struct LoginGrant {
    pub token: SessionToken,
    pub status: LoginStatus,
}

/// A successful resume: the replacement token, and whether ip or port was
/// brought up to date on the way.
#[derive(Debug)]
pub struct ResumeGrant {
    pub token: SessionToken,
    pub updated: bool,
}

pub struct SessionManager {
    active_peers: Arc<ActivePeerTable>,
    user_repository: Arc<DatabaseUserRepository>,
}

impl SessionManager {
    #[must_use]
    pub fn new(active_peers: &Arc<ActivePeerTable>, user_repository: &Arc<DatabaseUserRepository>) -> Self {
        Self {
            active_peers: active_peers.clone(),
            user_repository: user_repository.clone(),
        }
    }

    /// It connects a peer to the tracker.
    ///
    /// An unknown name creates the account row first and then the session;
    /// if either step fails no session exists afterwards. A known name must
    /// present the right password, and its stored ip/port are brought up to
    /// date before the session is added (one storage update per changed
    /// field).
    ///
    /// # Errors
    ///
    /// - [`OperationError::Full`] when no session slot is free.
    /// - [`OperationError::Duplicate`] when a live session already exists
    ///   under `name`.
    /// - [`OperationError::Password`] when the password does not match the
    ///   stored verifier.
    /// - [`OperationError::Storage`] when the store rejects a step.
    pub fn login(&self, name: &str, password: &str, ip: &str, port: u16) -> Result<LoginGrant, OperationError> {
        if !self.active_peers.has_space() {
            return Err(OperationError::Full);
        }

        if self.active_peers.find(name).is_some() {
            return Err(OperationError::Duplicate);
        }

        let stored = self.user_repository.fetch(name)?;
        let token = self.issue_token();

        match stored {
            None => {
                let password_hash = password::derive_verifier(password)
                    .map_err(|e| OperationError::Internal(format!("could not derive password verifier: {e}")))?;

                self.user_repository.insert(&UserRecord {
                    name: name.to_string(),
                    password_hash,
                    ip: ip.to_string(),
                    port,
                })?;

                self.add_session(name, &token)?;

                tracing::info!(user = name, "new user registered and connected");

                Ok(LoginGrant {
                    token,
                    status: LoginStatus::New,
                })
            }
            Some(user) => {
                if !password::matches(password, &user.password_hash) {
                    return Err(OperationError::Password);
                }

                let updated = self.reconcile_endpoint(&user, ip, port)?;

                self.add_session(name, &token)?;

                let status = if updated {
                    tracing::info!(user = name, "user connected, endpoint updated");
                    LoginStatus::Updated
                } else {
                    tracing::info!(user = name, "user connected, information up to date");
                    LoginStatus::Unchanged
                };

                Ok(LoginGrant { token, status })
            }
        }
    }

    /// It re-authenticates a peer whose transport dropped while its
    /// server-side session still lives. On success the old token is dead:
    /// the session carries a fresh one from here on.
    ///
    /// # Errors
    ///
    /// - [`OperationError::Credentials`] when no live session matches
    ///   `(name, token)` exactly.
    /// - [`OperationError::Storage`] when the store rejects a step.
    pub fn resume(&self, token: &SessionToken, name: &str, ip: &str, port: u16) -> Result<ResumeGrant, OperationError> {
        if !self.active_peers.verify(name, token) {
            return Err(OperationError::Credentials);
        }

        let user = self
            .user_repository
            .fetch(name)?
            .ok_or_else(|| OperationError::Internal(format!("no stored account for live session of {name}")))?;

        let updated = self.reconcile_endpoint(&user, ip, port)?;

        let fresh = self.issue_token();

        if !self.active_peers.rotate_token(name, token, fresh.clone()) {
            return Err(OperationError::Credentials);
        }

        tracing::info!(user = name, "session resumed with a fresh token");

        Ok(ResumeGrant { token: fresh, updated })
    }

    /// It removes the session of an authenticated peer.
    ///
    /// # Errors
    ///
    /// Will return [`OperationError::Credentials`] when `(name, token)`
    /// matches no live session.
    pub fn disconnect(&self, token: &SessionToken, name: &str) -> Result<(), OperationError> {
        match self.active_peers.remove(name, token) {
            Some(_) => {
                tracing::info!(user = name, "user disconnected");
                Ok(())
            }
            None => Err(OperationError::Credentials),
        }
    }

    /// It refreshes the liveness stamp of an authenticated peer, pushing
    /// the reaper's eviction horizon out.
    ///
    /// # Errors
    ///
    /// Will return [`OperationError::Credentials`] when `(name, token)`
    /// matches no live session.
    pub fn heartbeat(&self, token: &SessionToken, name: &str) -> Result<(), OperationError> {
        if !self.active_peers.verify(name, token) {
            return Err(OperationError::Credentials);
        }

        self.active_peers.touch(name);

        Ok(())
    }

    fn add_session(&self, name: &str, token: &SessionToken) -> Result<(), OperationError> {
        self.active_peers
            .add(Session::new(name, token.clone()))
            .map_err(|_| OperationError::Full)
    }

    /// One storage update per changed field, so a lone port change does not
    /// rewrite the ip.
    fn reconcile_endpoint(&self, user: &UserRecord, ip: &str, port: u16) -> Result<bool, OperationError> {
        let mut changed = false;

        if user.ip != ip {
            self.user_repository.update_ip(&user.name, ip)?;
            changed = true;
        }

        if user.port != port {
            self.user_repository.update_port(&user.name, port)?;
            changed = true;
        }

        Ok(changed)
    }

    /// Fresh tokens are checked against the live table and regenerated on
    /// the (astronomically unlikely) collision.
    fn issue_token(&self) -> SessionToken {
        loop {
            let token = SessionToken::random();
            if !self.active_peers.contains_token(&token) {
                return token;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::repository::in_memory::ActivePeerTable;
    use super::repository::persisted::DatabaseUserRepository;
    use super::token::SessionToken;
    use super::{LoginStatus, SessionManager};
    use crate::core::databases::sqlite::Sqlite3;
    use crate::core::databases::Database;
    use crate::core::error::OperationError;

    fn instantiate_session_manager(capacity: usize) -> (SessionManager, Arc<ActivePeerTable>) {
        let database: Arc<Box<dyn Database>> = Arc::new(Box::new(
            Sqlite3::new(":memory:").expect("it should open an in-memory database"),
        ));
        database.setup_schema().expect("it should create the schema");

        let active_peers = Arc::new(ActivePeerTable::new(capacity));
        let user_repository = Arc::new(DatabaseUserRepository::new(&database));

        (SessionManager::new(&active_peers, &user_repository), active_peers)
    }

    mod handling_a_login_request {
        use super::{instantiate_session_manager, LoginStatus, OperationError};

        #[test]
        fn it_should_register_and_connect_an_unknown_user() {
            let (manager, active_peers) = instantiate_session_manager(3);

            let grant = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            assert_eq!(grant.status, LoginStatus::New);
            assert!(active_peers.verify("alice", &grant.token));
        }

        #[test]
        fn it_should_accept_a_returning_user_with_an_unchanged_endpoint() {
            let (manager, _active_peers) = instantiate_session_manager(3);

            let first = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();
            manager.disconnect(&first.token, "alice").unwrap();

            let second = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            assert_eq!(second.status, LoginStatus::Unchanged);
        }

        #[test]
        fn it_should_report_an_update_when_ip_or_port_changed() {
            let (manager, _active_peers) = instantiate_session_manager(3);

            let first = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();
            manager.disconnect(&first.token, "alice").unwrap();

            let second = manager.login("alice", "pw123456", "10.0.0.2", 1053).unwrap();

            assert_eq!(second.status, LoginStatus::Updated);
        }

        #[test]
        fn it_should_reject_a_wrong_password() {
            let (manager, active_peers) = instantiate_session_manager(3);

            let first = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();
            manager.disconnect(&first.token, "alice").unwrap();

            let outcome = manager.login("alice", "wrong-pass", "10.0.0.1", 1052);

            assert!(matches!(outcome, Err(OperationError::Password)));
            assert!(active_peers.is_empty());
        }

        #[test]
        fn it_should_reject_a_second_login_under_the_same_name() {
            let (manager, _active_peers) = instantiate_session_manager(3);

            manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let outcome = manager.login("alice", "pw123456", "10.0.0.2", 1053);

            assert!(matches!(outcome, Err(OperationError::Duplicate)));
        }

        #[test]
        fn it_should_reject_logins_past_capacity() {
            let (manager, _active_peers) = instantiate_session_manager(1);

            manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let outcome = manager.login("bob", "pw123456", "10.0.0.2", 1053);

            assert!(matches!(outcome, Err(OperationError::Full)));
        }

        #[test]
        fn it_should_issue_a_token_unused_by_any_live_session() {
            let (manager, active_peers) = instantiate_session_manager(3);

            let first = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();
            let second = manager.login("bob", "pw123456", "10.0.0.2", 1053).unwrap();

            assert_ne!(first.token, second.token);
            assert_eq!(active_peers.len(), 2);
        }
    }

    mod handling_a_resume_request {
        use super::{instantiate_session_manager, OperationError, SessionToken};

        #[test]
        fn it_should_rotate_the_token_and_invalidate_the_old_one() {
            let (manager, active_peers) = instantiate_session_manager(3);
            let grant = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let resumed = manager.resume(&grant.token, "alice", "10.0.0.1", 1052).unwrap();

            assert_ne!(resumed.token, grant.token);
            assert!(!active_peers.verify("alice", &grant.token));
            assert!(active_peers.verify("alice", &resumed.token));
            assert!(!resumed.updated);
        }

        #[test]
        fn it_should_reconcile_the_endpoint_on_resume() {
            let (manager, _active_peers) = instantiate_session_manager(3);
            let grant = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let resumed = manager.resume(&grant.token, "alice", "10.0.0.9", 1052).unwrap();

            assert!(resumed.updated);
        }

        #[test]
        fn it_should_reject_a_token_name_mismatch() {
            let (manager, _active_peers) = instantiate_session_manager(3);
            manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let outcome = manager.resume(&SessionToken::from("bogus"), "alice", "10.0.0.1", 1052);

            assert!(matches!(outcome, Err(OperationError::Credentials)));
        }

        #[test]
        fn it_should_reject_a_resume_without_a_live_session() {
            let (manager, _active_peers) = instantiate_session_manager(3);

            let outcome = manager.resume(&SessionToken::from("bogus"), "ghost", "10.0.0.1", 1052);

            assert!(matches!(outcome, Err(OperationError::Credentials)));
        }
    }

    mod handling_disconnect_and_heartbeat {
        use super::{instantiate_session_manager, OperationError, SessionToken};

        #[test]
        fn it_should_remove_the_session_on_disconnect() {
            let (manager, active_peers) = instantiate_session_manager(3);
            let grant = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            manager.disconnect(&grant.token, "alice").unwrap();

            assert!(active_peers.is_empty());
        }

        #[test]
        fn it_should_reject_a_disconnect_with_the_wrong_token() {
            let (manager, _active_peers) = instantiate_session_manager(3);
            manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let outcome = manager.disconnect(&SessionToken::from("bogus"), "alice");

            assert!(matches!(outcome, Err(OperationError::Credentials)));
        }

        #[test]
        fn it_should_refresh_liveness_on_heartbeat() {
            let (manager, _active_peers) = instantiate_session_manager(3);
            let grant = manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            assert!(manager.heartbeat(&grant.token, "alice").is_ok());
        }

        #[test]
        fn it_should_reject_a_heartbeat_with_the_wrong_token() {
            let (manager, _active_peers) = instantiate_session_manager(3);
            manager.login("alice", "pw123456", "10.0.0.1", 1052).unwrap();

            let outcome = manager.heartbeat(&SessionToken::from("bogus"), "alice");

            assert!(matches!(outcome, Err(OperationError::Credentials)));
        }
    }
}
