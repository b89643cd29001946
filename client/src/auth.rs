//! Authentication provider seam.
//!
//! The store only needs to know whether a session is present and to be told
//! when that changes. Token refresh and sign-in flows live elsewhere.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Bearer token presented to the remote cart service
    pub access_token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Source of the current session and its changes.
pub trait AuthProvider: Send + Sync {
    /// The current session, if any.
    fn session(&self) -> Option<Session>;

    /// A receiver notified on every session change.
    fn watch(&self) -> watch::Receiver<Option<Session>>;
}

/// A session holder backed by a watch channel.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAuth {
    /// Create a provider with no session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Create a provider that starts signed in.
    pub fn signed_in(session: Session) -> Self {
        let auth = Self::new();
        auth.sign_in(session);
        auth
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(user_id = %session.user_id, "session started");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            tracing::info!(user_id = %previous.user_id, "session ended");
        }
    }
}

impl AuthProvider for SessionAuth {
    fn session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let auth = SessionAuth::new();
        assert!(auth.session().is_none());

        auth.sign_in(Session::new("user-1", "token-1"));
        assert_eq!(auth.session().unwrap().user_id, "user-1");

        auth.sign_out();
        assert!(auth.session().is_none());
    }

    #[test]
    fn watchers_see_changes() {
        let auth = SessionAuth::new();
        let mut rx = auth.watch();
        assert!(!rx.has_changed().unwrap());

        auth.sign_in(Session::new("user-1", "token-1"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("user-1", "secret-token");
        let debug = format!("{session:?}");
        assert!(debug.contains("user-1"));
        assert!(!debug.contains("secret-token"));
    }
}
