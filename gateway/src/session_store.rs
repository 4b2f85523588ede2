// gateway/src/session_store.rs
use common::GatewaySession;
use dashmap::DashMap;
use std::sync::Arc;

use crate::utils::token::create_session_token;

/// Process-wide keyed session store.
///
/// Sessions are created on first touch, mutated on login and on denied
/// navigation, and destroyed on logout. There is no expiry: lifetime is
/// bound to the browser-session cookie and process memory. The trait keeps
/// call sites independent of the backing store, so a distributed store can
/// be substituted without touching handlers or middleware.
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new anonymous session and return a snapshot of it
    fn create(&self) -> GatewaySession;

    /// Look up a session by token, refreshing its activity timestamp
    fn get(&self, token: &str) -> Option<GatewaySession>;

    /// Flip the authenticated flag; returns false if the token is unknown
    fn set_authenticated(&self, token: &str, authenticated: bool) -> bool;

    /// Record (or clear) the intended post-login destination
    fn set_return_to(&self, token: &str, return_to: Option<String>) -> bool;

    /// Remove the session entirely; returns false if the token is unknown
    fn destroy(&self, token: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store backed by a concurrent map
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, GatewaySession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> GatewaySession {
        let session = GatewaySession::new(create_session_token());
        self.sessions.insert(session.token.clone(), session.clone());

        tracing::debug!("Created new session: {}", session.id);
        session
    }

    fn get(&self, token: &str) -> Option<GatewaySession> {
        let mut entry = self.sessions.get_mut(token)?;
        let session = entry.value_mut();
        session.touch();
        Some(session.clone())
    }

    fn set_authenticated(&self, token: &str, authenticated: bool) -> bool {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            let session = entry.value_mut();
            session.authenticated = authenticated;
            session.touch();

            tracing::info!(
                "Session {} is now {}",
                session.id,
                if authenticated { "authenticated" } else { "anonymous" }
            );
            true
        } else {
            tracing::debug!("Session not found for token");
            false
        }
    }

    fn set_return_to(&self, token: &str, return_to: Option<String>) -> bool {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            let session = entry.value_mut();
            session.return_to = return_to;
            session.touch();
            true
        } else {
            false
        }
    }

    fn destroy(&self, token: &str) -> bool {
        if let Some((_, session)) = self.sessions.remove(token) {
            tracing::info!("Destroyed session: {}", session.id);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
