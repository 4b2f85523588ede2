// common/src/session.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Browser session tracked by the gateway via an HTTP-only cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    /// Stable identifier used in logs; never leaves the process
    pub id: Uuid,
    /// Opaque token carried in the session cookie
    pub token: String,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of last activity
    pub last_active: DateTime<Utc>,
    /// Whether the browser has passed the login form
    pub authenticated: bool,
    /// Path the browser asked for before being sent to the login form
    pub return_to: Option<String>,
}

impl GatewaySession {
    /// Create a new anonymous session
    pub fn new(token: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token,
            created_at: now,
            last_active: now,
            authenticated: false,
            return_to: None,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}
