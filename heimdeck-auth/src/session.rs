// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-owner session registry.
//!
//! At most one session exists process-wide. Issuing a new one atomically
//! invalidates the previous token for all authorization checks; the caller
//! is handed the replaced session so it can notify the evicted client.
use std::sync::Arc;

use heimdeck_core::{Clock, SessionToken};
use tracing::debug;

/// Sliding idle window: an authenticated call pushes expiry this far out.
pub const SESSION_IDLE_MS: u64 = 24 * 60 * 60 * 1000;

/// Absolute cap, measured from login; the idle window cannot extend a
/// session past it.
pub const SESSION_MAX_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// The single live session.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: SessionToken,
    pub device_label: String,
    pub login_at: u64,
    pub expires_at: u64,
}

/// Holds the at-most-one active session and issues opaque tokens.
pub struct SessionRegistry {
    clock: Arc<dyn Clock>,
    active: Option<Session>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            active: None,
        }
    }

    /// Issue a fresh session, returning it together with the session it
    /// replaced (if one was still alive).
    pub fn login(&mut self, device_label: &str) -> (Session, Option<Session>) {
        let login_at = self.clock.now_ms();
        let session = Session {
            token: SessionToken::generate(),
            device_label: device_label.to_string(),
            login_at,
            expires_at: login_at + SESSION_IDLE_MS,
        };
        // Expired leftovers are not worth notifying.
        let previous = self.current().cloned();
        if let Some(prev) = &previous {
            debug!(device = %prev.device_label, "evicting previous session");
        }
        self.active = Some(session.clone());
        (session, previous)
    }

    /// Drop the active session. No notification is sent on logout.
    pub fn logout(&mut self) {
        self.active = None;
    }

    /// The live session, dropping it first if it expired.
    pub fn current(&mut self) -> Option<&Session> {
        let now = self.clock.now_ms();
        let expired = self.active.as_ref().is_some_and(|session| {
            now > session.expires_at || now.saturating_sub(session.login_at) > SESSION_MAX_MS
        });
        if expired {
            self.active = None;
        }
        self.active.as_ref()
    }

    /// Whether `presented` is the live session's token.
    pub fn is_valid(&mut self, presented: &str) -> bool {
        self.current()
            .is_some_and(|session| session.token.matches(presented))
    }

    /// Validate a bearer token and, on success, push the sliding expiry out.
    pub fn authorize(&mut self, presented: &str) -> bool {
        if !self.is_valid(presented) {
            return false;
        }
        let expires_at = self.clock.now_ms() + SESSION_IDLE_MS;
        if let Some(session) = &mut self.active {
            session.expires_at = expires_at;
        }
        true
    }
}
