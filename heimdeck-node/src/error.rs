// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy of the engine API.
use heimdeck_store::StoreError;
use thiserror::Error;

/// Everything an engine operation can fail with.
///
/// Rate-limit and credential failures carry actionable detail because they
/// gate a human retry. Token failures stay deliberately generic: a
/// superseded token is unrecoverable and the only remedy is a full
/// re-login.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Wrong username/password and no whitelisted token presented.
    #[error("invalid credentials, {attempts_left} attempts remaining")]
    InvalidCredentials { attempts_left: u32 },

    /// The client address is locked out.
    #[error("too many failed attempts, locked for {remaining_ms} ms")]
    RateLimited { remaining_ms: u64 },

    /// Missing or stale bearer token on a protected call.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The addressed row or id does not exist; nothing was written.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request field; rejected before touching the store.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Persisting the state document failed; the in-memory value was rolled
    /// back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine actor is gone.
    #[error("engine shut down")]
    Shutdown,
}

impl EngineError {
    /// HTTP status an outer handler should map this error to.
    pub fn status(&self) -> u16 {
        match self {
            EngineError::InvalidCredentials { .. } => 401,
            EngineError::RateLimited { .. } => 429,
            EngineError::Unauthenticated => 401,
            EngineError::NotFound(_) => 404,
            EngineError::ValidationFailed(_) => 400,
            EngineError::Store(_) | EngineError::Shutdown => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(EngineError::Unauthenticated.status(), 401);
        assert_eq!(
            EngineError::RateLimited { remaining_ms: 1 }.status(),
            429
        );
        assert_eq!(EngineError::NotFound("port".to_string()).status(), 404);
    }
}
