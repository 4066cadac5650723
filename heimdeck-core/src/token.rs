// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque tokens, stored credentials and digest-based comparison.
//!
//! Secrets are never compared byte-by-byte: both sides are run through
//! SHA-256 first and the fixed-size digests are compared, which removes the
//! length/prefix timing channel of a plain string comparison.
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bytes of entropy behind a freshly generated token.
const TOKEN_ENTROPY: usize = 16;

fn random_hex() -> String {
    hex::encode(rand::random::<[u8; TOKEN_ENTROPY]>())
}

/// Compare two secrets without leaking where they diverge.
pub fn secrets_match(a: &str, b: &str) -> bool {
    Sha256::digest(a.as_bytes()) == Sha256::digest(b.as_bytes())
}

/// Opaque unguessable string identifying the single authorized session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(random_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time-ish comparison against a presented bearer value.
    pub fn matches(&self, presented: &str) -> bool {
        secrets_match(&self.0, presented)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Session tokens must not end up in logs.
        write!(f, "SessionToken(..)")
    }
}

/// Longer-lived pre-shared secret granting login without credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken(String);

impl DeviceToken {
    pub fn generate() -> Self {
        Self(random_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest under which this token is stored in the whitelist.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(&self.0)
    }
}

impl From<&str> for DeviceToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceToken(..)")
    }
}

/// Hex-encoded SHA-256 digest of a device token or password.
///
/// The whitelist persists digests only; legacy documents may still carry
/// plaintext entries, recognized by [`TokenDigest::looks_like_digest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDigest(String);

impl TokenDigest {
    pub fn of(secret: &str) -> Self {
        Self(hex::encode(Sha256::digest(secret.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a stored whitelist entry is already a digest (64 lowercase
    /// hex characters) rather than a legacy plaintext token.
    pub fn looks_like_digest(value: &str) -> bool {
        value.len() == 64
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }
}

impl From<String> for TokenDigest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Persisted login credentials; the password is stored as a digest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password_digest: TokenDigest,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password_digest: TokenDigest::of(password),
        }
    }

    pub fn check(&self, username: &str, password: &str) -> bool {
        secrets_match(username, &self.username)
            && TokenDigest::of(password) == self.password_digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(SessionToken::generate(), SessionToken::generate());
        assert_ne!(DeviceToken::generate(), DeviceToken::generate());
    }

    #[test]
    fn session_token_matches_presented_value() {
        let token = SessionToken::generate();
        assert!(token.matches(token.as_str()));
        assert!(!token.matches("somebody-else"));
    }

    #[test]
    fn digest_detection() {
        let digest = DeviceToken::generate().digest();
        assert!(TokenDigest::looks_like_digest(digest.as_str()));
        assert!(!TokenDigest::looks_like_digest("d81c2a0a-uuid-style-token"));
        // Uppercase hex is not a stored digest of ours.
        assert!(!TokenDigest::looks_like_digest(&"A".repeat(64)));
    }

    #[test]
    fn credentials_check() {
        let creds = Credentials::new("admin", "hunter2");
        assert!(creds.check("admin", "hunter2"));
        assert!(!creds.check("admin", "hunter3"));
        assert!(!creds.check("root", "hunter2"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let formatted = format!("{:?}", SessionToken::generate());
        assert_eq!(formatted, "SessionToken(..)");
    }
}
