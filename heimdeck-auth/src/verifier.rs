// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential and device-token verification.
use heimdeck_core::{Credentials, TokenDigest};

/// Which accept path admitted a login attempt.
///
/// The two paths are independent and either one is sufficient. Token
/// matches bypass the rate limiter entirely (device tokens are long,
/// high-entropy and provisioned out of band); only password rejections feed
/// it. Keeping this an explicit enum keeps that asymmetry auditable at the
/// call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The presented device token is whitelisted; username and password were
    /// not consulted at all.
    TokenMatch {
        /// Label from the external token list, used as the session's device
        /// label when present.
        label: Option<String>,
        /// The matching whitelist entry is still stored as plaintext and
        /// should be migrated to its digest.
        legacy: bool,
    },
    /// Username and password both matched the stored credentials.
    PasswordMatch,
    Rejected,
}

/// One entry of the externally provisioned token list: a label naming the
/// device plus the token's digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenListEntry {
    pub label: String,
    pub digest: TokenDigest,
}

/// Check a login attempt against the whitelist and the stored credentials.
///
/// `whitelist` entries are token digests, with legacy plaintext entries
/// still accepted; `token_list` holds externally provisioned labelled
/// tokens (already digested).
pub fn verify(
    credentials: &Credentials,
    whitelist: &[String],
    token_list: &[TokenListEntry],
    username: Option<&str>,
    password: Option<&str>,
    device_token: Option<&str>,
) -> AuthOutcome {
    if let Some(token) = device_token.filter(|t| !t.is_empty()) {
        let digest = TokenDigest::of(token);

        let mut legacy = false;
        let whitelisted = whitelist.iter().any(|entry| {
            if TokenDigest::looks_like_digest(entry) {
                entry == digest.as_str()
            } else if heimdeck_core::token::secrets_match(entry, token) {
                legacy = true;
                true
            } else {
                false
            }
        });
        if whitelisted {
            return AuthOutcome::TokenMatch {
                label: None,
                legacy,
            };
        }

        if let Some(entry) = token_list.iter().find(|entry| entry.digest == digest) {
            return AuthOutcome::TokenMatch {
                label: Some(entry.label.clone()),
                legacy: false,
            };
        }
    }

    match (username, password) {
        (Some(username), Some(password))
            if !password.is_empty() && credentials.check(username, password) =>
        {
            AuthOutcome::PasswordMatch
        }
        _ => AuthOutcome::Rejected,
    }
}
