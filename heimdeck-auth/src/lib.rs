// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login gatekeeping for the heimdeck dashboard.
//!
//! Three pieces, applied in order on every login attempt: the
//! [`RateLimiter`] decides whether the client address may try at all, the
//! [`verifier`] decides whether the presented secrets are acceptable, and
//! the [`SessionRegistry`] turns an accepted attempt into the single live
//! session.
pub mod rate_limit;
pub mod session;
pub mod verifier;

pub use rate_limit::{FailureOutcome, LockStatus, RateLimiter};
pub use session::{Session, SessionRegistry};
pub use verifier::{AuthOutcome, TokenListEntry, verify};
