// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalating per-address login rate limiting.
//!
//! State is purely in memory and never persisted: a process restart clears
//! all lockouts. The limiter is itself the backoff mechanism, there is no
//! further retry logic behind it.
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use heimdeck_core::Clock;
use tracing::warn;

/// Failed attempts allowed before an address gets locked out.
pub const MAX_ATTEMPTS: u32 = 5;

/// Base lockout duration; multiplied by the address's lockout level.
pub const BASE_LOCKOUT_MS: u64 = 5 * 60 * 1000;

/// Records older than this with no pending failures are dropped by
/// [`RateLimiter::purge_stale`].
pub const PURGE_AFTER_MS: u64 = 60 * 60 * 1000;

#[derive(Clone, Copy, Debug)]
struct AttemptRecord {
    fail_count: u32,
    locked_until: u64,
    lockout_level: u32,
}

impl Default for AttemptRecord {
    fn default() -> Self {
        Self {
            fail_count: 0,
            locked_until: 0,
            lockout_level: 1,
        }
    }
}

/// Whether an address is currently locked out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
    pub remaining_ms: u64,
}

/// Result of recording one failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The attempt tripped the threshold; the address is now locked.
    LockedOut { lockout_ms: u64 },
    /// Still below the threshold.
    AttemptsLeft(u32),
}

/// Tracks failed-login state per client address.
///
/// Callers must consult [`RateLimiter::check_locked`] before verifying
/// credentials and reject locked addresses without consuming an attempt.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    table: HashMap<IpAddr, AttemptRecord>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            table: HashMap::new(),
        }
    }

    /// Whether `addr` is locked out right now, and for how much longer.
    pub fn check_locked(&self, addr: IpAddr) -> LockStatus {
        let now = self.clock.now_ms();
        match self.table.get(&addr) {
            Some(record) if record.locked_until > now => LockStatus {
                locked: true,
                remaining_ms: record.locked_until - now,
            },
            _ => LockStatus {
                locked: false,
                remaining_ms: 0,
            },
        }
    }

    /// Record one failed password attempt from `addr`.
    ///
    /// Reaching [`MAX_ATTEMPTS`] locks the address for
    /// `BASE_LOCKOUT_MS * lockout_level` and bumps the level, so repeated
    /// lock cycles escalate: 5 min, 10 min, 15 min, ...
    pub fn record_failure(&mut self, addr: IpAddr) -> FailureOutcome {
        let now = self.clock.now_ms();
        let record = self.table.entry(addr).or_default();
        record.fail_count += 1;

        if record.fail_count >= MAX_ATTEMPTS {
            let lockout_ms = BASE_LOCKOUT_MS * u64::from(record.lockout_level);
            record.locked_until = now + lockout_ms;
            record.lockout_level += 1;
            record.fail_count = 0;
            warn!(%addr, lockout_ms, "address locked out after repeated login failures");
            return FailureOutcome::LockedOut { lockout_ms };
        }

        FailureOutcome::AttemptsLeft(MAX_ATTEMPTS - record.fail_count)
    }

    /// Fully reset the record for `addr`; called only after a verified
    /// successful login from that address.
    pub fn reset(&mut self, addr: IpAddr) {
        self.table.insert(addr, AttemptRecord::default());
    }

    /// Drop records whose lockout expired more than [`PURGE_AFTER_MS`] ago
    /// and that carry no pending failures. Returns how many were removed.
    pub fn purge_stale(&mut self) -> usize {
        let cutoff = self.clock.now_ms().saturating_sub(PURGE_AFTER_MS);
        let before = self.table.len();
        self.table
            .retain(|_, record| record.fail_count > 0 || record.locked_until >= cutoff);
        before - self.table.len()
    }
}
