// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only, capped version history around the live value of one entity.
use heimdeck_core::version::version_label;
use heimdeck_core::{Clock, VersionEntry, VersionId};
use serde::{Deserialize, Serialize};

/// Maximum number of history entries kept per entity; appending beyond the
/// cap drops the oldest entry.
pub const MAX_VERSIONS: usize = 100;

/// Live value of one tracked entity plus its version history, newest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedEntity<S> {
    current: S,
    #[serde(default = "Vec::new")]
    history: Vec<VersionEntry<S>>,
}

impl<S> VersionedEntity<S>
where
    S: Clone + PartialEq,
{
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// Version entries, newest first.
    pub fn history(&self) -> &[VersionEntry<S>] {
        &self.history
    }

    pub fn newest(&self) -> Option<&VersionEntry<S>> {
        self.history.first()
    }

    pub fn find(&self, id: &VersionId) -> Option<&VersionEntry<S>> {
        self.history.iter().find(|entry| &entry.id == id)
    }

    /// Replace the live value, recording a version entry when it differs.
    ///
    /// A candidate equal to the current value is still stored (saves are
    /// idempotent) but never grows the history. The recorded snapshot is a
    /// deep copy: later mutation of the live value cannot alter it.
    pub fn apply(&mut self, summary: &str, next: S, clock: &dyn Clock) -> bool {
        if next == self.current {
            self.current = next;
            return false;
        }

        let timestamp = clock.now_ms();
        self.current = next.clone();
        self.history.insert(
            0,
            VersionEntry {
                id: VersionId::generate(),
                label: version_label(timestamp),
                summary: summary.to_string(),
                timestamp,
                snapshot: Some(next),
            },
        );
        self.history.truncate(MAX_VERSIONS);
        true
    }

    /// Build the candidate value by mutating a copy of the current one, then
    /// apply it. Returns whether a version entry was recorded.
    pub fn update(
        &mut self,
        summary: &str,
        clock: &dyn Clock,
        mutate: impl FnOnce(&mut S),
    ) -> bool {
        let mut next = self.current.clone();
        mutate(&mut next);
        self.apply(summary, next, clock)
    }
}
