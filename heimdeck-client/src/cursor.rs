// SPDX-License-Identifier: MIT OR Apache-2.0

//! "Follow latest vs. pinned" read cursor, one per tracked entity.
use heimdeck_core::{VersionEntry, VersionId};

/// What drives a cursor transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorEvent {
    /// The user explicitly picked an entry from the history list.
    Selected { id: VersionId },
    /// A fresh version list arrived (login bootstrap or a pushed update).
    NewHead,
}

/// Where the view should render the entity's value from.
#[derive(Debug, PartialEq)]
pub enum RenderSource<'a, S> {
    /// Render from the always-fresh live value, not the head's stored
    /// snapshot: the two are written together, but the live value may be
    /// mid-edit on the editing client.
    Live,
    /// Render from an older entry's stored snapshot, read-only.
    Snapshot(&'a S),
    /// The targeted entry has no snapshot; show a "no data" placeholder.
    Placeholder,
}

/// Per-entity read cursor: either follows the newest version automatically
/// or stays pinned to one the user selected.
///
/// Invariant: `follow_latest` is true iff the cursor targets the newest
/// entry's id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewCursor {
    active: Option<VersionId>,
    follow_latest: bool,
}

impl Default for ViewCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCursor {
    pub fn new() -> Self {
        Self {
            active: None,
            follow_latest: true,
        }
    }

    pub fn active(&self) -> Option<&VersionId> {
        self.active.as_ref()
    }

    pub fn follows_latest(&self) -> bool {
        self.follow_latest
    }

    /// Apply one event against the current version list (newest first) and
    /// resolve where to render from.
    ///
    /// Selecting an id absent from the list is not an error: it resolves as
    /// "not found" and the cursor re-targets the newest entry.
    pub fn apply<'a, S>(
        &mut self,
        event: CursorEvent,
        versions: &'a [VersionEntry<S>],
    ) -> RenderSource<'a, S> {
        let Some(newest) = versions.first() else {
            // Empty history: nothing to pin to, keep showing the live value.
            self.active = None;
            self.follow_latest = true;
            return RenderSource::Live;
        };

        let target = match event {
            CursorEvent::Selected { id } => {
                if versions.iter().any(|v| v.id == id) {
                    id
                } else {
                    // Selecting a pruned entry loses any previous pin.
                    newest.id.clone()
                }
            }
            // Keep the previous pin only if it still exists and the cursor
            // is not following.
            CursorEvent::NewHead => {
                let keep_pin = !self.follow_latest
                    && self
                        .active
                        .as_ref()
                        .is_some_and(|id| versions.iter().any(|v| &v.id == id));
                if keep_pin {
                    self.active.clone().expect("pin checked above")
                } else {
                    newest.id.clone()
                }
            }
        };

        self.follow_latest = target == newest.id;
        self.active = Some(target.clone());

        if self.follow_latest {
            return RenderSource::Live;
        }
        let entry = versions
            .iter()
            .find(|v| v.id == target)
            .expect("target resolved from the list");
        match &entry.snapshot {
            Some(snapshot) => RenderSource::Snapshot(snapshot),
            None => RenderSource::Placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use heimdeck_core::version::version_label;

    use super::*;

    fn versions(ids: &[&str]) -> Vec<VersionEntry<String>> {
        // Newest first, like the store serves them.
        ids.iter()
            .enumerate()
            .map(|(idx, id)| VersionEntry {
                id: VersionId::from(*id),
                label: version_label(1_714_566_645_000),
                summary: format!("change {idx}"),
                timestamp: 1_714_566_645_000 - idx as u64,
                snapshot: Some(format!("snapshot-{id}")),
            })
            .collect()
    }

    #[test]
    fn empty_history_renders_live() {
        let mut cursor = ViewCursor::new();
        let list = Vec::<VersionEntry<String>>::new();
        let source = cursor.apply(CursorEvent::NewHead, &list);
        assert_eq!(source, RenderSource::Live);
        assert!(cursor.active().is_none());
        assert!(cursor.follows_latest());
    }

    #[test]
    fn following_cursor_tracks_new_head() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h0"]);
        assert_eq!(cursor.apply(CursorEvent::NewHead, &list), RenderSource::Live);
        assert_eq!(cursor.active().unwrap().as_str(), "h0");

        // A new head arrives; the cursor moves with it and renders live.
        let list = versions(&["h1", "h0"]);
        assert_eq!(cursor.apply(CursorEvent::NewHead, &list), RenderSource::Live);
        assert_eq!(cursor.active().unwrap().as_str(), "h1");
        assert!(cursor.follows_latest());
    }

    #[test]
    fn manual_pin_survives_new_head() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h1", "h0"]);
        cursor.apply(CursorEvent::NewHead, &list);

        let source = cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h0"),
            },
            &list,
        );
        assert_eq!(source, RenderSource::Snapshot(&"snapshot-h0".to_string()));
        assert!(!cursor.follows_latest());

        let list = versions(&["h2", "h1", "h0"]);
        let source = cursor.apply(CursorEvent::NewHead, &list);
        assert_eq!(source, RenderSource::Snapshot(&"snapshot-h0".to_string()));
        assert_eq!(cursor.active().unwrap().as_str(), "h0");
    }

    #[test]
    fn selecting_the_newest_resumes_following() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h1", "h0"]);
        cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h0"),
            },
            &list,
        );
        assert!(!cursor.follows_latest());

        // Re-selecting the head renders live, not its stored snapshot.
        let source = cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h1"),
            },
            &list,
        );
        assert_eq!(source, RenderSource::Live);
        assert!(cursor.follows_latest());
    }

    #[test]
    fn pinned_entry_pruned_from_history_retargets_newest() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h1", "h0"]);
        cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h0"),
            },
            &list,
        );

        // h0 fell off the capped history.
        let list = versions(&["h2", "h1"]);
        assert_eq!(cursor.apply(CursorEvent::NewHead, &list), RenderSource::Live);
        assert_eq!(cursor.active().unwrap().as_str(), "h2");
        assert!(cursor.follows_latest());
    }

    #[test]
    fn selecting_unknown_id_retargets_newest() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h1", "h0"]);
        cursor.apply(CursorEvent::NewHead, &list);

        let source = cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("gone"),
            },
            &list,
        );
        assert_eq!(source, RenderSource::Live);
        assert_eq!(cursor.active().unwrap().as_str(), "h1");
    }

    #[test]
    fn unknown_selection_drops_an_existing_pin() {
        let mut cursor = ViewCursor::new();
        let list = versions(&["h1", "h0"]);
        cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h0"),
            },
            &list,
        );
        assert!(!cursor.follows_latest());

        // The pin does not survive a dangling selection: the cursor lands
        // on the newest entry and resumes following.
        let source = cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("gone"),
            },
            &list,
        );
        assert_eq!(source, RenderSource::Live);
        assert_eq!(cursor.active().unwrap().as_str(), "h1");
        assert!(cursor.follows_latest());
    }

    #[test]
    fn missing_snapshot_renders_placeholder() {
        let mut cursor = ViewCursor::new();
        let mut list = versions(&["h1", "h0"]);
        list[1].snapshot = None;

        let source = cursor.apply(
            CursorEvent::Selected {
                id: VersionId::from("h0"),
            },
            &list,
        );
        assert_eq!(source, RenderSource::Placeholder);
    }
}
