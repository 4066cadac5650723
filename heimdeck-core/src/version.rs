// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version entries recorded in an entity's change history.
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Unique identifier of one version entry.
///
/// Labels are derived from wall-clock time and may collide; the id is the
/// key that stays unique.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(String);

impl VersionId {
    pub fn generate() -> Self {
        Self(hex::encode(rand::random::<[u8; 16]>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One immutable, timestamped record in an entity's change history.
///
/// `snapshot` is a deep copy of the entity at the instant the entry was
/// created. It is optional on the wire: entries from older documents may
/// lack one, in which case the client renders a placeholder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry<S> {
    pub id: VersionId,
    pub label: String,
    pub summary: String,
    pub timestamp: u64,
    // The path form keeps the derived impl free of an `S: Default` bound.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<S>,
}

/// Human-readable label for a version created at the given wall-clock time,
/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn version_label(timestamp_ms: u64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms as i64) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        // Out-of-range timestamp, keep something renderable.
        None => timestamp_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_format() {
        // 2024-05-01 12:30:45 UTC
        assert_eq!(version_label(1_714_566_645_000), "2024-05-01 12:30:45");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(VersionId::generate(), VersionId::generate());
    }

    #[test]
    fn snapshot_type_needs_no_default_impl() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Opaque(u32);

        let entry: VersionEntry<Opaque> = serde_json::from_str(
            r#"{"id":"abc","label":"2024-05-01 12:30:45","summary":"change","timestamp":1}"#,
        )
        .unwrap();
        assert!(entry.snapshot.is_none());
    }

    #[test]
    fn missing_snapshot_deserializes() {
        let entry: VersionEntry<Vec<u32>> = serde_json::from_str(
            r#"{"id":"abc","label":"2024-05-01 12:30:45","summary":"Port changed","timestamp":1}"#,
        )
        .unwrap();
        assert!(entry.snapshot.is_none());

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("snapshot"));
    }
}
