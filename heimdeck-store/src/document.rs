// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted state document: one JSON file holding credentials, the
//! device-token whitelist and every versioned entity.
use std::fs;
use std::path::{Path, PathBuf};

use heimdeck_core::{CompanionInfo, Credentials, IspDeviceInfo, PortsSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::entity::VersionedEntity;
use crate::StoreError;

/// Upper bound on stored device tokens; registering beyond it drops the
/// oldest entries.
pub const MAX_DEVICE_TOKENS: usize = 20;

/// Everything the dashboard persists, as one flat JSON document.
///
/// Loading is lenient: fields missing from an older document fall back to
/// their seeded defaults instead of failing the whole load.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDocument {
    pub credentials: Credentials,
    /// Whitelisted device tokens, stored as SHA-256 digests (legacy entries
    /// may still be plaintext until their next successful use).
    pub device_tokens: Vec<String>,
    pub ports: VersionedEntity<PortsSnapshot>,
    pub isp_device: VersionedEntity<IspDeviceInfo>,
    pub companion: VersionedEntity<CompanionInfo>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            credentials: Credentials::new("admin", "admin"),
            device_tokens: Vec::new(),
            ports: VersionedEntity::new(PortsSnapshot::default_layout()),
            isp_device: VersionedEntity::new(IspDeviceInfo::default()),
            companion: VersionedEntity::new(CompanionInfo::default()),
        }
    }
}

impl StateDocument {
    /// Register a device token digest, dropping the oldest entries once the
    /// whitelist exceeds [`MAX_DEVICE_TOKENS`].
    pub fn register_device_token(&mut self, digest: String) {
        self.device_tokens.push(digest);
        if self.device_tokens.len() > MAX_DEVICE_TOKENS {
            let excess = self.device_tokens.len() - MAX_DEVICE_TOKENS;
            self.device_tokens.drain(..excess);
        }
    }
}

/// Owner of the state document on disk.
///
/// All access goes through [`DocumentStore::read`] or
/// [`DocumentStore::mutate`]; the internal mutex makes every
/// read-compare-append sequence one critical section, so two concurrent
/// writes can never both record a version from the same stale value.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    inner: Mutex<StateDocument>,
}

impl DocumentStore {
    /// Load the document from `path`, seeding defaults on first run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let initial = StateDocument::default();
                write_atomic(&path, &initial)?;
                debug!(path = %path.display(), "seeded fresh state document");
                initial
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            inner: Mutex::new(document),
        })
    }

    /// Run a read-only closure against the document.
    pub async fn read<R>(&self, f: impl FnOnce(&StateDocument) -> R) -> R {
        let document = self.inner.lock().await;
        f(&document)
    }

    /// Mutate the document and persist it atomically.
    ///
    /// The closure's changes only become visible once the write landed; on a
    /// write error the in-memory document is rolled back, so a failed save
    /// never leaves `current` half-updated.
    pub async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut StateDocument) -> R,
    ) -> Result<R, StoreError> {
        let mut document = self.inner.lock().await;
        let before = document.clone();
        let result = f(&mut document);

        // File I/O happens off the async executor; the mutex stays held so
        // no reader observes the unpersisted value.
        let path = self.path.clone();
        let snapshot = document.clone();
        let written = match tokio::task::spawn_blocking(move || write_atomic(&path, &snapshot)).await
        {
            Ok(written) => written,
            Err(err) => Err(StoreError::Io(std::io::Error::other(err))),
        };
        if let Err(err) = written {
            *document = before;
            return Err(err);
        }
        Ok(result)
    }
}

/// Serialize and write via a temporary file plus rename, so a crash mid-write
/// can never truncate the live document.
fn write_atomic(path: &Path, document: &StateDocument) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use heimdeck_core::clock::ManualClock;
    use heimdeck_core::TokenDigest;

    use super::*;

    #[tokio::test]
    async fn seeds_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = DocumentStore::open(&path).unwrap();
        store
            .mutate(|doc| {
                doc.register_device_token(TokenDigest::of("abc").as_str().to_string());
            })
            .await
            .unwrap();
        drop(store);

        let reloaded = DocumentStore::open(&path).unwrap();
        let tokens = reloaded.read(|doc| doc.device_tokens.clone()).await;
        assert_eq!(tokens, vec![TokenDigest::of("abc").as_str().to_string()]);
    }

    #[tokio::test]
    async fn lenient_load_of_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"credentials":{"username":"home","passwordDigest":"abc"}}"#,
        )
        .unwrap();

        let store = DocumentStore::open(&path).unwrap();
        store
            .read(|doc| {
                assert_eq!(doc.credentials.username, "home");
                assert!(doc.device_tokens.is_empty());
                assert_eq!(doc.ports.current().switch_ports.len(), 8);
            })
            .await;
    }

    #[tokio::test]
    async fn mutation_lands_through_entity_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = ManualClock::new(1_714_566_645_000);

        let store = DocumentStore::open(&path).unwrap();
        let changed = store
            .mutate(|doc| {
                doc.ports.update("Port changed: Port 1", &clock, |ports| {
                    ports.switch_ports[0].status = "NAS".to_string();
                })
            })
            .await
            .unwrap();
        assert!(changed);

        let reloaded = DocumentStore::open(&path).unwrap();
        reloaded
            .read(|doc| {
                assert_eq!(doc.ports.current().switch_ports[0].status, "NAS");
                assert_eq!(doc.ports.history().len(), 1);
            })
            .await;
    }

    #[test]
    fn device_token_whitelist_is_capped() {
        let mut doc = StateDocument::default();
        for n in 0..(MAX_DEVICE_TOKENS + 3) {
            doc.register_device_token(format!("digest-{n}"));
        }
        assert_eq!(doc.device_tokens.len(), MAX_DEVICE_TOKENS);
        assert_eq!(doc.device_tokens[0], "digest-3");
    }
}
