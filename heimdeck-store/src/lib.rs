// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned entity store and flat-file persistence.
//!
//! Each tracked entity keeps its live value next to an append-only, capped
//! history of snapshots ([`VersionedEntity`]). All entities live together in
//! one JSON [`document::StateDocument`] written atomically to disk.
pub mod document;
pub mod entity;

use thiserror::Error;

pub use document::{DocumentStore, StateDocument};
pub use entity::{MAX_VERSIONS, VersionedEntity};

#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error while reading or writing the state document.
    #[error("input/output error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while encoding or decoding the state document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
