// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared data types for the heimdeck dashboard core.
//!
//! The types in this crate carry no behavior beyond construction, comparison
//! and (de)serialization. Session logic lives in `heimdeck-auth`, versioned
//! persistence in `heimdeck-store` and push-channel plumbing in
//! `heimdeck-net`.
pub mod clock;
pub mod entity;
pub mod token;
pub mod version;

pub use clock::{Clock, SystemClock};
pub use entity::{
    CompanionInfo, EntityKind, IspDeviceInfo, Port, PortGroup, PortsSnapshot, is_hex_color,
};
pub use token::{Credentials, DeviceToken, SessionToken, TokenDigest};
pub use version::{VersionEntry, VersionId};
