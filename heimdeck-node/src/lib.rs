// SPDX-License-Identifier: MIT OR Apache-2.0

//! The heimdeck engine: one actor owning the rate limiter, the session
//! registry, the channel router and the versioned state document.
//!
//! HTTP handling stays outside this workspace; front ends serialize the
//! typed [`api`] requests and responses verbatim and drive push transports
//! through [`channel::serve_channel`].
pub mod api;
pub mod channel;
pub mod engine;
pub mod error;
pub mod node;

pub use api::{
    BootstrapResponse, ClientState, CompanionResponse, IspResponse, LoginRequest, LoginResponse,
    PortUpdate, PortsResponse, VersionsResponse,
};
pub use channel::serve_channel;
pub use error::EngineError;
pub use node::{Node, NodeBuilder};
