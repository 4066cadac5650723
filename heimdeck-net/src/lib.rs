// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-channel plumbing: JSON framing, the token-to-channel router and the
//! heartbeat sweep that keeps the binding table honest.
//!
//! Delivery here is fire-and-forget and best-effort. Losing a binding never
//! blocks core correctness; an evicted client that missed its notification
//! discovers invalidation on its next authenticated call instead.
pub mod channel;
pub mod codec;
pub mod handshake;
pub mod message;
pub mod router;

use thiserror::Error;

pub use channel::PushChannel;
pub use codec::{JsonCodec, MAX_FRAME_LEN};
pub use handshake::{AUTH_TIMEOUT, read_auth_frame};
pub use message::{ClientMessage, ServerEvent};
pub use router::ChannelRouter;

#[derive(Error, Debug)]
pub enum ChannelError {
    /// I/O error on the underlying transport.
    #[error("input/output error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while encoding or decoding a frame.
    #[error("codec error: {0}")]
    Codec(String),

    /// No auth frame arrived within [`AUTH_TIMEOUT`].
    #[error("channel handshake timed out")]
    AuthTimeout,

    /// The presented token does not belong to the live session.
    #[error("unauthorized channel")]
    Unauthorized,

    /// The transport or the channel closed mid-conversation.
    #[error("channel closed")]
    Closed,
}
