// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handle to one live push channel.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::message::ServerEvent;

/// Queued events per channel; a slow client loses pushes rather than
/// blocking the sender.
pub const CHANNEL_CAPACITY: usize = 64;

/// Send half of one push channel plus its liveness state.
///
/// The receive half is pumped into the transport by the channel driver.
/// Everything here is fire-and-forget: no delivery acknowledgement, no
/// retries.
#[derive(Clone, Debug)]
pub struct PushChannel {
    tx: mpsc::Sender<ServerEvent>,
    alive: Arc<AtomicBool>,
    closer: CancellationToken,
}

impl PushChannel {
    /// Create a channel handle together with the receiver its driver pumps.
    pub fn new() -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let channel = Self {
            tx,
            alive: Arc::new(AtomicBool::new(true)),
            closer: CancellationToken::new(),
        };
        (channel, rx)
    }

    /// Queue an event without waiting. Returns false if the channel is
    /// closed or its queue is full; the event is dropped either way.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!("push event dropped: {err}");
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed() && !self.closer.is_cancelled()
    }

    /// Mark the channel as having answered the last probe.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }

    /// Consume the liveness flag: returns whether the channel answered since
    /// the previous probe and arms the next one.
    pub fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::SeqCst)
    }

    /// Ask the driver to shut the transport down.
    pub fn close(&self) {
        self.closer.cancel();
    }

    /// Resolves once [`PushChannel::close`] was called.
    pub async fn closed(&self) {
        self.closer.cancelled().await;
    }
}
