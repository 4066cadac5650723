// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps session tokens to their live push channels.
use std::collections::HashMap;

use heimdeck_core::SessionToken;
use tracing::debug;

use crate::channel::PushChannel;
use crate::message::ServerEvent;

/// The token → channel binding table.
///
/// This is a cache, not a source of truth: a missing binding only means the
/// evicted or updated client learns about it later through a rejected call.
#[derive(Debug, Default)]
pub struct ChannelRouter {
    channels: HashMap<SessionToken, PushChannel>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticated channel under its session token. A second
    /// channel for the same token replaces (and closes) the first.
    pub fn bind(&mut self, token: SessionToken, channel: PushChannel) {
        if let Some(previous) = self.channels.insert(token, channel) {
            previous.close();
        }
    }

    pub fn unbind(&mut self, token: &SessionToken) {
        self.channels.remove(token);
    }

    /// Deliver one event to the channel bound under `token`, if any.
    ///
    /// Never blocks and is never retried; returns whether a bound, open
    /// channel accepted the event.
    pub fn notify(&self, token: &SessionToken, event: ServerEvent) -> bool {
        match self.channels.get(token) {
            Some(channel) if channel.is_open() => channel.send(event),
            _ => {
                debug!("no open channel bound, notification dropped");
                false
            }
        }
    }

    /// Send an event to the live session's channel, evicting every binding
    /// whose token is stale on the way.
    pub fn broadcast(&mut self, live: Option<&SessionToken>, event: ServerEvent) {
        self.evict_stale(live);
        if let Some(token) = live {
            self.notify(token, event);
        }
    }

    /// Close and remove bindings whose token no longer matches the live
    /// session. Returns how many were evicted.
    pub fn evict_stale(&mut self, live: Option<&SessionToken>) -> usize {
        let before = self.channels.len();
        self.channels.retain(|token, channel| {
            let keep = live == Some(token) && channel.is_open();
            if !keep {
                channel.close();
            }
            keep
        });
        before - self.channels.len()
    }

    /// Heartbeat sweep: drop channels that failed to answer the previous
    /// probe, ping the rest. Returns how many were dropped.
    pub fn probe(&mut self) -> usize {
        let before = self.channels.len();
        self.channels.retain(|_, channel| {
            if !channel.is_open() || !channel.take_alive() {
                channel.close();
                return false;
            }
            channel.send(ServerEvent::Ping);
            true
        });
        let dropped = before - self.channels.len();
        if dropped > 0 {
            debug!(dropped, "heartbeat removed dead channels");
        }
        dropped
    }

    /// Close every channel; used on logout.
    pub fn close_all(&mut self) {
        for channel in self.channels.values() {
            channel.close();
        }
        self.channels.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.channels.len()
    }
}
