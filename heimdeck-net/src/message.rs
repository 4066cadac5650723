// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frames exchanged on a push channel.
use heimdeck_core::EntityKind;
use serde::{Deserialize, Serialize};

/// Server → client push frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Answer to the handshake's auth frame.
    #[serde(rename = "auth")]
    Auth { success: bool },

    /// The single session was taken over by another device; carries the
    /// *new* login's label and timestamp so the evicted client can show
    /// "device X logged in at time Y".
    #[serde(rename = "forceLogout", rename_all = "camelCase")]
    ForceLogout { device_label: String, login_at: u64 },

    /// An entity's live value changed after a mutation; other tabs of the
    /// same session should refetch it.
    #[serde(rename = "stateChanged")]
    StateChanged { entity: EntityKind },

    /// Liveness probe; the client must answer with a pong.
    #[serde(rename = "ping")]
    Ping,
}

/// Client → server frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Must be the first frame on a fresh channel; nothing else is
    /// processed before it.
    #[serde(rename = "auth")]
    Auth { token: String },

    /// Answer to a server ping.
    #[serde(rename = "pong")]
    Pong,

    /// Unsolicited client keepalive; treated like a pong.
    #[serde(rename = "ping")]
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_logout_wire_shape() {
        let event = ServerEvent::ForceLogout {
            device_label: "Kitchen tablet".to_string(),
            login_at: 1_714_566_645_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "forceLogout");
        assert_eq!(json["deviceLabel"], "Kitchen tablet");
        assert_eq!(json["loginAt"], 1_714_566_645_000_u64);
    }

    #[test]
    fn auth_frame_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"auth","token":"deadbeef"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Auth {
                token: "deadbeef".to_string()
            }
        );
    }
}
