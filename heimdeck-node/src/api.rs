// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed request and response surface.
//!
//! An HTTP front end serializes these verbatim; the field names and casing
//! are the dashboard's wire protocol. Version snapshots leaving the server
//! have their password fields blanked, the live values are shown as-is to
//! the (single) authenticated user.
use heimdeck_core::{CompanionInfo, IspDeviceInfo, Port, PortsSnapshot, VersionEntry};
use heimdeck_store::StateDocument;
use serde::{Deserialize, Serialize};

/// Longest accepted value for any free-text entity field.
pub const MAX_FIELD_LEN: usize = 256;

fn default_device_label() -> String {
    "Unknown device".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_token: Option<String>,
    #[serde(default = "default_device_label")]
    pub device_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    /// Bearer token for all later authenticated calls.
    pub token: String,
    /// Device token for auto-login on future visits: either the one the
    /// client presented or a freshly minted one.
    pub device_token: String,
    pub state: ClientState,
}

/// Unauthenticated bootstrap payload: version metadata only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapResponse {
    pub versions: Vec<VersionEntry<PortsSnapshot>>,
}

/// Everything the dashboard needs after login. Credentials and the token
/// whitelist never leave the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub switch_ports: Vec<Port>,
    pub router_ports: Vec<Port>,
    pub versions: Vec<VersionEntry<PortsSnapshot>>,
    pub isp_device: IspDeviceInfo,
    pub isp_versions: Vec<VersionEntry<IspDeviceInfo>>,
    pub companion: CompanionInfo,
    pub companion_versions: Vec<VersionEntry<CompanionInfo>>,
}

impl ClientState {
    pub fn from_document(doc: &StateDocument) -> Self {
        Self {
            switch_ports: doc.ports.current().switch_ports.clone(),
            router_ports: doc.ports.current().router_ports.clone(),
            versions: doc.ports.history().to_vec(),
            isp_device: doc.isp_device.current().clone(),
            isp_versions: sanitize_isp_versions(doc.isp_device.history()),
            companion: doc.companion.current().clone(),
            companion_versions: sanitize_companion_versions(doc.companion.history()),
        }
    }
}

/// Partial update of one port row.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortUpdate {
    pub group: String,
    pub id: String,
    pub label: Option<String>,
    pub status: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortsResponse {
    pub ok: bool,
    pub switch_ports: Vec<Port>,
    pub router_ports: Vec<Port>,
    pub versions: Vec<VersionEntry<PortsSnapshot>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IspResponse {
    pub ok: bool,
    pub isp_device: IspDeviceInfo,
    pub versions: Vec<VersionEntry<IspDeviceInfo>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionResponse {
    pub ok: bool,
    pub companion: CompanionInfo,
    pub versions: Vec<VersionEntry<CompanionInfo>>,
}

/// Version listing of one entity, newest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionsResponse {
    Ports(Vec<VersionEntry<PortsSnapshot>>),
    IspDevice(Vec<VersionEntry<IspDeviceInfo>>),
    Companion(Vec<VersionEntry<CompanionInfo>>),
}

/// Blank the secret fields of ISP-device snapshots before they leave the
/// server. Historical passwords must not be recoverable from the history
/// list.
pub fn sanitize_isp_versions(
    history: &[VersionEntry<IspDeviceInfo>],
) -> Vec<VersionEntry<IspDeviceInfo>> {
    history
        .iter()
        .map(|entry| {
            let mut entry = entry.clone();
            if let Some(snapshot) = &mut entry.snapshot {
                snapshot.wifi_password.clear();
                snapshot.device_password.clear();
            }
            entry
        })
        .collect()
}

pub fn sanitize_companion_versions(
    history: &[VersionEntry<CompanionInfo>],
) -> Vec<VersionEntry<CompanionInfo>> {
    history
        .iter()
        .map(|entry| {
            let mut entry = entry.clone();
            if let Some(snapshot) = &mut entry.snapshot {
                snapshot.ssh_password.clear();
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_defaults_device_label() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"username":"admin","password":"pw"}"#).unwrap();
        assert_eq!(request.device_label, "Unknown device");
        assert!(request.device_token.is_none());
    }

    #[test]
    fn isp_snapshots_are_sanitized() {
        let entry = VersionEntry {
            id: heimdeck_core::VersionId::generate(),
            label: "2024-05-01 12:30:45".to_string(),
            summary: "ISP device changed".to_string(),
            timestamp: 1,
            snapshot: Some(IspDeviceInfo {
                wifi_name: "homenet".to_string(),
                wifi_password: "secret".to_string(),
                ..Default::default()
            }),
        };
        let sanitized = sanitize_isp_versions(&[entry]);
        let snapshot = sanitized[0].snapshot.as_ref().unwrap();
        assert_eq!(snapshot.wifi_name, "homenet");
        assert!(snapshot.wifi_password.is_empty());
    }
}
