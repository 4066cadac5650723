// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshots of the tracked dashboard entities.
//!
//! Each of these types is the full "live" value of one entity at an instant.
//! Change detection in the version store is plain `PartialEq` over the whole
//! snapshot, so every field that matters must take part in equality.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies one of the independently versioned dashboard entities.
///
/// There is no cross-entity transaction: each kind carries its own history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Ports,
    IspDevice,
    Companion,
}

/// Which physical device a port row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortGroup {
    Switch,
    Router,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("unknown port group")]
pub struct UnknownGroup;

impl FromStr for PortGroup {
    type Err = UnknownGroup;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "switch" => Ok(PortGroup::Switch),
            "router" => Ok(PortGroup::Router),
            _ => Err(UnknownGroup),
        }
    }
}

impl fmt::Display for PortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortGroup::Switch => write!(f, "switch"),
            PortGroup::Router => write!(f, "router"),
        }
    }
}

/// One labelled port row on the switch or the router.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: String,
    pub label: String,
    pub status: String,
    pub color: String,
}

impl Port {
    pub fn new(id: &str, label: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            status: String::new(),
            color: color.to_string(),
        }
    }
}

/// Live value of the ports entity: both port tables together.
///
/// Switch and router ports are versioned as one entity because a single save
/// can touch either table and the history view shows them side by side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortsSnapshot {
    pub switch_ports: Vec<Port>,
    pub router_ports: Vec<Port>,
}

impl PortsSnapshot {
    /// Port layout seeded into a fresh state document.
    pub fn default_layout() -> Self {
        let switch_ports = (1..=8)
            .map(|n| Port::new(&format!("port{n}"), &format!("Port {n}"), "#000000"))
            .collect();
        let router_ports = vec![
            Port::new("dsl", "DSL", "#7a7a7a"),
            Port::new("lan1", "Link/LAN1", "#0050c8"),
            Port::new("lan2", "LAN2", "#d1ac00"),
            Port::new("lan3", "LAN3", "#d1ac00"),
            Port::new("lan4", "LAN4", "#d1ac00"),
            Port::new("phone", "Phone", "#d97800"),
        ];
        Self {
            switch_ports,
            router_ports,
        }
    }

    pub fn group(&self, group: PortGroup) -> &[Port] {
        match group {
            PortGroup::Switch => &self.switch_ports,
            PortGroup::Router => &self.router_ports,
        }
    }

    pub fn group_mut(&mut self, group: PortGroup) -> &mut Vec<Port> {
        match group {
            PortGroup::Switch => &mut self.switch_ports,
            PortGroup::Router => &mut self.router_ports,
        }
    }
}

/// Metadata of the ISP-provided modem/router.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IspDeviceInfo {
    pub wifi_name: String,
    pub wifi_password: String,
    pub serial_number: String,
    pub configuration: String,
    pub remote_url: String,
    pub device_password: String,
    pub modem_id: String,
}

/// Metadata of the companion single-board computer on the network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanionInfo {
    pub model: String,
    pub hostname: String,
    pub ip_address: String,
    pub vpn_ip: String,
    pub mac_address: String,
    pub ssh_user: String,
    pub ssh_password: String,
    pub dns_url: String,
    pub dns_remote_url: String,
}

/// Returns true for a `#RRGGBB` hex color.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_group_round_trip() {
        assert_eq!("switch".parse(), Ok(PortGroup::Switch));
        assert_eq!("router".parse(), Ok(PortGroup::Router));
        assert_eq!("modem".parse::<PortGroup>(), Err(UnknownGroup));
        assert_eq!(PortGroup::Router.to_string(), "router");
    }

    #[test]
    fn default_layout_shape() {
        let ports = PortsSnapshot::default_layout();
        assert_eq!(ports.switch_ports.len(), 8);
        assert_eq!(ports.router_ports.len(), 6);
        assert_eq!(ports.group(PortGroup::Router)[0].id, "dsl");
    }

    #[test]
    fn hex_color_validation() {
        assert!(is_hex_color("#0050c8"));
        assert!(is_hex_color("#ABCDEF"));
        assert!(!is_hex_color("0050c8"));
        assert!(!is_hex_color("#0050c"));
        assert!(!is_hex_color("#0050cg"));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let info = CompanionInfo {
            ip_address: "10.0.0.2".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["ipAddress"], "10.0.0.2");
        assert_eq!(json["dnsRemoteUrl"], "");
    }
}
