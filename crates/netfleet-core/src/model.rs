use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::FleetError;

/// Identity and transport parameters for one piece of network gear.
///
/// Supplied by the caller and immutable within a run. The platform tag must
/// resolve through the [`crate::platform::PlatformRegistry`] or the engine
/// refuses the device up front.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    /// Hostname or IP address used for the SSH transport
    pub host: String,
    /// Platform tag, e.g. "cisco_ios" or "qtech"
    pub platform: String,
    /// Model hint forwarded to NetBox; never drives code paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Friendly name; falls back to the hostname learned from the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Device {
    pub fn new(host: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            platform: platform.into(),
            device_type: None,
            site: None,
            role: None,
            name: None,
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        if self.host.trim().is_empty() {
            return Err(FleetError::ConfigError(
                "device host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Username and password bound to a device set; passed by value and never
/// persisted by the core.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub enable: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            enable: None,
        }
    }

    pub fn with_enable(mut self, secret: impl Into<String>) -> Self {
        self.enable = Some(secret.into());
        self
    }
}

// Secrets stay out of log output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("enable", &self.enable.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Platform-neutral classification of a port's physical or logical kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortType {
    AccessCopper,
    Sfp,
    SfpPlus,
    Sfp28,
    Qsfp28,
    Qsfpdd,
    Lag,
    Virtual,
    Loopback,
    Mgmt,
    Unknown,
}

impl PortType {
    /// NetBox interface type slug for this port type, refined by speed where
    /// the generic slug would undersell the port.
    pub fn nb_type(&self, speed_bps: Option<u64>) -> &'static str {
        match self {
            PortType::AccessCopper => match speed_bps {
                Some(s) if s >= 10_000_000_000 => "10gbase-t",
                Some(s) if s >= 2_500_000_000 => "2.5gbase-t",
                Some(s) if s >= 1_000_000_000 => "1000base-t",
                Some(s) if s >= 100_000_000 => "100base-tx",
                _ => "1000base-t",
            },
            PortType::Sfp => "1000base-x-sfp",
            PortType::SfpPlus => "10gbase-x-sfpp",
            PortType::Sfp28 => "25gbase-x-sfp28",
            PortType::Qsfp28 => "100gbase-x-qsfp28",
            PortType::Qsfpdd => "400gbase-x-qsfpdd",
            PortType::Lag => "lag",
            PortType::Virtual => "virtual",
            PortType::Loopback => "virtual",
            PortType::Mgmt => "1000base-t",
            PortType::Unknown => "other",
        }
    }
}

/// Switchport operating mode of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchportMode {
    Access,
    Tagged,
    /// Trunk carrying the full VLAN range; the tagged set stays empty
    TaggedAll,
    #[default]
    Unset,
}

/// Canonical interface record
///
/// Vendor-specific shape has been normalized away: the name is the long
/// canonical form, aliases cover every spelling other commands may have used,
/// and VLAN membership honours the mode invariants (access ⇒ no tagged VLANs,
/// tagged-all ⇒ empty tagged set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub device: String,
    pub name: String,
    pub short_name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// Speed in bits per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,
    /// IPv4 address in CIDR form, e.g. "10.0.0.1/24"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip6: Option<String>,
    pub port_type: PortType,
    /// NetBox interface type slug derived from port_type + media hints
    pub nb_type: String,
    pub mode: SwitchportMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untagged_vlan: Option<u16>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tagged_vlans: BTreeSet<u16>,
    /// Canonical name of the owning LAG; always None when this interface is
    /// itself a LAG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_parent: Option<String>,
}

impl Interface {
    /// VLAN id of an SVI ("Vlan10" -> 10), None for anything else
    pub fn svi_vid(&self) -> Option<u16> {
        let rest = self.name.strip_prefix("Vlan")?;
        rest.parse::<u16>().ok().filter(|vid| vlan_id_valid(*vid))
    }
}

/// One learned MAC table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    pub device: String,
    /// Canonical IEEE form AA:BB:CC:DD:EE:FF
    pub mac: String,
    pub vlan: u16,
    pub interface: String,
    pub kind: MacKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MacKind {
    Dynamic,
    Static,
    Sticky,
}

impl MacKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "static" => MacKind::Static,
            "sticky" => MacKind::Sticky,
            _ => MacKind::Dynamic,
        }
    }
}

/// How the remote end of an LLDP/CDP observation was identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborIdKind {
    Hostname,
    Mac,
    Ip,
    Unknown,
}

/// One LLDP/CDP neighbor observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LldpNeighbor {
    pub local_device: String,
    pub local_interface: String,
    pub remote_name: String,
    pub remote_interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_description: Option<String>,
    pub id_kind: NeighborIdKind,
}

/// Kind of a physical inventory element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryKind {
    Chassis,
    Module,
    Sfp,
    Psu,
    Fan,
    Other,
}

/// One hardware inventory element (chassis, module, optic, PSU, fan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub device: String,
    pub slot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: InventoryKind,
}

/// Canonical device facts learned from the gear itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFacts {
    pub host: String,
    pub hostname: String,
    pub platform: String,
    pub vendor: String,
    /// NetBox platform slug for this platform tag
    pub nb_platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

pub fn vlan_id_valid(vid: u16) -> bool {
    (1..=4094).contains(&vid)
}

/// Canonicalize a MAC address to the IEEE form `AA:BB:CC:DD:EE:FF`.
///
/// Accepts Cisco dotted triplets ("aabb.ccdd.eeff"), dashed and colon-separated
/// forms, and bare hex. Idempotent.
pub fn canonical_mac(raw: &str) -> Option<String> {
    let hex: String = raw
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_uppercase();
    if hex.len() != 12 {
        return None;
    }
    let mut out = String::with_capacity(17);
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push(chunk[0] as char);
        out.push(chunk[1] as char);
    }
    Some(out)
}
