use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reference to a named NetBox object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbRef {
    pub id: u64,
    pub name: String,
}

impl NbRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A NetBox device record; desired-side records carry id 0 until applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NbDevice {
    pub id: u64,
    pub name: String,
    pub site: Option<String>,
    pub role: Option<String>,
    pub platform: Option<String>,
    pub device_type: Option<String>,
    pub serial: Option<String>,
    pub status: String,
    pub tenant: Option<String>,
    pub primary_ip4: Option<String>,
}

/// A NetBox interface record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NbInterface {
    pub id: u64,
    pub device: String,
    pub name: String,
    pub if_type: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub mtu: Option<u32>,
    pub mac_address: Option<String>,
    /// NetBox stores interface speed in kbit/s
    pub speed_kbps: Option<u64>,
    pub mode: Option<String>,
    pub untagged_vlan: Option<u16>,
    pub tagged_vlans: BTreeSet<u16>,
    /// Name of the owning LAG interface on the same device
    pub lag: Option<String>,
}

/// A NetBox IP address, attached to a device interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NbIpAddress {
    pub id: u64,
    pub address: String,
    pub device: String,
    pub interface: String,
    pub is_primary: bool,
}

/// A NetBox VLAN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NbVlan {
    pub id: u64,
    pub vid: u16,
    pub name: String,
    pub site: Option<String>,
}

/// One cable endpoint
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NbCableEnd {
    pub device: String,
    pub interface: String,
}

/// A NetBox cable between two interfaces. The endpoint pair is unordered;
/// [`NbCable::normalized_ends`] gives the canonical ordering used as the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbCable {
    pub id: u64,
    pub a: NbCableEnd,
    pub b: NbCableEnd,
    pub status: String,
}

impl NbCable {
    pub fn connected(a: NbCableEnd, b: NbCableEnd) -> Self {
        Self {
            id: 0,
            a,
            b,
            status: "connected".to_string(),
        }
    }

    /// Endpoints in a stable order so (A,B) and (B,A) compare equal
    pub fn normalized_ends(&self) -> (NbCableEnd, NbCableEnd) {
        if self.a <= self.b {
            (self.a.clone(), self.b.clone())
        } else {
            (self.b.clone(), self.a.clone())
        }
    }
}

/// A NetBox inventory item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NbInventoryItem {
    pub id: u64,
    pub device: String,
    pub name: String,
    pub part_id: Option<String>,
    pub serial: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
}

/// Filter for device listing
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub site: Option<String>,
    pub role: Option<String>,
    pub tenant: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cable_ends_normalize_regardless_of_order() {
        let ab = NbCable::connected(
            NbCableEnd {
                device: "sw1".into(),
                interface: "GigabitEthernet0/1".into(),
            },
            NbCableEnd {
                device: "sw2".into(),
                interface: "GigabitEthernet0/2".into(),
            },
        );
        let ba = NbCable::connected(
            NbCableEnd {
                device: "sw2".into(),
                interface: "GigabitEthernet0/2".into(),
            },
            NbCableEnd {
                device: "sw1".into(),
                interface: "GigabitEthernet0/1".into(),
            },
        );
        assert_eq!(ab.normalized_ends(), ba.normalized_ends());
    }
}
