use crate::model::{canonical_mac, vlan_id_valid, Device, MacEntry, MacKind, SwitchportMode};
use crate::names::{self, AliasMap};
use crate::normalize::SwitchportSetting;
use crate::parse::{Row, RowExt};
use std::collections::HashSet;
use tracing::debug;

/// Turns parsed MAC table rows into canonical, deduplicated [`MacEntry`]
/// records.
pub struct MacNormalizer {
    /// Drop entries learned on trunk ports; every host shows up there
    pub exclude_trunk_ports: bool,
}

impl Default for MacNormalizer {
    fn default() -> Self {
        Self {
            exclude_trunk_ports: true,
        }
    }
}

impl MacNormalizer {
    pub fn new(exclude_trunk_ports: bool) -> Self {
        Self {
            exclude_trunk_ports,
        }
    }

    /// Normalize rows; the switchport map (when available) feeds the trunk
    /// filter. Dedup key is (device, vlan, mac, interface).
    pub fn normalize(
        &self,
        rows: &[Row],
        device: &Device,
        switchports: Option<&AliasMap<SwitchportSetting>>,
    ) -> Vec<MacEntry> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for row in rows {
            let Some(raw_mac) = row.text("mac") else {
                continue;
            };
            let Some(mac) = canonical_mac(raw_mac) else {
                debug!(raw_mac, "unparseable MAC dropped");
                continue;
            };
            let Some(vlan) = vlan_of(row) else {
                continue;
            };
            if !vlan_id_valid(vlan) {
                debug!(vlan, "MAC entry with out-of-range VLAN dropped");
                continue;
            }
            let Some(raw_interface) = row.text("interface") else {
                continue;
            };
            let interface = names::canonical(raw_interface);

            if self.exclude_trunk_ports {
                if let Some(switchports) = switchports {
                    if let Some(setting) = switchports.get(&interface) {
                        if matches!(
                            setting.mode,
                            SwitchportMode::Tagged | SwitchportMode::TaggedAll
                        ) {
                            continue;
                        }
                    }
                }
            }

            let kind = row
                .text("kind")
                .map(MacKind::parse)
                .unwrap_or(MacKind::Dynamic);

            let key = (device.host.clone(), vlan, mac.clone(), interface.clone());
            if !seen.insert(key) {
                continue;
            }
            out.push(MacEntry {
                device: device.host.clone(),
                mac,
                vlan,
                interface,
                kind,
            });
        }
        out
    }
}

/// VLAN id from a numeric column or a Junos-style VLAN name ("vlan10", "v10")
fn vlan_of(row: &Row) -> Option<u16> {
    if let Some(vlan) = row.text("vlan") {
        return vlan.parse().ok();
    }
    let name = row.text("vlan_name")?;
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::RowValue;

    fn row(fields: &[(&str, &str)]) -> Row {
        let mut row = Row::new();
        for (key, value) in fields {
            row.insert(key.to_string(), RowValue::Text(value.to_string()));
        }
        row
    }

    fn device() -> Device {
        Device::new("10.0.0.1", "cisco_ios")
    }

    fn mac_row(mac: &str, vlan: &str, interface: &str) -> Row {
        row(&[
            ("vlan", vlan),
            ("mac", mac),
            ("kind", "DYNAMIC"),
            ("interface", interface),
        ])
    }

    #[test]
    fn macs_are_canonicalized() {
        let rows = vec![mac_row("aabb.ccdd.eeff", "10", "Gi0/1")];
        let entries = MacNormalizer::new(false).normalize(&rows, &device(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mac, "AA:BB:CC:DD:EE:FF");
        assert_eq!(entries[0].interface, "GigabitEthernet0/1");
        assert_eq!(entries[0].vlan, 10);
    }

    #[test]
    fn trunk_filter_drops_trunk_learned_entries() {
        let mut switchports = AliasMap::new();
        switchports.insert(
            "Gi0/24",
            SwitchportSetting {
                mode: SwitchportMode::TaggedAll,
                untagged: None,
                tagged: Default::default(),
            },
        );
        switchports.insert(
            "Gi0/1",
            SwitchportSetting {
                mode: SwitchportMode::Access,
                untagged: Some(10),
                tagged: Default::default(),
            },
        );

        let mut rows = Vec::new();
        for i in 0..8 {
            rows.push(mac_row(&format!("aabb.ccdd.ee0{}", i), "10", "Gi0/1"));
        }
        rows.push(mac_row("aabb.ccdd.ee10", "10", "Gi0/24"));
        rows.push(mac_row("aabb.ccdd.ee11", "20", "Gi0/24"));

        let entries =
            MacNormalizer::new(true).normalize(&rows, &device(), Some(&switchports));
        assert_eq!(entries.len(), 8);
        assert!(entries.iter().all(|e| e.interface == "GigabitEthernet0/1"));
    }

    #[test]
    fn duplicates_are_collapsed() {
        let rows = vec![
            mac_row("aabb.ccdd.eeff", "10", "Gi0/1"),
            mac_row("aabb.ccdd.eeff", "10", "Gi0/1"),
        ];
        let entries = MacNormalizer::new(false).normalize(&rows, &device(), None);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn out_of_range_vlan_is_rejected() {
        let rows = vec![mac_row("aabb.ccdd.eeff", "4095", "Gi0/1")];
        let entries = MacNormalizer::new(false).normalize(&rows, &device(), None);
        assert!(entries.is_empty());
    }

    #[test]
    fn junos_vlan_names_resolve_to_ids() {
        let rows = vec![row(&[
            ("vlan_name", "vlan10"),
            ("mac", "aa:bb:cc:dd:ee:ff"),
            ("kind", "D"),
            ("interface", "ge-0/0/0.0"),
        ])];
        let entries = MacNormalizer::new(false).normalize(&rows, &device(), None);
        assert_eq!(entries[0].vlan, 10);
    }
}
