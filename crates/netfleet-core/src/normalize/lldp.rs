use crate::model::{canonical_mac, Device, LldpNeighbor, NeighborIdKind};
use crate::names;
use crate::parse::{Row, RowExt};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref IPV4: Regex = Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").unwrap();
}

/// Turns parsed LLDP/CDP rows into deduplicated [`LldpNeighbor`] records.
///
/// Remote identification falls back from hostname to chassis MAC to IP; the
/// id kind is recorded so the cable phase can weigh observations.
pub struct LldpNormalizer;

impl LldpNormalizer {
    pub fn normalize(rows: &[Row], device: &Device) -> Vec<LldpNeighbor> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for row in rows {
            let Some(local_raw) = row.text("local_interface") else {
                continue;
            };
            let local_interface = names::canonical(local_raw);

            let (remote_name, id_kind) = identify_remote(row);
            if remote_name.is_empty() {
                continue;
            }
            let remote_interface = row
                .text("remote_interface")
                .map(names::canonical)
                .unwrap_or_default();

            let key = (
                device.host.clone(),
                local_interface.clone(),
                remote_name.clone(),
                remote_interface.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            out.push(LldpNeighbor {
                local_device: device.host.clone(),
                local_interface,
                remote_name,
                remote_interface,
                remote_platform: row.text("remote_platform").map(str::to_string),
                remote_description: row.text("remote_description").map(str::to_string),
                id_kind,
            });
        }
        out
    }
}

/// Only hex sextets and the usual separators; keeps hostnames that happen
/// to contain twelve hex characters out of the MAC branch
fn mac_shaped(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_hexdigit() || matches!(c, ':' | '.' | '-'))
}

/// Pick the best identifier for the far end: system name, then chassis id
/// (MAC or IP), then nothing.
fn identify_remote(row: &Row) -> (String, NeighborIdKind) {
    if let Some(name) = row.text("remote_name") {
        let name = name.trim();
        if !name.is_empty() && name != "-" {
            // Some stacks put the chassis MAC in the system name field
            if mac_shaped(name) {
                if let Some(mac) = canonical_mac(name) {
                    return (mac, NeighborIdKind::Mac);
                }
            }
            if IPV4.is_match(name) {
                return (name.to_string(), NeighborIdKind::Ip);
            }
            return (name.to_string(), NeighborIdKind::Hostname);
        }
    }
    if let Some(chassis) = row.text("chassis_id") {
        if mac_shaped(chassis) {
            if let Some(mac) = canonical_mac(chassis) {
                return (mac, NeighborIdKind::Mac);
            }
        }
        if IPV4.is_match(chassis) {
            return (chassis.to_string(), NeighborIdKind::Ip);
        }
        if !chassis.is_empty() {
            return (chassis.to_string(), NeighborIdKind::Unknown);
        }
    }
    (String::new(), NeighborIdKind::Unknown)
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

    #[test]
    fn hostname_identification_wins() {
        let rows = vec![row(&[
            ("local_interface", "Gi0/1"),
            ("chassis_id", "aabb.ccdd.eeff"),
            ("remote_name", "sw2.example.net"),
            ("remote_interface", "Gi0/2"),
        ])];
        let neighbors = LldpNormalizer::normalize(&rows, &device());
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].remote_name, "sw2.example.net");
        assert_eq!(neighbors[0].id_kind, NeighborIdKind::Hostname);
        assert_eq!(neighbors[0].local_interface, "GigabitEthernet0/1");
        assert_eq!(neighbors[0].remote_interface, "GigabitEthernet0/2");
    }

    #[test]
    fn chassis_mac_fallback() {
        let rows = vec![row(&[
            ("local_interface", "Gi0/1"),
            ("chassis_id", "aabb.ccdd.eeff"),
            ("remote_interface", "Gi0/2"),
        ])];
        let neighbors = LldpNormalizer::normalize(&rows, &device());
        assert_eq!(neighbors[0].remote_name, "AA:BB:CC:DD:EE:FF");
        assert_eq!(neighbors[0].id_kind, NeighborIdKind::Mac);
    }

    #[test]
    fn ip_fallback() {
        let rows = vec![row(&[
            ("local_interface", "Gi0/1"),
            ("chassis_id", "192.168.1.5"),
        ])];
        let neighbors = LldpNormalizer::normalize(&rows, &device());
        assert_eq!(neighbors[0].remote_name, "192.168.1.5");
        assert_eq!(neighbors[0].id_kind, NeighborIdKind::Ip);
    }

    #[test]
    fn duplicate_observations_collapse() {
        let entry = [
            ("local_interface", "Gi0/1"),
            ("remote_name", "sw2"),
            ("remote_interface", "Gi0/2"),
        ];
        let rows = vec![row(&entry), row(&entry)];
        let neighbors = LldpNormalizer::normalize(&rows, &device());
        assert_eq!(neighbors.len(), 1);
    }
}
