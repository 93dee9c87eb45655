mod device;
mod interface;
mod inventory;
mod lldp;
mod mac;

pub use device::DeviceNormalizer;
pub use interface::{
    InterfaceNormalizer, SwitchportDialect, SwitchportSetting,
};
pub use inventory::InventoryNormalizer;
pub use lldp::LldpNormalizer;
pub use mac::MacNormalizer;

use crate::model::vlan_id_valid;
use std::collections::BTreeSet;
use tracing::warn;

/// Parse a VLAN list accepting comma lists and hyphen ranges: "10,20,30-40".
/// Ids outside [1, 4094] are rejected and dropped.
pub fn parse_vlan_list(raw: &str) -> BTreeSet<u16> {
    let mut out = BTreeSet::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((lo, hi)) = token.split_once('-') {
            let (Ok(lo), Ok(hi)) = (lo.trim().parse::<u16>(), hi.trim().parse::<u16>()) else {
                warn!(token, "unparseable VLAN range token");
                continue;
            };
            for vid in lo..=hi {
                if vlan_id_valid(vid) {
                    out.insert(vid);
                }
            }
        } else {
            match token.parse::<u16>() {
                Ok(vid) if vlan_id_valid(vid) => {
                    out.insert(vid);
                }
                Ok(vid) => {
                    warn!(vid, "VLAN id out of range, dropped");
                }
                Err(_) => {
                    warn!(token, "unparseable VLAN token");
                }
            }
        }
    }
    out
}

/// True when a VLAN list names the entire usable range
pub fn is_full_vlan_range(set: &BTreeSet<u16>) -> bool {
    set.len() == 4094
}

/// Parse a speed hint into bits per second. Accepts "1000Mb/s", "10Gb/s",
/// "1000mbps", "a-1000" and bare Kbit bandwidth values are handled by the
/// caller.
pub fn parse_speed_bps(raw: &str) -> Option<u64> {
    let lower = raw.trim().to_lowercase();
    let lower = lower.strip_prefix("a-").unwrap_or(&lower);
    let digits: String = lower.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value: u64 = digits.parse().ok()?;
    if lower.contains('g') {
        Some(value * 1_000_000_000)
    } else if lower.contains('m') {
        Some(value * 1_000_000)
    } else if lower.contains('k') {
        Some(value * 1_000)
    } else {
        // Bare numbers in switch output are megabits ("a-1000", "Speed: 1000")
        Some(value * 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlan_list_accepts_commas_and_ranges() {
        let set = parse_vlan_list("10,20,30-33");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec![10, 20, 30, 31, 32, 33]
        );
    }

    #[test]
    fn vlan_list_rejects_out_of_range_ids() {
        let set = parse_vlan_list("0,10,4095");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn full_range_is_detected() {
        assert!(is_full_vlan_range(&parse_vlan_list("1-4094")));
        assert!(!is_full_vlan_range(&parse_vlan_list("1-4093")));
    }

    #[test]
    fn speed_hints_parse_to_bps() {
        assert_eq!(parse_speed_bps("1000Mb/s"), Some(1_000_000_000));
        assert_eq!(parse_speed_bps("10Gb/s"), Some(10_000_000_000));
        assert_eq!(parse_speed_bps("a-1000"), Some(1_000_000_000));
        assert_eq!(parse_speed_bps("1000mbps"), Some(1_000_000_000));
        assert_eq!(parse_speed_bps("unknown"), None);
    }
}
