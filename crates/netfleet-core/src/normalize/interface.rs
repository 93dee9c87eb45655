use super::{is_full_vlan_range, parse_speed_bps, parse_vlan_list};
use crate::model::{Device, Interface, PortType, SwitchportMode};
use crate::names::{self, AliasMap};
use crate::parse::{Row, RowExt};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Raw switchport format, tagged at parse-row inspection time so that
/// normalization is a deterministic match instead of a cascade whose order
/// is load-bearing.
///
/// NX-OS detection must run before the QTech check: NX-OS rows also carry a
/// `switchport` field, and keying on it first would swallow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchportDialect {
    IosLike,
    NxosLike,
    QtechLike,
}

impl SwitchportDialect {
    /// Identify a parsed switchport row by field shape
    pub fn detect(row: &Row) -> Option<Self> {
        if row.has("admin_mode") {
            return Some(SwitchportDialect::IosLike);
        }
        // Before the QTech branch: NX-OS rows have switchport too
        if row.has("mode") && row.has("trunking_vlans") {
            return Some(SwitchportDialect::NxosLike);
        }
        if row.has("switchport") && row.has("MODE") && row.has("VLAN_LISTS") {
            return Some(SwitchportDialect::QtechLike);
        }
        None
    }
}

/// Normalized switchport configuration for one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchportSetting {
    pub mode: SwitchportMode,
    pub untagged: Option<u16>,
    pub tagged: BTreeSet<u16>,
}

impl SwitchportSetting {
    fn unset() -> Self {
        Self {
            mode: SwitchportMode::Unset,
            untagged: None,
            tagged: BTreeSet::new(),
        }
    }
}

/// Turns parsed interface rows into canonical [`Interface`] records and
/// applies LAG / switchport / media enrichment tables.
pub struct InterfaceNormalizer;

impl InterfaceNormalizer {
    /// Build canonical records from primary-command rows
    pub fn normalize(rows: &[Row], device: &Device) -> Vec<Interface> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(raw_name) = row.text("interface") else {
                continue;
            };
            let name = names::canonical(raw_name);
            let short_name = names::short(raw_name);

            let enabled = row
                .text("link_status")
                .map(|status| {
                    let status = status.to_lowercase();
                    !status.contains("administratively down") && !status.contains("disabled")
                })
                .unwrap_or(true)
                && row
                    .text("admin_state")
                    .map(|state| state.eq_ignore_ascii_case("up"))
                    .unwrap_or(true)
                && row
                    .text("admin_status")
                    .map(|state| state.eq_ignore_ascii_case("enabled"))
                    .unwrap_or(true);

            let speed = row
                .text("speed")
                .and_then(parse_speed_bps)
                .or_else(|| {
                    row.text("bandwidth")
                        .and_then(|bw| bw.parse::<u64>().ok())
                        .map(|kbit| kbit * 1_000)
                });

            let port_type = detect_port_type(row, raw_name);
            let nb_type = port_type.nb_type(speed).to_string();

            let (ip4, ip6) = split_addresses(row);

            out.push(Interface {
                device: device.host.clone(),
                name,
                short_name,
                enabled,
                description: row.text("description").map(str::to_string),
                mac: row.text("mac").and_then(crate::model::canonical_mac),
                mtu: row.text("mtu").and_then(|m| m.parse().ok()),
                speed,
                ip4,
                ip6,
                port_type,
                nb_type,
                mode: SwitchportMode::Unset,
                untagged_vlan: None,
                tagged_vlans: BTreeSet::new(),
                lag_parent: None,
            });
        }
        out
    }

    /// Build the member -> LAG map from LAG summary rows.
    /// Handles both Cisco-style member columns ("Gi0/1(P) Gi0/2(D)") and
    /// QTech comma lists ("TFGigabitEthernet 0/1,TFGigabitEthernet 0/2").
    pub fn lag_membership(rows: &[Row]) -> AliasMap<String> {
        let mut map = AliasMap::new();
        for row in rows {
            let Some(lag) = row.text("lag") else {
                continue;
            };
            let lag_canonical = names::canonical(lag);
            let Some(member_blobs) = row.list("members") else {
                continue;
            };
            for blob in member_blobs {
                for member in split_members(blob) {
                    map.insert(&member, lag_canonical.clone());
                }
            }
        }
        map
    }

    /// Build the per-interface switchport map from dialect-tagged rows
    pub fn switchport_settings(rows: &[Row]) -> AliasMap<SwitchportSetting> {
        let mut map = AliasMap::new();
        for row in rows {
            let Some(raw_name) = row.text("interface") else {
                continue;
            };
            let Some(dialect) = SwitchportDialect::detect(row) else {
                debug!(interface = raw_name, "switchport row with unknown shape");
                continue;
            };
            let setting = match dialect {
                SwitchportDialect::IosLike => normalize_ios_like(row),
                SwitchportDialect::NxosLike => normalize_nxos_like(row),
                SwitchportDialect::QtechLike => normalize_qtech_like(row),
            };
            map.insert(raw_name, setting);
        }
        map
    }

    /// Build the per-interface media map from status/transceiver rows
    pub fn media_types(rows: &[Row]) -> AliasMap<String> {
        let mut map = AliasMap::new();
        for row in rows {
            let (Some(raw_name), Some(media)) = (row.text("interface"), row.text("media")) else {
                continue;
            };
            if row
                .text("present")
                .map(|p| !p.eq_ignore_ascii_case("present"))
                .unwrap_or(false)
            {
                continue;
            }
            map.insert(raw_name, media.to_string());
        }
        map
    }

    /// Set `lag_parent` by looking up each interface's canonical name and
    /// every alias against the membership map. LAGs themselves never get a
    /// parent.
    pub fn enrich_with_lag(interfaces: &mut [Interface], membership: &AliasMap<String>) {
        for iface in interfaces.iter_mut() {
            if iface.port_type == PortType::Lag {
                continue;
            }
            if let Some(parent) = membership.get(&iface.name) {
                iface.lag_parent = Some(parent.clone());
            }
        }
    }

    /// Apply switchport mode and VLAN membership through alias lookup
    pub fn enrich_with_switchport(
        interfaces: &mut [Interface],
        settings: &AliasMap<SwitchportSetting>,
    ) {
        for iface in interfaces.iter_mut() {
            let Some(setting) = settings.get(&iface.name) else {
                continue;
            };
            iface.mode = setting.mode;
            iface.untagged_vlan = setting.untagged;
            iface.tagged_vlans = match setting.mode {
                // Access and tagged-all both imply an empty tagged set
                SwitchportMode::Access | SwitchportMode::TaggedAll | SwitchportMode::Unset => {
                    BTreeSet::new()
                }
                SwitchportMode::Tagged => setting.tagged.clone(),
            };
        }
    }

    /// Refine port_type / nb_type from observed media
    pub fn enrich_with_media_type(interfaces: &mut [Interface], media: &AliasMap<String>) {
        for iface in interfaces.iter_mut() {
            let Some(media_type) = media.get(&iface.name) else {
                continue;
            };
            if let Some(port_type) = media_to_port_type(media_type) {
                iface.port_type = port_type;
                iface.nb_type = port_type.nb_type(iface.speed).to_string();
            }
        }
    }
}

/// Port type detection ladder: explicit field, media hint, hardware hint,
/// then the name-prefix fallback.
fn detect_port_type(row: &Row, raw_name: &str) -> PortType {
    if let Some(explicit) = row.text("port_type") {
        if let Some(port_type) = named_port_type(explicit) {
            return port_type;
        }
    }
    if let Some(media) = row.text("media_type") {
        if let Some(port_type) = media_to_port_type(media) {
            return port_type;
        }
    }
    if let Some(hardware) = row.text("hardware_type") {
        if let Some(port_type) = hardware_to_port_type(hardware) {
            return port_type;
        }
    }
    names::classify(raw_name)
}

fn named_port_type(raw: &str) -> Option<PortType> {
    match raw.trim().to_lowercase().as_str() {
        "access-copper" => Some(PortType::AccessCopper),
        "sfp" => Some(PortType::Sfp),
        "sfp+" | "sfp-plus" => Some(PortType::SfpPlus),
        "sfp28" => Some(PortType::Sfp28),
        "qsfp28" => Some(PortType::Qsfp28),
        "qsfpdd" | "qsfp-dd" => Some(PortType::Qsfpdd),
        "lag" => Some(PortType::Lag),
        "virtual" => Some(PortType::Virtual),
        "loopback" => Some(PortType::Loopback),
        "mgmt" => Some(PortType::Mgmt),
        _ => None,
    }
}

fn media_to_port_type(raw: &str) -> Option<PortType> {
    let media = raw.to_lowercase();
    if media.contains("400g") || media.contains("qsfp-dd") || media.contains("qsfpdd") {
        Some(PortType::Qsfpdd)
    } else if media.contains("100g") || media.contains("qsfp28") || media.contains("40g") {
        Some(PortType::Qsfp28)
    } else if media.contains("25g") || media.contains("sfp28") {
        Some(PortType::Sfp28)
    } else if media.contains("10g") || media.contains("sfp+") || media.contains("sfp-10") {
        Some(PortType::SfpPlus)
    } else if media.contains("basesx")
        || media.contains("baselx")
        || media.contains("basezx")
        || media.contains("base-x")
        || media.contains("1000base-sx")
        || (media.contains("sfp") && !media.contains("copper"))
    {
        Some(PortType::Sfp)
    } else if media.contains("rj45")
        || media.contains("basetx")
        || media.contains("base-t")
        || media.contains("copper")
        || media.contains("10/100")
    {
        Some(PortType::AccessCopper)
    } else {
        None
    }
}

fn hardware_to_port_type(raw: &str) -> Option<PortType> {
    let hardware = raw.to_lowercase();
    if hardware.contains("etherchannel") || hardware.contains("port-channel") {
        Some(PortType::Lag)
    } else if hardware.contains("loopback") {
        Some(PortType::Loopback)
    } else if hardware.contains("vlan") || hardware.contains("svi") {
        Some(PortType::Virtual)
    } else if hardware.contains("rj45") || hardware.contains("10/100") {
        Some(PortType::AccessCopper)
    } else {
        // "Hardware is Ethernet" and friends carry no media information
        None
    }
}

fn split_addresses(row: &Row) -> (Option<String>, Option<String>) {
    let mut ip4 = None;
    let mut ip6 = None;
    if let Some(address) = row.text("ip_address") {
        let address = address.trim_end_matches(',');
        if address.contains(':') {
            ip6 = Some(address.to_string());
        } else if address.contains('/') {
            ip4 = Some(address.to_string());
        } else if let Some(dest) = row.text("destination") {
            // Junos prints the bare local address; the prefix length comes
            // from the destination network
            let prefix = dest.rsplit_once('/').map(|(_, p)| p).unwrap_or("32");
            ip4 = Some(format!("{}/{}", address, prefix));
        } else {
            ip4 = Some(format!("{}/32", address));
        }
    }
    (ip4, ip6)
}

fn split_members(blob: &str) -> Vec<String> {
    let mut members = Vec::new();
    for chunk in blob.split(',') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if chunk.contains('(') {
            for token in chunk.split_whitespace() {
                let member = token.split('(').next().unwrap_or(token).trim();
                if !member.is_empty() {
                    members.push(member.to_string());
                }
            }
        } else {
            members.push(chunk.to_string());
        }
    }
    members
}

fn normalize_ios_like(row: &Row) -> SwitchportSetting {
    if row
        .text("switchport")
        .map(|s| s.eq_ignore_ascii_case("disabled"))
        .unwrap_or(false)
    {
        return SwitchportSetting::unset();
    }
    let admin = row.text("admin_mode").unwrap_or("").to_lowercase();
    let oper = row.text("oper_mode").unwrap_or("").to_lowercase();
    let effective = if admin.contains("access") || admin.contains("trunk") {
        admin
    } else {
        // dynamic auto/desirable: what the port negotiated to
        oper
    };
    if effective.contains("trunk") {
        trunk_setting(row, "trunking_vlans")
    } else if effective.contains("access") {
        SwitchportSetting {
            mode: SwitchportMode::Access,
            untagged: row.text("access_vlan").and_then(|v| v.parse().ok()),
            tagged: BTreeSet::new(),
        }
    } else {
        SwitchportSetting::unset()
    }
}

fn normalize_nxos_like(row: &Row) -> SwitchportSetting {
    if row
        .text("switchport")
        .map(|s| s.eq_ignore_ascii_case("disabled"))
        .unwrap_or(false)
    {
        return SwitchportSetting::unset();
    }
    let mode = row.text("mode").unwrap_or("").to_lowercase();
    if mode.contains("trunk") {
        trunk_setting(row, "trunking_vlans")
    } else if mode.contains("access") {
        SwitchportSetting {
            mode: SwitchportMode::Access,
            untagged: row.text("access_vlan").and_then(|v| v.parse().ok()),
            tagged: BTreeSet::new(),
        }
    } else {
        SwitchportSetting::unset()
    }
}

fn normalize_qtech_like(row: &Row) -> SwitchportSetting {
    if row
        .text("switchport")
        .map(|s| s.eq_ignore_ascii_case("disabled"))
        .unwrap_or(false)
    {
        return SwitchportSetting::unset();
    }
    let mode = row.text("MODE").unwrap_or("").to_lowercase();
    if mode.contains("trunk") {
        let lists = row.text("VLAN_LISTS").unwrap_or("");
        if lists.eq_ignore_ascii_case("all") {
            return SwitchportSetting {
                mode: SwitchportMode::TaggedAll,
                untagged: row.text("native_vlan").and_then(|v| v.parse().ok()),
                tagged: BTreeSet::new(),
            };
        }
        let tagged = parse_vlan_list(lists);
        if is_full_vlan_range(&tagged) {
            return SwitchportSetting {
                mode: SwitchportMode::TaggedAll,
                untagged: row.text("native_vlan").and_then(|v| v.parse().ok()),
                tagged: BTreeSet::new(),
            };
        }
        SwitchportSetting {
            mode: SwitchportMode::Tagged,
            untagged: row.text("native_vlan").and_then(|v| v.parse().ok()),
            tagged,
        }
    } else if mode.contains("access") {
        SwitchportSetting {
            mode: SwitchportMode::Access,
            untagged: row.text("access_vlan").and_then(|v| v.parse().ok()),
            tagged: BTreeSet::new(),
        }
    } else {
        SwitchportSetting::unset()
    }
}

/// Shared trunk handling: comma lists, hyphen ranges, the literal ALL token,
/// and the full 1-4094 range all collapse tagged-all to an empty set.
fn trunk_setting(row: &Row, vlans_field: &str) -> SwitchportSetting {
    let untagged = row.text("native_vlan").and_then(|v| v.parse().ok());
    let joined = match row.list(vlans_field) {
        Some(parts) => parts.join(","),
        None => row.text(vlans_field).unwrap_or("").to_string(),
    };
    if joined.trim().eq_ignore_ascii_case("all") {
        return SwitchportSetting {
            mode: SwitchportMode::TaggedAll,
            untagged,
            tagged: BTreeSet::new(),
        };
    }
    let tagged = parse_vlan_list(&joined);
    if is_full_vlan_range(&tagged) {
        SwitchportSetting {
            mode: SwitchportMode::TaggedAll,
            untagged,
            tagged: BTreeSet::new(),
        }
    } else if tagged.is_empty() && joined.trim().is_empty() {
        warn!("trunk port without a VLAN list, treating as tagged-all");
        SwitchportSetting {
            mode: SwitchportMode::TaggedAll,
            untagged,
            tagged: BTreeSet::new(),
        }
    } else {
        SwitchportSetting {
            mode: SwitchportMode::Tagged,
            untagged,
            tagged,
        }
    }
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
    fn nxos_row_is_detected_before_qtech() {
        // NX-OS rows carry switchport=enabled like QTech rows do; the
        // dialect check must classify on mode+trunking_vlans first.
        let nxos = row(&[
            ("interface", "Ethernet1/1"),
            ("switchport", "enabled"),
            ("mode", "trunk"),
            ("trunking_vlans", "1-4094"),
        ]);
        assert_eq!(
            SwitchportDialect::detect(&nxos),
            Some(SwitchportDialect::NxosLike)
        );

        let qtech = row(&[
            ("interface", "TFGigabitEthernet 0/1"),
            ("switchport", "enabled"),
            ("MODE", "ACCESS"),
            ("access_vlan", "10"),
            ("VLAN_LISTS", "ALL"),
        ]);
        assert_eq!(
            SwitchportDialect::detect(&qtech),
            Some(SwitchportDialect::QtechLike)
        );
    }

    #[test]
    fn nxos_full_range_trunk_is_tagged_all() {
        // Historic regression: must not normalize to plain tagged
        let rows = vec![row(&[
            ("interface", "Ethernet1/1"),
            ("switchport", "enabled"),
            ("mode", "trunk"),
            ("trunking_vlans", "1-4094"),
        ])];
        let settings = InterfaceNormalizer::switchport_settings(&rows);
        let setting = settings.get("Ethernet1/1").unwrap();
        assert_eq!(setting.mode, SwitchportMode::TaggedAll);
        assert!(setting.tagged.is_empty());
    }

    #[test]
    fn ios_access_port_has_untagged_only() {
        let rows = vec![row(&[
            ("interface", "Gi0/1"),
            ("switchport", "Enabled"),
            ("admin_mode", "static access"),
            ("access_vlan", "10"),
        ])];
        let settings = InterfaceNormalizer::switchport_settings(&rows);
        let setting = settings.get("GigabitEthernet0/1").unwrap();
        assert_eq!(setting.mode, SwitchportMode::Access);
        assert_eq!(setting.untagged, Some(10));
        assert!(setting.tagged.is_empty());
    }

    #[test]
    fn ios_trunk_with_explicit_list_is_tagged() {
        let mut trunk = row(&[
            ("interface", "Gi0/2"),
            ("switchport", "Enabled"),
            ("admin_mode", "trunk"),
            ("native_vlan", "1"),
        ]);
        trunk.insert(
            "trunking_vlans".to_string(),
            RowValue::List(vec!["10,20".to_string(), "30-32".to_string()]),
        );
        let settings = InterfaceNormalizer::switchport_settings(&[trunk]);
        let setting = settings.get("Gi0/2").unwrap();
        assert_eq!(setting.mode, SwitchportMode::Tagged);
        assert_eq!(
            setting.tagged.iter().copied().collect::<Vec<_>>(),
            vec![10, 20, 30, 31, 32]
        );
    }

    #[test]
    fn qtech_all_token_is_tagged_all() {
        let rows = vec![row(&[
            ("interface", "TFGigabitEthernet 0/1"),
            ("switchport", "enabled"),
            ("MODE", "TRUNK"),
            ("native_vlan", "1"),
            ("VLAN_LISTS", "ALL"),
        ])];
        let settings = InterfaceNormalizer::switchport_settings(&rows);
        let setting = settings.get("TFGigabitEthernet0/1").unwrap();
        assert_eq!(setting.mode, SwitchportMode::TaggedAll);
        assert!(setting.tagged.is_empty());
    }

    #[test]
    fn lag_membership_handles_cisco_and_qtech_shapes() {
        let mut cisco = Row::new();
        cisco.insert("lag".to_string(), RowValue::Text("Po1".to_string()));
        cisco.insert(
            "members".to_string(),
            RowValue::List(vec!["Gi0/1(P)    Gi0/2(D)".to_string()]),
        );
        let mut qtech = Row::new();
        qtech.insert("lag".to_string(), RowValue::Text("Ag10".to_string()));
        qtech.insert(
            "members".to_string(),
            RowValue::List(vec![
                "TFGigabitEthernet 0/1,TFGigabitEthernet 0/2".to_string()
            ]),
        );
        let map = InterfaceNormalizer::lag_membership(&[cisco, qtech]);
        assert_eq!(map.get("GigabitEthernet0/1"), Some(&"Port-channel1".to_string()));
        assert_eq!(map.get("Gi0/2"), Some(&"Port-channel1".to_string()));
        assert_eq!(
            map.get("TFGigabitEthernet0/2"),
            Some(&"AggregatePort10".to_string())
        );
    }

    #[test]
    fn enrichment_resolves_aliases() {
        let rows = vec![
            row(&[
                ("interface", "HundredGigE0/55"),
                ("link_status", "up"),
                ("protocol", "up"),
            ]),
            row(&[("interface", "Po1"), ("link_status", "up"), ("protocol", "up")]),
        ];
        let mut interfaces = InterfaceNormalizer::normalize(&rows, &device());

        // Membership reported under the short alias must land on the
        // canonical record
        let mut membership = AliasMap::new();
        membership.insert("Hu0/55", "Port-channel1".to_string());
        InterfaceNormalizer::enrich_with_lag(&mut interfaces, &membership);
        assert_eq!(
            interfaces[0].lag_parent.as_deref(),
            Some("Port-channel1")
        );
        // The LAG itself never gets a parent
        assert_eq!(interfaces[1].port_type, PortType::Lag);
        assert_eq!(interfaces[1].lag_parent, None);
    }

    #[test]
    fn media_enrichment_refines_nb_type() {
        let rows = vec![row(&[
            ("interface", "Gi0/1"),
            ("link_status", "up"),
            ("protocol", "up"),
        ])];
        let mut interfaces = InterfaceNormalizer::normalize(&rows, &device());
        assert_eq!(interfaces[0].port_type, PortType::AccessCopper);

        let mut media = AliasMap::new();
        media.insert("Gi0/1", "SFP-10GBase-LR".to_string());
        InterfaceNormalizer::enrich_with_media_type(&mut interfaces, &media);
        assert_eq!(interfaces[0].port_type, PortType::SfpPlus);
        assert_eq!(interfaces[0].nb_type, "10gbase-x-sfpp");
    }

    #[test]
    fn admin_down_is_disabled() {
        let rows = vec![row(&[
            ("interface", "Gi0/3"),
            ("link_status", "administratively down"),
            ("protocol", "down"),
        ])];
        let interfaces = InterfaceNormalizer::normalize(&rows, &device());
        assert!(!interfaces[0].enabled);
    }

    #[test]
    fn bandwidth_kbit_becomes_bps() {
        let rows = vec![row(&[
            ("interface", "Gi0/1"),
            ("link_status", "up"),
            ("protocol", "up"),
            ("bandwidth", "1000000"),
        ])];
        let interfaces = InterfaceNormalizer::normalize(&rows, &device());
        assert_eq!(interfaces[0].speed, Some(1_000_000_000));
    }

    #[test]
    fn junos_address_gets_prefix_from_destination() {
        let rows = vec![row(&[
            ("interface", "ge-0/0/0"),
            ("admin_status", "Enabled"),
            ("link_status", "Up"),
            ("ip_address", "10.0.0.1"),
            ("destination", "10.0.0.0/24"),
        ])];
        let interfaces = InterfaceNormalizer::normalize(&rows, &device());
        assert_eq!(interfaces[0].ip4.as_deref(), Some("10.0.0.1/24"));
    }
}
