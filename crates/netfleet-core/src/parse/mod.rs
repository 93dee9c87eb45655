pub mod engine;
mod library;

pub use engine::{Row, RowExt, RowValue, Template, TemplateDef};

use crate::error::FleetError;
use crate::platform::{Intent, PlatformRegistry};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, trace};

lazy_static! {
    static ref FALLBACK_HOSTNAME: Regex =
        Regex::new(r"(?m)^(?P<hostname>\S+)\s+uptime\s+is\s").unwrap();
    static ref FALLBACK_VERSION: Regex =
        Regex::new(r"[Vv]ersion[:\s]+(?P<version>[0-9][^,\s]*)").unwrap();
    static ref FALLBACK_INTERFACE: Regex =
        Regex::new(r"^(?P<interface>\S+) is (?P<link_status>\S+)").unwrap();
}

/// Two-stage template resolver
///
/// Resolution order, taking the first that yields rows:
/// 1. custom template for (platform, command),
/// 2. shared template for (template family, command),
/// 3. regex fallback, devices/interfaces intents only.
pub struct TemplateParser {
    shared: HashMap<(String, String), Template>,
    custom: HashMap<(String, String), Template>,
}

impl TemplateParser {
    /// Compile the built-in library. A malformed definition fails the run
    /// here, before any device is touched.
    pub fn builtin() -> Result<Self, FleetError> {
        let mut shared = HashMap::new();
        for entry in library::shared_entries() {
            shared.insert(
                (entry.family.to_string(), entry.command.to_string()),
                Template::compile(entry.def)?,
            );
        }
        let mut custom = HashMap::new();
        for entry in library::custom_entries() {
            custom.insert(
                (entry.platform.to_string(), entry.command.to_string()),
                Template::compile(entry.def)?,
            );
        }
        Ok(Self { shared, custom })
    }

    /// Parse raw command output into rows. Zero rows is a tolerable result;
    /// collectors treat missing enrichment as degraded, not fatal.
    pub fn parse(
        &self,
        registry: &PlatformRegistry,
        platform: &str,
        command: &str,
        raw: &str,
    ) -> Result<Vec<Row>, FleetError> {
        let key = registry.template_key(platform, command);

        if let Some(template) = self.custom.get(&key) {
            let rows = template.parse(raw);
            if !rows.is_empty() {
                trace!(template = template.name, rows = rows.len(), "custom template matched");
                return Ok(rows);
            }
        }

        let family = registry.resolve(platform)?.template_family.to_string();
        if let Some(template) = self.shared.get(&(family.clone(), key.1.clone())) {
            let rows = template.parse(raw);
            if !rows.is_empty() {
                trace!(template = template.name, rows = rows.len(), "shared template matched");
                return Ok(rows);
            }
        }

        // Regex fallback covers only the two primary intents where a bare
        // minimum of fields can be scraped without a proper template.
        let entry = registry.resolve(platform)?;
        if entry.command(Intent::Devices) == Some(command) {
            let rows = fallback_devices(raw);
            debug!(platform, command, rows = rows.len(), "devices regex fallback");
            return Ok(rows);
        }
        if entry.command(Intent::Interfaces) == Some(command) {
            let rows = fallback_interfaces(raw);
            debug!(platform, command, rows = rows.len(), "interfaces regex fallback");
            return Ok(rows);
        }

        Ok(Vec::new())
    }
}

/// Scrape at least hostname/version out of unrecognized "show version" output
fn fallback_devices(raw: &str) -> Vec<Row> {
    let mut row = Row::new();
    if let Some(caps) = FALLBACK_HOSTNAME.captures(raw) {
        row.insert(
            "hostname".to_string(),
            RowValue::Text(caps["hostname"].to_string()),
        );
    }
    if let Some(caps) = FALLBACK_VERSION.captures(raw) {
        row.insert(
            "version".to_string(),
            RowValue::Text(caps["version"].to_string()),
        );
    }
    if row.is_empty() {
        Vec::new()
    } else {
        vec![row]
    }
}

/// Scrape interface name/status pairs out of unrecognized interface output
fn fallback_interfaces(raw: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = FALLBACK_INTERFACE.captures(line) {
            let mut row = Row::new();
            row.insert(
                "interface".to_string(),
                RowValue::Text(caps["interface"].to_string()),
            );
            row.insert(
                "link_status".to_string(),
                RowValue::Text(caps["link_status"].to_string()),
            );
            rows.push(row);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_and_registry() -> (TemplateParser, PlatformRegistry) {
        (
            TemplateParser::builtin().expect("builtin library must compile"),
            PlatformRegistry::builtin(),
        )
    }

    const IOS_VERSION_FIXTURE: &str = "\
Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(4)E10, RELEASE SOFTWARE (fc2)
Technical Support: http://www.cisco.com/techsupport
core-sw-01 uptime is 41 weeks, 6 days, 2 hours, 52 minutes
System image file is \"flash:/c2960x-universalk9-mz.152-4.E10.bin\"

cisco WS-C2960X-48TS-L (APM86XXX) processor (revision D0) with 524288K bytes of memory.
Processor board ID FOC2233X0ZY
Model number                    : WS-C2960X-48TS-L
";

    #[test]
    fn ios_show_version_parses() {
        let (parser, registry) = parser_and_registry();
        let rows = parser
            .parse(&registry, "cisco_ios", "show version", IOS_VERSION_FIXTURE)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("version"), Some("15.2(4)E10"));
        assert_eq!(rows[0].text("hostname"), Some("core-sw-01"));
        assert_eq!(rows[0].text("serial"), Some("FOC2233X0ZY"));
        assert_eq!(rows[0].text("model"), Some("WS-C2960X-48TS-L"));
    }

    #[test]
    fn qtech_custom_template_wins_over_family() {
        let (parser, registry) = parser_and_registry();
        let raw = "\
System description      : QTECH QSW-6900-56F Switch
System uptime           : 32 days, 4 hours, 10 minutes
System software version : 8.4.1(R3)
System serial number    : G1QW8C123456
Device model            : QSW-6900-56F
";
        let rows = parser
            .parse(&registry, "qtech", "show version", raw)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("version"), Some("8.4.1(R3)"));
        assert_eq!(rows[0].text("serial"), Some("G1QW8C123456"));
        assert_eq!(rows[0].text("model"), Some("QSW-6900-56F"));
    }

    #[test]
    fn qtech_falls_back_to_cisco_family_templates() {
        let (parser, registry) = parser_and_registry();
        // QTech has no custom template for etherchannel-style output, and the
        // registry maps its family to cisco_ios. "show running-config" has no
        // template anywhere and is not a fallback intent -> empty.
        let rows = parser
            .parse(&registry, "qtech", "show running-config", "hostname sw1")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn devices_intent_uses_regex_fallback() {
        let (parser, registry) = parser_and_registry();
        // Output no template recognizes, but the fallback scrapes it
        let raw = "Frobozz OS version 1.2.3\nedge-sw-9 uptime is 3 days\n";
        let rows = parser
            .parse(&registry, "cisco_ios", "show version", raw)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("hostname"), Some("edge-sw-9"));
        assert_eq!(rows[0].text("version"), Some("1.2.3"));
    }

    #[test]
    fn nxos_switchport_exposes_mode_not_admin_mode() {
        let (parser, registry) = parser_and_registry();
        let raw = "\
Name: Ethernet1/1
  Switchport: Enabled
  Operational Mode: trunk
  Access Mode VLAN: 1 (default)
  Trunking Native Mode VLAN: 1 (default)
  Trunking VLANs Allowed: 1-4094
";
        let rows = parser
            .parse(&registry, "cisco_nxos", "show interface switchport", raw)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("mode"), Some("trunk"));
        assert!(!rows[0].has("admin_mode"));
        assert_eq!(
            rows[0].list("trunking_vlans"),
            Some(&["1-4094".to_string()][..])
        );
    }

    #[test]
    fn ios_etherchannel_members_accumulate() {
        let (parser, registry) = parser_and_registry();
        let raw = "\
Group  Port-channel  Protocol    Ports
------+-------------+-----------+-----------------------------------------------
1      Po1(SU)         LACP      Gi0/1(P)    Gi0/2(P)
                                 Gi0/3(P)
";
        let rows = parser
            .parse(&registry, "cisco_ios", "show etherchannel summary", raw)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("lag"), Some("Po1"));
        let members = rows[0].list("members").unwrap();
        assert_eq!(members.len(), 2);
        assert!(members[1].contains("Gi0/3"));
    }
}
