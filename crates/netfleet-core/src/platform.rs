use crate::error::FleetError;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// SSH driver flavor behind a platform tag
///
/// The closed set of CLI dialects the connection layer knows how to drive.
/// `WlcLike` is reserved for wireless controllers; no registry entry
/// constructs it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SshDriver {
    IosLike,
    NxosLike,
    EosLike,
    JunosLike,
    WlcLike,
}

impl SshDriver {
    /// Command issued right after login to pin paging off
    pub fn no_pager_command(&self) -> &'static str {
        match self {
            SshDriver::IosLike | SshDriver::NxosLike | SshDriver::EosLike => "terminal length 0",
            SshDriver::JunosLike => "set cli screen-length 0",
            SshDriver::WlcLike => "config paging disable",
        }
    }
}

/// A named collection task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Devices,
    Mac,
    Lldp,
    Interfaces,
    Inventory,
    Backup,
    // Secondary enrichment intents
    Lag,
    Switchport,
    MediaType,
    Transceiver,
}

impl Intent {
    /// Secondary intents enrich primary records; a platform without a
    /// command for one simply skips that enrichment.
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            Intent::Lag | Intent::Switchport | Intent::MediaType | Intent::Transceiver
        )
    }

    pub const fn primary() -> [Intent; 6] {
        [
            Intent::Devices,
            Intent::Mac,
            Intent::Lldp,
            Intent::Interfaces,
            Intent::Inventory,
            Intent::Backup,
        ]
    }
}

impl FromStr for Intent {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devices" => Ok(Intent::Devices),
            "mac" => Ok(Intent::Mac),
            "lldp" => Ok(Intent::Lldp),
            "interfaces" => Ok(Intent::Interfaces),
            "inventory" => Ok(Intent::Inventory),
            "backup" => Ok(Intent::Backup),
            "lag" => Ok(Intent::Lag),
            "switchport" => Ok(Intent::Switchport),
            "media_type" => Ok(Intent::MediaType),
            "transceiver" => Ok(Intent::Transceiver),
            _ => Err(FleetError::ConfigError(format!("unknown intent: {}", s))),
        }
    }
}

impl Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Intent::Devices => "devices",
            Intent::Mac => "mac",
            Intent::Lldp => "lldp",
            Intent::Interfaces => "interfaces",
            Intent::Inventory => "inventory",
            Intent::Backup => "backup",
            Intent::Lag => "lag",
            Intent::Switchport => "switchport",
            Intent::MediaType => "media_type",
            Intent::Transceiver => "transceiver",
        };
        write!(f, "{}", name)
    }
}

/// Everything the engine needs to know about one platform tag
#[derive(Debug, Clone)]
pub struct PlatformEntry {
    pub tag: &'static str,
    pub driver: SshDriver,
    /// Family key used to look up shared templates when no per-platform
    /// custom template exists (e.g. qtech resolves through cisco_ios)
    pub template_family: &'static str,
    pub vendor: &'static str,
    /// NetBox platform slug hint
    pub nb_platform: &'static str,
    commands: HashMap<Intent, &'static str>,
}

impl PlatformEntry {
    pub fn command(&self, intent: Intent) -> Option<&'static str> {
        self.commands.get(&intent).copied()
    }
}

/// Table-driven mapping from platform tag to driver, templates and commands
///
/// Adding a Cisco-like vendor costs one `register` call and zero code. The
/// registry is constructed once at startup and shared read-only.
#[derive(Debug)]
pub struct PlatformRegistry {
    entries: HashMap<&'static str, PlatformEntry>,
}

impl PlatformRegistry {
    /// Registry covering the stock fleet
    pub fn builtin() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };

        registry.register(PlatformEntry {
            tag: "cisco_ios",
            driver: SshDriver::IosLike,
            template_family: "cisco_ios",
            vendor: "cisco",
            nb_platform: "cisco-ios",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show mac address-table"),
                (Intent::Lldp, "show lldp neighbors detail"),
                (Intent::Interfaces, "show interfaces"),
                (Intent::Inventory, "show inventory"),
                (Intent::Backup, "show running-config"),
                (Intent::Lag, "show etherchannel summary"),
                (Intent::Switchport, "show interfaces switchport"),
                (Intent::MediaType, "show interfaces status"),
                (Intent::Transceiver, "show interfaces transceiver"),
            ]),
        });

        registry.register(PlatformEntry {
            tag: "cisco_xe",
            driver: SshDriver::IosLike,
            template_family: "cisco_ios",
            vendor: "cisco",
            nb_platform: "cisco-ios-xe",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show mac address-table"),
                (Intent::Lldp, "show lldp neighbors detail"),
                (Intent::Interfaces, "show interfaces"),
                (Intent::Inventory, "show inventory"),
                (Intent::Backup, "show running-config"),
                (Intent::Lag, "show etherchannel summary"),
                (Intent::Switchport, "show interfaces switchport"),
                (Intent::MediaType, "show interfaces status"),
                (Intent::Transceiver, "show interfaces transceiver"),
            ]),
        });

        registry.register(PlatformEntry {
            tag: "cisco_nxos",
            driver: SshDriver::NxosLike,
            template_family: "cisco_nxos",
            vendor: "cisco",
            nb_platform: "cisco-nx-os",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show mac address-table"),
                (Intent::Lldp, "show lldp neighbors detail"),
                (Intent::Interfaces, "show interface"),
                (Intent::Inventory, "show inventory"),
                (Intent::Backup, "show running-config"),
                (Intent::Lag, "show port-channel summary"),
                (Intent::Switchport, "show interface switchport"),
                (Intent::Transceiver, "show interface transceiver"),
            ]),
        });

        registry.register(PlatformEntry {
            tag: "cisco_xr",
            driver: SshDriver::IosLike,
            template_family: "cisco_xr",
            vendor: "cisco",
            nb_platform: "cisco-ios-xr",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Lldp, "show lldp neighbors detail"),
                (Intent::Interfaces, "show interfaces"),
                (Intent::Inventory, "show inventory"),
                (Intent::Backup, "show running-config"),
            ]),
        });

        registry.register(PlatformEntry {
            tag: "arista_eos",
            driver: SshDriver::EosLike,
            template_family: "arista_eos",
            vendor: "arista",
            nb_platform: "arista-eos",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show mac address-table"),
                (Intent::Lldp, "show lldp neighbors detail"),
                (Intent::Interfaces, "show interfaces"),
                (Intent::Inventory, "show inventory"),
                (Intent::Backup, "show running-config"),
                (Intent::Lag, "show port-channel summary"),
                (Intent::Switchport, "show interfaces switchport"),
                (Intent::Transceiver, "show interfaces transceiver"),
            ]),
        });

        registry.register(PlatformEntry {
            tag: "juniper_junos",
            driver: SshDriver::JunosLike,
            template_family: "juniper_junos",
            vendor: "juniper",
            nb_platform: "juniper-junos",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show ethernet-switching table"),
                (Intent::Lldp, "show lldp neighbors"),
                (Intent::Interfaces, "show interfaces"),
                (Intent::Inventory, "show chassis hardware"),
                (Intent::Backup, "show configuration"),
            ]),
        });

        // QTech gear speaks a Cisco-like CLI with its own command spellings;
        // templates resolve through the cisco_ios family plus custom overrides.
        registry.register(PlatformEntry {
            tag: "qtech",
            driver: SshDriver::IosLike,
            template_family: "cisco_ios",
            vendor: "qtech",
            nb_platform: "qtech",
            commands: HashMap::from([
                (Intent::Devices, "show version"),
                (Intent::Mac, "show mac-address-table"),
                (Intent::Lldp, "show lldp neighbors"),
                (Intent::Interfaces, "show interface"),
                (Intent::Inventory, "show version module detail"),
                (Intent::Backup, "show running-config"),
                (Intent::Lag, "show aggregatePort summary"),
                (Intent::Switchport, "show interfaces switchport"),
                (Intent::MediaType, "show interfaces status"),
            ]),
        });

        registry
    }

    fn register(&mut self, entry: PlatformEntry) {
        debug_assert!(
            entry.command(Intent::Devices).is_some(),
            "platform {} registered without a devices command",
            entry.tag
        );
        self.entries.insert(entry.tag, entry);
    }

    pub fn resolve(&self, tag: &str) -> Result<&PlatformEntry, FleetError> {
        self.entries
            .get(tag)
            .ok_or_else(|| FleetError::UnknownPlatform(tag.to_string()))
    }

    /// Command string for an intent, or None when the platform does not
    /// define one. Missing secondary commands are expected and harmless.
    pub fn command_for(&self, tag: &str, intent: Intent) -> Result<Option<&'static str>, FleetError> {
        Ok(self.resolve(tag)?.command(intent))
    }

    /// Key used by the template parser for custom-template lookup
    pub fn template_key(&self, tag: &str, command: &str) -> (String, String) {
        (tag.to_lowercase(), command.to_lowercase())
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_has_a_devices_command() {
        let registry = PlatformRegistry::builtin();
        for tag in registry.tags().collect::<Vec<_>>() {
            assert!(
                registry.command_for(tag, Intent::Devices).unwrap().is_some(),
                "{} lacks a devices command",
                tag
            );
        }
    }

    #[test]
    fn unknown_platform_is_a_typed_error() {
        let registry = PlatformRegistry::builtin();
        match registry.resolve("frobozz_os") {
            Err(FleetError::UnknownPlatform(tag)) => assert_eq!(tag, "frobozz_os"),
            other => panic!("expected UnknownPlatform, got {:?}", other),
        }
    }

    #[test]
    fn missing_secondary_command_is_none_not_error() {
        let registry = PlatformRegistry::builtin();
        // Junos has no switchport enrichment command
        let cmd = registry
            .command_for("juniper_junos", Intent::Switchport)
            .unwrap();
        assert_eq!(cmd, None);
    }

    #[test]
    fn qtech_resolves_through_cisco_family() {
        let registry = PlatformRegistry::builtin();
        let entry = registry.resolve("qtech").unwrap();
        assert_eq!(entry.template_family, "cisco_ios");
        assert_eq!(entry.driver, SshDriver::IosLike);
        assert_eq!(entry.command(Intent::Lag), Some("show aggregatePort summary"));
    }

    #[test]
    fn template_key_lowercases_command() {
        let registry = PlatformRegistry::builtin();
        let (tag, cmd) = registry.template_key("cisco_ios", "Show Version");
        assert_eq!(tag, "cisco_ios");
        assert_eq!(cmd, "show version");
    }

    #[test]
    fn intent_round_trips_through_strings() {
        for intent in [
            Intent::Devices,
            Intent::Mac,
            Intent::Lldp,
            Intent::Interfaces,
            Intent::Inventory,
            Intent::Backup,
            Intent::Lag,
            Intent::Switchport,
            Intent::MediaType,
            Intent::Transceiver,
        ] {
            let parsed: Intent = intent.to_string().parse().unwrap();
            assert_eq!(parsed, intent);
        }
    }
}
