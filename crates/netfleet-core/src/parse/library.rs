//! Built-in template definitions.
//!
//! Shared templates are keyed by (template family, command); custom templates
//! are keyed by (platform tag, command) and win over the shared set. QTech is
//! the heaviest custom user: its CLI is cisco-like but most of its table
//! layouts differ enough to need their own patterns.

use super::engine::TemplateDef;

pub struct SharedEntry {
    pub family: &'static str,
    pub command: &'static str,
    pub def: &'static TemplateDef,
}

pub struct CustomEntry {
    pub platform: &'static str,
    pub command: &'static str,
    pub def: &'static TemplateDef,
}

// ---------------------------------------------------------------------------
// cisco_ios family (also serves cisco_xe and, via family aliasing, qtech for
// anything qtech does not override)
// ---------------------------------------------------------------------------

static IOS_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "cisco_ios_show_version",
    start: r"^Cisco IOS(?: XE)? Software.*Version\s+(?P<version>[^,\s]+)",
    continuations: &[
        r"^(?P<hostname>\S+)\s+uptime\s+is\s+(?P<uptime>.+)$",
        r"^Processor board ID\s+(?P<serial>\S+)",
        r"^[Mm]odel [Nn]umber\s*:\s*(?P<model>\S+)",
        r"^cisco\s+(?P<model>[A-Z0-9-]+)\s+\([^)]*\)\s+processor",
    ],
    list_fields: &[],
};

static IOS_SHOW_INTERFACES: TemplateDef = TemplateDef {
    name: "cisco_ios_show_interfaces",
    start: r"^(?P<interface>\S+) is (?P<link_status>[^,]+), line protocol is (?P<protocol>\S+)",
    continuations: &[
        r"^\s+Hardware is (?P<hardware_type>[^,]+)(?:, address is (?P<mac>\S+))?",
        r"^\s+Description:\s*(?P<description>.+)$",
        r"^\s+Internet address is\s+(?P<ip_address>\S+)",
        r"^\s+MTU\s+(?P<mtu>\d+)\s+bytes,\s+BW\s+(?P<bandwidth>\d+)\s+[Kk]bit",
        r"^\s+(?:Full|Half|Auto)-duplex,\s+(?P<speed>[^,\s]+)(?:.*media type is (?P<media_type>.+))?",
    ],
    list_fields: &[],
};

static IOS_SHOW_MAC: TemplateDef = TemplateDef {
    name: "cisco_ios_show_mac_address_table",
    start: r"^[*\s]*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<kind>\S+)\s+(?P<interface>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

static IOS_SHOW_LLDP_DETAIL: TemplateDef = TemplateDef {
    name: "cisco_ios_show_lldp_neighbors_detail",
    start: r"^Local Intf:\s*(?P<local_interface>\S+)",
    continuations: &[
        r"^Chassis id:\s*(?P<chassis_id>\S+)",
        r"^Port id:\s*(?P<remote_interface>\S+)",
        r"^Port Description:\s*(?P<remote_description>.+)$",
        r"^System Name:\s*(?P<remote_name>\S+)",
        r"^(?P<remote_platform>(?:Cisco IOS|Cisco Nexus|Arista|Juniper|QTECH).*)$",
    ],
    list_fields: &[],
};

static IOS_SHOW_INVENTORY: TemplateDef = TemplateDef {
    name: "cisco_ios_show_inventory",
    start: r#"^NAME:\s*"(?P<slot>[^"]*)"\s*,\s*DESCR:\s*"(?P<description>[^"]*)""#,
    continuations: &[
        r"^PID:\s*(?P<part_id>[^,\s]+)?\s*,\s*VID:\s*(?P<vid>[^,\s]*)\s*,\s*SN:\s*(?P<serial>\S+)?",
    ],
    list_fields: &[],
};

static IOS_SHOW_ETHERCHANNEL: TemplateDef = TemplateDef {
    name: "cisco_ios_show_etherchannel_summary",
    start: r"^(?P<group>\d+)\s+(?P<lag>[A-Za-z-]+\d+)\((?P<flags>[^)]+)\)\s+(?P<protocol>\S+)\s+(?P<members>\S+\(\S+\).*)$",
    continuations: &[r"^\s{5,}(?P<members>\S+\(\S+\).*)$"],
    list_fields: &["members"],
};

static IOS_SHOW_SWITCHPORT: TemplateDef = TemplateDef {
    name: "cisco_ios_show_interfaces_switchport",
    start: r"^Name:\s*(?P<interface>\S+)",
    continuations: &[
        r"^Switchport:\s*(?P<switchport>\S+)",
        r"^Administrative Mode:\s*(?P<admin_mode>.+)$",
        r"^Operational Mode:\s*(?P<oper_mode>.+)$",
        r"^Access Mode VLAN:\s*(?P<access_vlan>\d+)",
        r"^Trunking Native Mode VLAN:\s*(?P<native_vlan>\d+)",
        r"^Trunking VLANs Enabled:\s*(?P<trunking_vlans>\S+)",
        r"^\s{2,}(?P<trunking_vlans>[\d,\-]+)\s*$",
    ],
    list_fields: &["trunking_vlans"],
};

static IOS_SHOW_STATUS: TemplateDef = TemplateDef {
    name: "cisco_ios_show_interfaces_status",
    start: r"^(?P<interface>\S+)\s+.*?(?P<status>connected|notconnect|disabled|err-disabled|inactive)\s+\S+\s+\S+\s+\S+\s+(?P<media>\S.*?)\s*$",
    continuations: &[],
    list_fields: &[],
};

// ---------------------------------------------------------------------------
// cisco_nxos family
// ---------------------------------------------------------------------------

static NXOS_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_version",
    start: r"^\s*(?:NXOS|system):\s+version\s+(?P<version>\S+)",
    continuations: &[
        r"^\s*Device name:\s*(?P<hostname>\S+)",
        r"^\s*cisco\s+(?P<model>Nexus\S*(?:\s+\S+)?)\s+Chassis",
        r"^\s*Processor Board ID\s+(?P<serial>\S+)",
        r"^\s*Kernel uptime is\s+(?P<uptime>.+)$",
    ],
    list_fields: &[],
};

static NXOS_SHOW_INTERFACE: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_interface",
    start: r"^(?P<interface>\S+) is (?P<link_status>\S+)(?:\s+\((?P<down_reason>[^)]*)\))?\s*$",
    continuations: &[
        r"^\s*admin state is (?P<admin_state>\S+)",
        r"^\s+Hardware:\s*(?P<hardware_type>[^,]+)(?:,\s*address:\s*(?P<mac>\S+))?",
        r"^\s+Description:\s*(?P<description>.+)$",
        r"^\s+Internet Address is\s+(?P<ip_address>\S+)",
        r"^\s+MTU\s+(?P<mtu>\d+)\s+bytes,\s+BW\s+(?P<bandwidth>\d+)\s+[Kk]bit",
    ],
    list_fields: &[],
};

static NXOS_SHOW_MAC: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_mac_address_table",
    start: r"^[*+G]?\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<kind>\S+)\s+\S+\s+\S+\s+\S+\s+(?P<interface>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

static NXOS_SHOW_LLDP_DETAIL: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_lldp_neighbors_detail",
    start: r"^Chassis id:\s*(?P<chassis_id>\S+)",
    continuations: &[
        r"^Local Port id:\s*(?P<local_interface>\S+)",
        r"^Port id:\s*(?P<remote_interface>\S+)",
        r"^Port Description:\s*(?P<remote_description>.+)$",
        r"^System Name:\s*(?P<remote_name>\S+)",
        r"^System Description:\s*(?P<remote_platform>\S.*)$",
    ],
    list_fields: &[],
};

static NXOS_SHOW_PORT_CHANNEL: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_port_channel_summary",
    start: r"^(?P<group>\d+)\s+(?P<lag>Po\d+)\((?P<flags>[^)]+)\)\s+(?P<kind>\S+)\s+(?P<protocol>\S+)\s+(?P<members>\S+\(\S+\).*)$",
    continuations: &[r"^\s{5,}(?P<members>\S+\(\S+\).*)$"],
    list_fields: &["members"],
};

static NXOS_SHOW_SWITCHPORT: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_interface_switchport",
    start: r"^Name:\s*(?P<interface>\S+)",
    continuations: &[
        r"^\s*Switchport:\s*(?P<switchport>\S+)",
        r"^\s*Operational Mode:\s*(?P<mode>.+)$",
        r"^\s*Access Mode VLAN:\s*(?P<access_vlan>\d+)",
        r"^\s*Trunking Native Mode VLAN:\s*(?P<native_vlan>\d+)",
        r"^\s*Trunking VLANs Allowed:\s*(?P<trunking_vlans>\S+)",
        r"^\s{2,}(?P<trunking_vlans>[\d,\-]+)\s*$",
    ],
    list_fields: &["trunking_vlans"],
};

static NXOS_SHOW_TRANSCEIVER: TemplateDef = TemplateDef {
    name: "cisco_nxos_show_interface_transceiver",
    start: r"^(?P<interface>Ethernet\S+)\s*$",
    continuations: &[
        r"^\s+transceiver is (?P<present>\S+)",
        r"^\s+type is (?P<media>\S.*)$",
    ],
    list_fields: &[],
};

// ---------------------------------------------------------------------------
// cisco_xr family: show version differs, the rest rides on the IOS shapes
// ---------------------------------------------------------------------------

static XR_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "cisco_xr_show_version",
    start: r"^Cisco IOS XR Software, Version (?P<version>\S+)",
    continuations: &[
        r"^(?P<hostname>\S+)\s+uptime\s+is\s+(?P<uptime>.+)$",
        r"^cisco\s+(?P<model>\S+)\s+\(",
    ],
    list_fields: &[],
};

// ---------------------------------------------------------------------------
// arista_eos family
// ---------------------------------------------------------------------------

static EOS_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "arista_eos_show_version",
    start: r"^Arista\s+(?P<model>\S+)",
    continuations: &[
        r"^Serial number:\s*(?P<serial>\S+)",
        r"^Software image version:\s*(?P<version>\S+)",
        r"^Uptime:\s*(?P<uptime>.+)$",
    ],
    list_fields: &[],
};

static EOS_SHOW_INTERFACES: TemplateDef = TemplateDef {
    name: "arista_eos_show_interfaces",
    start: r"^(?P<interface>\S+) is (?P<link_status>[^,]+), line protocol is (?P<protocol>\S+)",
    continuations: &[
        r"^\s+Hardware is (?P<hardware_type>[^,]+)(?:, address is (?P<mac>\S+))?",
        r"^\s+Description:\s*(?P<description>.+)$",
        r"^\s+Internet address is\s+(?P<ip_address>\S+)",
        r"^\s+MTU\s+(?P<mtu>\d+)\s+bytes(?:,\s*BW\s+(?P<bandwidth>\d+)\s*[Kk]bit)?",
    ],
    list_fields: &[],
};

static EOS_SHOW_MAC: TemplateDef = TemplateDef {
    name: "arista_eos_show_mac_address_table",
    start: r"^\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<kind>\S+)\s+(?P<interface>\S+)",
    continuations: &[],
    list_fields: &[],
};

static EOS_SHOW_LLDP_DETAIL: TemplateDef = TemplateDef {
    name: "arista_eos_show_lldp_neighbors_detail",
    start: r"^Interface (?P<local_interface>\S+) detected \d+ LLDP neighbors",
    continuations: &[
        r#"^\s+-?\s*Chassis ID\s*:?\s*(?P<chassis_id>\S+)"#,
        r#"^\s+-?\s*Port ID\s*:?\s*"?(?P<remote_interface>[^"\s]+)"?"#,
        r#"^\s+-?\s*System Name:\s*"?(?P<remote_name>[^"]+)"?"#,
        r#"^\s+-?\s*System Description:\s*"?(?P<remote_platform>[^"]+)"?"#,
    ],
    list_fields: &[],
};

static EOS_SHOW_PORT_CHANNEL: TemplateDef = TemplateDef {
    name: "arista_eos_show_port_channel_summary",
    start: r"^(?P<group>\d+)\s+(?P<lag>Po\d+)\((?P<flags>[^)]+)\)\s+(?P<protocol>\S+(?:\(\S+\))?)\s+(?P<members>\S+\(\S+\).*)$",
    continuations: &[r"^\s{5,}(?P<members>\S+\(\S+\).*)$"],
    list_fields: &["members"],
};

// ---------------------------------------------------------------------------
// juniper_junos family
// ---------------------------------------------------------------------------

static JUNOS_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "juniper_junos_show_version",
    start: r"^Hostname:\s*(?P<hostname>\S+)",
    continuations: &[
        r"^Model:\s*(?P<model>\S+)",
        r"^Junos:\s*(?P<version>\S+)",
        r"^JUNOS Software Release \[(?P<version>[^\]]+)\]",
    ],
    list_fields: &[],
};

static JUNOS_SHOW_INTERFACES: TemplateDef = TemplateDef {
    name: "juniper_junos_show_interfaces",
    start: r"^Physical interface:\s*(?P<interface>\S+),\s*(?P<admin_status>\S+),\s*Physical link is (?P<link_status>\S+)",
    continuations: &[
        r"^\s+Description:\s*(?P<description>.+)$",
        r"^\s+Link-level type:.*MTU:\s*(?P<mtu>\d+)(?:.*Speed:\s*(?P<speed>[^,\s]+))?",
        r"^\s+Current address:\s*(?P<mac>\S+)",
        r"^\s+Destination:\s*(?P<destination>\S+),\s*Local:\s*(?P<ip_address>\S+)",
    ],
    list_fields: &[],
};

static JUNOS_SHOW_SWITCHING_TABLE: TemplateDef = TemplateDef {
    name: "juniper_junos_show_ethernet_switching_table",
    start: r"^\s{1,8}(?P<vlan_name>\S+)\s+(?P<mac>[0-9a-fA-F]{2}(?::[0-9a-fA-F]{2}){5})\s+(?P<kind>\S+)\s+\S+\s+(?P<interface>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

static JUNOS_SHOW_LLDP: TemplateDef = TemplateDef {
    name: "juniper_junos_show_lldp_neighbors",
    start: r"^(?P<local_interface>[a-z]+-\S+|ae\d+\S*)\s+\S+\s+(?P<chassis_id>[0-9a-fA-F:.]+)\s+(?P<remote_interface>\S+)\s+(?P<remote_name>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

static JUNOS_SHOW_CHASSIS_HARDWARE: TemplateDef = TemplateDef {
    name: "juniper_junos_show_chassis_hardware",
    start: r"^(?P<slot>\S.{0,18}?)\s{2,}(?:(?P<rev>REV \S+)\s+)?(?:(?P<part_id>\d{3}-\d{6}|BUILTIN)\s+)?(?P<serial>\S+)\s{2,}(?P<description>\S.*)$",
    continuations: &[],
    list_fields: &[],
};

// ---------------------------------------------------------------------------
// QTech custom overrides
// ---------------------------------------------------------------------------

static QTECH_SHOW_VERSION: TemplateDef = TemplateDef {
    name: "qtech_show_version",
    start: r"^System description\s*:\s*(?P<description>.+)$",
    continuations: &[
        r"^System uptime\s*:\s*(?P<uptime>.+)$",
        r"^System software version\s*:\s*(?P<version>\S+)",
        r"^System serial number\s*:\s*(?P<serial>\S+)",
        r"^Device model\s*:\s*(?P<model>\S+)",
    ],
    list_fields: &[],
};

static QTECH_SHOW_INTERFACE: TemplateDef = TemplateDef {
    name: "qtech_show_interface",
    start: r"^(?P<interface>[A-Za-z-]+ ?\d\S*) is (?P<link_status>\S+)\s*,\s*line protocol is (?P<protocol>\S+)",
    continuations: &[
        r"^\s+Hardware is (?P<hardware_type>[^,]+)(?:,\s*address is (?P<mac>\S+))?",
        r"^\s+Description:\s*(?P<description>.+)$",
        r"^\s+Interface address is:\s*(?P<ip_address>\S+)",
        r"^\s+MTU\s+(?P<mtu>\d+)\s+bytes.*BW\s+(?P<bandwidth>\d+)\s+[Kk]bit",
        r"^\s+Media-type(?:\s+is)?:?\s*(?P<media_type>.+)$",
    ],
    list_fields: &[],
};

static QTECH_SHOW_MAC: TemplateDef = TemplateDef {
    name: "qtech_show_mac_address_table",
    start: r"^\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<kind>\S+)\s+(?P<interface>[A-Za-z-]+ ?\d\S*)\s*$",
    continuations: &[],
    list_fields: &[],
};

static QTECH_SHOW_AGGREGATEPORT: TemplateDef = TemplateDef {
    name: "qtech_show_aggregateport_summary",
    start: r"^(?P<lag>Ag\d+)\s+\d+\s+\S+\s+\S+\s+\S+\s+(?P<members>\S.*)$",
    continuations: &[r"^\s{10,}(?P<members>\S.*)$"],
    list_fields: &["members"],
};

static QTECH_SHOW_SWITCHPORT: TemplateDef = TemplateDef {
    name: "qtech_show_interfaces_switchport",
    start: r"^(?P<interface>[A-Za-z-]+ ?\d\S*)\s+(?P<switchport>[Ee]nabled|[Dd]isabled)\s+(?P<MODE>\S+)\s+(?P<access_vlan>\d+)\s+(?P<native_vlan>\d+)\s+\S+\s+(?P<VLAN_LISTS>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

static QTECH_SHOW_STATUS: TemplateDef = TemplateDef {
    name: "qtech_show_interfaces_status",
    start: r"^(?P<interface>[A-Za-z-]+ ?\d\S*)\s+(?P<status>up|down|disabled)\s+\S+\s+\S+\s+\S+\s+(?P<media>\S+)\s*$",
    continuations: &[],
    list_fields: &[],
};

/// Shared library, one entry per (family, command)
pub fn shared_entries() -> Vec<SharedEntry> {
    vec![
        SharedEntry { family: "cisco_ios", command: "show version", def: &IOS_SHOW_VERSION },
        SharedEntry { family: "cisco_ios", command: "show interfaces", def: &IOS_SHOW_INTERFACES },
        SharedEntry { family: "cisco_ios", command: "show interface", def: &IOS_SHOW_INTERFACES },
        SharedEntry { family: "cisco_ios", command: "show mac address-table", def: &IOS_SHOW_MAC },
        SharedEntry { family: "cisco_ios", command: "show mac-address-table", def: &IOS_SHOW_MAC },
        SharedEntry { family: "cisco_ios", command: "show lldp neighbors detail", def: &IOS_SHOW_LLDP_DETAIL },
        SharedEntry { family: "cisco_ios", command: "show lldp neighbors", def: &IOS_SHOW_LLDP_DETAIL },
        SharedEntry { family: "cisco_ios", command: "show inventory", def: &IOS_SHOW_INVENTORY },
        SharedEntry { family: "cisco_ios", command: "show etherchannel summary", def: &IOS_SHOW_ETHERCHANNEL },
        SharedEntry { family: "cisco_ios", command: "show interfaces switchport", def: &IOS_SHOW_SWITCHPORT },
        SharedEntry { family: "cisco_ios", command: "show interfaces status", def: &IOS_SHOW_STATUS },
        SharedEntry { family: "cisco_nxos", command: "show version", def: &NXOS_SHOW_VERSION },
        SharedEntry { family: "cisco_nxos", command: "show interface", def: &NXOS_SHOW_INTERFACE },
        SharedEntry { family: "cisco_nxos", command: "show mac address-table", def: &NXOS_SHOW_MAC },
        SharedEntry { family: "cisco_nxos", command: "show lldp neighbors detail", def: &NXOS_SHOW_LLDP_DETAIL },
        SharedEntry { family: "cisco_nxos", command: "show inventory", def: &IOS_SHOW_INVENTORY },
        SharedEntry { family: "cisco_nxos", command: "show port-channel summary", def: &NXOS_SHOW_PORT_CHANNEL },
        SharedEntry { family: "cisco_nxos", command: "show interface switchport", def: &NXOS_SHOW_SWITCHPORT },
        SharedEntry { family: "cisco_nxos", command: "show interface transceiver", def: &NXOS_SHOW_TRANSCEIVER },
        SharedEntry { family: "cisco_xr", command: "show version", def: &XR_SHOW_VERSION },
        SharedEntry { family: "cisco_xr", command: "show interfaces", def: &IOS_SHOW_INTERFACES },
        SharedEntry { family: "cisco_xr", command: "show lldp neighbors detail", def: &IOS_SHOW_LLDP_DETAIL },
        SharedEntry { family: "cisco_xr", command: "show inventory", def: &IOS_SHOW_INVENTORY },
        SharedEntry { family: "arista_eos", command: "show version", def: &EOS_SHOW_VERSION },
        SharedEntry { family: "arista_eos", command: "show interfaces", def: &EOS_SHOW_INTERFACES },
        SharedEntry { family: "arista_eos", command: "show mac address-table", def: &EOS_SHOW_MAC },
        SharedEntry { family: "arista_eos", command: "show lldp neighbors detail", def: &EOS_SHOW_LLDP_DETAIL },
        SharedEntry { family: "arista_eos", command: "show inventory", def: &IOS_SHOW_INVENTORY },
        SharedEntry { family: "arista_eos", command: "show port-channel summary", def: &EOS_SHOW_PORT_CHANNEL },
        SharedEntry { family: "arista_eos", command: "show interfaces switchport", def: &IOS_SHOW_SWITCHPORT },
        SharedEntry { family: "juniper_junos", command: "show version", def: &JUNOS_SHOW_VERSION },
        SharedEntry { family: "juniper_junos", command: "show interfaces", def: &JUNOS_SHOW_INTERFACES },
        SharedEntry { family: "juniper_junos", command: "show ethernet-switching table", def: &JUNOS_SHOW_SWITCHING_TABLE },
        SharedEntry { family: "juniper_junos", command: "show lldp neighbors", def: &JUNOS_SHOW_LLDP },
        SharedEntry { family: "juniper_junos", command: "show chassis hardware", def: &JUNOS_SHOW_CHASSIS_HARDWARE },
    ]
}

/// Custom per-platform overrides, consulted before the shared set
pub fn custom_entries() -> Vec<CustomEntry> {
    vec![
        CustomEntry { platform: "qtech", command: "show version", def: &QTECH_SHOW_VERSION },
        CustomEntry { platform: "qtech", command: "show interface", def: &QTECH_SHOW_INTERFACE },
        CustomEntry { platform: "qtech", command: "show mac-address-table", def: &QTECH_SHOW_MAC },
        CustomEntry { platform: "qtech", command: "show aggregateport summary", def: &QTECH_SHOW_AGGREGATEPORT },
        CustomEntry { platform: "qtech", command: "show interfaces switchport", def: &QTECH_SHOW_SWITCHPORT },
        CustomEntry { platform: "qtech", command: "show interfaces status", def: &QTECH_SHOW_STATUS },
        CustomEntry { platform: "qtech", command: "show version module detail", def: &IOS_SHOW_INVENTORY },
    ]
}
