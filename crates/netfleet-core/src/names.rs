use crate::model::PortType;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// One interface name family: canonical long form, short form, and any other
/// spellings seen in the wild for the same port
struct NameFamily {
    long: &'static str,
    short: &'static str,
    alternates: &'static [&'static str],
    port_type: PortType,
}

// The same physical port can be named three different ways in the output of
// three different commands on one device. Every family below ties those
// spellings together.
const FAMILIES: &[NameFamily] = &[
    NameFamily {
        long: "Ethernet",
        short: "Et",
        alternates: &["Eth"],
        port_type: PortType::AccessCopper,
    },
    NameFamily {
        long: "FastEthernet",
        short: "Fa",
        alternates: &[],
        port_type: PortType::AccessCopper,
    },
    NameFamily {
        long: "GigabitEthernet",
        short: "Gi",
        alternates: &["GigE"],
        port_type: PortType::AccessCopper,
    },
    NameFamily {
        long: "TwoGigabitEthernet",
        short: "Tw",
        alternates: &["TwoGigE"],
        port_type: PortType::AccessCopper,
    },
    NameFamily {
        long: "TenGigabitEthernet",
        short: "Te",
        alternates: &["TenGigE"],
        port_type: PortType::SfpPlus,
    },
    NameFamily {
        long: "TwentyFiveGigE",
        short: "Twe",
        alternates: &["TwentyFiveGigabitEthernet"],
        port_type: PortType::Sfp28,
    },
    NameFamily {
        long: "FortyGigabitEthernet",
        short: "Fo",
        alternates: &["FortyGigE"],
        port_type: PortType::Qsfp28,
    },
    NameFamily {
        long: "HundredGigE",
        short: "Hu",
        alternates: &["HundredGigabitEthernet"],
        port_type: PortType::Qsfp28,
    },
    NameFamily {
        long: "FourHundredGigE",
        short: "FH",
        alternates: &["FourHundredGigabitEthernet"],
        port_type: PortType::Qsfpdd,
    },
    // QTech's 10G copper/fiber combo ports
    NameFamily {
        long: "TFGigabitEthernet",
        short: "TF",
        alternates: &[],
        port_type: PortType::SfpPlus,
    },
    NameFamily {
        long: "Port-channel",
        short: "Po",
        alternates: &["Port-Channel"],
        port_type: PortType::Lag,
    },
    NameFamily {
        long: "AggregatePort",
        short: "Ag",
        alternates: &[],
        port_type: PortType::Lag,
    },
    NameFamily {
        long: "Bundle-Ether",
        short: "BE",
        alternates: &[],
        port_type: PortType::Lag,
    },
    NameFamily {
        long: "Vlan",
        short: "Vl",
        alternates: &[],
        port_type: PortType::Virtual,
    },
    NameFamily {
        long: "Tunnel",
        short: "Tu",
        alternates: &[],
        port_type: PortType::Virtual,
    },
    NameFamily {
        long: "Loopback",
        short: "Lo",
        alternates: &[],
        port_type: PortType::Loopback,
    },
    NameFamily {
        long: "Management",
        short: "Ma",
        alternates: &["mgmt"],
        port_type: PortType::Mgmt,
    },
];

lazy_static! {
    // Lowercased prefix -> family index
    static ref PREFIX_INDEX: HashMap<String, usize> = {
        let mut index = HashMap::new();
        for (i, family) in FAMILIES.iter().enumerate() {
            index.insert(family.long.to_lowercase(), i);
            index.insert(family.short.to_lowercase(), i);
            for alt in family.alternates {
                index.insert(alt.to_lowercase(), i);
            }
        }
        index
    };
}

/// Split an interface name into its alphabetic prefix and the numeric
/// remainder, dropping interior whitespace ("TFGigabitEthernet 0/1" ->
/// ("TFGigabitEthernet", "0/1")).
fn split_name(name: &str) -> (&str, String) {
    let trimmed = name.trim();
    let prefix_end = trimmed
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let prefix = trimmed[..prefix_end].trim_end();
    let rest: String = trimmed[prefix_end..]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    (prefix, rest)
}

fn family_of(prefix: &str) -> Option<&'static NameFamily> {
    PREFIX_INDEX
        .get(&prefix.to_lowercase())
        .map(|&i| &FAMILIES[i])
}

/// Canonicalize a name to its long form: "Gi0/1" -> "GigabitEthernet0/1",
/// "TFGigabitEthernet 0/1" -> "TFGigabitEthernet0/1". Unknown prefixes pass
/// through with whitespace normalized away.
pub fn canonical(name: &str) -> String {
    let (prefix, rest) = split_name(name);
    match family_of(prefix) {
        Some(family) => format!("{}{}", family.long, rest),
        None => format!("{}{}", prefix, rest),
    }
}

/// Short form of a name: "GigabitEthernet0/1" -> "Gi0/1"
pub fn short(name: &str) -> String {
    let (prefix, rest) = split_name(name);
    match family_of(prefix) {
        Some(family) => format!("{}{}", family.short, rest),
        None => format!("{}{}", prefix, rest),
    }
}

/// Every spelling other commands or sources might have used for this name.
/// Always contains the canonical long form; lookups through [`AliasMap`] are
/// case-insensitive on top of this set.
pub fn aliases(name: &str) -> Vec<String> {
    let (prefix, rest) = split_name(name);
    let mut out = Vec::new();
    match family_of(prefix) {
        Some(family) => {
            out.push(format!("{}{}", family.long, rest));
            // QTech and some show commands print a space before the index
            out.push(format!("{} {}", family.long, rest));
            out.push(format!("{}{}", family.short, rest));
            for alt in family.alternates {
                out.push(format!("{}{}", alt, rest));
            }
        }
        None => {
            out.push(format!("{}{}", prefix, rest));
        }
    }
    out
}

/// Classify a name into a port type when no media hint is available.
/// This is the last rung of the detection ladder.
pub fn classify(name: &str) -> PortType {
    let (prefix, _) = split_name(name);
    if let Some(family) = family_of(prefix) {
        return family.port_type;
    }
    // Junos-style lowercase names carry their own speed prefix
    match prefix.to_lowercase().trim_end_matches('-') {
        "ge" => PortType::AccessCopper,
        "xe" => PortType::SfpPlus,
        "et" => PortType::Qsfp28,
        "ae" => PortType::Lag,
        "lo" => PortType::Loopback,
        "irb" | "vlan" => PortType::Virtual,
        "fxp" | "em" => PortType::Mgmt,
        _ => PortType::Unknown,
    }
}

/// Map keyed by every alias of every inserted name.
///
/// Enrichment tables (LAG membership, switchport modes, media types) are
/// built once and then probed with whatever spelling the source command
/// produced; the probe canonicalizes before lookup so any alias hits.
#[derive(Debug, Clone, Default)]
pub struct AliasMap<T> {
    entries: HashMap<String, T>,
}

impl<T: Clone> AliasMap<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: T) {
        for alias in aliases(name) {
            self.entries.insert(alias.to_lowercase(), value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        // Canonicalizing first folds spacing and prefix variants together
        let canon = canonical(name).to_lowercase();
        self.entries
            .get(&canon)
            .or_else(|| self.entries.get(&name.trim().to_lowercase()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_short_forms() {
        assert_eq!(canonical("Gi0/1"), "GigabitEthernet0/1");
        assert_eq!(canonical("Te1/0/48"), "TenGigabitEthernet1/0/48");
        assert_eq!(canonical("Po1"), "Port-channel1");
        assert_eq!(canonical("Hu0/55"), "HundredGigE0/55");
    }

    #[test]
    fn canonical_strips_qtech_interior_space() {
        assert_eq!(canonical("TFGigabitEthernet 0/1"), "TFGigabitEthernet0/1");
        assert_eq!(canonical("AggregatePort 10"), "AggregatePort10");
    }

    #[test]
    fn short_forms_round_trip() {
        assert_eq!(short("GigabitEthernet0/1"), "Gi0/1");
        assert_eq!(short("Port-channel1"), "Po1");
        assert_eq!(short(&canonical("Gi0/1")), "Gi0/1");
    }

    #[test]
    fn alias_set_covers_vendor_alternates() {
        let set = aliases("Hu0/55");
        assert!(set.contains(&"HundredGigE0/55".to_string()));
        assert!(set.contains(&"Hu0/55".to_string()));
        assert!(set.contains(&"HundredGigabitEthernet0/55".to_string()));
    }

    #[test]
    fn every_alias_resolves_back_to_the_record() {
        let mut map = AliasMap::new();
        map.insert("GigabitEthernet0/1", 1u32);
        for alias in aliases("GigabitEthernet0/1") {
            assert_eq!(map.get(&alias), Some(&1), "alias {} missed", alias);
        }
    }

    #[test]
    fn spaced_canonical_matches_short_alias() {
        // Membership reported as Hu0/55 must match a canonical
        // HundredGigabitEthernet 0/55
        let mut map = AliasMap::new();
        map.insert("Hu0/55", "lag-member");
        assert_eq!(map.get("HundredGigabitEthernet 0/55"), Some(&"lag-member"));
        assert_eq!(map.get("HundredGigE0/55"), Some(&"lag-member"));
    }

    #[test]
    fn lag_prefixes_resolve_case_insensitively() {
        for name in ["port-channel1", "Po1", "PORT-CHANNEL1", "po1"] {
            assert_eq!(classify(name), PortType::Lag, "{} not a lag", name);
            assert_eq!(canonical(name), "Port-channel1");
        }
        for name in ["aggregateport10", "Ag10", "AGGREGATEPORT10", "ag10"] {
            assert_eq!(classify(name), PortType::Lag, "{} not a lag", name);
            assert_eq!(canonical(name), "AggregatePort10");
        }
    }

    #[test]
    fn classification_ladder_by_prefix() {
        assert_eq!(classify("Vlan10"), PortType::Virtual);
        assert_eq!(classify("Loopback0"), PortType::Loopback);
        assert_eq!(classify("TFGigabitEthernet 0/1"), PortType::SfpPlus);
        assert_eq!(classify("TF0/2"), PortType::SfpPlus);
        assert_eq!(classify("mgmt0"), PortType::Mgmt);
        assert_eq!(classify("GigabitEthernet0/1"), PortType::AccessCopper);
        assert_eq!(classify("xe-0/0/1"), PortType::SfpPlus);
        assert_eq!(classify("ae0"), PortType::Lag);
        assert_eq!(classify("Fictional9/9"), PortType::Unknown);
    }
}
