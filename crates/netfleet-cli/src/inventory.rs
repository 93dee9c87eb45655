use anyhow::{Context, Result};
use netfleet_core::Device;
use serde::Deserialize;
use std::path::Path;

/// Inventory files are either a bare list of devices or a mapping with a
/// `devices` key, so hand-written and generated files both load.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InventoryFile {
    Bare(Vec<Device>),
    Wrapped { devices: Vec<Device> },
}

/// Load the device inventory, dropping disabled entries
pub fn load_devices(path: &Path) -> Result<Vec<Device>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading inventory {}", path.display()))?;
    let parsed: InventoryFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing inventory {}", path.display()))?;
    let devices = match parsed {
        InventoryFile::Bare(devices) => devices,
        InventoryFile::Wrapped { devices } => devices,
    };
    let enabled: Vec<Device> = devices.into_iter().filter(|d| d.enabled).collect();
    anyhow::ensure!(!enabled.is_empty(), "inventory contains no enabled devices");
    Ok(enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn bare_list_loads() {
        let file = write_tmp(
            "- host: 10.0.0.1\n  platform: cisco_ios\n- host: 10.0.0.2\n  platform: qtech\n  site: hq\n",
        );
        let devices = load_devices(file.path()).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].site.as_deref(), Some("hq"));
    }

    #[test]
    fn wrapped_list_loads_and_skips_disabled() {
        let file = write_tmp(
            "devices:\n  - host: 10.0.0.1\n    platform: cisco_ios\n  - host: 10.0.0.2\n    platform: cisco_ios\n    enabled: false\n",
        );
        let devices = load_devices(file.path()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].host, "10.0.0.1");
    }

    #[test]
    fn empty_inventory_is_an_error() {
        let file = write_tmp("devices: []\n");
        assert!(load_devices(file.path()).is_err());
    }
}
