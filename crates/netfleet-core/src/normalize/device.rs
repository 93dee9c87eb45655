use crate::model::{Device, DeviceFacts};
use crate::parse::{Row, RowExt};
use crate::platform::PlatformEntry;

/// Turns the first parsed "show version" row into [`DeviceFacts`].
///
/// Some platforms (Arista, QTech) never print the hostname in their version
/// output; the hostname learned from the session prompt fills the gap, then
/// the inventory-supplied friendly name, then the transport host.
pub struct DeviceNormalizer;

impl DeviceNormalizer {
    pub fn normalize(
        rows: &[Row],
        device: &Device,
        entry: &PlatformEntry,
        prompt_hostname: Option<&str>,
    ) -> Option<DeviceFacts> {
        let row = rows.first()?;
        let hostname = row
            .text("hostname")
            .map(str::to_string)
            .or_else(|| prompt_hostname.map(str::to_string))
            .or_else(|| device.name.clone())
            .unwrap_or_else(|| device.host.clone());

        Some(DeviceFacts {
            host: device.host.clone(),
            hostname,
            platform: device.platform.clone(),
            vendor: entry.vendor.to_string(),
            nb_platform: entry.nb_platform.to_string(),
            model: row
                .text("model")
                .map(str::to_string)
                .or_else(|| device.device_type.clone()),
            serial: row.text("serial").map(str::to_string),
            version: row.text("version").map(str::to_string),
            uptime: row.text("uptime").map(str::to_string),
        })
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

    #[test]
    fn hostname_comes_from_row_when_present() {
        let registry = crate::platform::PlatformRegistry::builtin();
        let entry = registry.resolve("cisco_ios").unwrap();
        let device = Device::new("10.0.0.1", "cisco_ios");
        let rows = vec![row(&[
            ("hostname", "core-sw-01"),
            ("version", "15.2(4)E10"),
            ("serial", "FOC1"),
        ])];
        let facts =
            DeviceNormalizer::normalize(&rows, &device, entry, Some("prompt-name")).unwrap();
        assert_eq!(facts.hostname, "core-sw-01");
        assert_eq!(facts.vendor, "cisco");
        assert_eq!(facts.nb_platform, "cisco-ios");
        assert_eq!(facts.version.as_deref(), Some("15.2(4)E10"));
    }

    #[test]
    fn prompt_hostname_fills_the_gap() {
        let registry = crate::platform::PlatformRegistry::builtin();
        let entry = registry.resolve("qtech").unwrap();
        let device = Device::new("10.0.0.2", "qtech");
        let rows = vec![row(&[("version", "8.4.1(R3)")])];
        let facts =
            DeviceNormalizer::normalize(&rows, &device, entry, Some("edge-sw-9")).unwrap();
        assert_eq!(facts.hostname, "edge-sw-9");
        assert_eq!(facts.vendor, "qtech");
    }

    #[test]
    fn empty_rows_yield_nothing() {
        let registry = crate::platform::PlatformRegistry::builtin();
        let entry = registry.resolve("cisco_ios").unwrap();
        let device = Device::new("10.0.0.3", "cisco_ios");
        assert!(DeviceNormalizer::normalize(&[], &device, entry, None).is_none());
    }
}
