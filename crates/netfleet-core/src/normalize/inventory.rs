use crate::model::{Device, InventoryItem, InventoryKind};
use crate::parse::{Row, RowExt};

/// Turns parsed inventory rows into [`InventoryItem`] records.
pub struct InventoryNormalizer;

impl InventoryNormalizer {
    pub fn normalize(rows: &[Row], device: &Device, vendor: &str) -> Vec<InventoryItem> {
        rows.iter()
            .filter_map(|row| {
                let slot = row.text("slot")?.to_string();
                let description = row.text("description").map(str::to_string);
                let kind = classify(&slot, description.as_deref().unwrap_or(""));
                Some(InventoryItem {
                    device: device.host.clone(),
                    slot,
                    part_id: row.text("part_id").map(str::to_string),
                    serial: row.text("serial").map(str::to_string),
                    vendor: vendor.to_string(),
                    description,
                    kind,
                })
            })
            .collect()
    }
}

fn classify(slot: &str, description: &str) -> InventoryKind {
    let slot_lower = slot.to_lowercase();
    let desc_lower = description.to_lowercase();
    let text = format!("{} {}", slot_lower, desc_lower);

    if slot_lower == "chassis" || slot_lower == "1" || desc_lower.contains("chassis") {
        InventoryKind::Chassis
    } else if text.contains("power supply") || text.contains("psu") || text.contains("pwr") {
        InventoryKind::Psu
    } else if text.contains("fan") {
        InventoryKind::Fan
    } else if text.contains("sfp")
        || text.contains("qsfp")
        || text.contains("xcvr")
        || text.contains("transceiver")
        || text.contains("gbic")
    {
        InventoryKind::Sfp
    } else if text.contains("module")
        || text.contains("fpc")
        || text.contains("linecard")
        || text.contains("line card")
        || text.contains("supervisor")
        || text.contains("routing engine")
    {
        InventoryKind::Module
    } else {
        InventoryKind::Other
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
    fn kinds_are_classified_from_text() {
        let device = Device::new("10.0.0.1", "cisco_ios");
        let rows = vec![
            row(&[("slot", "1"), ("description", "WS-C2960X-48TS-L"), ("serial", "FOC1")]),
            row(&[("slot", "GigabitEthernet0/49"), ("description", "1000BaseSX SFP")]),
            row(&[("slot", "Power Supply 1"), ("description", "AC Power Supply")]),
            row(&[("slot", "Fan 1"), ("description", "Fan Tray")]),
            row(&[("slot", "Slot 2"), ("description", "48x1G Linecard")]),
        ];
        let items = InventoryNormalizer::normalize(&rows, &device, "cisco");
        let kinds: Vec<_> = items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InventoryKind::Chassis,
                InventoryKind::Sfp,
                InventoryKind::Psu,
                InventoryKind::Fan,
                InventoryKind::Module,
            ]
        );
        assert!(items.iter().all(|i| i.vendor == "cisco"));
        assert_eq!(items[0].serial.as_deref(), Some("FOC1"));
    }
}
