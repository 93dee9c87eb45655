//! Pure, deterministic diffing of desired against observed NetBox state.
//!
//! For every entity kind the calculator compares by natural key and emits a
//! field-level plan. The tracked field sets below must match exactly what the
//! reconciler phases are prepared to write.

use super::models::{
    NbCable, NbDevice, NbInterface, NbInventoryItem, NbIpAddress, NbVlan,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// One field-level change inside an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

impl FieldChange {
    fn compare<T: PartialEq + std::fmt::Debug>(
        field: &str,
        old: &T,
        new: &T,
        out: &mut Vec<FieldChange>,
    ) {
        if old != new {
            out.push(FieldChange {
                field: field.to_string(),
                old: format!("{:?}", old),
                new: format!("{:?}", new),
            });
        }
    }
}

/// An update pairing the observed record with the desired one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedUpdate<T> {
    pub current: T,
    pub desired: T,
    pub changes: Vec<FieldChange>,
}

/// Creates/updates/deletes for one entity kind. A record appears in at most
/// one of the three lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDiff<T> {
    pub to_create: Vec<T>,
    pub to_update: Vec<PlannedUpdate<T>>,
    pub to_delete: Vec<T>,
}

impl<T> Default for EntityDiff<T> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<T> EntityDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

/// Natural key plus tracked-field comparison for one entity kind
pub trait Diffable: Clone {
    type Key: Eq + Hash + Ord;

    fn key(&self) -> Self::Key;

    /// Field-level differences between the observed and the desired record,
    /// restricted to the fields the reconciler writes
    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange>;
}

/// Compute the plan for one entity kind. Deletes are only emitted when
/// `allow_delete` is set (the cleanup flag, tenant-restricted upstream).
pub fn diff_entities<T: Diffable>(
    desired: &[T],
    observed: &[T],
    allow_delete: bool,
) -> EntityDiff<T> {
    let observed_by_key: HashMap<T::Key, &T> =
        observed.iter().map(|item| (item.key(), item)).collect();
    let mut desired_keys: HashSet<T::Key> = HashSet::with_capacity(desired.len());

    let mut plan = EntityDiff::default();

    for want in desired {
        let key = want.key();
        if !desired_keys.insert(want.key()) {
            // Duplicate desired records would double-apply; first wins
            continue;
        }
        match observed_by_key.get(&key) {
            None => plan.to_create.push(want.clone()),
            Some(have) => {
                let changes = T::tracked_changes(have, want);
                if !changes.is_empty() {
                    plan.to_update.push(PlannedUpdate {
                        current: (*have).clone(),
                        desired: want.clone(),
                        changes,
                    });
                }
            }
        }
    }

    if allow_delete {
        for have in observed {
            if !desired_keys.contains(&have.key()) {
                plan.to_delete.push(have.clone());
            }
        }
    }

    plan
}

impl Diffable for NbDevice {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        FieldChange::compare("site", &observed.site, &desired.site, &mut out);
        FieldChange::compare("role", &observed.role, &desired.role, &mut out);
        FieldChange::compare("platform", &observed.platform, &desired.platform, &mut out);
        FieldChange::compare("serial", &observed.serial, &desired.serial, &mut out);
        FieldChange::compare(
            "device_type",
            &observed.device_type,
            &desired.device_type,
            &mut out,
        );
        out
    }
}

impl Diffable for NbInterface {
    type Key = (String, String);

    fn key(&self) -> (String, String) {
        (self.device.clone(), self.name.clone())
    }

    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        FieldChange::compare("type", &observed.if_type, &desired.if_type, &mut out);
        FieldChange::compare("enabled", &observed.enabled, &desired.enabled, &mut out);
        FieldChange::compare(
            "description",
            &observed.description,
            &desired.description,
            &mut out,
        );
        FieldChange::compare("mtu", &observed.mtu, &desired.mtu, &mut out);
        FieldChange::compare("mode", &observed.mode, &desired.mode, &mut out);
        FieldChange::compare(
            "untagged_vlan",
            &observed.untagged_vlan,
            &desired.untagged_vlan,
            &mut out,
        );
        FieldChange::compare(
            "tagged_vlans",
            &observed.tagged_vlans,
            &desired.tagged_vlans,
            &mut out,
        );
        FieldChange::compare("lag", &observed.lag, &desired.lag, &mut out);
        out
    }
}

impl Diffable for NbIpAddress {
    type Key = (String, String, String);

    fn key(&self) -> (String, String, String) {
        (
            self.device.clone(),
            self.interface.clone(),
            self.address.clone(),
        )
    }

    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        FieldChange::compare(
            "is_primary",
            &observed.is_primary,
            &desired.is_primary,
            &mut out,
        );
        out
    }
}

impl Diffable for NbVlan {
    type Key = (u16, Option<String>);

    fn key(&self) -> (u16, Option<String>) {
        (self.vid, self.site.clone())
    }

    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        FieldChange::compare("name", &observed.name, &desired.name, &mut out);
        out
    }
}

impl Diffable for NbCable {
    type Key = (super::models::NbCableEnd, super::models::NbCableEnd);

    fn key(&self) -> Self::Key {
        self.normalized_ends()
    }

    fn tracked_changes(_observed: &Self, _desired: &Self) -> Vec<FieldChange> {
        // A cable either exists between two endpoints or it does not
        Vec::new()
    }
}

impl Diffable for NbInventoryItem {
    type Key = (String, String);

    fn key(&self) -> (String, String) {
        (self.device.clone(), self.name.clone())
    }

    fn tracked_changes(observed: &Self, desired: &Self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        FieldChange::compare("part_id", &observed.part_id, &desired.part_id, &mut out);
        FieldChange::compare("serial", &observed.serial, &desired.serial, &mut out);
        FieldChange::compare(
            "description",
            &observed.description,
            &desired.description,
            &mut out,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, serial: Option<&str>) -> NbDevice {
        NbDevice {
            name: name.to_string(),
            serial: serial.map(str::to_string),
            status: "active".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn diff_of_identical_sets_is_empty() {
        let records = vec![device("sw1", Some("A")), device("sw2", None)];
        let plan = diff_entities(&records, &records, true);
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_records_are_created() {
        let desired = vec![device("sw1", None), device("sw2", None)];
        let observed = vec![device("sw1", None)];
        let plan = diff_entities(&desired, &observed, false);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].name, "sw2");
        assert!(plan.to_update.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn changed_fields_become_updates_with_old_new_pairs() {
        let desired = vec![device("sw1", Some("NEW"))];
        let observed = vec![device("sw1", Some("OLD"))];
        let plan = diff_entities(&desired, &observed, false);
        assert_eq!(plan.to_update.len(), 1);
        let update = &plan.to_update[0];
        assert_eq!(update.changes.len(), 1);
        assert_eq!(update.changes[0].field, "serial");
        assert!(update.changes[0].old.contains("OLD"));
        assert!(update.changes[0].new.contains("NEW"));
    }

    #[test]
    fn deletes_require_the_cleanup_flag() {
        let desired: Vec<NbDevice> = Vec::new();
        let observed = vec![device("stale", None)];
        assert!(diff_entities(&desired, &observed, false).to_delete.is_empty());
        assert_eq!(diff_entities(&desired, &observed, true).to_delete.len(), 1);
    }

    #[test]
    fn a_record_lands_in_at_most_one_list() {
        let desired = vec![device("sw1", Some("NEW")), device("sw3", None)];
        let observed = vec![device("sw1", Some("OLD")), device("sw2", None)];
        let plan = diff_entities(&desired, &observed, true);
        let created: HashSet<_> = plan.to_create.iter().map(|d| d.name.clone()).collect();
        let updated: HashSet<_> = plan
            .to_update
            .iter()
            .map(|u| u.desired.name.clone())
            .collect();
        let deleted: HashSet<_> = plan.to_delete.iter().map(|d| d.name.clone()).collect();
        assert!(created.is_disjoint(&updated));
        assert!(created.is_disjoint(&deleted));
        assert!(updated.is_disjoint(&deleted));
    }

    #[test]
    fn apply_then_diff_is_empty() {
        // Applying a plan to the observed set must make a re-diff empty
        let desired = vec![device("sw1", Some("NEW")), device("sw3", None)];
        let mut observed = vec![device("sw1", Some("OLD")), device("sw2", None)];
        let plan = diff_entities(&desired, &observed, true);

        for update in &plan.to_update {
            let slot = observed
                .iter_mut()
                .find(|d| d.key() == update.desired.key())
                .unwrap();
            *slot = update.desired.clone();
        }
        observed.extend(plan.to_create.iter().cloned());
        let delete_keys: HashSet<_> = plan.to_delete.iter().map(|d| d.key()).collect();
        observed.retain(|d| !delete_keys.contains(&d.key()));

        assert!(diff_entities(&desired, &observed, true).is_empty());
    }

    #[test]
    fn cable_diff_is_order_insensitive() {
        use super::super::models::{NbCable, NbCableEnd};
        let end = |d: &str, i: &str| NbCableEnd {
            device: d.to_string(),
            interface: i.to_string(),
        };
        let desired = vec![NbCable::connected(end("sw1", "Gi0/1"), end("sw2", "Gi0/2"))];
        let observed = vec![NbCable::connected(end("sw2", "Gi0/2"), end("sw1", "Gi0/1"))];
        assert!(diff_entities(&desired, &observed, false).is_empty());
    }
}
