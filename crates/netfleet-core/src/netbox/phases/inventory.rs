use super::{device_scope, is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::diff_entities;
use crate::netbox::models::NbInventoryItem;
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

/// Phase 6: hardware inventory items (modules, optics, PSUs, fans).
pub struct InventoryPhase;

fn desired_items(input: &ReconcileInput) -> Vec<NbInventoryItem> {
    input
        .inventory
        .iter()
        .map(|item| NbInventoryItem {
            id: 0,
            device: input.device_name_of(&item.device),
            name: item.slot.clone(),
            part_id: item.part_id.clone(),
            serial: item.serial.clone(),
            manufacturer: Some(item.vendor.clone()),
            description: item.description.clone(),
        })
        .collect()
}

#[async_trait]
impl Phase for InventoryPhase {
    fn name(&self) -> &'static str {
        "inventory"
    }

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError> {
        let mut totals = PhaseTotals::default();
        let scope = device_scope(
            input.inventory.iter().map(|i| i.device.as_str()),
            input,
            state,
        );
        let scope_set: HashSet<&String> = scope.iter().collect();

        let desired: Vec<NbInventoryItem> = desired_items(input)
            .into_iter()
            .filter(|item| scope_set.contains(&item.device))
            .collect();

        let mut observed = Vec::new();
        for device in &scope {
            observed.extend(api.list_inventory_items(device).await?);
        }

        // Inventory items are never deleted here; stale hardware is an
        // operator decision
        let plan = diff_entities(&desired, &observed, false);

        for item in &plan.to_create {
            state.record(
                self.name(),
                "create",
                format!("{}/{}", item.device, item.name),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(device = %item.device, item = %item.name, "dry-run: would create inventory item");
                totals.created += 1;
                continue;
            }
            match api.create_inventory_item(item).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %item.device, item = %item.name, error = %err, "inventory create failed");
                    totals.failed += 1;
                }
            }
        }

        for update in &plan.to_update {
            state.record(
                self.name(),
                "update",
                format!("{}/{}", update.current.device, update.current.name),
                update.changes.clone(),
            );
            if ctx.dry_run {
                info!(device = %update.current.device, item = %update.current.name, "dry-run: would update inventory item");
                totals.updated += 1;
                continue;
            }
            let mut desired = update.desired.clone();
            desired.id = update.current.id;
            match api.update_inventory_item(&desired).await {
                Ok(()) => totals.updated += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %update.current.device, item = %update.current.name, error = %err, "inventory update failed");
                    totals.failed += 1;
                }
            }
        }

        Ok(totals)
    }
}
