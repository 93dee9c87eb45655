use super::{is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::diff_entities;
use crate::netbox::models::{DeviceFilter, NbDevice};
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use tracing::{info, warn};

/// Phase 1: create missing devices, update changed ones. A device that
/// cannot be brought into NetBox here takes its dependent entities out of
/// every later phase.
pub struct DevicesPhase;

fn desired_devices(input: &ReconcileInput) -> Vec<NbDevice> {
    input
        .facts
        .iter()
        .map(|facts| {
            let device = input.devices.iter().find(|d| d.host == facts.host);
            NbDevice {
                id: 0,
                name: facts.hostname.clone(),
                site: input.site_of(&facts.host),
                role: device
                    .and_then(|d| d.role.clone())
                    .or_else(|| input.options.role.clone()),
                platform: Some(facts.nb_platform.clone()),
                device_type: facts.model.clone(),
                serial: facts.serial.clone(),
                status: if device.map(|d| d.enabled).unwrap_or(true) {
                    "active".to_string()
                } else {
                    "offline".to_string()
                },
                tenant: input.options.tenant.clone(),
                primary_ip4: None,
            }
        })
        .collect()
}

#[async_trait]
impl Phase for DevicesPhase {
    fn name(&self) -> &'static str {
        "devices"
    }

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError> {
        let mut totals = PhaseTotals::default();
        let desired = desired_devices(input);
        let filter = DeviceFilter {
            site: input.options.site.clone(),
            role: input.options.role.clone(),
            tenant: input.options.tenant.clone(),
        };
        let observed = api.list_devices(&filter).await?;

        let allow_delete = input.options.cleanup && input.options.tenant.is_some();
        let plan = diff_entities(&desired, &observed, allow_delete);

        for device in &plan.to_create {
            if !input.options.create_devices {
                // Children cannot attach to a device that was never created
                state.failed_devices.insert(device.name.clone());
                state.record(self.name(), "skip", &device.name, Vec::new());
                totals.skipped += 1;
                continue;
            }
            state.record(self.name(), "create", &device.name, Vec::new());
            if ctx.dry_run {
                info!(device = %device.name, "dry-run: would create device");
                totals.created += 1;
                continue;
            }
            match api.create_device(device).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %device.name, error = %err, "device create failed");
                    state.failed_devices.insert(device.name.clone());
                    totals.failed += 1;
                }
            }
        }

        for update in &plan.to_update {
            if !input.options.update_devices {
                state.record(self.name(), "skip", &update.current.name, Vec::new());
                totals.skipped += 1;
                continue;
            }
            state.record(
                self.name(),
                "update",
                &update.current.name,
                update.changes.clone(),
            );
            if ctx.dry_run {
                info!(
                    device = %update.current.name,
                    changes = update.changes.len(),
                    "dry-run: would update device"
                );
                totals.updated += 1;
                continue;
            }
            let mut desired = update.desired.clone();
            desired.id = update.current.id;
            match api.update_device(&desired).await {
                Ok(()) => totals.updated += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %update.current.name, error = %err, "device update failed");
                    state.failed_devices.insert(update.current.name.clone());
                    totals.failed += 1;
                }
            }
        }

        for device in &plan.to_delete {
            state.record(self.name(), "delete", &device.name, Vec::new());
            if ctx.dry_run {
                info!(device = %device.name, "dry-run: would delete device");
                totals.deleted += 1;
                continue;
            }
            match api.delete_device(device.id).await {
                Ok(()) => totals.deleted += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %device.name, error = %err, "device delete failed");
                    totals.failed += 1;
                }
            }
        }

        Ok(totals)
    }
}
