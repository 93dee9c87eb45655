use super::{device_scope, is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::diff_entities;
use crate::netbox::models::NbIpAddress;
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

/// Phase 3: attach IP addresses to interfaces. The address matching the
/// transport host becomes the device's primary IPv4.
pub struct IpsPhase;

fn desired_ips(input: &ReconcileInput) -> Vec<NbIpAddress> {
    let mut out = Vec::new();
    for iface in &input.interfaces {
        let device = input.device_name_of(&iface.device);
        if let Some(ip4) = &iface.ip4 {
            let bare = ip4.split('/').next().unwrap_or(ip4);
            out.push(NbIpAddress {
                id: 0,
                address: ip4.clone(),
                device: device.clone(),
                interface: iface.name.clone(),
                is_primary: bare == iface.device,
            });
        }
        if let Some(ip6) = &iface.ip6 {
            out.push(NbIpAddress {
                id: 0,
                address: ip6.clone(),
                device: device.clone(),
                interface: iface.name.clone(),
                is_primary: false,
            });
        }
    }
    out
}

#[async_trait]
impl Phase for IpsPhase {
    fn name(&self) -> &'static str {
        "ip-addresses"
    }

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError> {
        let mut totals = PhaseTotals::default();
        let desired = desired_ips(input);
        let scope = device_scope(
            input.interfaces.iter().map(|i| i.device.as_str()),
            input,
            state,
        );
        let scope_set: HashSet<&String> = scope.iter().collect();
        let desired: Vec<NbIpAddress> = desired
            .into_iter()
            .filter(|ip| scope_set.contains(&ip.device))
            .collect();

        let mut observed = Vec::new();
        for device in &scope {
            observed.extend(api.list_ip_addresses(device).await?);
        }

        let allow_delete = input.options.cleanup && input.options.tenant.is_some();
        let plan = diff_entities(&desired, &observed, allow_delete);

        for ip in &plan.to_create {
            state.record(
                self.name(),
                "create",
                format!("{}/{} {}", ip.device, ip.interface, ip.address),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(device = %ip.device, address = %ip.address, "dry-run: would create IP address");
                totals.created += 1;
                continue;
            }
            match api.create_ip_address(ip).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %ip.device, address = %ip.address, error = %err, "IP create failed");
                    totals.failed += 1;
                }
            }
        }

        for update in &plan.to_update {
            state.record(
                self.name(),
                "update",
                format!(
                    "{}/{} {}",
                    update.current.device, update.current.interface, update.current.address
                ),
                update.changes.clone(),
            );
            if ctx.dry_run {
                info!(device = %update.current.device, address = %update.current.address, "dry-run: would update IP address");
                totals.updated += 1;
                continue;
            }
            let mut desired = update.desired.clone();
            desired.id = update.current.id;
            match api.update_ip_address(&desired).await {
                Ok(()) => totals.updated += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %update.current.device, address = %update.current.address, error = %err, "IP update failed");
                    totals.failed += 1;
                }
            }
        }

        for stale in &plan.to_delete {
            state.record(
                self.name(),
                "delete",
                format!("{}/{} {}", stale.device, stale.interface, stale.address),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(device = %stale.device, address = %stale.address, "dry-run: would delete IP address");
                totals.deleted += 1;
                continue;
            }
            match api.delete_ip_address(stale.id).await {
                Ok(()) => totals.deleted += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %stale.device, address = %stale.address, error = %err, "IP delete failed");
                    totals.failed += 1;
                }
            }
        }

        Ok(totals)
    }
}
