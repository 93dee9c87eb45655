use super::{is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::diff_entities;
use crate::netbox::models::NbVlan;
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use tracing::{info, warn};

/// Phase 4: VLANs derived from SVI interfaces. `Vlan10` becomes VLAN 10,
/// named after the SVI description when one exists.
pub struct VlansPhase;

fn desired_vlans(input: &ReconcileInput) -> Vec<NbVlan> {
    let mut out = Vec::new();
    for iface in &input.interfaces {
        let Some(vid) = iface.svi_vid() else {
            continue;
        };
        let name = iface
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("VLAN {}", vid));
        out.push(NbVlan {
            id: 0,
            vid,
            name,
            site: input.site_of(&iface.device),
        });
    }
    out
}

#[async_trait]
impl Phase for VlansPhase {
    fn name(&self) -> &'static str {
        "vlans"
    }

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError> {
        let mut totals = PhaseTotals::default();
        let desired = desired_vlans(input);
        let observed = api.list_vlans(input.options.site.as_deref()).await?;

        // VLANs are shared infrastructure: never deleted here
        let plan = diff_entities(&desired, &observed, false);

        for vlan in &plan.to_create {
            state.record(
                self.name(),
                "create",
                format!("vlan {} ({})", vlan.vid, vlan.name),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(vid = vlan.vid, name = %vlan.name, "dry-run: would create VLAN");
                totals.created += 1;
                continue;
            }
            match api.create_vlan(vlan).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(vid = vlan.vid, error = %err, "VLAN create failed");
                    totals.failed += 1;
                }
            }
        }

        for update in &plan.to_update {
            state.record(
                self.name(),
                "update",
                format!("vlan {}", update.current.vid),
                update.changes.clone(),
            );
            if ctx.dry_run {
                info!(vid = update.current.vid, "dry-run: would update VLAN");
                totals.updated += 1;
                continue;
            }
            let mut desired = update.desired.clone();
            desired.id = update.current.id;
            match api.update_vlan(&desired).await {
                Ok(()) => totals.updated += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(vid = update.current.vid, error = %err, "VLAN update failed");
                    totals.failed += 1;
                }
            }
        }

        Ok(totals)
    }
}
