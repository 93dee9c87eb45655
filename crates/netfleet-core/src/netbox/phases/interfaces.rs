use super::{device_scope, is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::model::{Interface, SwitchportMode};
use crate::names::AliasMap;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::{diff_entities, Diffable, PlannedUpdate};
use crate::netbox::models::NbInterface;
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Phase 2: interfaces, two passes within the phase.
///
/// Pass A writes every interface whose type is `lag` — the parents that
/// member interfaces reference. Only after pass A completes does pass B
/// write the rest, resolving `lag_parent` through alias-expanded lookup
/// against everything pass A made available. The dependency is semantic
/// (type == lag), not an ordering trick on names.
pub struct InterfacesPhase;

fn mode_value(mode: SwitchportMode) -> Option<String> {
    match mode {
        SwitchportMode::Access => Some("access".to_string()),
        SwitchportMode::Tagged => Some("tagged".to_string()),
        SwitchportMode::TaggedAll => Some("tagged-all".to_string()),
        SwitchportMode::Unset => None,
    }
}

fn desired_interface(iface: &Interface, input: &ReconcileInput) -> NbInterface {
    NbInterface {
        id: 0,
        device: input.device_name_of(&iface.device),
        name: iface.name.clone(),
        if_type: iface.nb_type.clone(),
        enabled: iface.enabled,
        description: iface.description.clone(),
        mtu: iface.mtu,
        mac_address: iface.mac.clone(),
        speed_kbps: iface.speed.map(|bps| bps / 1_000),
        mode: mode_value(iface.mode),
        untagged_vlan: iface.untagged_vlan,
        tagged_vlans: iface.tagged_vlans.clone(),
        lag: iface.lag_parent.clone(),
    }
}

#[async_trait]
impl Phase for InterfacesPhase {
    fn name(&self) -> &'static str {
        "interfaces"
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
            input.interfaces.iter().map(|i| i.device.as_str()),
            input,
            state,
        );
        let scope_set: HashSet<&String> = scope.iter().collect();

        let desired: Vec<NbInterface> = input
            .interfaces
            .iter()
            .map(|iface| desired_interface(iface, input))
            .filter(|iface| scope_set.contains(&iface.device))
            .collect();

        let mut observed = Vec::new();
        for device in &scope {
            observed.extend(api.list_interfaces(device).await?);
        }

        // Pass A: LAG parents
        let lag_desired: Vec<NbInterface> = desired
            .iter()
            .filter(|i| i.if_type == "lag")
            .cloned()
            .collect();
        let plan_a = diff_entities(&lag_desired, &observed, false);
        self.apply(api, ctx, state, &mut totals, &plan_a.to_create, &plan_a.to_update)
            .await?;

        // Publish every LAG now available for member linking
        let mut lags_available: HashMap<String, AliasMap<String>> = HashMap::new();
        for iface in observed
            .iter()
            .filter(|i| i.if_type == "lag")
            .chain(lag_desired.iter())
        {
            lags_available
                .entry(iface.device.clone())
                .or_default()
                .insert(&iface.name, iface.name.clone());
        }

        // Intra-phase barrier: pass B starts only now
        let mut member_desired: Vec<NbInterface> = desired
            .iter()
            .filter(|i| i.if_type != "lag")
            .cloned()
            .collect();
        for member in &mut member_desired {
            let Some(parent) = member.lag.clone() else {
                continue;
            };
            let resolved = lags_available
                .get(&member.device)
                .and_then(|lags| lags.get(&parent).cloned());
            match resolved {
                Some(canonical) => member.lag = Some(canonical),
                None => {
                    // Written without the parent link, not silently skipped
                    warn!(
                        device = %member.device,
                        interface = %member.name,
                        lag = %parent,
                        "LAG parent not available, writing member without link"
                    );
                    member.lag = None;
                }
            }
        }

        let plan_b = diff_entities(&member_desired, &observed, false);
        self.apply(api, ctx, state, &mut totals, &plan_b.to_create, &plan_b.to_update)
            .await?;

        // Cleanup considers the full desired set so pass A parents are
        // never mistaken for strays
        if input.options.cleanup && input.options.tenant.is_some() {
            let desired_keys: HashSet<_> = desired.iter().map(|i| i.key()).collect();
            for stale in observed.iter().filter(|i| !desired_keys.contains(&i.key())) {
                state.record(
                    self.name(),
                    "delete",
                    format!("{}/{}", stale.device, stale.name),
                    Vec::new(),
                );
                if ctx.dry_run {
                    info!(device = %stale.device, interface = %stale.name, "dry-run: would delete interface");
                    totals.deleted += 1;
                    continue;
                }
                match api.delete_interface(stale.id).await {
                    Ok(()) => totals.deleted += 1,
                    Err(err) if is_run_fatal(&err) => return Err(err),
                    Err(err) => {
                        warn!(device = %stale.device, interface = %stale.name, error = %err, "interface delete failed");
                        totals.failed += 1;
                    }
                }
            }
        }

        Ok(totals)
    }
}

impl InterfacesPhase {
    async fn apply(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        state: &mut ReconcileState,
        totals: &mut PhaseTotals,
        to_create: &[NbInterface],
        to_update: &[PlannedUpdate<NbInterface>],
    ) -> Result<(), FleetError> {
        for iface in to_create {
            state.record(
                self.name(),
                "create",
                format!("{}/{}", iface.device, iface.name),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(device = %iface.device, interface = %iface.name, "dry-run: would create interface");
                totals.created += 1;
                continue;
            }
            match api.create_interface(iface).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %iface.device, interface = %iface.name, error = %err, "interface create failed");
                    totals.failed += 1;
                }
            }
        }
        for update in to_update {
            state.record(
                self.name(),
                "update",
                format!("{}/{}", update.current.device, update.current.name),
                update.changes.clone(),
            );
            if ctx.dry_run {
                info!(
                    device = %update.current.device,
                    interface = %update.current.name,
                    changes = update.changes.len(),
                    "dry-run: would update interface"
                );
                totals.updated += 1;
                continue;
            }
            let mut desired = update.desired.clone();
            desired.id = update.current.id;
            match api.update_interface(&desired).await {
                Ok(()) => totals.updated += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(device = %update.current.device, interface = %update.current.name, error = %err, "interface update failed");
                    totals.failed += 1;
                }
            }
        }
        Ok(())
    }
}
