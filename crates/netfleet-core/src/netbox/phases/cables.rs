use super::{is_run_fatal, Phase};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::model::NeighborIdKind;
use crate::netbox::client::NetBoxApi;
use crate::netbox::diff::diff_entities;
use crate::netbox::models::{NbCable, NbCableEnd};
use crate::netbox::reconciler::{ReconcileInput, ReconcileState};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Phase 5: cables from LLDP/CDP observations. Both endpoints must resolve
/// to known devices and interfaces in NetBox; unresolved endpoints are
/// skipped with a warning. The endpoint pair is unordered, so two devices
/// reporting each other still plan exactly one cable.
pub struct CablesPhase;

#[async_trait]
impl Phase for CablesPhase {
    fn name(&self) -> &'static str {
        "cables"
    }

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError> {
        let mut totals = PhaseTotals::default();

        // Interface existence cache per device; devices absent from NetBox
        // cache as None
        let mut interfaces_of: HashMap<String, Option<HashSet<String>>> = HashMap::new();

        let mut desired = Vec::new();
        for neighbor in &input.neighbors {
            if neighbor.id_kind != NeighborIdKind::Hostname {
                debug!(
                    local = %neighbor.local_device,
                    remote = %neighbor.remote_name,
                    kind = ?neighbor.id_kind,
                    "neighbor without hostname identification skipped"
                );
                totals.skipped += 1;
                continue;
            }
            let local_device = input.device_name_of(&neighbor.local_device);
            if state.failed_devices.contains(&local_device) {
                totals.skipped += 1;
                continue;
            }
            // Strip the domain: LLDP often reports FQDNs while NetBox
            // carries short names
            let remote_device = neighbor
                .remote_name
                .split('.')
                .next()
                .unwrap_or(&neighbor.remote_name)
                .to_string();

            let mut resolved = true;
            for (device, interface) in [
                (&local_device, &neighbor.local_interface),
                (&remote_device, &neighbor.remote_interface),
            ] {
                let known = match interfaces_of.get(device) {
                    Some(cached) => cached.clone(),
                    None => {
                        let fetched = match api.get_device(device).await? {
                            Some(_) => {
                                let names: HashSet<String> = api
                                    .list_interfaces(device)
                                    .await?
                                    .into_iter()
                                    .map(|i| i.name)
                                    .collect();
                                Some(names)
                            }
                            None => None,
                        };
                        interfaces_of.insert(device.clone(), fetched.clone());
                        fetched
                    }
                };
                match known {
                    Some(names) if names.contains(interface) => {}
                    Some(_) => {
                        warn!(device = %device, interface = %interface, "cable endpoint interface unknown, skipping");
                        resolved = false;
                    }
                    None => {
                        warn!(device = %device, "cable endpoint device unknown, skipping");
                        resolved = false;
                    }
                }
            }
            if !resolved {
                totals.skipped += 1;
                continue;
            }

            desired.push(NbCable::connected(
                NbCableEnd {
                    device: local_device,
                    interface: neighbor.local_interface.clone(),
                },
                NbCableEnd {
                    device: remote_device,
                    interface: neighbor.remote_interface.clone(),
                },
            ));
        }

        let observed = api.list_cables().await?;
        let plan = diff_entities(&desired, &observed, false);

        for cable in &plan.to_create {
            let (a, b) = cable.normalized_ends();
            state.record(
                self.name(),
                "create",
                format!("{}/{} <-> {}/{}", a.device, a.interface, b.device, b.interface),
                Vec::new(),
            );
            if ctx.dry_run {
                info!(
                    a = format!("{}/{}", a.device, a.interface),
                    b = format!("{}/{}", b.device, b.interface),
                    "dry-run: would create cable"
                );
                totals.created += 1;
                continue;
            }
            match api.create_cable(cable).await {
                Ok(_) => totals.created += 1,
                Err(err) if is_run_fatal(&err) => return Err(err),
                Err(err) => {
                    warn!(error = %err, "cable create failed");
                    totals.failed += 1;
                }
            }
        }

        Ok(totals)
    }
}
