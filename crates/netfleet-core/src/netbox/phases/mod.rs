mod cables;
mod devices;
mod interfaces;
mod inventory;
mod ips;
mod vlans;

pub use cables::CablesPhase;
pub use devices::DevicesPhase;
pub use interfaces::InterfacesPhase;
pub use inventory::InventoryPhase;
pub use ips::IpsPhase;
pub use vlans::VlansPhase;

use super::client::NetBoxApi;
use super::reconciler::{ReconcileInput, ReconcileState};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use async_trait::async_trait;
use std::collections::HashSet;

/// One step of the phased sync. Each phase observes, diffs and applies one
/// entity kind; the reconciler sequences them.
///
/// `run` returns the phase totals; it returns `Err` only for run-fatal
/// conditions (NetBox auth, configuration). Per-entity failures are counted
/// in the totals and the phase carries on.
#[async_trait]
pub trait Phase: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        api: &dyn NetBoxApi,
        ctx: &RunContext,
        input: &ReconcileInput,
        state: &mut ReconcileState,
    ) -> Result<PhaseTotals, FleetError>;
}

/// Device names a phase should touch: every device that owns one of its
/// input records, minus devices that already failed in phase 1.
pub(crate) fn device_scope<'a, I>(
    hosts: I,
    input: &ReconcileInput,
    state: &ReconcileState,
) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut scope = Vec::new();
    for host in hosts {
        let name = input.device_name_of(host);
        if state.failed_devices.contains(&name) {
            continue;
        }
        if seen.insert(name.clone()) {
            scope.push(name);
        }
    }
    scope
}

/// True when an error should abort the whole run instead of being counted
pub(crate) fn is_run_fatal(err: &FleetError) -> bool {
    err.is_auth() || err.is_fatal()
}
