use super::client::NetBoxApi;
use super::diff::FieldChange;
use super::history::{HistoryStore, RunRecord};
use super::phases::{
    CablesPhase, DevicesPhase, InterfacesPhase, InventoryPhase, IpsPhase, Phase, VlansPhase,
};
use crate::context::{PhaseTotals, RunContext};
use crate::error::FleetError;
use crate::model::{Device, DeviceFacts, Interface, InventoryItem, LldpNeighbor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Which reconciliation work the caller asked for. The flags are additive;
/// `sync_all()` turns everything on. Cleanup is tenant-restricted and
/// refused without one.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub create_devices: bool,
    pub update_devices: bool,
    pub interfaces: bool,
    pub ip_addresses: bool,
    pub vlans: bool,
    pub cables: bool,
    pub inventory: bool,
    pub cleanup: bool,
    pub site: Option<String>,
    pub role: Option<String>,
    pub tenant: Option<String>,
}

impl SyncOptions {
    pub fn sync_all(mut self) -> Self {
        self.create_devices = true;
        self.update_devices = true;
        self.interfaces = true;
        self.ip_addresses = true;
        self.vlans = true;
        self.cables = true;
        self.inventory = true;
        self
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        if self.cleanup && self.tenant.is_none() {
            return Err(FleetError::ConfigError(
                "--cleanup requires an explicit --tenant".to_string(),
            ));
        }
        Ok(())
    }

    fn wants_device_phase(&self) -> bool {
        self.create_devices || self.update_devices || self.cleanup
    }
}

/// Everything the reconciler consumes: canonical records from the collector
/// plus the inventory-supplied device list for site/role hints.
#[derive(Debug, Default)]
pub struct ReconcileInput {
    pub devices: Vec<Device>,
    pub facts: Vec<DeviceFacts>,
    pub interfaces: Vec<Interface>,
    pub neighbors: Vec<LldpNeighbor>,
    pub inventory: Vec<InventoryItem>,
    pub options: SyncOptions,
}

impl ReconcileInput {
    /// NetBox device name for a transport host: learned hostname first,
    /// then the inventory friendly name, then the host itself.
    pub fn device_name_of(&self, host: &str) -> String {
        if let Some(facts) = self.facts.iter().find(|f| f.host == host) {
            return facts.hostname.clone();
        }
        if let Some(device) = self.devices.iter().find(|d| d.host == host) {
            if let Some(name) = &device.name {
                return name.clone();
            }
        }
        host.to_string()
    }

    pub fn site_of(&self, host: &str) -> Option<String> {
        self.devices
            .iter()
            .find(|d| d.host == host)
            .and_then(|d| d.site.clone())
            .or_else(|| self.options.site.clone())
    }
}

/// One applied (or planned, in dry-run) change, kept for the history log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDetail {
    pub phase: String,
    pub action: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldChange>,
}

/// Mutable cross-phase context. Later phases consult earlier phases'
/// results through this; most importantly, device failures remove
/// dependent entities from everything downstream.
#[derive(Debug, Default)]
pub struct ReconcileState {
    /// Device names whose phase-1 handling failed; children are skipped
    pub failed_devices: HashSet<String>,
    pub changes: Vec<ChangeDetail>,
}

impl ReconcileState {
    pub fn record(
        &mut self,
        phase: &str,
        action: &str,
        key: impl Into<String>,
        fields: Vec<FieldChange>,
    ) {
        self.changes.push(ChangeDetail {
            phase: phase.to_string(),
            action: action.to_string(),
            key: key.into(),
            fields,
        });
    }
}

/// Final report of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub dry_run: bool,
    pub phases: HashMap<String, PhaseTotals>,
    pub changes: Vec<ChangeDetail>,
}

/// Sequences the phased sync: devices, interfaces (two-pass), IP addresses,
/// VLANs, cables, inventory items. Phases run strictly in order; a phase
/// never starts before the previous one finished.
pub struct Reconciler {
    api: Arc<dyn NetBoxApi>,
    history: Option<HistoryStore>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn NetBoxApi>) -> Self {
        Self { api, history: None }
    }

    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    /// Run the sync. Only NetBox authentication failures and configuration
    /// errors abort; per-entity failures are counted and reported.
    #[instrument(skip_all, fields(dry_run = ctx.dry_run))]
    pub async fn run(
        &self,
        input: &ReconcileInput,
        ctx: &RunContext,
    ) -> Result<ReconcileReport, FleetError> {
        input.options.validate()?;

        let mut state = ReconcileState::default();
        let mut phases: Vec<Box<dyn Phase>> = Vec::new();
        if input.options.wants_device_phase() {
            phases.push(Box::new(DevicesPhase));
        }
        if input.options.interfaces {
            phases.push(Box::new(InterfacesPhase));
        }
        if input.options.ip_addresses {
            phases.push(Box::new(IpsPhase));
        }
        if input.options.vlans {
            phases.push(Box::new(VlansPhase));
        }
        if input.options.cables {
            phases.push(Box::new(CablesPhase));
        }
        if input.options.inventory {
            phases.push(Box::new(InventoryPhase));
        }

        let mut totals_by_phase = HashMap::new();
        for phase in &phases {
            if ctx.is_cancelled() {
                info!(phase = phase.name(), "cancelled before phase");
                break;
            }
            info!(phase = phase.name(), "phase starting");
            let totals = match phase.run(self.api.as_ref(), ctx, input, &mut state).await {
                Ok(totals) => totals,
                Err(err) if err.is_auth() || err.is_fatal() => {
                    error!(phase = phase.name(), error = %err, "run-fatal error");
                    return Err(err);
                }
                Err(err) => {
                    error!(phase = phase.name(), error = %err, "phase failed");
                    PhaseTotals {
                        failed: 1,
                        ..Default::default()
                    }
                }
            };
            info!(
                phase = phase.name(),
                created = totals.created,
                updated = totals.updated,
                deleted = totals.deleted,
                skipped = totals.skipped,
                failed = totals.failed,
                "phase finished"
            );
            ctx.record_phase(phase.name(), totals);
            totals_by_phase.insert(phase.name().to_string(), totals);
        }

        let report = ReconcileReport {
            dry_run: ctx.dry_run,
            phases: totals_by_phase,
            changes: state.changes,
        };

        if let Some(history) = &self.history {
            let record = RunRecord {
                run_id: ctx.run_id.to_string(),
                started_at: ctx.started_at,
                dry_run: ctx.dry_run,
                phases: report.phases.clone(),
                changes: report.changes.clone(),
            };
            if let Err(err) = history.append(&record) {
                error!(error = %err, "failed to write history entry");
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_without_tenant_is_refused() {
        let options = SyncOptions {
            cleanup: true,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let with_tenant = SyncOptions {
            cleanup: true,
            tenant: Some("lab".to_string()),
            ..Default::default()
        };
        assert!(with_tenant.validate().is_ok());
    }

    #[test]
    fn device_name_resolution_prefers_learned_hostname() {
        let mut input = ReconcileInput::default();
        input.devices.push({
            let mut d = Device::new("10.0.0.1", "cisco_ios");
            d.name = Some("friendly".to_string());
            d
        });
        input.facts.push(DeviceFacts {
            host: "10.0.0.1".to_string(),
            hostname: "core-sw-01".to_string(),
            platform: "cisco_ios".to_string(),
            vendor: "cisco".to_string(),
            nb_platform: "cisco-ios".to_string(),
            model: None,
            serial: None,
            version: None,
            uptime: None,
        });
        assert_eq!(input.device_name_of("10.0.0.1"), "core-sw-01");
        assert_eq!(input.device_name_of("10.0.0.9"), "10.0.0.9");
    }
}
