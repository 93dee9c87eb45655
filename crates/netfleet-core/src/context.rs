use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one intent on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentOutcome {
    Ok,
    /// Primary records were produced but at least one enrichment step failed
    Partial,
    Failed,
    Cancelled,
}

/// Per-device record of what happened during a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceReport {
    pub intents: HashMap<String, IntentOutcome>,
    pub errors: Vec<String>,
}

/// Counters for one reconciliation phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTotals {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PhaseTotals {
    pub fn merge(&mut self, other: &PhaseTotals) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Aggregated outcome of a whole run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub devices: HashMap<String, DeviceReport>,
    pub phases: HashMap<String, PhaseTotals>,
}

impl RunSummary {
    pub fn record_intent(&mut self, host: &str, intent: &str, outcome: IntentOutcome) {
        self.devices
            .entry(host.to_string())
            .or_default()
            .intents
            .insert(intent.to_string(), outcome);
    }

    pub fn record_error(&mut self, host: &str, message: impl Into<String>) {
        self.devices
            .entry(host.to_string())
            .or_default()
            .errors
            .push(message.into());
    }

    pub fn record_phase(&mut self, phase: &str, totals: PhaseTotals) {
        self.phases
            .entry(phase.to_string())
            .or_default()
            .merge(&totals);
    }

    /// True when any device finished with a failed or partial intent
    pub fn has_device_errors(&self) -> bool {
        self.devices.values().any(|report| {
            !report.errors.is_empty()
                || report.intents.values().any(|outcome| {
                    matches!(outcome, IntentOutcome::Failed | IntentOutcome::Partial)
                })
        })
    }
}

/// Shared state for one invocation of the engine
///
/// Constructed once, read-only to workers except for the summary aggregator
/// behind its mutex. Dropping the context flushes nothing on its own; the
/// caller owns log lifetime.
pub struct RunContext {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub output_dir: PathBuf,
    cancelled: Arc<AtomicBool>,
    summary: Mutex<RunSummary>,
}

impl RunContext {
    pub fn new(dry_run: bool, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dry_run,
            started_at: Utc::now(),
            output_dir: output_dir.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
            summary: Mutex::new(RunSummary::default()),
        }
    }

    /// Signal all in-flight work to abandon after its current blocking call
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Handle that workers can poll without holding the whole context
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn record_intent(&self, host: &str, intent: &str, outcome: IntentOutcome) {
        self.summary.lock().record_intent(host, intent, outcome);
    }

    pub fn record_error(&self, host: &str, message: impl Into<String>) {
        self.summary.lock().record_error(host, message);
    }

    pub fn record_phase(&self, phase: &str, totals: PhaseTotals) {
        self.summary.lock().record_phase(phase, totals);
    }

    pub fn summary(&self) -> RunSummary {
        self.summary.lock().clone()
    }
}
