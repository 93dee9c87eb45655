use anyhow::{Context, Result};
use netfleet_core::netbox::ReconcileReport;
use netfleet_core::{IntentOutcome, RunSummary};
use serde::Serialize;
use std::path::Path;

/// Write one intent's records as pretty JSON into the output directory
pub fn write_records<T: Serialize>(dir: &Path, name: &str, records: &T) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.json", name));
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Write one device's configuration backup
pub fn write_backup(dir: &Path, host: &str, config: &str) -> Result<()> {
    let backups = dir.join("backups");
    std::fs::create_dir_all(&backups)?;
    let path = backups.join(format!("{}.cfg", host.replace(['/', ':'], "_")));
    std::fs::write(&path, config).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Per-device outcome table printed at the end of every collection run
pub fn print_summary(summary: &RunSummary) {
    if summary.devices.is_empty() {
        return;
    }
    println!();
    println!("{:<24} {:<14} {}", "device", "intent", "outcome");
    let mut hosts: Vec<_> = summary.devices.keys().collect();
    hosts.sort();
    for host in hosts {
        let report = &summary.devices[host];
        let mut intents: Vec<_> = report.intents.iter().collect();
        intents.sort_by_key(|(name, _)| name.clone());
        for (intent, outcome) in intents {
            let shown = match outcome {
                IntentOutcome::Ok => "ok",
                IntentOutcome::Partial => "partial",
                IntentOutcome::Failed => "FAILED",
                IntentOutcome::Cancelled => "cancelled",
            };
            println!("{:<24} {:<14} {}", host, intent, shown);
        }
        for error in &report.errors {
            println!("{:<24} {}", host, error);
        }
    }
}

/// Per-phase counters printed after a sync run
pub fn print_report(report: &ReconcileReport) {
    println!();
    if report.dry_run {
        println!("dry-run: no changes were written to NetBox");
    }
    println!(
        "{:<14} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "phase", "created", "updated", "deleted", "skipped", "failed"
    );
    let mut phases: Vec<_> = report.phases.iter().collect();
    phases.sort_by_key(|(name, _)| name.clone());
    for (name, totals) in phases {
        println!(
            "{:<14} {:>8} {:>8} {:>8} {:>8} {:>8}",
            name, totals.created, totals.updated, totals.deleted, totals.skipped, totals.failed
        );
    }
}
