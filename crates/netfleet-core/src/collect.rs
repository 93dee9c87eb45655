use crate::connect::{ConnectionManager, SshSession};
use crate::context::{IntentOutcome, RunContext};
use crate::error::FleetError;
use crate::model::{
    Credentials, Device, DeviceFacts, Interface, InventoryItem, LldpNeighbor, MacEntry,
};
use crate::names::AliasMap;
use crate::normalize::{
    DeviceNormalizer, InterfaceNormalizer, InventoryNormalizer, LldpNormalizer, MacNormalizer,
    SwitchportSetting,
};
use crate::parse::{Row, TemplateParser};
use crate::platform::{Intent, PlatformRegistry};
use crate::settings::CollectorSettings;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Toggles for the secondary enrichment passes
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub enrich_lag: bool,
    pub enrich_switchport: bool,
    pub enrich_media: bool,
    /// Drop MAC entries learned on trunk ports
    pub exclude_trunk_macs: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            enrich_lag: true,
            enrich_switchport: true,
            enrich_media: true,
            exclude_trunk_macs: true,
        }
    }
}

/// Everything one run of the collector produced, across all devices.
/// Emission order across devices is unspecified.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    pub facts: Vec<DeviceFacts>,
    pub interfaces: Vec<Interface>,
    pub macs: Vec<MacEntry>,
    pub neighbors: Vec<LldpNeighbor>,
    pub inventory: Vec<InventoryItem>,
    /// host -> raw configuration text
    pub backups: HashMap<String, String>,
}

impl CollectionOutcome {
    fn merge(&mut self, other: CollectionOutcome) {
        self.facts.extend(other.facts);
        self.interfaces.extend(other.interfaces);
        self.macs.extend(other.macs);
        self.neighbors.extend(other.neighbors);
        self.inventory.extend(other.inventory);
        self.backups.extend(other.backups);
    }
}

/// Fans collection out over devices under a bounded worker pool.
///
/// Within one device, commands run sequentially over a single session and
/// the primary command's records are fully normalized before any secondary
/// enrichment command is issued.
pub struct CollectorEngine {
    registry: Arc<PlatformRegistry>,
    parser: Arc<TemplateParser>,
    manager: Arc<ConnectionManager>,
    settings: Arc<CollectorSettings>,
    options: CollectorOptions,
}

impl CollectorEngine {
    pub fn new(
        registry: Arc<PlatformRegistry>,
        parser: Arc<TemplateParser>,
        settings: Arc<CollectorSettings>,
        options: CollectorOptions,
    ) -> Self {
        Self {
            registry,
            parser,
            manager: Arc::new(ConnectionManager::new(Arc::clone(&settings))),
            settings,
            options,
        }
    }

    /// Collect the requested intents from every device. A device that fails
    /// entirely lands in the run's error set; it never blocks records from
    /// other devices.
    #[instrument(skip_all, fields(devices = devices.len()))]
    pub async fn collect(
        &self,
        devices: &[Device],
        credentials: &Credentials,
        intents: &[Intent],
        ctx: &Arc<RunContext>,
    ) -> CollectionOutcome {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_devices));
        let mut tasks: Vec<(String, JoinHandle<CollectionOutcome>)> = Vec::new();

        let intents: Vec<Intent> = intents.iter().copied().filter(|i| !i.is_secondary()).collect();

        for device in devices.iter().cloned() {
            // Refuse unknown platforms before spending a connection on them
            if let Err(err) = self.registry.resolve(&device.platform) {
                error!(host = %device.host, error = %err, "device refused");
                ctx.record_error(&device.host, err.to_string());
                for intent in &intents {
                    ctx.record_intent(&device.host, &intent.to_string(), IntentOutcome::Failed);
                }
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let registry = Arc::clone(&self.registry);
            let parser = Arc::clone(&self.parser);
            let manager = Arc::clone(&self.manager);
            let options = self.options.clone();
            let credentials = credentials.clone();
            let ctx = Arc::clone(ctx);
            let intents = intents.clone();
            let host = device.host.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                // ssh2 is blocking; keep the reactor free
                tokio::task::spawn_blocking(move || {
                    collect_device(
                        &device,
                        &credentials,
                        &intents,
                        &registry,
                        &parser,
                        &manager,
                        &options,
                        &ctx,
                    )
                })
                .await
                .unwrap_or_else(|join_err| {
                    error!(error = %join_err, "collection worker panicked");
                    CollectionOutcome::default()
                })
            });
            tasks.push((host, handle));
        }

        let mut outcome = CollectionOutcome::default();
        for (host, handle) in tasks {
            match handle.await {
                Ok(device_outcome) => outcome.merge(device_outcome),
                Err(err) => {
                    error!(host = %host, error = %err, "collection task failed");
                    ctx.record_error(&host, format!("worker failed: {}", err));
                }
            }
        }

        info!(
            facts = outcome.facts.len(),
            interfaces = outcome.interfaces.len(),
            macs = outcome.macs.len(),
            neighbors = outcome.neighbors.len(),
            inventory = outcome.inventory.len(),
            "collection finished"
        );
        outcome
    }
}

/// Sequential per-device collection over one session
#[allow(clippy::too_many_arguments)]
fn collect_device(
    device: &Device,
    credentials: &Credentials,
    intents: &[Intent],
    registry: &PlatformRegistry,
    parser: &TemplateParser,
    manager: &ConnectionManager,
    options: &CollectorOptions,
    ctx: &RunContext,
) -> CollectionOutcome {
    let mut outcome = CollectionOutcome::default();

    let mut session = match manager.open(device, credentials, registry, Some(ctx.cancel_flag())) {
        Ok(session) => session,
        Err(err) => {
            error!(host = %device.host, error = %err, "connection failed");
            ctx.record_error(&device.host, err.to_string());
            let outcome_kind = if matches!(err, FleetError::Cancelled) {
                IntentOutcome::Cancelled
            } else {
                IntentOutcome::Failed
            };
            for intent in intents {
                ctx.record_intent(&device.host, &intent.to_string(), outcome_kind);
            }
            return outcome;
        }
    };

    for intent in intents {
        if ctx.is_cancelled() {
            ctx.record_intent(&device.host, &intent.to_string(), IntentOutcome::Cancelled);
            continue;
        }
        let result = collect_intent(
            device, *intent, registry, parser, manager, options, &mut session, &mut outcome,
        );
        let reported = match result {
            Ok(reported) => reported,
            Err(err) => {
                warn!(host = %device.host, intent = %intent, error = %err, "intent failed");
                ctx.record_error(&device.host, format!("{}: {}", intent, err));
                if matches!(err, FleetError::Cancelled) {
                    IntentOutcome::Cancelled
                } else {
                    IntentOutcome::Failed
                }
            }
        };
        ctx.record_intent(&device.host, &intent.to_string(), reported);
    }

    manager.close(session);
    outcome
}

/// Run one primary intent on an open session, including its guarded
/// secondary enrichment
#[allow(clippy::too_many_arguments)]
fn collect_intent(
    device: &Device,
    intent: Intent,
    registry: &PlatformRegistry,
    parser: &TemplateParser,
    manager: &ConnectionManager,
    options: &CollectorOptions,
    session: &mut SshSession,
    outcome: &mut CollectionOutcome,
) -> Result<IntentOutcome, FleetError> {
    let entry = registry.resolve(&device.platform)?;
    let Some(command) = entry.command(intent) else {
        warn!(host = %device.host, intent = %intent, "platform defines no command");
        return Err(FleetError::ConfigError(format!(
            "platform {} has no command for intent {}",
            device.platform, intent
        )));
    };

    let raw = manager.run(session, command)?;

    if intent == Intent::Backup {
        outcome.backups.insert(device.host.clone(), raw);
        return Ok(IntentOutcome::Ok);
    }

    let rows = parser.parse(registry, &device.platform, command, &raw)?;
    if rows.is_empty() {
        warn!(host = %device.host, intent = %intent, command, "parse produced no rows");
        return Ok(IntentOutcome::Partial);
    }

    match intent {
        Intent::Devices => {
            let prompt = session.prompt_hostname().to_string();
            match DeviceNormalizer::normalize(&rows, device, entry, Some(&prompt)) {
                Some(facts) => outcome.facts.push(facts),
                None => return Ok(IntentOutcome::Partial),
            }
            Ok(IntentOutcome::Ok)
        }
        Intent::Interfaces => {
            let mut interfaces = InterfaceNormalizer::normalize(&rows, device);
            let mut degraded = false;

            if options.enrich_lag {
                match secondary_rows(device, Intent::Lag, registry, parser, manager, session) {
                    Ok(Some(lag_rows)) => {
                        let membership = InterfaceNormalizer::lag_membership(&lag_rows);
                        InterfaceNormalizer::enrich_with_lag(&mut interfaces, &membership);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(host = %device.host, error = %err, "lag enrichment failed");
                        degraded = true;
                    }
                }
            }
            if options.enrich_switchport {
                match secondary_rows(device, Intent::Switchport, registry, parser, manager, session)
                {
                    Ok(Some(sw_rows)) => {
                        let settings = InterfaceNormalizer::switchport_settings(&sw_rows);
                        InterfaceNormalizer::enrich_with_switchport(&mut interfaces, &settings);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(host = %device.host, error = %err, "switchport enrichment failed");
                        degraded = true;
                    }
                }
            }
            if options.enrich_media {
                for media_intent in [Intent::MediaType, Intent::Transceiver] {
                    match secondary_rows(device, media_intent, registry, parser, manager, session) {
                        Ok(Some(media_rows)) => {
                            let media = InterfaceNormalizer::media_types(&media_rows);
                            InterfaceNormalizer::enrich_with_media_type(&mut interfaces, &media);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(host = %device.host, error = %err, "media enrichment failed");
                            degraded = true;
                        }
                    }
                }
            }

            debug!(host = %device.host, count = interfaces.len(), "interfaces normalized");
            outcome.interfaces.extend(interfaces);
            if degraded {
                Ok(IntentOutcome::Partial)
            } else {
                Ok(IntentOutcome::Ok)
            }
        }
        Intent::Mac => {
            let mut degraded = false;
            let switchports: Option<AliasMap<SwitchportSetting>> = if options.exclude_trunk_macs {
                match secondary_rows(device, Intent::Switchport, registry, parser, manager, session)
                {
                    Ok(Some(sw_rows)) => {
                        Some(InterfaceNormalizer::switchport_settings(&sw_rows))
                    }
                    Ok(None) => None,
                    Err(err) => {
                        warn!(host = %device.host, error = %err, "switchport lookup for trunk filter failed");
                        degraded = true;
                        None
                    }
                }
            } else {
                None
            };
            let normalizer = MacNormalizer::new(options.exclude_trunk_macs);
            let entries = normalizer.normalize(&rows, device, switchports.as_ref());
            debug!(host = %device.host, count = entries.len(), "MAC entries normalized");
            outcome.macs.extend(entries);
            if degraded {
                Ok(IntentOutcome::Partial)
            } else {
                Ok(IntentOutcome::Ok)
            }
        }
        Intent::Lldp => {
            let neighbors = LldpNormalizer::normalize(&rows, device);
            debug!(host = %device.host, count = neighbors.len(), "LLDP neighbors normalized");
            outcome.neighbors.extend(neighbors);
            Ok(IntentOutcome::Ok)
        }
        Intent::Inventory => {
            let items = InventoryNormalizer::normalize(&rows, device, entry.vendor);
            debug!(host = %device.host, count = items.len(), "inventory items normalized");
            outcome.inventory.extend(items);
            Ok(IntentOutcome::Ok)
        }
        Intent::Backup | Intent::Lag | Intent::Switchport | Intent::MediaType
        | Intent::Transceiver => {
            // Backup returned earlier; secondaries never reach here
            Ok(IntentOutcome::Ok)
        }
    }
}

/// Run one secondary command if the platform defines it. Returns Ok(None)
/// when the platform has no such command; that is not an error.
fn secondary_rows(
    device: &Device,
    intent: Intent,
    registry: &PlatformRegistry,
    parser: &TemplateParser,
    manager: &ConnectionManager,
    session: &mut SshSession,
) -> Result<Option<Vec<Row>>, FleetError> {
    let Some(command) = registry.command_for(&device.platform, intent)? else {
        return Ok(None);
    };
    let raw = manager.run(session, command)?;
    let rows = parser.parse(registry, &device.platform, command, &raw)?;
    Ok(Some(rows))
}
