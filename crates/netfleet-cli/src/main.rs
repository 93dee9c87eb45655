mod args;
mod inventory;
mod output;

use anyhow::Result;
use args::{Cli, Command, SyncArgs};
use clap::Parser;
use netfleet_core::netbox::{HistoryStore, NetBoxRestClient, ReconcileInput, Reconciler};
use netfleet_core::{
    CollectionOutcome, CollectorEngine, CollectorOptions, CollectorSettings, ConnectionManager,
    Credentials, Device, FleetError, Intent, NetBoxSettings, PlatformRegistry, RunContext,
    SyncOptions, TemplateParser,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

const EXIT_OK: u8 = 0;
const EXIT_DEVICE_ERRORS: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_NETBOX_AUTH: u8 = 3;
const EXIT_INTERNAL: u8 = 4;

const HISTORY_CAP: usize = 50;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = netfleet_core::init_logging(
        &cli.log_level,
        cli.log_file.is_some(),
        cli.log_file.as_deref().and_then(|p| p.to_str()),
    ) {
        eprintln!("failed to initialize logging: {}", err);
        return ExitCode::from(EXIT_INTERNAL);
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<FleetError>() {
        Some(fleet_err) if fleet_err.is_auth() && matches!(fleet_err, FleetError::NetBoxAuth(_)) => {
            EXIT_NETBOX_AUTH
        }
        Some(
            FleetError::ConfigError(_) | FleetError::UnknownPlatform(_) | FleetError::TemplateError(_),
        ) => EXIT_CONFIG,
        Some(_) => EXIT_INTERNAL,
        // Inventory / argument problems surface as plain anyhow context
        None => EXIT_CONFIG,
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let devices = inventory::load_devices(&cli.inventory)?;
    let credentials = resolve_credentials(&cli)?;

    let registry = Arc::new(PlatformRegistry::builtin());
    let parser = Arc::new(TemplateParser::builtin()?);
    let settings = Arc::new(
        CollectorSettings::builder()
            .max_concurrent_devices(cli.workers)
            .build(),
    );

    match &cli.command {
        Command::Devices => {
            collect_and_write(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Devices])
                .await
        }
        Command::Mac { include_trunk } => {
            let options = CollectorOptions {
                exclude_trunk_macs: !include_trunk,
                ..Default::default()
            };
            collect_with_options(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Mac], options)
                .await
        }
        Command::Lldp => {
            collect_and_write(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Lldp])
                .await
        }
        Command::Interfaces => {
            collect_and_write(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Interfaces])
                .await
        }
        Command::Inventory => {
            collect_and_write(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Inventory])
                .await
        }
        Command::Backup => {
            collect_and_write(&cli, &devices, &credentials, registry, parser, settings, &[Intent::Backup])
                .await
        }
        Command::Run { command } => {
            run_raw_command(&devices, &credentials, registry, settings, command).await
        }
        Command::SyncNetbox(sync_args) => {
            sync_netbox(&cli, sync_args, &devices, &credentials, registry, parser, settings).await
        }
    }
}

fn resolve_credentials(cli: &Cli) -> Result<Credentials> {
    let username = match &cli.username {
        Some(username) => username.clone(),
        None => {
            eprint!("Username: ");
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };
    let password = match &cli.password {
        Some(password) => password.clone(),
        None => rpassword::prompt_password("Password: ")?,
    };
    let mut credentials = Credentials::new(username, password);
    if let Some(enable) = &cli.enable {
        credentials = credentials.with_enable(enable.clone());
    }
    Ok(credentials)
}

#[allow(clippy::too_many_arguments)]
async fn collect_and_write(
    cli: &Cli,
    devices: &[Device],
    credentials: &Credentials,
    registry: Arc<PlatformRegistry>,
    parser: Arc<TemplateParser>,
    settings: Arc<CollectorSettings>,
    intents: &[Intent],
) -> Result<u8> {
    collect_with_options(
        cli,
        devices,
        credentials,
        registry,
        parser,
        settings,
        intents,
        CollectorOptions::default(),
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn collect_with_options(
    cli: &Cli,
    devices: &[Device],
    credentials: &Credentials,
    registry: Arc<PlatformRegistry>,
    parser: Arc<TemplateParser>,
    settings: Arc<CollectorSettings>,
    intents: &[Intent],
    options: CollectorOptions,
) -> Result<u8> {
    let ctx = Arc::new(RunContext::new(false, cli.output_dir.clone()));
    let engine = CollectorEngine::new(registry, parser, settings, options);
    let outcome = engine.collect(devices, credentials, intents, &ctx).await;

    write_outcome(cli, intents, &outcome)?;

    let summary = ctx.summary();
    output::print_summary(&summary);
    if summary.has_device_errors() {
        Ok(EXIT_DEVICE_ERRORS)
    } else {
        Ok(EXIT_OK)
    }
}

fn write_outcome(cli: &Cli, intents: &[Intent], outcome: &CollectionOutcome) -> Result<()> {
    for intent in intents {
        match intent {
            Intent::Devices => output::write_records(&cli.output_dir, "devices", &outcome.facts)?,
            Intent::Interfaces => {
                output::write_records(&cli.output_dir, "interfaces", &outcome.interfaces)?
            }
            Intent::Mac => output::write_records(&cli.output_dir, "mac", &outcome.macs)?,
            Intent::Lldp => output::write_records(&cli.output_dir, "lldp", &outcome.neighbors)?,
            Intent::Inventory => {
                output::write_records(&cli.output_dir, "inventory", &outcome.inventory)?
            }
            Intent::Backup => {
                for (host, config) in &outcome.backups {
                    output::write_backup(&cli.output_dir, host, config)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

async fn run_raw_command(
    devices: &[Device],
    credentials: &Credentials,
    registry: Arc<PlatformRegistry>,
    settings: Arc<CollectorSettings>,
    command: &str,
) -> Result<u8> {
    let manager = Arc::new(ConnectionManager::new(settings));
    let mut failures = 0usize;

    for device in devices {
        let manager = Arc::clone(&manager);
        let registry = Arc::clone(&registry);
        let device = device.clone();
        let credentials = credentials.clone();
        let command = command.to_string();
        let device_host = device.host.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut session = manager.open(&device, &credentials, &registry, None)?;
            let output = manager.run(&mut session, &command);
            manager.close(session);
            output
        })
        .await?;

        println!("===== {} =====", device_host);
        match result {
            Ok(text) => println!("{}", text),
            Err(err) => {
                failures += 1;
                println!("error: {}", err);
            }
        }
    }

    Ok(if failures > 0 { EXIT_DEVICE_ERRORS } else { EXIT_OK })
}

#[allow(clippy::too_many_arguments)]
async fn sync_netbox(
    cli: &Cli,
    sync_args: &SyncArgs,
    devices: &[Device],
    credentials: &Credentials,
    registry: Arc<PlatformRegistry>,
    parser: Arc<TemplateParser>,
    settings: Arc<CollectorSettings>,
) -> Result<u8> {
    let mut options = SyncOptions {
        create_devices: sync_args.create_devices,
        update_devices: sync_args.update_devices,
        interfaces: sync_args.interfaces,
        ip_addresses: sync_args.ip_addresses,
        vlans: sync_args.vlans,
        cables: sync_args.cables,
        inventory: sync_args.inventory,
        cleanup: sync_args.cleanup,
        site: sync_args.site.clone(),
        role: sync_args.role.clone(),
        tenant: sync_args.tenant.clone(),
    };
    if sync_args.sync_all {
        options = options.sync_all();
    }
    options.validate().map_err(anyhow::Error::from)?;

    let url = sync_args
        .netbox_url
        .clone()
        .ok_or_else(|| FleetError::ConfigError("NETBOX_URL is not set".to_string()))?;
    let token = sync_args
        .netbox_token
        .clone()
        .ok_or_else(|| FleetError::ConfigError("NETBOX_TOKEN is not set".to_string()))?;

    // Collect what the selected phases need
    let mut intents = vec![Intent::Devices];
    if options.interfaces || options.ip_addresses || options.vlans {
        intents.push(Intent::Interfaces);
    }
    if options.cables {
        intents.push(Intent::Lldp);
    }
    if options.inventory {
        intents.push(Intent::Inventory);
    }

    let ctx = Arc::new(RunContext::new(
        sync_args.effective_dry_run(),
        cli.output_dir.clone(),
    ));
    let engine = CollectorEngine::new(registry, parser, settings, CollectorOptions::default());
    let outcome = engine.collect(devices, credentials, &intents, &ctx).await;

    let input = ReconcileInput {
        devices: devices.to_vec(),
        facts: outcome.facts,
        interfaces: outcome.interfaces,
        neighbors: outcome.neighbors,
        inventory: outcome.inventory,
        options,
    };

    let api = Arc::new(NetBoxRestClient::new(NetBoxSettings::new(url, token))?);
    let history = HistoryStore::new(cli.output_dir.join("history.json"), HISTORY_CAP);
    let reconciler = Reconciler::new(api).with_history(history);

    let report = reconciler.run(&input, &ctx).await.map_err(anyhow::Error::from)?;
    output::print_report(&report);
    output::print_summary(&ctx.summary());

    if ctx.summary().has_device_errors() {
        Ok(EXIT_DEVICE_ERRORS)
    } else {
        Ok(EXIT_OK)
    }
}
