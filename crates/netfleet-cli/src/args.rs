use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Network fleet inventory collector and NetBox sync
#[derive(Debug, Parser)]
#[command(name = "netfleet", version, about)]
pub struct Cli {
    /// Device inventory file (YAML list of {host, platform, ...})
    #[arg(long, short = 'i', global = true, default_value = "devices.yml")]
    pub inventory: PathBuf,

    /// SSH username (falls back to NET_USERNAME, then an interactive prompt)
    #[arg(long, global = true, env = "NET_USERNAME")]
    pub username: Option<String>,

    /// SSH password (falls back to NET_PASSWORD, then an interactive prompt)
    #[arg(long, global = true, env = "NET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable secret where privilege escalation is needed
    #[arg(long, global = true, hide_env_values = true)]
    pub enable: Option<String>,

    /// Maximum number of devices worked on concurrently
    #[arg(long, global = true, default_value_t = 10)]
    pub workers: usize,

    /// Directory for reports, backups and the run history
    #[arg(long, short = 'o', global = true, default_value = "reports")]
    pub output_dir: PathBuf,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Also log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect device facts (hostname, model, serial, version)
    Devices,
    /// Collect MAC address tables
    Mac {
        /// Keep entries learned on trunk ports
        #[arg(long)]
        include_trunk: bool,
    },
    /// Collect LLDP neighbor tables
    Lldp,
    /// Collect interfaces with LAG, switchport and media enrichment
    Interfaces,
    /// Collect hardware inventory
    Inventory,
    /// Save running configurations
    Backup,
    /// Run one raw command on every device and print the output
    Run {
        /// The command to execute
        command: String,
    },
    /// Reconcile collected state into NetBox
    SyncNetbox(SyncArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Create devices missing from NetBox
    #[arg(long)]
    pub create_devices: bool,

    /// Update changed device fields (site, role, platform, serial)
    #[arg(long)]
    pub update_devices: bool,

    /// Sync interfaces (two-pass: LAGs before members)
    #[arg(long)]
    pub interfaces: bool,

    /// Sync IP addresses and device primary IPs
    #[arg(long)]
    pub ip_addresses: bool,

    /// Create cables from neighbor observations
    #[arg(long)]
    pub cables: bool,

    /// Create VLANs derived from SVIs
    #[arg(long)]
    pub vlans: bool,

    /// Sync hardware inventory items
    #[arg(long)]
    pub inventory: bool,

    /// Delete objects NetBox has but the fleet does not; requires --tenant
    #[arg(long)]
    pub cleanup: bool,

    /// Enable every sync flag at once
    #[arg(long)]
    pub sync_all: bool,

    /// Compute and log the plan without writing to NetBox (the default)
    #[arg(long, default_value_t = true, overrides_with = "no_dry_run")]
    pub dry_run: bool,

    /// Actually write to NetBox
    #[arg(long)]
    pub no_dry_run: bool,

    /// Restrict the sync to one site
    #[arg(long)]
    pub site: Option<String>,

    /// Restrict the sync to one device role
    #[arg(long)]
    pub role: Option<String>,

    /// Tenant the sync (and any cleanup) is scoped to
    #[arg(long)]
    pub tenant: Option<String>,

    /// Which discovery protocol feeds the cable phase
    #[arg(long, value_enum, default_value_t = Protocol::Lldp)]
    pub protocol: Protocol,

    /// NetBox base URL
    #[arg(long, env = "NETBOX_URL")]
    pub netbox_url: Option<String>,

    /// NetBox API token
    #[arg(long, env = "NETBOX_TOKEN", hide_env_values = true)]
    pub netbox_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    Lldp,
    Cdp,
    Both,
}

impl SyncArgs {
    /// Destructive operations default to dry-run unless explicitly disabled
    pub fn effective_dry_run(&self) -> bool {
        if self.no_dry_run {
            false
        } else {
            self.dry_run
        }
    }
}
