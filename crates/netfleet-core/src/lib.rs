pub mod collect;
pub mod connect;
pub mod context;
pub mod error;
pub mod logging;
pub mod model;
pub mod names;
pub mod netbox;
pub mod normalize;
pub mod parse;
pub mod platform;
pub mod settings;

// Re-export core types
pub use collect::{CollectionOutcome, CollectorEngine, CollectorOptions};
pub use connect::{ConnectionManager, SshSession};
pub use context::{DeviceReport, IntentOutcome, PhaseTotals, RunContext, RunSummary};
pub use error::FleetError;
pub use logging::init_logging;
pub use model::{
    canonical_mac, Credentials, Device, DeviceFacts, Interface, InventoryItem, InventoryKind,
    LldpNeighbor, MacEntry, MacKind, NeighborIdKind, PortType, SwitchportMode,
};
pub use names::AliasMap;
pub use netbox::{
    HistoryStore, NetBoxApi, NetBoxRestClient, ReconcileInput, ReconcileReport, Reconciler,
    SyncOptions,
};
pub use parse::TemplateParser;
pub use platform::{Intent, PlatformEntry, PlatformRegistry, SshDriver};
pub use settings::{CollectorSettings, NetBoxSettings};
