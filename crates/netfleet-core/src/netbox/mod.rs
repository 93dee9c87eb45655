pub mod client;
pub mod diff;
pub mod history;
pub mod models;
pub mod phases;
pub mod reconciler;

pub use client::{NetBoxApi, NetBoxRestClient};
pub use diff::{diff_entities, Diffable, EntityDiff, FieldChange, PlannedUpdate};
pub use history::{HistoryStore, RunRecord};
pub use models::{
    DeviceFilter, NbCable, NbCableEnd, NbDevice, NbInterface, NbInventoryItem, NbIpAddress,
    NbRef, NbVlan,
};
pub use reconciler::{
    ChangeDetail, ReconcileInput, ReconcileReport, ReconcileState, Reconciler, SyncOptions,
};
