//! Administrative operations for Kontak.
//!
//! [`Admin`] bundles the admin panel's actions: file export and import,
//! backup snapshots to a [`BackupStorage`], and bulk import / e-wallet sync
//! from an [`ExternalSource`]. Each long-running action holds a named
//! [`BusySlots`] entry so the same action cannot run twice at once.

pub mod admin;
pub mod backup;
pub mod busy;
pub mod error;
pub mod external;
pub mod schedule;
pub mod storage;

pub use admin::{Admin, AdminSettings, ImportReport, SyncReport};
pub use backup::{BackupEntry, BackupReport};
pub use busy::{BusySlots, Operation};
pub use error::{Error, Result};
pub use external::{ExternalSource, RestSource};
pub use storage::{BackupStorage, FsStorage, StoredObject};

#[cfg(test)]
mod tests;
