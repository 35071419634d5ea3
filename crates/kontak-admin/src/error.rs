//! Error type for `kontak-admin`.

use thiserror::Error;

use crate::busy::Operation;

#[derive(Debug, Error)]
pub enum Error {
  /// An import parsed to zero contacts.
  #[error("no contact data found")]
  NoContacts,

  /// An imported row failed validation; nothing was written.
  #[error("row {row}: {source}")]
  InvalidRow {
    row:    usize,
    #[source]
    source: kontak_core::Error,
  },

  #[error("{0} is already running")]
  Busy(Operation),

  #[error("invalid backup name: {0:?}")]
  InvalidName(String),

  #[error("backup not found: {0}")]
  BackupNotFound(String),

  #[error("backup already exists: {0}")]
  BackupExists(String),

  #[error("storage error: {0}")]
  Storage(#[from] std::io::Error),

  #[error("failed to read external source: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A batch of an external import failed after `inserted` rows were saved.
  #[error("failed to insert batch after {inserted} contacts: {source}")]
  Batch {
    inserted: usize,
    #[source]
    source:   kontak_core::Error,
  },

  #[error(transparent)]
  Contact(#[from] kontak_core::Error),

  #[error(transparent)]
  Format(#[from] kontak_formats::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub fn source_error<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Source(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
