//! Error types for `kontak-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("name is required")]
  EmptyName,

  #[error("phone {phone} is already saved under the name {owner_name}")]
  DuplicatePhone {
    phone:      String,
    owner_id:   Uuid,
    owner_name: String,
  },

  /// Two rows of one bulk write carry the same phone (1-based rows).
  #[error("phone {phone} appears twice in the import (rows {first} and {second})")]
  RepeatedPhone {
    phone:  String,
    first:  usize,
    second: usize,
  },

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap an arbitrary backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
