//! Error types for the kontak-formats codecs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid JSON format: expected a list of contacts")]
  NotAList,

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
