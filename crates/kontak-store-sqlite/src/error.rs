//! Error type for `kontak-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The unique phone index rejected a write.
  #[error("phone {phone} is already saved under the name {owner_name}")]
  PhoneTaken {
    phone:      String,
    owner_id:   uuid::Uuid,
    owner_name: String,
  },

  /// Two rows of one `insert_many` call share a phone.
  #[error("phone {phone} appears twice in the batch (rows {first} and {second})")]
  RepeatedPhone {
    phone:  String,
    first:  usize,
    second: usize,
  },
}

impl From<Error> for kontak_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::PhoneTaken { phone, owner_id, owner_name } => {
        kontak_core::Error::DuplicatePhone { phone, owner_id, owner_name }
      }
      Error::RepeatedPhone { phone, first, second } => {
        kontak_core::Error::RepeatedPhone { phone, first, second }
      }
      other => kontak_core::Error::store(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
