//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// The contact that already holds a phone number.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
  pub id:   Uuid,
  pub name: String,
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {message}")]
  Conflict {
    message: String,
    owner:   Option<Owner>,
  },

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn conflict(message: impl ToString) -> Self {
    Self::Conflict { message: message.to_string(), owner: None }
  }
}

impl From<kontak_core::Error> for ApiError {
  fn from(e: kontak_core::Error) -> Self {
    use kontak_core::Error as E;
    match e {
      E::EmptyName | E::RepeatedPhone { .. } => Self::BadRequest(e.to_string()),
      E::ContactNotFound(_) => Self::NotFound(e.to_string()),
      E::DuplicatePhone { ref owner_id, ref owner_name, .. } => Self::Conflict {
        owner:   Some(Owner { id: *owner_id, name: owner_name.clone() }),
        message: e.to_string(),
      },
      other => Self::Internal(Box::new(other)),
    }
  }
}

impl From<kontak_admin::Error> for ApiError {
  fn from(e: kontak_admin::Error) -> Self {
    use kontak_admin::Error as E;
    match e {
      E::Contact(inner) => inner.into(),
      E::NoContacts | E::InvalidRow { .. } | E::InvalidName(_) | E::Format(_) => {
        Self::BadRequest(e.to_string())
      }
      E::Busy(_) | E::BackupExists(_) => Self::conflict(e),
      E::BackupNotFound(_) => Self::NotFound(e.to_string()),
      other => Self::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict { message, owner } => {
        (StatusCode::CONFLICT, json!({ "error": message, "owner": owner }))
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
