//! Handlers for the contact list view and form.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | `?q` search query, `?mode=keywords\|substring` |
//! | `POST` | `/contacts` | Body: [`NewContact`]; returns 201 + stored contact |
//! | `GET`  | `/contacts/{id}` | Single contact |
//! | `PUT`  | `/contacts/{id}` | Body: [`NewContact`]; replaces writable fields |
//! | `DELETE` | `/contacts/{id}` | 204 |
//! | `GET`  | `/phone-check` | `?phone` and optional `?exclude=<id>` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kontak_admin::{Admin, BackupStorage};
use kontak_core::{
  contact::{Contact, NewContact},
  guard::PhoneCheck,
  search::{SearchMode, SearchOutcome},
  store::ContactStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List / search ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub q:    String,
  #[serde(default)]
  pub mode: SearchMode,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  /// The query was the admin keyword; `contacts` is unfiltered.
  pub admin_trigger: bool,
  pub count:         usize,
  pub contacts:      Vec<Contact>,
}

/// `GET /contacts?q=<query>[&mode=substring]`
pub async fn list<S, B>(
  State(admin): State<Admin<S, B>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let response = match admin.book().search(&params.q, params.mode).await? {
    SearchOutcome::AdminTrigger(contacts) => ListResponse {
      admin_trigger: true,
      count: contacts.len(),
      contacts,
    },
    SearchOutcome::Matches(contacts) => ListResponse {
      admin_trigger: false,
      count: contacts.len(),
      contacts,
    },
  };
  Ok(Json(response))
}

// ─── Single contact ──────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Ok(Json(admin.book().get(id).await?))
}

/// `POST /contacts` — returns 201 + the stored contact, or 409 naming the
/// contact that already holds the phone.
pub async fn create<S, B>(
  State(admin): State<Admin<S, B>>,
  Json(body): Json<NewContact>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let contact = admin.book().save(body, None).await?;
  Ok((StatusCode::CREATED, Json(contact)))
}

/// `PUT /contacts/{id}`
pub async fn update<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewContact>,
) -> Result<Json<Contact>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Ok(Json(admin.book().save(body, Some(id)).await?))
}

/// `DELETE /contacts/{id}`
pub async fn delete<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  admin.book().delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Phone check ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PhoneCheckParams {
  #[serde(default)]
  pub phone:   String,
  /// The contact being edited, whose own number is not a conflict.
  pub exclude: Option<Uuid>,
}

/// `GET /phone-check?phone=<raw>[&exclude=<id>]`
pub async fn phone_check<S, B>(
  State(admin): State<Admin<S, B>>,
  Query(params): Query<PhoneCheckParams>,
) -> Result<Json<PhoneCheck>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Ok(Json(admin.book().check_phone(&params.phone, params.exclude).await?))
}
