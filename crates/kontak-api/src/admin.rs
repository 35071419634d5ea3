//! Handlers for the admin panel.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/export/{format}` | `csv`, `json` or `vcf`; file body |
//! | `POST` | `/import/{format}` | Body: file text; `{count, message}` |
//! | `POST` | `/functions/backup-contacts` | Function response |
//! | `POST` | `/functions/import-external` | Body: [`ExternalBody`] |
//! | `POST` | `/functions/sync-external` | Body: [`ExternalBody`] |
//! | `GET`  | `/backups` | Newest first |
//! | `GET`  | `/backups/{name}` | Snapshot bytes |
//! | `DELETE` | `/backups/{name}` | 204 |
//!
//! Function endpoints answer `{success: true, ...}` or, on any failure,
//! `{success: false, error}` with status 500.

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use kontak_admin::{
  Admin, BackupEntry, BackupStorage, ImportReport, RestSource, backup::sha256_hex,
};
use kontak_core::store::ContactStore;
use kontak_formats::Format;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

fn attachment(name: &str) -> String { format!("attachment; filename=\"{name}\"") }

// ─── Export / import ─────────────────────────────────────────────────────────

/// `GET /export/{format}`
pub async fn export<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(format): Path<Format>,
) -> Result<Response, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let body = admin.export(format).await?;
  Ok(
    (
      [
        (header::CONTENT_TYPE, format.media_type().to_string()),
        (header::CONTENT_DISPOSITION, attachment(&format.file_name())),
      ],
      body,
    )
      .into_response(),
  )
}

/// `POST /import/{format}` — the request body is the file text.
pub async fn import<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(format): Path<Format>,
  body: String,
) -> Result<Json<Value>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let report = admin.import(format, &body).await?;
  Ok(Json(json!({ "count": report.count, "message": report.message() })))
}

// ─── Server-side functions ───────────────────────────────────────────────────

/// Body of the external-source functions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBody {
  pub source_url: String,
  pub source_key: String,
}

fn function_response(result: kontak_admin::Result<Value>) -> Response {
  match result {
    Ok(Value::Object(mut fields)) => {
      fields.insert("success".into(), Value::Bool(true));
      Json(Value::Object(fields)).into_response()
    }
    Ok(other) => Json(json!({ "success": true, "result": other })).into_response(),
    Err(e) => {
      tracing::warn!(error = %e, "function failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": e.to_string() })),
      )
        .into_response()
    }
  }
}

fn import_fields(report: ImportReport) -> Value {
  json!({ "count": report.count, "message": report.message() })
}

/// `POST /functions/backup-contacts`
pub async fn backup_contacts<S, B>(State(admin): State<Admin<S, B>>) -> Response
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let result = admin.backup_now().await.map(|r| {
    json!({
      "count": r.count,
      "message": r.message(),
      "name": r.name,
      "sha256": r.sha256,
    })
  });
  function_response(result)
}

/// `POST /functions/import-external`
pub async fn import_external<S, B>(
  State(admin): State<Admin<S, B>>,
  Json(body): Json<ExternalBody>,
) -> Response
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let result = match RestSource::new(body.source_url, body.source_key) {
    Ok(source) => admin.import_external(&source).await.map(import_fields),
    Err(e) => Err(e),
  };
  function_response(result)
}

/// `POST /functions/sync-external`
pub async fn sync_external<S, B>(
  State(admin): State<Admin<S, B>>,
  Json(body): Json<ExternalBody>,
) -> Response
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let result = match RestSource::new(body.source_url, body.source_key) {
    Ok(source) => admin
      .sync_external(&source)
      .await
      .map(|r| json!({ "updated": r.updated, "message": r.message() })),
    Err(e) => Err(e),
  };
  function_response(result)
}

// ─── Backups ─────────────────────────────────────────────────────────────────

/// `GET /backups`
pub async fn list_backups<S, B>(
  State(admin): State<Admin<S, B>>,
) -> Result<Json<Vec<BackupEntry>>, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Ok(Json(admin.list_backups().await?))
}

/// `GET /backups/{name}` — the snapshot with a content-hash `ETag`.
pub async fn download_backup<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(name): Path<String>,
) -> Result<Response, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let bytes = admin.download_backup(&name).await?;
  let etag = format!("\"{}\"", sha256_hex(&bytes));
  Ok(
    (
      [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&name)),
        (header::ETAG, etag),
      ],
      Bytes::from(bytes),
    )
      .into_response(),
  )
}

/// `DELETE /backups/{name}`
pub async fn delete_backup<S, B>(
  State(admin): State<Admin<S, B>>,
  Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  admin.delete_backup(&name).await?;
  Ok(StatusCode::NO_CONTENT)
}
