//! HTTP server for Kontak.
//!
//! Composes the [`kontak_api`] routers under `/api`, guards `/api/admin` with
//! Basic auth and wraps everything in a request trace layer.

pub mod auth;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use kontak_admin::{Admin, AdminSettings, BackupStorage};
use kontak_core::store::ContactStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_admin};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `KONTAK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub backup_dir:          PathBuf,
  pub admin_username:      String,
  /// argon2 PHC string; admin routes are open when unset.
  pub admin_password_hash: Option<String>,
  /// UTC hour of the daily backup; no schedule when unset.
  pub backup_hour:         Option<u32>,
  pub import_batch_size:   usize,
  pub sync_concurrency:    usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let admin = AdminSettings::default();
    Self {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      store_path:          PathBuf::from("kontak.db"),
      backup_dir:          PathBuf::from("backups"),
      admin_username:      "admin".to_string(),
      admin_password_hash: None,
      backup_hour:         None,
      import_batch_size:   admin.batch_size,
      sync_concurrency:    admin.sync_concurrency,
    }
  }
}

impl ServerConfig {
  pub fn admin_settings(&self) -> AdminSettings {
    AdminSettings {
      batch_size:       self.import_batch_size,
      sync_concurrency: self.sync_concurrency,
    }
  }

  pub fn auth(&self) -> Option<AuthConfig> {
    self.admin_password_hash.as_ref().map(|hash| AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: hash.clone(),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn app<S, B>(admin: Admin<S, B>, auth: Option<AuthConfig>) -> Router
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  let admin_routes = kontak_api::admin_router(admin.clone())
    .layer(middleware::from_fn_with_state(Arc::new(auth), require_admin));

  Router::new()
    .nest("/api", kontak_api::api_router(admin).nest("/admin", admin_routes))
    .layer(TraceLayer::new_for_http())
}
