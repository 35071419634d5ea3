//! JSON REST API for Kontak.
//!
//! Exposes axum [`Router`]s backed by an [`Admin`] (which also carries the
//! [`kontak_core::book::ContactBook`]). Auth, TLS, and transport concerns are
//! the caller's responsibility; [`admin_router`] is meant to sit behind an
//! auth layer.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kontak_api::api_router(admin.clone())
//!   .nest("/admin", kontak_api::admin_router(admin).layer(auth)))
//! ```

pub mod admin;
pub mod contacts;
pub mod error;

use axum::{
  Router,
  routing::{get, post},
};
use kontak_admin::{Admin, BackupStorage};
use kontak_core::store::ContactStore;

pub use error::ApiError;

/// Routes for the contact list view and form.
pub fn api_router<S, B>(admin: Admin<S, B>) -> Router<()>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Router::new()
    .route("/contacts", get(contacts::list::<S, B>).post(contacts::create::<S, B>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S, B>)
        .put(contacts::update::<S, B>)
        .delete(contacts::delete::<S, B>),
    )
    .route("/phone-check", get(contacts::phone_check::<S, B>))
    .with_state(admin)
}

/// Routes for the admin panel.
pub fn admin_router<S, B>(admin: Admin<S, B>) -> Router<()>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  Router::new()
    // Files
    .route("/export/{format}", get(admin::export::<S, B>))
    .route("/import/{format}", post(admin::import::<S, B>))
    // Server-side functions
    .route("/functions/backup-contacts", post(admin::backup_contacts::<S, B>))
    .route("/functions/import-external", post(admin::import_external::<S, B>))
    .route("/functions/sync-external", post(admin::sync_external::<S, B>))
    // Backups
    .route("/backups", get(admin::list_backups::<S, B>))
    .route(
      "/backups/{name}",
      get(admin::download_backup::<S, B>).delete(admin::delete_backup::<S, B>),
    )
    .with_state(admin)
}
