//! Backup object storage.
//!
//! Snapshots are immutable named objects. [`FsStorage`] keeps them as files in
//! one directory; other backends implement [`BackupStorage`].

use std::{future::Future, io, path::PathBuf, time::SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{Error, Result};

/// Metadata of one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub size:       u64,
}

/// A flat namespace of immutable backup objects.
pub trait BackupStorage: Send + Sync {
  /// Store `bytes` under `name`. Fails with [`Error::BackupExists`] rather
  /// than overwriting.
  fn upload<'a>(
    &'a self,
    name: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Every stored object, in no particular order.
  fn list(&self) -> impl Future<Output = Result<Vec<StoredObject>>> + Send + '_;

  fn download<'a>(&'a self, name: &'a str) -> impl Future<Output = Result<Vec<u8>>> + Send + 'a;

  fn remove<'a>(&'a self, name: &'a str) -> impl Future<Output = Result<()>> + Send + 'a;
}

/// Reject anything that is not a plain `backup-*.json` file name.
pub fn validate_name(name: &str) -> Result<()> {
  let plain = !name.contains(['/', '\\']) && name != "." && name != "..";
  if plain && name.starts_with("backup-") && name.ends_with(".json") {
    Ok(())
  } else {
    Err(Error::InvalidName(name.to_string()))
  }
}

// ─── Filesystem backend ──────────────────────────────────────────────────────

/// Snapshots stored as files under `root`.
#[derive(Debug, Clone)]
pub struct FsStorage {
  root: PathBuf,
}

impl FsStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &PathBuf { &self.root }

  fn path_for(&self, name: &str) -> Result<PathBuf> {
    validate_name(name)?;
    Ok(self.root.join(name))
  }
}

fn not_found(name: &str) -> impl FnOnce(io::Error) -> Error + '_ {
  move |e| match e.kind() {
    io::ErrorKind::NotFound => Error::BackupNotFound(name.to_string()),
    _ => Error::Storage(e),
  }
}

impl BackupStorage for FsStorage {
  async fn upload<'a>(&'a self, name: &'a str, bytes: Vec<u8>) -> Result<()> {
    let path = self.path_for(name)?;
    fs::create_dir_all(&self.root).await?;

    let mut file = fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&path)
      .await
      .map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => Error::BackupExists(name.to_string()),
        _ => Error::Storage(e),
      })?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "backup written");
    Ok(())
  }

  async fn list(&self) -> Result<Vec<StoredObject>> {
    let mut entries = match fs::read_dir(&self.root).await {
      Ok(entries) => entries,
      // Nothing has been backed up yet.
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut objects = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      let Ok(name) = entry.file_name().into_string() else {
        continue;
      };
      if validate_name(&name).is_err() {
        continue;
      }
      let meta = entry.metadata().await?;
      if !meta.is_file() {
        continue;
      }
      let created: SystemTime = meta.created().or_else(|_| meta.modified())?;
      objects.push(StoredObject {
        name,
        created_at: created.into(),
        size: meta.len(),
      });
    }
    Ok(objects)
  }

  async fn download<'a>(&'a self, name: &'a str) -> Result<Vec<u8>> {
    let path = self.path_for(name)?;
    fs::read(&path).await.map_err(not_found(name))
  }

  async fn remove<'a>(&'a self, name: &'a str) -> Result<()> {
    let path = self.path_for(name)?;
    fs::remove_file(&path).await.map_err(not_found(name))
  }
}
