//! [`Admin`] — the admin panel's actions.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use kontak_core::{
  book::ContactBook,
  contact::{Contact, NewContact},
  guard::ensure_unique_phones,
  store::ContactStore,
};
use kontak_formats::Format;
use serde::Serialize;
use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
  Error, Result,
  backup::{self, BackupEntry, BackupReport},
  busy::{BusySlots, Operation},
  external::{ExternalSource, map_record},
  storage::BackupStorage,
};

/// Tunables for bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSettings {
  /// Rows per insert request during external import.
  pub batch_size:       usize,
  /// Maximum in-flight updates during external sync.
  pub sync_concurrency: usize,
}

impl Default for AdminSettings {
  fn default() -> Self { Self { batch_size: 100, sync_concurrency: 8 } }
}

/// Outcome of a file or external import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub count: usize,
}

impl ImportReport {
  pub fn message(&self) -> String {
    match self.count {
      0 => "No contacts found".to_string(),
      n => format!("{n} contacts imported"),
    }
  }
}

/// Outcome of an external e-wallet sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
  pub updated: usize,
}

impl SyncReport {
  pub fn message(&self) -> String { format!("{} contacts updated", self.updated) }
}

fn store_err<E: Into<kontak_core::Error>>(e: E) -> Error { Error::Contact(e.into()) }

/// Export, import, backup and external sync over a [`ContactBook`].
///
/// Cloning is cheap; every clone shares the same busy slots.
pub struct Admin<S, B> {
  book:     ContactBook<S>,
  storage:  Arc<B>,
  slots:    Arc<BusySlots>,
  settings: AdminSettings,
}

impl<S, B> Clone for Admin<S, B> {
  fn clone(&self) -> Self {
    Self {
      book:     self.book.clone(),
      storage:  Arc::clone(&self.storage),
      slots:    Arc::clone(&self.slots),
      settings: self.settings,
    }
  }
}

impl<S, B> Admin<S, B>
where
  S: ContactStore + 'static,
  B: BackupStorage,
{
  pub fn new(book: ContactBook<S>, storage: Arc<B>, settings: AdminSettings) -> Self {
    Self { book, storage, slots: Arc::new(BusySlots::new()), settings }
  }

  pub fn book(&self) -> &ContactBook<S> { &self.book }

  pub fn storage(&self) -> &Arc<B> { &self.storage }

  pub fn slots(&self) -> &BusySlots { &self.slots }

  pub fn settings(&self) -> AdminSettings { self.settings }

  /// Notify the outcome of an action and pass it through.
  fn report<T>(
    &self,
    context: &str,
    result: Result<T>,
    success: impl FnOnce(&T) -> String,
  ) -> Result<T> {
    let notifier = self.book.notifier();
    match &result {
      Ok(value) => notifier.success(&success(value)),
      Err(e) => notifier.error(&format!("{context}: {e}")),
    }
    result
  }

  // ── Export / import ───────────────────────────────────────────────────────

  /// Every contact encoded in `format`.
  pub async fn export(&self, format: Format) -> Result<String> {
    let result = async {
      let contacts = self.book.store().list_contacts().await.map_err(store_err)?;
      let body = kontak_formats::export(format, &contacts)?;
      Ok::<_, Error>((body, contacts.len()))
    }
    .await;
    let (body, _) = self.report("Export failed", result, |(_, n)| {
      format!("Exported {n} contacts as {}", format.extension().to_uppercase())
    })?;
    Ok(body)
  }

  /// Parse `text` and insert every row in one transaction.
  ///
  /// An empty parse fails with [`Error::NoContacts`]; a row without a name
  /// fails the whole import with [`Error::InvalidRow`].
  pub async fn import(&self, format: Format, text: &str) -> Result<ImportReport> {
    let result = self.import_inner(format, text).await;
    self.report("Import failed", result, ImportReport::message)
  }

  async fn import_inner(&self, format: Format, text: &str) -> Result<ImportReport> {
    let _slot = self.slots.acquire(Operation::Import)?;

    let parsed = kontak_formats::import(format, text)?;
    if parsed.is_empty() {
      return Err(Error::NoContacts);
    }
    let drafts = normalize_all(parsed)?;
    ensure_unique_phones(&drafts)?;

    let created = self.book.store().insert_many(drafts).await.map_err(store_err)?;
    tracing::info!(%format, count = created.len(), "file import finished");
    Ok(ImportReport { count: created.len() })
  }

  // ── Backups ───────────────────────────────────────────────────────────────

  /// Snapshot every contact to storage.
  pub async fn backup_now(&self) -> Result<BackupReport> {
    let result = self.backup_inner().await;
    self.report("Backup failed", result, BackupReport::message)
  }

  async fn backup_inner(&self) -> Result<BackupReport> {
    let _slot = self.slots.acquire(Operation::Backup)?;

    let contacts = self.book.store().list_contacts().await.map_err(store_err)?;
    let bytes = backup::snapshot(&contacts)?;
    let name = backup::backup_name(Utc::now(), contacts.len());
    let sha256 = backup::sha256_hex(&bytes);

    self.storage.upload(&name, bytes).await?;
    tracing::info!(%name, count = contacts.len(), "backup uploaded");
    Ok(BackupReport { name, count: contacts.len(), sha256 })
  }

  /// Stored snapshots, newest first.
  pub async fn list_backups(&self) -> Result<Vec<BackupEntry>> {
    let mut objects = self.storage.list().await?;
    backup::sort_newest_first(&mut objects);
    let now = Utc::now();
    Ok(objects.into_iter().map(|o| BackupEntry::new(o, now)).collect())
  }

  pub async fn download_backup(&self, name: &str) -> Result<Vec<u8>> {
    self.storage.download(name).await
  }

  pub async fn delete_backup(&self, name: &str) -> Result<()> {
    let result = self.storage.remove(name).await;
    self.report("Failed to delete backup", result, |_| "Backup deleted".to_string())
  }

  // ── External source ───────────────────────────────────────────────────────

  /// Copy every record of `source` into the store, `batch_size` rows per
  /// insert. Batches already written stay written when a later one fails.
  pub async fn import_external<X: ExternalSource>(&self, source: &X) -> Result<ImportReport> {
    let result = self.import_external_inner(source).await;
    self.report("External import failed", result, ImportReport::message)
  }

  async fn import_external_inner<X: ExternalSource>(&self, source: &X) -> Result<ImportReport> {
    let _slot = self.slots.acquire(Operation::ImportExternal)?;

    let records = source.fetch_contacts().await?;
    if records.is_empty() {
      return Ok(ImportReport { count: 0 });
    }
    let drafts = normalize_all(records.iter().map(map_record).collect())?;
    ensure_unique_phones(&drafts)?;

    let mut inserted = 0;
    for batch in drafts.chunks(self.settings.batch_size.max(1)) {
      self
        .book
        .store()
        .insert_many(batch.to_vec())
        .await
        .map_err(|e| Error::Batch { inserted, source: e.into() })?;
      inserted += batch.len();
      tracing::debug!(inserted, total = drafts.len(), "external batch inserted");
    }
    Ok(ImportReport { count: inserted })
  }

  /// Copy e-wallet tags from `source` onto local contacts with the same
  /// phone. Each local contact is updated at most once; individual failures
  /// are logged and left out of the count. Records without an `ewallet`
  /// array carry no tags to copy and are skipped.
  pub async fn sync_external<X: ExternalSource>(&self, source: &X) -> Result<SyncReport> {
    let result = self.sync_external_inner(source).await;
    self.report("Sync failed", result, SyncReport::message)
  }

  async fn sync_external_inner<X: ExternalSource>(&self, source: &X) -> Result<SyncReport> {
    let _slot = self.slots.acquire(Operation::Sync)?;

    let records = source.fetch_contacts().await?;
    let local = self.book.store().list_contacts().await.map_err(store_err)?;
    let mut by_phone: HashMap<String, Contact> = local
      .into_iter()
      .filter_map(|c| Some((c.phone.clone()?, c)))
      .collect();

    let permits = Arc::new(Semaphore::new(self.settings.sync_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for record in &records {
      if !record.get("ewallet").is_some_and(Value::is_array) {
        continue;
      }
      let incoming = map_record(record);
      let Some(contact) = incoming.phone.as_deref().and_then(|p| by_phone.remove(p)) else {
        continue;
      };
      if contact.ewallet == incoming.ewallet {
        continue;
      }

      let draft = NewContact { ewallet: incoming.ewallet, ..contact.to_new() };
      let store = Arc::clone(self.book.store());
      let permits = Arc::clone(&permits);
      tasks.spawn(async move {
        let _permit = permits.acquire_owned().await.map_err(Error::source_error)?;
        store.update_contact(contact.id, draft).await.map_err(store_err)
      });
    }

    let mut updated = 0;
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok(Ok(Some(_))) => updated += 1,
        // Deleted while the sync was running.
        Ok(Ok(None)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "sync update failed"),
        Err(e) => tracing::warn!(error = %e, "sync task aborted"),
      }
    }
    tracing::info!(updated, "external sync finished");
    Ok(SyncReport { updated })
  }
}

/// Normalise every row, failing on the first invalid one (1-based).
fn normalize_all(rows: Vec<NewContact>) -> Result<Vec<NewContact>> {
  rows
    .into_iter()
    .enumerate()
    .map(|(i, row)| row.normalized().map_err(|source| Error::InvalidRow { row: i + 1, source }))
    .collect()
}
