//! `Admin` against an in-memory SQLite store and a temporary backup directory.

use std::{
  path::PathBuf,
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use kontak_core::{
  book::ContactBook,
  contact::{Contact, EWallet, NewContact},
  notify::{CollectingNotifier, Notice},
  store::ContactStore,
};
use kontak_formats::Format;
use kontak_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Admin, AdminSettings, Error, FsStorage, Operation,
  external::{DEFAULT_NAME, ExternalSource},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A directory under the system temp dir, removed on drop.
struct TempDir(PathBuf);

impl TempDir {
  fn new() -> Self {
    Self(std::env::temp_dir().join(format!("kontak-admin-{}", Uuid::new_v4())))
  }
}

impl Drop for TempDir {
  fn drop(&mut self) { let _ = std::fs::remove_dir_all(&self.0); }
}

struct Fixture<S> {
  admin:    Admin<S, FsStorage>,
  notifier: Arc<CollectingNotifier>,
  _dir:     TempDir,
}

async fn fixture_with<S: ContactStore + 'static>(store: S, settings: AdminSettings) -> Fixture<S> {
  let dir = TempDir::new();
  let notifier = Arc::new(CollectingNotifier::new());
  let book = ContactBook::new(Arc::new(store), notifier.clone());
  let admin = Admin::new(book, Arc::new(FsStorage::new(&dir.0)), settings);
  Fixture { admin, notifier, _dir: dir }
}

async fn fixture() -> Fixture<SqliteStore> {
  fixture_with(SqliteStore::open_in_memory().await.unwrap(), AdminSettings::default()).await
}

async fn seed<S: ContactStore + 'static>(admin: &Admin<S, FsStorage>, name: &str, phone: &str) -> Contact {
  admin
    .book()
    .save(NewContact::new(name).with_phone(phone), None)
    .await
    .unwrap()
}

/// A fixed list of source records.
struct StaticSource(Vec<Value>);

impl ExternalSource for StaticSource {
  async fn fetch_contacts(&self) -> crate::Result<Vec<Value>> { Ok(self.0.clone()) }
}

// ─── Backups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn backup_writes_named_snapshot() {
  let f = fixture().await;
  seed(&f.admin, "Budi", "081234").await;
  seed(&f.admin, "Andi", "085700").await;

  let report = f.admin.backup_now().await.unwrap();
  assert_eq!(report.count, 2);
  assert!(report.name.starts_with("backup-"), "{}", report.name);
  assert!(report.name.ends_with("Z-2kontak.json"), "{}", report.name);
  assert!(!report.name.contains(':'));

  let bytes = f.admin.download_backup(&report.name).await.unwrap();
  assert_eq!(crate::backup::sha256_hex(&bytes), report.sha256);
  let contacts: Vec<Contact> = serde_json::from_slice(&bytes).unwrap();
  let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Andi", "Budi"]);
  assert!(String::from_utf8(bytes).unwrap().contains("\n  {\n    \"id\""));

  assert_eq!(f.notifier.last(), Some(Notice::Success(report.message())));
}

#[tokio::test]
async fn backup_of_empty_store_is_allowed() {
  let f = fixture().await;
  let report = f.admin.backup_now().await.unwrap();
  assert_eq!(report.count, 0);
  assert!(report.name.ends_with("-0kontak.json"));
}

#[tokio::test]
async fn backups_list_newest_first_and_delete() {
  let f = fixture().await;
  let first = f.admin.backup_now().await.unwrap();
  tokio::time::sleep(Duration::from_millis(20)).await;
  seed(&f.admin, "Budi", "081234").await;
  let second = f.admin.backup_now().await.unwrap();

  let listed = f.admin.list_backups().await.unwrap();
  let names: Vec<&str> = listed.iter().map(|b| b.name.as_str()).collect();
  assert_eq!(names, [second.name.as_str(), first.name.as_str()]);
  assert!(listed.iter().all(|b| b.age == "just now"));

  f.admin.delete_backup(&first.name).await.unwrap();
  assert_eq!(f.admin.list_backups().await.unwrap().len(), 1);
  assert!(matches!(
    f.admin.download_backup(&first.name).await,
    Err(Error::BackupNotFound(_))
  ));
}

#[tokio::test]
async fn backup_list_of_missing_directory_is_empty() {
  let f = fixture().await;
  assert!(f.admin.list_backups().await.unwrap().is_empty());
}

#[tokio::test]
async fn traversal_names_are_refused() {
  let f = fixture().await;
  assert!(matches!(
    f.admin.download_backup("../secrets.json").await,
    Err(Error::InvalidName(_))
  ));
  assert!(matches!(f.admin.delete_backup("backup-x.txt").await, Err(Error::InvalidName(_))));
}

#[tokio::test]
async fn busy_backup_rejects_second_trigger() {
  let f = fixture().await;
  let held = f.admin.slots().acquire(Operation::Backup).unwrap();

  assert!(matches!(f.admin.backup_now().await, Err(Error::Busy(Operation::Backup))));
  assert!(matches!(f.notifier.last(), Some(Notice::Error(m)) if m.contains("backup is already running")));

  // Other slots are unaffected.
  f.admin.import(Format::Csv, "h\nBudi,0812,").await.unwrap();

  drop(held);
  assert!(f.admin.backup_now().await.is_ok());
}

// ─── File import / export ────────────────────────────────────────────────────

#[tokio::test]
async fn csv_import_then_export() {
  let f = fixture().await;
  let report = f
    .admin
    .import(Format::Csv, "Nama,Telepon,E-Wallet\n\"Budi\",\"0812-34\",\"dana;ovo\"\nSari,,\n")
    .await
    .unwrap();
  assert_eq!(report.count, 2);
  assert_eq!(f.notifier.last(), Some(Notice::Success("2 contacts imported".into())));

  let out = f.admin.export(Format::Csv).await.unwrap();
  assert_eq!(out, "Nama,Telepon,E-Wallet\n\"Budi\",\"081234\",\"dana;ovo\"\n\"Sari\",\"\",\"\"");
}

#[tokio::test]
async fn non_array_json_imports_nothing() {
  let f = fixture().await;
  let err = f.admin.import(Format::Json, r#"{"name":"Budi"}"#).await.unwrap_err();
  assert!(matches!(err, Error::Format(kontak_formats::Error::NotAList)));
  assert!(f.admin.book().list().await.unwrap().is_empty());
  assert!(matches!(f.notifier.last(), Some(Notice::Error(_))));
}

#[tokio::test]
async fn empty_parse_is_no_contacts() {
  let f = fixture().await;
  assert!(matches!(f.admin.import(Format::Vcard, "nothing here").await, Err(Error::NoContacts)));
  assert!(matches!(f.admin.import(Format::Json, "[]").await, Err(Error::NoContacts)));
}

#[tokio::test]
async fn nameless_json_row_rejects_whole_import() {
  let f = fixture().await;
  let err = f
    .admin
    .import(Format::Json, r#"[{"name":"Budi"},{"phone":"0812"}]"#)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidRow { row: 2, .. }));
  assert!(f.admin.book().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_phone_in_import_rolls_back() {
  let f = fixture().await;
  seed(&f.admin, "Budi", "081234").await;

  let err = f
    .admin
    .import(Format::Csv, "h\nAndi,0899,\nCitra,081234,\n")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Contact(kontak_core::Error::DuplicatePhone { .. })));
  assert_eq!(f.admin.book().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_phone_in_one_file_is_rejected() {
  let f = fixture().await;
  let err = f
    .admin
    .import(Format::Csv, "Nama,Telepon,E-Wallet\nAndi,0811,\nBudi,0811,\n")
    .await
    .unwrap_err();
  assert!(
    matches!(
      err,
      Error::Contact(kontak_core::Error::RepeatedPhone { ref phone, first: 1, second: 2 })
        if phone == "0811"
    ),
    "{err:?}"
  );
  assert!(f.admin.book().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn export_failure_is_reported_once() {
  let store = CountingStore::new(SqliteStore::open_in_memory().await.unwrap());
  let f = fixture_with(store, AdminSettings::default()).await;
  f.admin.book().store().fail_lists.store(true, Ordering::SeqCst);

  assert!(f.admin.export(Format::Json).await.is_err());
  let notices = f.notifier.notices();
  assert_eq!(notices.len(), 1, "{notices:?}");
  assert!(matches!(&notices[0], Notice::Error(m) if m.starts_with("Export failed")));
}

#[tokio::test]
async fn vcard_export_round_trips_through_import() {
  let f = fixture().await;
  seed(&f.admin, "Jane Mary Doe", "0812").await;
  let vcf = f.admin.export(Format::Vcard).await.unwrap();
  assert!(vcf.contains("N:Mary Doe;Jane;;;"));

  let other = fixture().await;
  assert_eq!(other.admin.import(Format::Vcard, &vcf).await.unwrap().count, 1);
  let back = other.admin.book().list().await.unwrap();
  assert_eq!(back[0].name, "Jane Mary Doe");
  assert_eq!(back[0].phone.as_deref(), Some("0812"));
}

// ─── External import ─────────────────────────────────────────────────────────

#[tokio::test]
async fn external_import_maps_and_inserts() {
  let f = fixture().await;
  let source = StaticSource(vec![
    json!({"name": "Budi", "phone": "0812-34", "ewallet": ["gopay"]}),
    json!({"phone": "0899"}),
    json!({"name": "Sari", "ewallet": "dana"}),
  ]);

  let report = f.admin.import_external(&source).await.unwrap();
  assert_eq!(report.count, 3);

  let contacts = f.admin.book().list().await.unwrap();
  let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Budi", "Sari", DEFAULT_NAME]);
  assert_eq!(contacts[0].ewallet, vec![EWallet::Gopay]);
  assert!(contacts[1].ewallet.is_empty());
}

#[tokio::test]
async fn empty_external_source_succeeds_with_zero() {
  let f = fixture().await;
  let report = f.admin.import_external(&StaticSource(Vec::new())).await.unwrap();
  assert_eq!(report.count, 0);
  assert_eq!(f.notifier.last(), Some(Notice::Success("No contacts found".into())));
}

#[tokio::test]
async fn failing_batch_reports_rows_already_inserted() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let f = fixture_with(store, AdminSettings { batch_size: 2, ..AdminSettings::default() }).await;
  seed(&f.admin, "Budi", "081234").await;

  let source = StaticSource(vec![
    json!({"name": "A", "phone": "0811"}),
    json!({"name": "B", "phone": "0822"}),
    json!({"name": "C", "phone": "0833"}),
    json!({"name": "D", "phone": "081234"}),
  ]);
  let err = f.admin.import_external(&source).await.unwrap_err();
  assert!(matches!(err, Error::Batch { inserted: 2, .. }), "{err:?}");

  // Budi plus the first batch; the failing batch was rolled back as a unit.
  assert_eq!(f.admin.book().list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn repeated_phone_across_batches_writes_nothing() {
  let store = CountingStore::new(SqliteStore::open_in_memory().await.unwrap());
  let f = fixture_with(store, AdminSettings { batch_size: 2, ..AdminSettings::default() }).await;

  let source = StaticSource(vec![
    json!({"name": "A", "phone": "0811"}),
    json!({"name": "B", "phone": "0822"}),
    json!({"name": "C", "phone": "0833"}),
    json!({"name": "D", "phone": "0811"}),
  ]);
  let err = f.admin.import_external(&source).await.unwrap_err();
  assert!(
    matches!(err, Error::Contact(kontak_core::Error::RepeatedPhone { first: 1, second: 4, .. })),
    "{err:?}"
  );
  assert!(f.admin.book().store().batches().is_empty());
  assert!(f.admin.book().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn import_inserts_in_batches_of_batch_size() {
  let store = CountingStore::new(SqliteStore::open_in_memory().await.unwrap());
  let f = fixture_with(store, AdminSettings::default()).await;
  let records: Vec<Value> = (0..250).map(|i| json!({"name": format!("C{i:03}")})).collect();

  let report = f.admin.import_external(&StaticSource(records)).await.unwrap();
  assert_eq!(report.count, 250);
  assert_eq!(f.admin.book().store().batches(), vec![100, 100, 50]);
}

// ─── External sync ───────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_updates_ewallets_of_matching_phones() {
  let f = fixture().await;
  let budi = seed(&f.admin, "Budi", "081234").await;
  seed(&f.admin, "Andi", "085700").await;

  let source = StaticSource(vec![
    json!({"name": "Budi (remote)", "phone": "0812-34", "ewallet": ["ovo", "dana"]}),
    json!({"name": "Andi", "phone": "085700", "ewallet": []}),
    json!({"name": "Stranger", "phone": "0899", "ewallet": ["gopay"]}),
  ]);
  let report = f.admin.sync_external(&source).await.unwrap();
  assert_eq!(report.updated, 1);

  let after = f.admin.book().get(budi.id).await.unwrap();
  assert_eq!(after.name, "Budi");
  assert_eq!(after.ewallet, vec![EWallet::Ovo, EWallet::Dana]);
  assert_eq!(f.admin.book().list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn sync_keeps_tags_when_source_has_no_ewallet_list() {
  let f = fixture().await;
  let budi = f
    .admin
    .book()
    .save(NewContact::new("Budi").with_phone("081234").with_ewallet([EWallet::Dana]), None)
    .await
    .unwrap();

  let source = StaticSource(vec![
    json!({"name": "Budi", "phone": "081234"}),
    json!({"name": "Budi", "phone": "081234", "ewallet": "ovo"}),
  ]);
  let report = f.admin.sync_external(&source).await.unwrap();
  assert_eq!(report.updated, 0);
  assert_eq!(f.admin.book().get(budi.id).await.unwrap().ewallet, vec![EWallet::Dana]);
}

#[tokio::test]
async fn sync_respects_concurrency_limit() {
  let store = CountingStore::new(SqliteStore::open_in_memory().await.unwrap());
  let settings = AdminSettings { sync_concurrency: 3, ..AdminSettings::default() };
  let f = fixture_with(store, settings).await;

  let mut records = Vec::new();
  for i in 0..10 {
    let phone = format!("08120000{i:02}");
    seed(&f.admin, &format!("C{i}"), &phone).await;
    records.push(json!({"phone": phone, "ewallet": ["shopeepay"]}));
  }

  let report = f.admin.sync_external(&StaticSource(records)).await.unwrap();
  assert_eq!(report.updated, 10);
  let peak = f.admin.book().store().peak_updates();
  assert!((1..=3).contains(&peak), "peak {peak}");
}

// ─── Instrumented store ──────────────────────────────────────────────────────

/// Delegates to SQLite while recording batch sizes and update concurrency.
struct CountingStore {
  inner:      SqliteStore,
  /// Make `list_contacts` fail.
  fail_lists: AtomicBool,
  batches:    std::sync::Mutex<Vec<usize>>,
  inflight:   AtomicUsize,
  peak:       AtomicUsize,
}

impl CountingStore {
  fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      fail_lists: AtomicBool::new(false),
      batches: Default::default(),
      inflight: AtomicUsize::new(0),
      peak: AtomicUsize::new(0),
    }
  }

  fn batches(&self) -> Vec<usize> { self.batches.lock().unwrap().clone() }

  fn peak_updates(&self) -> usize { self.peak.load(Ordering::SeqCst) }
}

impl ContactStore for CountingStore {
  type Error = kontak_store_sqlite::Error;

  async fn list_contacts(&self) -> Result<Vec<Contact>, Self::Error> {
    if self.fail_lists.load(Ordering::SeqCst) {
      return Err(kontak_store_sqlite::Error::DateParse("unreadable row".into()));
    }
    self.inner.list_contacts().await
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, Self::Error> {
    self.inner.get_contact(id).await
  }

  async fn find_by_phone<'a>(&'a self, phone: &'a str) -> Result<Option<Contact>, Self::Error> {
    self.inner.find_by_phone(phone).await
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact, Self::Error> {
    self.inner.insert_contact(input).await
  }

  async fn insert_many(&self, inputs: Vec<NewContact>) -> Result<Vec<Contact>, Self::Error> {
    self.batches.lock().unwrap().push(inputs.len());
    self.inner.insert_many(inputs).await
  }

  async fn update_contact(
    &self,
    id: Uuid,
    input: NewContact,
  ) -> Result<Option<Contact>, Self::Error> {
    let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(10)).await;
    let result = self.inner.update_contact(id, input).await;
    self.inflight.fetch_sub(1, Ordering::SeqCst);
    result
  }

  async fn delete_contact(&self, id: Uuid) -> Result<bool, Self::Error> {
    self.inner.delete_contact(id).await
  }
}
