//! Snapshot naming, encoding and age labels.

use chrono::{DateTime, SecondsFormat, Utc};
use kontak_core::contact::Contact;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Result, storage::StoredObject};

/// `backup-<timestamp>-<count>kontak.json`, where the timestamp is ISO 8601
/// UTC with millisecond precision and every `:` and `.` replaced by `-`.
pub fn backup_name(at: DateTime<Utc>, count: usize) -> String {
  let stamp = at
    .to_rfc3339_opts(SecondsFormat::Millis, true)
    .replace([':', '.'], "-");
  format!("backup-{stamp}-{count}kontak.json")
}

/// Pretty-printed JSON array of full contact records.
pub fn snapshot(contacts: &[Contact]) -> Result<Vec<u8>> {
  Ok(serde_json::to_vec_pretty(contacts)?)
}

pub fn sha256_hex(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }

/// A coarse human-readable age.
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let hours = (now - created_at).num_hours();
  if hours < 1 {
    return "just now".to_string();
  }
  if hours < 24 {
    return format!("~{hours} hours ago");
  }
  match hours / 24 {
    1 => "1 day ago".to_string(),
    days => format!("{days} days ago"),
  }
}

/// Outcome of a successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupReport {
  pub name:   String,
  pub count:  usize,
  /// Hex SHA-256 of the uploaded bytes.
  pub sha256: String,
}

impl BackupReport {
  pub fn message(&self) -> String { format!("Backup saved: {}", self.name) }
}

/// A listed snapshot with its age label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub size:       u64,
  pub age:        String,
}

impl BackupEntry {
  pub fn new(object: StoredObject, now: DateTime<Utc>) -> Self {
    Self {
      age:        relative_age(object.created_at, now),
      name:       object.name,
      created_at: object.created_at,
      size:       object.size,
    }
  }
}

/// Sort newest first; equal timestamps fall back to name, which embeds the
/// timestamp at millisecond precision.
pub fn sort_newest_first(entries: &mut [StoredObject]) {
  entries.sort_by(|a, b| {
    b.created_at
      .cmp(&a.created_at)
      .then_with(|| b.name.cmp(&a.name))
  });
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn name_replaces_colons_and_dots() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
    assert_eq!(backup_name(at, 3), "backup-2024-06-01T02-00-00-000Z-3kontak.json");

    let at = at + Duration::milliseconds(457);
    assert_eq!(backup_name(at, 0), "backup-2024-06-01T02-00-00-457Z-0kontak.json");
  }

  #[test]
  fn age_labels() {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    let ago = |d: Duration| relative_age(now - d, now);
    assert_eq!(ago(Duration::minutes(59)), "just now");
    assert_eq!(ago(Duration::hours(1)), "~1 hours ago");
    assert_eq!(ago(Duration::hours(23)), "~23 hours ago");
    assert_eq!(ago(Duration::hours(24)), "1 day ago");
    assert_eq!(ago(Duration::hours(47)), "1 day ago");
    assert_eq!(ago(Duration::days(5)), "5 days ago");
  }

  #[test]
  fn newest_first() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let obj = |name: &str, h: i64| StoredObject {
      name:       name.into(),
      created_at: at + Duration::hours(h),
      size:       0,
    };
    let mut list = vec![obj("backup-a.json", 0), obj("backup-c.json", 2), obj("backup-b.json", 1)];
    sort_newest_first(&mut list);
    let names: Vec<_> = list.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["backup-c.json", "backup-b.json", "backup-a.json"]);
  }

  #[test]
  fn empty_snapshot_is_an_empty_array() {
    let text = String::from_utf8(snapshot(&[]).unwrap()).unwrap();
    assert_eq!(text, "[]");
    assert_eq!(sha256_hex(b"").len(), 64);
  }
}
