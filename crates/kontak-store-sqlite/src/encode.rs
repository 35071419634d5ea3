//! Encoding and decoding helpers between [`Contact`] and the plain-text
//! columns stored in SQLite.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings and
//! the e-wallet set is a compact JSON array of provider tags.

use chrono::{DateTime, Utc};
use kontak_core::contact::{Contact, EWallet};
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` so [`RawContact::from_row`] can read
/// by position.
pub const COLUMNS: &str =
  "id, name, phone, ewallet, email, company, notes, created_at, updated_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── E-wallet set ────────────────────────────────────────────────────────────

pub fn encode_ewallet(tags: &[EWallet]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_ewallet(s: &str) -> Result<Vec<EWallet>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `contacts` row.
pub struct RawContact {
  pub id:         String,
  pub name:       String,
  pub phone:      Option<String>,
  pub ewallet:    String,
  pub email:      Option<String>,
  pub company:    Option<String>,
  pub notes:      Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawContact {
  /// Read a row selected with [`COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      phone:      row.get(2)?,
      ewallet:    row.get(3)?,
      email:      row.get(4)?,
      company:    row.get(5)?,
      notes:      row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
    })
  }

  /// Column strings for writing `c`.
  pub fn encode(c: &Contact) -> Result<Self> {
    Ok(Self {
      id:         encode_uuid(c.id),
      name:       c.name.clone(),
      phone:      c.phone.clone(),
      ewallet:    encode_ewallet(&c.ewallet)?,
      email:      c.email.clone(),
      company:    c.company.clone(),
      notes:      c.notes.clone(),
      created_at: encode_dt(c.created_at),
      updated_at: encode_dt(c.updated_at),
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      phone:      self.phone,
      ewallet:    decode_ewallet(&self.ewallet)?,
      email:      self.email,
      company:    self.company,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// The existing holder of a phone number that blocked a write.
pub struct RawConflict {
  pub phone:      String,
  pub owner_id:   String,
  pub owner_name: String,
}

impl RawConflict {
  pub fn into_error(self) -> Error {
    match decode_uuid(&self.owner_id) {
      Ok(owner_id) => Error::PhoneTaken {
        phone: self.phone,
        owner_id,
        owner_name: self.owner_name,
      },
      Err(e) => e,
    }
  }
}
