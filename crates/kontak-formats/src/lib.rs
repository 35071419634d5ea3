//! CSV, JSON and vCard codecs for Kontak.
//!
//! Converts between file text and [`kontak_core`] contact types. Pure
//! synchronous; no HTTP or database dependencies. Decoders return
//! [`NewContact`]s that still have to go through
//! [`NewContact::normalized`] before they are stored.
//!
//! # Quick start
//!
//! ```no_run
//! use kontak_formats::{Format, import};
//!
//! let text = "BEGIN:VCARD\nFN:Jane Doe\nTEL;TYPE=CELL:+62 812-3456\nEND:VCARD";
//! let contacts = import(Format::Vcard, text).unwrap();
//! assert_eq!(contacts[0].phone.as_deref(), Some("628123456"));
//! ```

pub mod csv;
pub mod error;
pub mod json;
pub mod vcard;

pub use error::{Error, Result};
use kontak_core::contact::{Contact, NewContact};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Format ──────────────────────────────────────────────────────────────────

/// A supported exchange format.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Format {
  #[strum(serialize = "csv")]
  Csv,
  #[strum(serialize = "json")]
  Json,
  #[serde(rename = "vcf", alias = "vcard")]
  #[strum(serialize = "vcf", serialize = "vcard")]
  Vcard,
}

impl Format {
  /// File extension without the dot.
  pub fn extension(self) -> &'static str {
    match self {
      Self::Csv => "csv",
      Self::Json => "json",
      Self::Vcard => "vcf",
    }
  }

  pub fn media_type(self) -> &'static str {
    match self {
      Self::Csv => "text/csv; charset=utf-8",
      Self::Json => "application/json",
      Self::Vcard => "text/vcard; charset=utf-8",
    }
  }

  /// Download name for an export, e.g. `kontak.csv`.
  pub fn file_name(self) -> String { format!("kontak.{}", self.extension()) }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Encode `contacts` in `format`.
pub fn export(format: Format, contacts: &[Contact]) -> Result<String> {
  match format {
    Format::Csv => Ok(csv::encode(contacts)),
    Format::Json => json::encode(contacts),
    Format::Vcard => Ok(vcard::encode(contacts)),
  }
}

/// Decode contacts from `text` in `format`.
///
/// CSV and vCard decoding never fails (unusable rows are skipped); JSON fails
/// when the payload is malformed or not a list.
pub fn import(format: Format, text: &str) -> Result<Vec<NewContact>> {
  match format {
    Format::Csv => Ok(csv::decode(text)),
    Format::Json => json::decode(text),
    Format::Vcard => Ok(vcard::decode(text)),
  }
}

// ─── Shared test helpers ─────────────────────────────────────────────────────
