//! Contact types — the single record kind held by the Kontak store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, phone::normalize_phone};

// ─── E-wallet ────────────────────────────────────────────────────────────────

/// An e-wallet provider the contact can receive payments on.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EWallet {
  Dana,
  Gopay,
  Ovo,
  Shopeepay,
}

impl EWallet {
  /// Display label, e.g. `ShopeePay`.
  pub fn label(self) -> &'static str {
    match self {
      Self::Dana => "DANA",
      Self::Gopay => "GoPay",
      Self::Ovo => "OVO",
      Self::Shopeepay => "ShopeePay",
    }
  }

  /// Parse a free-text tag; unknown providers yield `None`.
  pub fn from_tag(tag: &str) -> Option<Self> { tag.trim().parse().ok() }
}

/// Collect tags into an insertion-ordered set, dropping repeats.
pub fn ewallet_set<I>(tags: I) -> Vec<EWallet>
where
  I: IntoIterator<Item = EWallet>,
{
  let mut out: Vec<EWallet> = Vec::new();
  for tag in tags {
    if !out.contains(&tag) {
      out.push(tag);
    }
  }
  out
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A stored contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:         Uuid,
  pub name:       String,
  /// Normalised phone (see [`normalize_phone`]).
  pub phone:      Option<String>,
  #[serde(default)]
  pub ewallet:    Vec<EWallet>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Contact {
  /// The writable part of this contact.
  pub fn to_new(&self) -> NewContact {
    NewContact {
      name:    self.name.clone(),
      phone:   self.phone.clone(),
      ewallet: self.ewallet.clone(),
      email:   self.email.clone(),
      company: self.company.clone(),
      notes:   self.notes.clone(),
    }
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::insert_contact`] and
/// [`crate::store::ContactStore::update_contact`].
///
/// `id`, `created_at` and `updated_at` are always set by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
  pub name:    String,
  #[serde(default)]
  pub phone:   Option<String>,
  #[serde(default)]
  pub ewallet: Vec<EWallet>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:   Option<String>,
}

impl NewContact {
  /// Convenience constructor with every optional field empty.
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
    self.phone = Some(phone.into());
    self
  }

  pub fn with_ewallet(mut self, ewallet: impl IntoIterator<Item = EWallet>) -> Self {
    self.ewallet = ewallet.into_iter().collect();
    self
  }

  /// Bring the record into its stored shape.
  ///
  /// - the name is trimmed and must not be empty;
  /// - the phone is normalised, and an empty result becomes `None`;
  /// - e-wallet tags are de-duplicated, first occurrence wins;
  /// - blank `email` / `company` / `notes` become `None`.
  pub fn normalized(self) -> Result<Self> {
    let name = self.name.trim().to_string();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }
    Ok(Self {
      name,
      phone: self.phone.as_deref().and_then(normalize_phone),
      ewallet: ewallet_set(self.ewallet),
      email: non_blank(self.email),
      company: non_blank(self.company),
      notes: non_blank(self.notes),
    })
  }
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
