//! JSON codec: an array of `{name, phone, ewallet}` objects, 2-space indented.

use kontak_core::{
  contact::{Contact, EWallet, NewContact, ewallet_set},
  phone::normalize_phone,
};
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// The exported projection of a contact.
#[derive(Debug, Serialize)]
struct Record<'a> {
  name:    &'a str,
  phone:   Option<&'a str>,
  ewallet: &'a [EWallet],
  #[serde(skip_serializing_if = "Option::is_none")]
  email:   Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  company: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  notes:   Option<&'a str>,
}

impl<'a> From<&'a Contact> for Record<'a> {
  fn from(c: &'a Contact) -> Self {
    Record {
      name:    &c.name,
      phone:   c.phone.as_deref(),
      ewallet: &c.ewallet,
      email:   c.email.as_deref(),
      company: c.company.as_deref(),
      notes:   c.notes.as_deref(),
    }
  }
}

/// Serialise contacts as a pretty-printed array.
pub fn encode(contacts: &[Contact]) -> Result<String> {
  let records: Vec<Record<'_>> = contacts.iter().map(Record::from).collect();
  Ok(serde_json::to_string_pretty(&records)?)
}

/// Decode a JSON array of contact objects.
///
/// Fails with [`Error::NotAList`] when the root is not an array. Elements are
/// mapped with [`record_from_value`] and never rejected here.
pub fn decode(text: &str) -> Result<Vec<NewContact>> {
  let root: Value = serde_json::from_str(text)?;
  let Value::Array(items) = root else {
    return Err(Error::NotAList);
  };
  Ok(items.iter().map(record_from_value).collect())
}

/// Map one loosely-typed element onto a [`NewContact`].
///
/// | Field | Rule |
/// |-------|------|
/// | `name` | string as-is; anything else → `""` |
/// | `phone` | string or number, normalised; missing/null/empty → `None` |
/// | `ewallet` | array → its recognised string tags; anything else → `[]` |
/// | `email`, `company`, `notes` | non-empty string, else `None` |
pub fn record_from_value(item: &Value) -> NewContact {
  NewContact {
    name:    item
      .get("name")
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_string(),
    phone:   scalar_text(item.get("phone")).and_then(|p| normalize_phone(&p)),
    ewallet: ewallet_tags(item.get("ewallet")),
    email:   text_field(item, "email"),
    company: text_field(item, "company"),
    notes:   text_field(item, "notes"),
  }
}

/// Text of a string or number value.
pub(crate) fn scalar_text(v: Option<&Value>) -> Option<String> {
  match v? {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Recognised tags of an array value; anything else is an empty set.
pub(crate) fn ewallet_tags(v: Option<&Value>) -> Vec<EWallet> {
  match v {
    Some(Value::Array(tags)) => ewallet_set(
      tags
        .iter()
        .filter_map(Value::as_str)
        .filter_map(EWallet::from_tag),
    ),
    _ => Vec::new(),
  }
}

fn text_field(item: &Value, key: &str) -> Option<String> {
  item
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}
