//! Duplicate-phone lookup used by the contact form.
//!
//! Advisory only: two concurrent creations can both pass this check. Backends
//! are expected to enforce uniqueness as well.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  contact::NewContact,
  phone::{MIN_LOOKUP_LEN, normalize_phone},
  store::ContactStore,
};

/// What the store says about a phone being typed into the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhoneCheck {
  /// Empty or shorter than [`MIN_LOOKUP_LEN`]; no lookup was made.
  TooShort,
  Available { phone: String },
  Taken {
    phone:      String,
    owner_id:   Uuid,
    owner_name: String,
  },
}

impl PhoneCheck {
  /// Convert a `Taken` result into the conflict error that blocks submission.
  pub fn into_result(self) -> Result<Self> {
    match self {
      Self::Taken { phone, owner_id, owner_name } => {
        Err(Error::DuplicatePhone { phone, owner_id, owner_name })
      }
      other => Ok(other),
    }
  }
}

/// Look up `raw` (normalised first) and report whether another contact holds it.
///
/// `editing` is the contact currently being edited; finding it is not a
/// conflict.
pub async fn check_phone<S>(store: &S, raw: &str, editing: Option<Uuid>) -> Result<PhoneCheck>
where
  S: ContactStore,
{
  let Some(phone) = normalize_phone(raw) else {
    return Ok(PhoneCheck::TooShort);
  };
  if phone.chars().count() < MIN_LOOKUP_LEN {
    return Ok(PhoneCheck::TooShort);
  }

  let existing = store.find_by_phone(&phone).await.map_err(Into::<Error>::into)?;
  Ok(match existing {
    Some(owner) if Some(owner.id) != editing => PhoneCheck::Taken {
      phone,
      owner_id: owner.id,
      owner_name: owner.name,
    },
    _ => PhoneCheck::Available { phone },
  })
}

/// Fail when two normalised rows of one bulk write share a phone.
///
/// Run before anything is written so a batch never conflicts with itself.
pub fn ensure_unique_phones(rows: &[NewContact]) -> Result<()> {
  let mut seen: HashMap<&str, usize> = HashMap::new();
  for (i, row) in rows.iter().enumerate() {
    let Some(phone) = row.phone.as_deref() else {
      continue;
    };
    if let Some(first) = seen.insert(phone, i + 1) {
      return Err(Error::RepeatedPhone {
        phone:  phone.to_string(),
        first,
        second: i + 1,
      });
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repeated_phone_names_both_rows() {
    let rows = vec![
      NewContact::new("Andi").with_phone("0811"),
      NewContact::new("Citra"),
      NewContact::new("Dewi"),
      NewContact::new("Budi").with_phone("0811"),
    ];
    match ensure_unique_phones(&rows) {
      Err(Error::RepeatedPhone { phone, first, second }) => {
        assert_eq!((phone.as_str(), first, second), ("0811", 1, 4));
      }
      other => panic!("expected RepeatedPhone, got {other:?}"),
    }
  }

  #[test]
  fn rows_without_phone_never_collide() {
    let rows = vec![
      NewContact::new("Andi"),
      NewContact::new("Budi"),
      NewContact::new("Citra").with_phone("0811"),
    ];
    assert!(ensure_unique_phones(&rows).is_ok());
  }
}
