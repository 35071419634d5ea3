//! [`ContactBook`] — the list view and contact form actions.
//!
//! Each action is one user-triggered operation: it talks to the store,
//! reports its outcome through the [`Notifier`], and returns the result. A
//! failed action leaves the store untouched.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  contact::{Contact, NewContact},
  guard::{self, PhoneCheck},
  notify::Notifier,
  search::{self, SearchMode, SearchOutcome},
  store::ContactStore,
};

/// Contact CRUD, search and duplicate checks over a [`ContactStore`].
///
/// Cloning is cheap; store and notifier are shared.
pub struct ContactBook<S> {
  store:    Arc<S>,
  notifier: Arc<dyn Notifier>,
}

impl<S> Clone for ContactBook<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

impl<S: ContactStore> ContactBook<S> {
  pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn notifier(&self) -> &Arc<dyn Notifier> { &self.notifier }

  /// Report `err` with `context`, then hand it back.
  fn fail(&self, context: &str, err: Error) -> Error {
    self.notifier.error(&format!("{context}: {err}"));
    err
  }

  // ── List view ─────────────────────────────────────────────────────────────

  /// Every contact, ordered by name.
  pub async fn list(&self) -> Result<Vec<Contact>> {
    self
      .store
      .list_contacts()
      .await
      .map_err(|e| self.fail("Failed to load contacts", e.into()))
  }

  /// Fetch all contacts and filter them with `query`.
  pub async fn search(&self, query: &str, mode: SearchMode) -> Result<SearchOutcome> {
    let contacts = self.list().await?;
    Ok(search::filter(contacts, query, mode))
  }

  pub async fn get(&self, id: Uuid) -> Result<Contact> {
    self
      .store
      .get_contact(id)
      .await
      .map_err(Into::<Error>::into)?
      .ok_or(Error::ContactNotFound(id))
  }

  // ── Form ──────────────────────────────────────────────────────────────────

  /// Live duplicate lookup for the phone field.
  pub async fn check_phone(&self, raw: &str, editing: Option<Uuid>) -> Result<PhoneCheck> {
    guard::check_phone(self.store.as_ref(), raw, editing).await
  }

  /// Create a contact, or update `editing` when set.
  ///
  /// The duplicate-phone check is repeated here; a conflict blocks the save
  /// and names the contact that already holds the number.
  pub async fn save(&self, draft: NewContact, editing: Option<Uuid>) -> Result<Contact> {
    let context = if editing.is_some() {
      "Failed to update contact"
    } else {
      "Failed to add contact"
    };
    match self.save_inner(draft, editing).await {
      Ok(contact) => {
        self.notifier.success(if editing.is_some() {
          "Contact updated"
        } else {
          "Contact added"
        });
        Ok(contact)
      }
      Err(e) => Err(self.fail(context, e)),
    }
  }

  async fn save_inner(&self, draft: NewContact, editing: Option<Uuid>) -> Result<Contact> {
    let draft = draft.normalized()?;
    if let Some(phone) = draft.phone.as_deref() {
      guard::check_phone(self.store.as_ref(), phone, editing)
        .await?
        .into_result()?;
    }

    match editing {
      Some(id) => self
        .store
        .update_contact(id, draft)
        .await
        .map_err(Into::<Error>::into)?
        .ok_or(Error::ContactNotFound(id)),
      None => self.store.insert_contact(draft).await.map_err(Into::into),
    }
  }

  /// Delete a contact by id.
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let deleted = self
      .store
      .delete_contact(id)
      .await
      .map_err(|e| self.fail("Failed to delete contact", e.into()))?;
    if !deleted {
      return Err(self.fail("Failed to delete contact", Error::ContactNotFound(id)));
    }
    self.notifier.success("Contact deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Utc;

  use super::*;
  use crate::{
    contact::EWallet,
    notify::{CollectingNotifier, Notice},
  };

  #[derive(Debug, thiserror::Error)]
  #[error("memory store failure")]
  struct MemoryError;

  impl From<MemoryError> for Error {
    fn from(e: MemoryError) -> Self { Error::store(e) }
  }

  /// Vec-backed store; no uniqueness enforcement so only the guard is tested.
  #[derive(Default)]
  struct MemoryStore {
    rows: Mutex<Vec<Contact>>,
  }

  impl MemoryStore {
    fn rows(&self) -> Vec<Contact> { self.rows.lock().unwrap().clone() }
  }

  fn materialize(id: Uuid, input: NewContact) -> Contact {
    Contact {
      id,
      name: input.name,
      phone: input.phone,
      ewallet: input.ewallet,
      email: input.email,
      company: input.company,
      notes: input.notes,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  impl ContactStore for MemoryStore {
    type Error = MemoryError;

    async fn list_contacts(&self) -> Result<Vec<Contact>, MemoryError> {
      let mut rows = self.rows();
      rows.sort_by(|a, b| a.name.cmp(&b.name));
      Ok(rows)
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, MemoryError> {
      Ok(self.rows().into_iter().find(|c| c.id == id))
    }

    async fn find_by_phone<'a>(&'a self, phone: &'a str) -> Result<Option<Contact>, MemoryError> {
      Ok(self.rows().into_iter().find(|c| c.phone.as_deref() == Some(phone)))
    }

    async fn insert_contact(&self, input: NewContact) -> Result<Contact, MemoryError> {
      let c = materialize(Uuid::new_v4(), input);
      self.rows.lock().unwrap().push(c.clone());
      Ok(c)
    }

    async fn insert_many(&self, inputs: Vec<NewContact>) -> Result<Vec<Contact>, MemoryError> {
      let mut out = Vec::new();
      for i in inputs {
        out.push(self.insert_contact(i).await?);
      }
      Ok(out)
    }

    async fn update_contact(
      &self,
      id: Uuid,
      input: NewContact,
    ) -> Result<Option<Contact>, MemoryError> {
      let mut rows = self.rows.lock().unwrap();
      let Some(slot) = rows.iter_mut().find(|c| c.id == id) else {
        return Ok(None);
      };
      *slot = materialize(id, input);
      Ok(Some(slot.clone()))
    }

    async fn delete_contact(&self, id: Uuid) -> Result<bool, MemoryError> {
      let mut rows = self.rows.lock().unwrap();
      let before = rows.len();
      rows.retain(|c| c.id != id);
      Ok(rows.len() != before)
    }
  }

  fn book() -> (ContactBook<MemoryStore>, Arc<CollectingNotifier>) {
    let notifier = Arc::new(CollectingNotifier::new());
    let book = ContactBook::new(Arc::new(MemoryStore::default()), notifier.clone());
    (book, notifier)
  }

  #[tokio::test]
  async fn save_normalizes_and_notifies() {
    let (book, notes) = book();
    let c = book
      .save(NewContact::new(" Budi ").with_phone("0812-34"), None)
      .await
      .unwrap();
    assert_eq!(c.name, "Budi");
    assert_eq!(c.phone.as_deref(), Some("081234"));
    assert_eq!(notes.last(), Some(Notice::Success("Contact added".into())));
  }

  #[tokio::test]
  async fn duplicate_phone_blocks_new_contact() {
    let (book, notes) = book();
    let owner = book
      .save(NewContact::new("Budi").with_phone("081234"), None)
      .await
      .unwrap();

    let check = book.check_phone("0812 34", None).await.unwrap();
    assert_eq!(check, PhoneCheck::Taken {
      phone:      "081234".into(),
      owner_id:   owner.id,
      owner_name: "Budi".into(),
    });

    let err = book
      .save(NewContact::new("Andi").with_phone("+0812-34"), None)
      .await
      .unwrap_err();
    match err {
      Error::DuplicatePhone { owner_name, .. } => assert_eq!(owner_name, "Budi"),
      other => panic!("expected DuplicatePhone, got {other:?}"),
    }
    assert!(matches!(notes.last(), Some(Notice::Error(m)) if m.contains("Budi")));
    assert_eq!(book.store().rows().len(), 1);
  }

  #[tokio::test]
  async fn duplicate_phone_blocks_editing_a_different_contact() {
    let (book, _) = book();
    book.save(NewContact::new("Budi").with_phone("081234"), None).await.unwrap();
    let other = book.save(NewContact::new("Andi"), None).await.unwrap();

    let err = book
      .save(NewContact::new("Andi").with_phone("081234"), Some(other.id))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::DuplicatePhone { .. }));
  }

  #[tokio::test]
  async fn editing_own_phone_is_allowed() {
    let (book, notes) = book();
    let budi = book
      .save(NewContact::new("Budi").with_phone("081234"), None)
      .await
      .unwrap();

    assert!(matches!(
      book.check_phone("081234", Some(budi.id)).await.unwrap(),
      PhoneCheck::Available { .. }
    ));
    let updated = book
      .save(
        NewContact::new("Budi S").with_phone("081234").with_ewallet([EWallet::Dana]),
        Some(budi.id),
      )
      .await
      .unwrap();
    assert_eq!(updated.name, "Budi S");
    assert_eq!(notes.last(), Some(Notice::Success("Contact updated".into())));
  }

  #[tokio::test]
  async fn short_phone_is_not_looked_up() {
    let (book, _) = book();
    book.save(NewContact::new("Budi").with_phone("081"), None).await.unwrap();
    assert_eq!(book.check_phone("081", None).await.unwrap(), PhoneCheck::TooShort);
  }

  #[tokio::test]
  async fn empty_name_is_rejected_without_writing() {
    let (book, notes) = book();
    let err = book.save(NewContact::new("  "), None).await.unwrap_err();
    assert!(matches!(err, Error::EmptyName));
    assert!(book.store().rows().is_empty());
    assert!(matches!(notes.last(), Some(Notice::Error(_))));
  }

  #[tokio::test]
  async fn search_and_admin_trigger() {
    let (book, _) = book();
    book
      .save(
        NewContact::new("Budi").with_phone("081299").with_ewallet([EWallet::Dana]),
        None,
      )
      .await
      .unwrap();
    book.save(NewContact::new("Citra").with_phone("085700"), None).await.unwrap();

    let SearchOutcome::Matches(found) = book.search("dana 0812", SearchMode::Keywords).await.unwrap()
    else {
      panic!("expected matches")
    };
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Budi");

    let SearchOutcome::AdminTrigger(all) = book.search("Edit", SearchMode::Keywords).await.unwrap()
    else {
      panic!("expected admin trigger")
    };
    let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Budi", "Citra"]);
  }

  #[tokio::test]
  async fn delete_unknown_reports_not_found() {
    let (book, notes) = book();
    let id = Uuid::new_v4();
    assert!(matches!(book.delete(id).await, Err(Error::ContactNotFound(x)) if x == id));
    assert!(matches!(notes.last(), Some(Notice::Error(_))));
  }

  #[tokio::test]
  async fn update_unknown_reports_not_found() {
    let (book, _) = book();
    let id = Uuid::new_v4();
    let err = book.save(NewContact::new("Ghost"), Some(id)).await.unwrap_err();
    assert!(matches!(err, Error::ContactNotFound(x) if x == id));
  }
}
