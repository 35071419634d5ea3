//! The `ContactStore` trait.
//!
//! Implemented by storage backends (e.g. `kontak-store-sqlite`). Higher layers
//! (`ContactBook`, `kontak-admin`, `kontak-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::contact::{Contact, NewContact};

/// Abstraction over a Kontak contact store backend.
///
/// Inputs are expected to be [`NewContact::normalized`] already. Backends may
/// enforce phone uniqueness themselves; a violation must convert into
/// [`crate::Error::DuplicatePhone`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// All contacts ordered by name.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// The first contact holding exactly `phone` (already normalised).
  fn find_by_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// Persist a new contact and return it with its assigned id.
  fn insert_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Persist many contacts in a single request. Either every row is written
  /// or none is.
  fn insert_many(
    &self,
    inputs: Vec<NewContact>,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Replace the writable fields of an existing contact.
  /// Returns `None` if the id is unknown.
  fn update_contact(
    &self,
    id: Uuid,
    input: NewContact,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Delete a contact. Returns `false` if the id is unknown.
  fn delete_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
