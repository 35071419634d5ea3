//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::Utc;
use kontak_core::{
  contact::{Contact, NewContact},
  guard::ensure_unique_phones,
  store::ContactStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{COLUMNS, RawConflict, RawContact, encode_dt, encode_ewallet, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kontak contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened contact store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Another contact (not `except`) holding `phone`.
fn phone_owner(
  conn: &rusqlite::Connection,
  phone: &str,
  except: &str,
) -> rusqlite::Result<Option<RawConflict>> {
  conn
    .query_row(
      "SELECT id, name FROM contacts WHERE phone = ?1 AND id != ?2 LIMIT 1",
      rusqlite::params![phone, except],
      |row| {
        Ok(RawConflict {
          phone:      phone.to_owned(),
          owner_id:   row.get(0)?,
          owner_name: row.get(1)?,
        })
      },
    )
    .optional()
}

/// Turn a failed write into a phone conflict when the unique index is what
/// rejected it; any other failure is passed through.
fn conflict_or(
  conn: &rusqlite::Connection,
  err: rusqlite::Error,
  phone: Option<&str>,
  id: &str,
) -> rusqlite::Result<RawConflict> {
  if !is_unique_violation(&err) {
    return Err(err);
  }
  match phone.map(|p| phone_owner(conn, p, id)).transpose()?.flatten() {
    Some(conflict) => Ok(conflict),
    None => Err(err),
  }
}

/// Insert one encoded row. `Ok(Some(_))` when its phone is already taken.
fn insert_row(
  conn: &rusqlite::Connection,
  raw: &RawContact,
) -> rusqlite::Result<Option<RawConflict>> {
  let result = conn.execute(
    &format!(
      "INSERT INTO contacts ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ),
    rusqlite::params![
      raw.id,
      raw.name,
      raw.phone,
      raw.ewallet,
      raw.email,
      raw.company,
      raw.notes,
      raw.created_at,
      raw.updated_at,
    ],
  );
  match result {
    Ok(_) => Ok(None),
    Err(e) => conflict_or(conn, e, raw.phone.as_deref(), &raw.id).map(Some),
  }
}

fn select_one(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawContact>> {
  conn
    .query_row(
      &format!("SELECT {COLUMNS} FROM contacts WHERE id = ?1"),
      rusqlite::params![id],
      RawContact::from_row,
    )
    .optional()
}

fn materialize(input: NewContact) -> Contact {
  let now = Utc::now();
  Contact {
    id:         Uuid::new_v4(),
    name:       input.name,
    phone:      input.phone,
    ewallet:    input.ewallet,
    email:      input.email,
    company:    input.company,
    notes:      input.notes,
    created_at: now,
    updated_at: now,
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM contacts ORDER BY name COLLATE NOCASE, created_at"
        ))?;
        let rows = stmt
          .query_map([], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| Ok(select_one(conn, &id_str)?))
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn find_by_phone<'a>(&'a self, phone: &'a str) -> Result<Option<Contact>> {
    let phone = phone.to_owned();

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COLUMNS} FROM contacts WHERE phone = ?1 LIMIT 1"),
            rusqlite::params![phone],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact> {
    let contact = materialize(input);
    let raw = RawContact::encode(&contact)?;

    let conflict: Option<RawConflict> = self
      .conn
      .call(move |conn| Ok(insert_row(conn, &raw)?))
      .await?;

    match conflict {
      Some(c) => Err(c.into_error()),
      None => Ok(contact),
    }
  }

  async fn insert_many(&self, inputs: Vec<NewContact>) -> Result<Vec<Contact>> {
    // The owner lookup after a unique violation would otherwise find an
    // uncommitted row of this same batch.
    if let Err(kontak_core::Error::RepeatedPhone { phone, first, second }) =
      ensure_unique_phones(&inputs)
    {
      return Err(Error::RepeatedPhone { phone, first, second });
    }
    let contacts: Vec<Contact> = inputs.into_iter().map(materialize).collect();
    let raws = contacts
      .iter()
      .map(RawContact::encode)
      .collect::<Result<Vec<_>>>()?;

    let conflict: Option<RawConflict> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for raw in &raws {
          // Dropping the transaction rolls back the rows written so far.
          if let Some(c) = insert_row(&tx, raw)? {
            return Ok(Some(c));
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match conflict {
      Some(c) => Err(c.into_error()),
      None => Ok(contacts),
    }
  }

  async fn update_contact(&self, id: Uuid, input: NewContact) -> Result<Option<Contact>> {
    let id_str      = encode_uuid(id);
    let ewallet_str = encode_ewallet(&input.ewallet)?;
    let at_str      = encode_dt(Utc::now());

    let outcome: std::result::Result<Option<RawContact>, RawConflict> = self
      .conn
      .call(move |conn| {
        let phone = input.phone.as_deref();
        let result = conn.execute(
          "UPDATE contacts
              SET name = ?2, phone = ?3, ewallet = ?4, email = ?5,
                  company = ?6, notes = ?7, updated_at = ?8
            WHERE id = ?1",
          rusqlite::params![
            id_str,
            input.name,
            phone,
            ewallet_str,
            input.email,
            input.company,
            input.notes,
            at_str,
          ],
        );
        match result {
          Ok(0) => Ok(Ok(None)),
          Ok(_) => Ok(Ok(select_one(conn, &id_str)?)),
          Err(e) => Ok(Err(conflict_or(conn, e, phone, &id_str)?)),
        }
      })
      .await?;

    match outcome {
      Ok(raw) => raw.map(RawContact::into_contact).transpose(),
      Err(c) => Err(c.into_error()),
    }
  }

  async fn delete_contact(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM contacts WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(changed > 0)
  }
}
