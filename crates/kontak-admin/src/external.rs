//! Reading contacts from another Kontak deployment's REST endpoint.

use std::{future::Future, time::Duration};

use kontak_core::contact::NewContact;
use kontak_formats::json::record_from_value;
use serde_json::Value;

use crate::{Error, Result};

/// Name given to imported records that have none.
pub const DEFAULT_NAME: &str = "Tanpa Nama";

/// A remote table of loosely-typed contact records.
pub trait ExternalSource: Send + Sync {
  /// Every record, ordered by name.
  fn fetch_contacts(&self) -> impl Future<Output = Result<Vec<Value>>> + Send + '_;
}

/// Map a source record for insertion: a missing or blank name becomes
/// [`DEFAULT_NAME`]; everything else follows [`record_from_value`].
pub fn map_record(record: &Value) -> NewContact {
  let mut contact = record_from_value(record);
  if contact.name.trim().is_empty() {
    contact.name = DEFAULT_NAME.to_string();
  }
  contact
}

/// A PostgREST-style `contacts` table at `{url}/rest/v1/contacts`,
/// authenticated with an API key sent both as `apikey` and as a bearer token.
#[derive(Debug, Clone)]
pub struct RestSource {
  client: reqwest::Client,
  url:    String,
  key:    String,
}

impl RestSource {
  pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(Error::source_error)?;
    Ok(Self { client, url: url.into(), key: key.into() })
  }

  fn endpoint(&self) -> String {
    format!("{}/rest/v1/contacts", self.url.trim_end_matches('/'))
  }
}

impl ExternalSource for RestSource {
  async fn fetch_contacts(&self) -> Result<Vec<Value>> {
    let endpoint = self.endpoint();
    tracing::debug!(%endpoint, "fetching external contacts");

    let rows: Vec<Value> = self
      .client
      .get(&endpoint)
      .query(&[("select", "*"), ("order", "name.asc")])
      .header("apikey", &self.key)
      .bearer_auth(&self.key)
      .send()
      .await
      .map_err(Error::source_error)?
      .error_for_status()
      .map_err(Error::source_error)?
      .json()
      .await
      .map_err(Error::source_error)?;
    Ok(rows)
  }
}
