//! Async HTTP client wrapping the Kontak JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use kontak_core::{
  contact::{Contact, NewContact},
  guard::PhoneCheck,
};
use kontak_formats::Format;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Connection settings for the Kontak API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// `GET /api/contacts` response.
#[derive(Debug, Deserialize)]
pub struct ContactList {
  pub admin_trigger: bool,
  pub count:         usize,
  pub contacts:      Vec<Contact>,
}

/// One row of `GET /api/admin/backups`.
#[derive(Debug, Deserialize)]
pub struct BackupEntry {
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub size:       u64,
  pub age:        String,
}

/// Body of the external-source functions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSource {
  pub source_url: String,
  pub source_key: String,
}

/// Async HTTP client for the Kontak JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn ensure_ok(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: Value = resp.json().await.unwrap_or(Value::Null);
  match body.get("error").and_then(Value::as_str) {
    Some(message) => Err(anyhow!("{what} → {status}: {message}")),
    None => Err(anyhow!("{what} → {status}")),
  }
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  /// `GET /api/contacts?q=<query>&mode=<mode>`
  pub async fn list(&self, query: &str, substring: bool) -> Result<ContactList> {
    let mode = if substring { "substring" } else { "keywords" };
    let resp = self
      .auth(self.client.get(self.url("/contacts")))
      .query(&[("q", query), ("mode", mode)])
      .send()
      .await
      .context("GET /contacts failed")?;
    ensure_ok(resp, "GET /contacts")
      .await?
      .json()
      .await
      .context("deserialising contacts")
  }

  /// `GET /api/contacts/{id}`
  pub async fn get(&self, id: Uuid) -> Result<Contact> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/contacts/{id}"))))
      .send()
      .await
      .context("GET /contacts/{id} failed")?;
    ensure_ok(resp, "GET /contacts/{id}")
      .await?
      .json()
      .await
      .context("deserialising contact")
  }

  /// `POST /api/contacts`, or `PUT /api/contacts/{id}` when `id` is set.
  pub async fn save(&self, contact: &NewContact, id: Option<Uuid>) -> Result<Contact> {
    let req = match id {
      Some(id) => self.client.put(self.url(&format!("/contacts/{id}"))),
      None => self.client.post(self.url("/contacts")),
    };
    let resp = self
      .auth(req)
      .json(contact)
      .send()
      .await
      .context("saving contact failed")?;
    ensure_ok(resp, "save contact")
      .await?
      .json()
      .await
      .context("deserialising contact")
  }

  /// `DELETE /api/contacts/{id}`
  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/contacts/{id}"))))
      .send()
      .await
      .context("DELETE /contacts/{id} failed")?;
    ensure_ok(resp, "DELETE /contacts/{id}").await?;
    Ok(())
  }

  /// `GET /api/phone-check?phone=<raw>[&exclude=<id>]`
  pub async fn check_phone(&self, phone: &str, exclude: Option<Uuid>) -> Result<PhoneCheck> {
    let mut query = vec![("phone", phone.to_string())];
    if let Some(id) = exclude {
      query.push(("exclude", id.to_string()));
    }
    let resp = self
      .auth(self.client.get(self.url("/phone-check")))
      .query(&query)
      .send()
      .await
      .context("GET /phone-check failed")?;
    ensure_ok(resp, "GET /phone-check")
      .await?
      .json()
      .await
      .context("deserialising phone check")
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  /// `GET /api/admin/export/{format}`
  pub async fn export(&self, format: Format) -> Result<String> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/admin/export/{}", format.extension()))))
      .send()
      .await
      .context("export failed")?;
    ensure_ok(resp, "export").await?.text().await.context("reading export")
  }

  /// `POST /api/admin/import/{format}`; returns the server's message.
  pub async fn import(&self, format: Format, text: String) -> Result<Value> {
    let resp = self
      .auth(self.client.post(self.url(&format!("/admin/import/{}", format.extension()))))
      .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
      .body(text)
      .send()
      .await
      .context("import failed")?;
    ensure_ok(resp, "import").await?.json().await.context("deserialising import result")
  }

  // ── Functions ─────────────────────────────────────────────────────────────

  /// `POST /api/admin/functions/{name}`; fails when `success` is false.
  pub async fn call_function(&self, name: &str, body: Option<&ExternalSource>) -> Result<Value> {
    let mut req = self.auth(self.client.post(self.url(&format!("/admin/functions/{name}"))));
    req = match body {
      Some(source) => req.json(source),
      None => req.json(&json!({})),
    };
    let resp = req.send().await.with_context(|| format!("function {name} failed"))?;
    let status = resp.status();
    let body: Value = resp.json().await.context("deserialising function result")?;
    if body.get("success").and_then(Value::as_bool) == Some(true) {
      return Ok(body);
    }
    let message = body.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    Err(anyhow!("{name} → {status}: {message}"))
  }

  // ── Backups ───────────────────────────────────────────────────────────────

  /// `GET /api/admin/backups`
  pub async fn list_backups(&self) -> Result<Vec<BackupEntry>> {
    let resp = self
      .auth(self.client.get(self.url("/admin/backups")))
      .send()
      .await
      .context("GET /admin/backups failed")?;
    ensure_ok(resp, "GET /admin/backups")
      .await?
      .json()
      .await
      .context("deserialising backups")
  }

  /// `GET /api/admin/backups/{name}`
  pub async fn download_backup(&self, name: &str) -> Result<Vec<u8>> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/admin/backups/{name}"))))
      .send()
      .await
      .context("backup download failed")?;
    let bytes = ensure_ok(resp, "download backup").await?.bytes().await?;
    Ok(bytes.to_vec())
  }

  /// `DELETE /api/admin/backups/{name}`
  pub async fn delete_backup(&self, name: &str) -> Result<()> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/admin/backups/{name}"))))
      .send()
      .await
      .context("backup delete failed")?;
    ensure_ok(resp, "delete backup").await?;
    Ok(())
  }
}
