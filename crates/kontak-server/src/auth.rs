//! HTTP Basic-auth verification for the admin routes.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use serde_json::json;
use thiserror::Error;

/// Credentials accepted for the admin routes.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("unauthorized")]
  Unauthorized,
}

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    let mut resp =
      (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.to_string() }))).into_response();
    resp.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"kontak-admin\""),
    );
    resp
  }
}

/// Hash `password` into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), AuthError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(AuthError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(AuthError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| AuthError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| AuthError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(AuthError::Unauthorized)?;

  if username != config.username {
    return Err(AuthError::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| AuthError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| AuthError::Unauthorized)?;

  Ok(())
}

/// Middleware guarding the admin router. `None` leaves the routes open.
pub async fn require_admin(
  State(auth): State<Arc<Option<AuthConfig>>>,
  req: Request,
  next: Next,
) -> Response {
  if let Some(config) = auth.as_ref()
    && let Err(e) = verify_auth(req.headers(), config)
  {
    tracing::debug!(path = %req.uri().path(), "admin request rejected");
    return e.into_response();
  }
  next.run(req).await
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "admin".to_string(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("admin", "secret")), &cfg).is_ok());
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("admin", "wrong")), &cfg),
      Err(AuthError::Unauthorized)
    ));
  }

  #[test]
  fn wrong_user() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("root", "secret")), &cfg).is_err());
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(verify_auth(&HeaderMap::new(), &cfg).is_err());
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    assert!(verify_auth(&headers("Basic !!!not-base64!!!"), &cfg).is_err());
  }

  #[test]
  fn malformed_hash_rejects() {
    let cfg = AuthConfig { username: "admin".into(), password_hash: "plain".into() };
    assert!(verify_auth(&headers(&basic("admin", "plain")), &cfg).is_err());
  }
}
