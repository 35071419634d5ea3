//! Outcome reporting for user-triggered actions.
//!
//! Actions in [`crate::book::ContactBook`] (and the admin operations built on
//! top of it) report success and failure through an injected [`Notifier`] so
//! the logic itself stays free of presentation side effects.

use std::sync::Mutex;

/// Receives one transient message per finished action.
pub trait Notifier: Send + Sync {
  fn success(&self, message: &str);
  fn error(&self, message: &str);
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn success(&self, message: &str) { tracing::info!(target: "kontak::notify", "{message}"); }

  fn error(&self, message: &str) { tracing::warn!(target: "kontak::notify", "{message}"); }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Success(String),
  Error(String),
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
  notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
  pub fn new() -> Self { Self::default() }

  /// Everything delivered so far.
  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().map(|n| n.clone()).unwrap_or_default()
  }

  /// The most recent notification, if any.
  pub fn last(&self) -> Option<Notice> { self.notices().pop() }

  fn push(&self, notice: Notice) {
    if let Ok(mut n) = self.notices.lock() {
      n.push(notice);
    }
  }
}

impl Notifier for CollectingNotifier {
  fn success(&self, message: &str) { self.push(Notice::Success(message.to_string())); }

  fn error(&self, message: &str) { self.push(Notice::Error(message.to_string())); }
}
