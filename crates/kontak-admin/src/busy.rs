//! Per-operation busy flags.

use std::{
  collections::HashSet,
  sync::{Mutex, PoisonError},
};

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::{Error, Result};

/// An admin action that may only run once at a time.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
  Backup,
  Import,
  ImportExternal,
  Sync,
}

/// The set of operations currently running.
///
/// Slots are independent: a running backup does not block an import.
#[derive(Debug, Default)]
pub struct BusySlots {
  running: Mutex<HashSet<Operation>>,
}

impl BusySlots {
  pub fn new() -> Self { Self::default() }

  /// Claim `op`, failing with [`Error::Busy`] if it is already held.
  /// The slot is released when the returned guard drops.
  pub fn acquire(&self, op: Operation) -> Result<BusyGuard<'_>> {
    let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
    if !running.insert(op) {
      return Err(Error::Busy(op));
    }
    Ok(BusyGuard { slots: self, op })
  }

  pub fn is_busy(&self, op: Operation) -> bool {
    self
      .running
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains(&op)
  }
}

/// Holds one slot of a [`BusySlots`].
#[derive(Debug)]
pub struct BusyGuard<'a> {
  slots: &'a BusySlots,
  op:    Operation,
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    self
      .slots
      .running
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.op);
  }
}
