//! Daily backup scheduling.

use chrono::{DateTime, Days, Utc};
use kontak_core::store::ContactStore;
use tokio::task::JoinHandle;

use crate::{admin::Admin, storage::BackupStorage};

/// The next moment strictly after `now` whose UTC time is `hour`:00:00.
/// `None` when `hour` is not a valid hour of the day.
pub fn next_run(now: DateTime<Utc>, hour: u32) -> Option<DateTime<Utc>> {
  let today = now.date_naive().and_hms_opt(hour, 0, 0)?.and_utc();
  if today > now {
    Some(today)
  } else {
    today.checked_add_days(Days::new(1))
  }
}

/// Run [`Admin::backup_now`] every day at `hour` UTC until the task is
/// aborted. Failures are logged and the loop carries on.
pub fn spawn_daily<S, B>(admin: Admin<S, B>, hour: u32) -> JoinHandle<()>
where
  S: ContactStore + 'static,
  B: BackupStorage + 'static,
{
  tokio::spawn(async move {
    loop {
      let now = Utc::now();
      let Some(next) = next_run(now, hour) else {
        tracing::error!(hour, "invalid backup hour; daily backup disabled");
        return;
      };
      let wait = (next - now).to_std().unwrap_or_default();
      tracing::info!(%next, "next scheduled backup");
      tokio::time::sleep(wait).await;

      match admin.backup_now().await {
        Ok(report) => tracing::info!(name = %report.name, count = report.count, "scheduled backup done"),
        Err(e) => tracing::warn!(error = %e, "scheduled backup failed"),
      }
    }
  })
}
