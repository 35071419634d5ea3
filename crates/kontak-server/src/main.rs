//! kontak-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) merged with
//! `KONTAK_*` environment variables, opens the SQLite contact store, and
//! serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```text
//! cargo run -p kontak-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use kontak_admin::{Admin, FsStorage, schedule};
use kontak_core::{book::ContactBook, notify::TracingNotifier};
use kontak_server::{ServerConfig, auth};
use kontak_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kontak contact server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = auth::hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let config_path = cli.config;
  let settings = config::Config::builder()
    .add_source(config::File::from(config_path.clone()).required(false))
    .add_source(config::Environment::with_prefix("KONTAK"))
    .build()
    .with_context(|| format!("loading configuration from {}", config_path.display()))?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("invalid server configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening contact store {}", store_path.display()))?;

  let backup_dir = expand_tilde(&server_cfg.backup_dir);
  let book = ContactBook::new(Arc::new(store), Arc::new(TracingNotifier));
  let admin = Admin::new(
    book,
    Arc::new(FsStorage::new(&backup_dir)),
    server_cfg.admin_settings(),
  );

  let auth = server_cfg.auth();
  if auth.is_none() {
    tracing::warn!("admin_password_hash is not set; admin routes are open");
  }

  if let Some(hour) = server_cfg.backup_hour {
    tracing::info!(hour, backup_dir = %backup_dir.display(), "daily backup enabled");
    let _daily = schedule::spawn_daily(admin.clone(), hour);
  }

  let app = kontak_server::app(admin, auth);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(%address, "kontak-server listening");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("binding {address}"))?;

  axum::serve(listener, app).await.context("serving HTTP")?;

  Ok(())
}

/// Prompt for the admin password on stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{BufRead, Write};
  let mut stdout = std::io::stdout();
  write!(stdout, "Admin password: ")?;
  stdout.flush()?;
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line).context("reading password")?;
  let password = line.trim_end_matches(['\n', '\r']);
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password.to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
