//! `kontak` — command-line client for a Kontak server.
//!
//! # Usage
//!
//! ```text
//! kontak list "dana 0812"
//! kontak add --name "Budi" --phone 0812-3456 --ewallet dana,ovo
//! kontak --user admin --password secret backup now
//! kontak --config ~/.config/kontak/config.toml export csv -o kontak.csv
//! ```

mod client;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ExternalSource};
use kontak_core::{
  contact::{EWallet, NewContact},
  guard::PhoneCheck,
  notify::Notifier,
};
use kontak_formats::Format;
use output::ConsoleNotifier;
use serde::Deserialize;
use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kontak", about = "Command-line client for the Kontak contact server")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the kontak server (default: http://localhost:8080).
  #[arg(long, env = "KONTAK_URL")]
  url: Option<String>,

  /// Admin username.
  #[arg(long, env = "KONTAK_USER")]
  user: Option<String>,

  /// Admin password (plaintext).
  #[arg(long, env = "KONTAK_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// Writable contact fields shared by `add` and `edit`.
#[derive(clap::Args, Debug, Default)]
struct ContactFields {
  #[arg(long)]
  name:    Option<String>,
  #[arg(long)]
  phone:   Option<String>,
  /// Comma-separated: dana, gopay, ovo, shopeepay.
  #[arg(long, value_delimiter = ',')]
  ewallet: Option<Vec<EWallet>>,
  #[arg(long)]
  email:   Option<String>,
  #[arg(long)]
  company: Option<String>,
  #[arg(long)]
  notes:   Option<String>,
}

impl ContactFields {
  /// Overlay the given fields onto `base`.
  fn apply(self, mut base: NewContact) -> NewContact {
    if let Some(name) = self.name {
      base.name = name;
    }
    if let Some(phone) = self.phone {
      base.phone = Some(phone);
    }
    if let Some(ewallet) = self.ewallet {
      base.ewallet = ewallet;
    }
    if let Some(email) = self.email {
      base.email = Some(email);
    }
    if let Some(company) = self.company {
      base.company = Some(company);
    }
    if let Some(notes) = self.notes {
      base.notes = Some(notes);
    }
    base
  }
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List contacts, optionally filtered by a search query.
  List {
    query:     Option<String>,
    /// Match the whole query against name + phone instead of keywords.
    #[arg(long)]
    substring: bool,
  },
  /// Show one contact.
  Show { id: Uuid },
  /// Create a contact.
  Add(ContactFields),
  /// Change fields of an existing contact.
  Edit {
    id:     Uuid,
    #[command(flatten)]
    fields: ContactFields,
  },
  /// Delete a contact.
  Delete { id: Uuid },
  /// Check whether a phone number is already saved.
  CheckPhone {
    phone:   String,
    #[arg(long)]
    exclude: Option<Uuid>,
  },
  /// Export every contact as csv, json or vcf.
  Export {
    format: Format,
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Import contacts from a csv, json or vcf file.
  Import { format: Format, file: PathBuf },
  /// Manage backup snapshots.
  #[command(subcommand)]
  Backup(BackupCommand),
  /// Copy every contact from another Kontak deployment.
  ImportExternal {
    #[arg(long)]
    source_url: String,
    #[arg(long)]
    source_key: String,
  },
  /// Copy e-wallet tags from another deployment onto matching phones.
  SyncExternal {
    #[arg(long)]
    source_url: String,
    #[arg(long)]
    source_key: String,
  },
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
  /// Snapshot every contact now.
  Now,
  /// List snapshots, newest first.
  List,
  Download {
    name:   String,
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  Delete { name: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args.user.or_else(|| non_empty(&file_cfg.username)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(&file_cfg.password)).unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  let notifier = ConsoleNotifier;
  let result = run(&client, &notifier, args.command).await;
  if let Err(e) = &result {
    notifier.error(&format!("{e:#}"));
    std::process::exit(1);
  }
  Ok(())
}

fn message(body: &Value) -> String {
  body.get("message").and_then(Value::as_str).unwrap_or("done").to_string()
}

async fn run(client: &ApiClient, notifier: &dyn Notifier, command: Command) -> Result<()> {
  match command {
    Command::List { query, substring } => {
      let list = client.list(query.as_deref().unwrap_or_default(), substring).await?;
      for contact in &list.contacts {
        println!("{}", output::contact_row(contact));
      }
      println!("{} contacts", list.count);
      if list.admin_trigger {
        println!("admin commands: export, import, backup, import-external, sync-external");
      }
    }
    Command::Show { id } => println!("{}", output::contact_detail(&client.get(id).await?)),
    Command::Add(fields) => {
      let draft = fields.apply(NewContact::default());
      precheck_phone(client, &draft, None).await?;
      let contact = client.save(&draft, None).await?;
      notifier.success("Contact added");
      println!("{}", output::contact_detail(&contact));
    }
    Command::Edit { id, fields } => {
      let draft = fields.apply(client.get(id).await?.to_new());
      precheck_phone(client, &draft, Some(id)).await?;
      let contact = client.save(&draft, Some(id)).await?;
      notifier.success("Contact updated");
      println!("{}", output::contact_detail(&contact));
    }
    Command::Delete { id } => {
      client.delete(id).await?;
      notifier.success("Contact deleted");
    }
    Command::CheckPhone { phone, exclude } => match client.check_phone(&phone, exclude).await? {
      PhoneCheck::TooShort => println!("too short to check"),
      PhoneCheck::Available { phone } => println!("{phone} is available"),
      PhoneCheck::Taken { phone, owner_name, .. } => {
        println!("{phone} is already saved under the name {owner_name}")
      }
    },
    Command::Export { format, output } => {
      let text = client.export(format).await?;
      let path = output.unwrap_or_else(|| PathBuf::from(format.file_name()));
      std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
      notifier.success(&format!("Exported to {}", path.display()));
    }
    Command::Import { format, file } => {
      let text = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      notifier.success(&message(&client.import(format, text).await?));
    }
    Command::Backup(cmd) => backup(client, notifier, cmd).await?,
    Command::ImportExternal { source_url, source_key } => {
      let body = ExternalSource { source_url, source_key };
      let result = client.call_function("import-external", Some(&body)).await?;
      notifier.success(&message(&result));
    }
    Command::SyncExternal { source_url, source_key } => {
      let body = ExternalSource { source_url, source_key };
      let result = client.call_function("sync-external", Some(&body)).await?;
      notifier.success(&message(&result));
    }
  }
  Ok(())
}

/// Refuse before submitting when the phone already belongs to someone else.
async fn precheck_phone(client: &ApiClient, draft: &NewContact, editing: Option<Uuid>) -> Result<()> {
  let Some(phone) = draft.phone.as_deref() else {
    return Ok(());
  };
  if let PhoneCheck::Taken { phone, owner_name, .. } = client.check_phone(phone, editing).await? {
    bail!("phone {phone} is already saved under the name {owner_name}");
  }
  Ok(())
}

async fn backup(client: &ApiClient, notifier: &dyn Notifier, cmd: BackupCommand) -> Result<()> {
  match cmd {
    BackupCommand::Now => {
      let result = client.call_function("backup-contacts", None).await?;
      notifier.success(&message(&result));
    }
    BackupCommand::List => {
      let backups = client.list_backups().await?;
      if backups.is_empty() {
        println!("no backups yet");
      }
      for b in backups {
        println!("{:<52} {:>9} B  {} ({})", b.name, b.size, b.age, b.created_at.format("%Y-%m-%d %H:%M"));
      }
    }
    BackupCommand::Download { name, output } => {
      let bytes = client.download_backup(&name).await?;
      let path = output.unwrap_or_else(|| PathBuf::from(&name));
      std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
      notifier.success(&format!("Saved {}", path.display()));
    }
    BackupCommand::Delete { name } => {
      client.delete_backup(&name).await?;
      notifier.success("Backup deleted");
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields_overlay_only_what_was_given() {
    let base = NewContact::new("Budi").with_phone("0812").with_ewallet([EWallet::Dana]);
    let fields = ContactFields {
      ewallet: Some(vec![EWallet::Ovo]),
      notes: Some("met at market".into()),
      ..ContactFields::default()
    };
    let merged = fields.apply(base);
    assert_eq!(merged.name, "Budi");
    assert_eq!(merged.phone.as_deref(), Some("0812"));
    assert_eq!(merged.ewallet, vec![EWallet::Ovo]);
    assert_eq!(merged.notes.as_deref(), Some("met at market"));
  }

  #[test]
  fn parses_add_with_ewallet_list() {
    let args = Args::try_parse_from([
      "kontak", "add", "--name", "Budi", "--phone", "0812", "--ewallet", "dana,GoPay",
    ])
    .unwrap();
    let Command::Add(fields) = args.command else { panic!("expected add") };
    assert_eq!(fields.ewallet, Some(vec![EWallet::Dana, EWallet::Gopay]));
  }

  #[test]
  fn parses_format_aliases() {
    let args = Args::try_parse_from(["kontak", "export", "vcard"]).unwrap();
    assert!(matches!(args.command, Command::Export { format: Format::Vcard, .. }));
    assert!(Args::try_parse_from(["kontak", "export", "xml"]).is_err());
  }

  #[test]
  fn parses_backup_subcommands() {
    let args = Args::try_parse_from(["kontak", "backup", "download", "backup-x.json"]).unwrap();
    assert!(matches!(args.command, Command::Backup(BackupCommand::Download { .. })));
  }
}
