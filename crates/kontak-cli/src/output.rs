//! Terminal rendering and the console notifier.

use kontak_core::{contact::Contact, notify::Notifier, phone::format_phone};

/// Prints notifications as one-line status messages.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
  fn success(&self, message: &str) { println!("✓ {message}"); }

  fn error(&self, message: &str) { eprintln!("✗ {message}"); }
}

/// One list row: name, grouped phone, e-wallet labels.
pub fn contact_row(c: &Contact) -> String {
  let phone = c.phone.as_deref().map(format_phone).unwrap_or_else(|| "-".to_string());
  let wallets: Vec<&str> = c.ewallet.iter().map(|e| e.label()).collect();
  format!("{:<28} {:<18} {}", c.name, phone, wallets.join(", "))
    .trim_end()
    .to_string()
}

/// Every field of a contact, one per line.
pub fn contact_detail(c: &Contact) -> String {
  let mut lines = vec![format!("id       {}", c.id), format!("name     {}", c.name)];
  if let Some(phone) = &c.phone {
    lines.push(format!("phone    {}", format_phone(phone)));
  }
  if !c.ewallet.is_empty() {
    let wallets: Vec<&str> = c.ewallet.iter().map(|e| e.label()).collect();
    lines.push(format!("e-wallet {}", wallets.join(", ")));
  }
  for (label, value) in [("email", &c.email), ("company", &c.company), ("notes", &c.notes)] {
    if let Some(v) = value {
      lines.push(format!("{label:<8} {v}"));
    }
  }
  lines.join("\n")
}
