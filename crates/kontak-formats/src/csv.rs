//! CSV codec: `Nama,Telepon,E-Wallet` with `;`-separated e-wallet tags.
//!
//! Quoting is minimal. A `"` toggles quoted mode and is never copied into the
//! field, so doubled quotes inside a quoted field are not unescaped.

use kontak_core::{
  contact::{Contact, EWallet, NewContact, ewallet_set},
  phone::normalize_phone,
};

/// Header row written by [`encode`]. The first row is always skipped on decode.
pub const HEADER: &str = "Nama,Telepon,E-Wallet";

/// Split one line into fields, honouring double-quoted commas.
pub fn parse_line(line: &str) -> Vec<String> {
  let mut fields = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;
  for c in line.chars() {
    match c {
      '"' => in_quotes = !in_quotes,
      ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
      _ => current.push(c),
    }
  }
  fields.push(current);
  fields
}

/// Split a `;`-separated e-wallet column, keeping known providers only.
fn parse_ewallets(column: &str) -> Vec<EWallet> {
  ewallet_set(
    column
      .split(';')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .filter_map(EWallet::from_tag),
  )
}

/// Decode CSV text. Blank lines are ignored, the first remaining line is the
/// header, and rows with an empty first column are skipped.
pub fn decode(text: &str) -> Vec<NewContact> {
  text
    .split('\n')
    .filter(|l| !l.trim().is_empty())
    .skip(1)
    .filter_map(|line| {
      let cols = parse_line(line);
      let name = cols.first().map(|c| c.trim()).unwrap_or_default();
      if name.is_empty() {
        return None;
      }
      Some(NewContact {
        name:    name.to_string(),
        phone:   cols.get(1).and_then(|p| normalize_phone(p.trim())),
        ewallet: cols.get(2).map(|e| parse_ewallets(e)).unwrap_or_default(),
        ..NewContact::default()
      })
    })
    .collect()
}

/// Encode contacts with every field quoted.
pub fn encode(contacts: &[Contact]) -> String {
  let rows: Vec<String> = contacts
    .iter()
    .map(|c| {
      let ewallet: Vec<&str> = c.ewallet.iter().map(|e| e.as_ref()).collect();
      format!(
        "\"{}\",\"{}\",\"{}\"",
        c.name,
        c.phone.as_deref().unwrap_or_default(),
        ewallet.join(";"),
      )
    })
    .collect();
  format!("{HEADER}\n{}", rows.join("\n"))
}
