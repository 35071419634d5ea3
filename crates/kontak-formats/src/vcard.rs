//! vCard 3.0 codec.
//!
//! Generation emits one `BEGIN:VCARD … END:VCARD` record per contact with
//! `FN`, `N`, and optional `TEL`, `EMAIL`, `ORG` and `NOTE` lines, joined by
//! `\n`. Parsing is deliberately lenient: it reads the first `FN` and the
//! first `TEL` of each record and ignores everything it does not know.

use kontak_core::{
  contact::{Contact, NewContact},
  phone::normalize_phone,
};

// ─── Escaping ────────────────────────────────────────────────────────────────

/// Escape a full property value: `\`, `,`, `;`, `\n`.
fn escape_value(s: &str) -> String {
  s.replace('\\', "\\\\")
    .replace(',', "\\,")
    .replace(';', "\\;")
    .replace('\n', "\\n")
}

/// Escape one `N` component: `\`, `;`, `\n`.
fn escape_component(s: &str) -> String {
  s.replace('\\', "\\\\").replace(';', "\\;").replace('\n', "\\n")
}

fn unescape_value(s: &str) -> String {
  let mut result = String::with_capacity(s.len());
  let mut chars = s.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      result.push(c);
      continue;
    }
    match chars.next() {
      Some('n') | Some('N') => result.push('\n'),
      Some(other @ ('\\' | ',' | ';')) => result.push(other),
      Some(other) => {
        result.push('\\');
        result.push(other);
      }
      None => result.push('\\'),
    }
  }
  result
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Split a full name into `(given, family)`: the first whitespace token is
/// the given name and the rest is the family name. Multi-word given names end
/// up in the family part.
pub fn split_name(full: &str) -> (String, String) {
  let mut tokens = full.split_whitespace();
  let given = tokens.next().unwrap_or_default().to_string();
  let family = tokens.collect::<Vec<_>>().join(" ");
  (given, family)
}

fn encode_one(c: &Contact) -> String {
  let (given, family) = split_name(&c.name);
  let mut lines = vec![
    "BEGIN:VCARD".to_string(),
    "VERSION:3.0".to_string(),
    format!("FN:{}", escape_value(&c.name)),
    format!("N:{};{};;;", escape_component(&family), escape_component(&given)),
  ];
  if let Some(phone) = &c.phone {
    lines.push(format!("TEL;TYPE=CELL:{phone}"));
  }
  if let Some(email) = &c.email {
    lines.push(format!("EMAIL;TYPE=INTERNET:{}", escape_value(email)));
  }
  if let Some(company) = &c.company {
    lines.push(format!("ORG:{}", escape_value(company)));
  }
  if let Some(notes) = &c.notes {
    lines.push(format!("NOTE:{}", escape_value(notes)));
  }
  lines.push("END:VCARD".to_string());
  lines.join("\n")
}

/// Encode contacts as concatenated vCard 3.0 records.
pub fn encode(contacts: &[Contact]) -> String {
  contacts.iter().map(encode_one).collect::<Vec<_>>().join("\n")
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Join CRLF+SP (or LF+SP / LF+HT) continuation lines and drop empty lines.
fn unfold_lines(s: &str) -> Vec<String> {
  let mut lines: Vec<String> = Vec::new();
  for raw in s.split('\n') {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    if let Some(rest) = line.strip_prefix([' ', '\t']) {
      if let Some(last) = lines.last_mut() {
        last.push_str(rest);
      }
    } else {
      lines.push(line.to_string());
    }
  }
  lines.retain(|l| !l.is_empty());
  lines
}

/// Find the first `:` that is not inside a double-quoted parameter value.
fn find_unquoted_colon(s: &str) -> Option<usize> {
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ':' if !in_quotes => return Some(i),
      _ => {}
    }
  }
  None
}

/// `(PROPERTY, value)` of a content line, with parameters and any group
/// prefix (`item1.TEL`) dropped.
fn property(line: &str) -> Option<(String, &str)> {
  let colon = find_unquoted_colon(line)?;
  let head = &line[..colon];
  let name = head.split(';').next().unwrap_or_default();
  let name = name.rsplit('.').next().unwrap_or(name);
  Some((name.trim().to_uppercase(), &line[colon + 1..]))
}

/// The text before the first unescaped `;` (the organisation name of `ORG`).
fn first_component(value: &str) -> &str {
  let mut escaped = false;
  for (i, c) in value.char_indices() {
    match c {
      '\\' if !escaped => escaped = true,
      ';' if !escaped => return &value[..i],
      _ => escaped = false,
    }
  }
  value
}

/// Fields gathered from one record.
#[derive(Default)]
struct Card {
  name:    Option<String>,
  phone:   Option<String>,
  email:   Option<String>,
  company: Option<String>,
  notes:   Option<String>,
}

impl Card {
  fn read(&mut self, prop: &str, value: &str) {
    let text = || Some(unescape_value(value).trim().to_string()).filter(|s| !s.is_empty());
    match prop {
      "FN" if self.name.is_none() => self.name = text(),
      "TEL" if self.phone.is_none() => {
        let number = value
          .get(..4)
          .filter(|p| p.eq_ignore_ascii_case("tel:"))
          .map_or(value, |_| &value[4..]);
        self.phone = normalize_phone(number);
      }
      "EMAIL" if self.email.is_none() => self.email = text(),
      "ORG" if self.company.is_none() => {
        let first = first_component(value);
        self.company = Some(unescape_value(first).trim().to_string()).filter(|s| !s.is_empty());
      }
      "NOTE" if self.notes.is_none() => self.notes = text(),
      _ => {}
    }
  }

  fn finish(self) -> Option<NewContact> {
    Some(NewContact {
      name:    self.name?,
      phone:   self.phone,
      ewallet: Vec::new(),
      email:   self.email,
      company: self.company,
      notes:   self.notes,
    })
  }
}

/// Decode every `BEGIN:VCARD` record in `text`.
///
/// Records without a non-empty `FN` are dropped. Text before the first
/// `BEGIN:VCARD` and after each `END:VCARD` is ignored.
pub fn decode(text: &str) -> Vec<NewContact> {
  let mut out = Vec::new();
  let mut current: Option<Card> = None;

  for line in unfold_lines(text) {
    if line.trim().eq_ignore_ascii_case("BEGIN:VCARD") {
      if let Some(card) = current.replace(Card::default()) {
        out.extend(card.finish());
      }
      continue;
    }
    if line.trim().eq_ignore_ascii_case("END:VCARD") {
      if let Some(card) = current.take() {
        out.extend(card.finish());
      }
      continue;
    }
    if let (Some(card), Some((prop, value))) = (current.as_mut(), property(&line)) {
      card.read(&prop, value);
    }
  }
  // A record cut off before END:VCARD still counts.
  if let Some(card) = current {
    out.extend(card.finish());
  }
  out
}
