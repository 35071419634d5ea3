//! Client-side contact filtering for the list view.

use serde::{Deserialize, Serialize};

use crate::contact::Contact;

/// The query that opens the admin panel instead of filtering.
pub const ADMIN_TRIGGER: &str = "edit";

/// How a query is matched against a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
  /// Every keyword must occur somewhere in name, phone or e-wallet tags.
  #[default]
  Keywords,
  /// The whole query must occur in `name + phone`.
  Substring,
}

/// Result of applying a query to the contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
  /// The query was the admin trigger; filtering is off and every contact
  /// is listed.
  AdminTrigger(Vec<Contact>),
  Matches(Vec<Contact>),
}

/// True when `query` is the hidden admin trigger rather than a search term.
pub fn is_admin_trigger(query: &str) -> bool { query.to_lowercase() == ADMIN_TRIGGER }

/// Split a query into lowercase keywords on whitespace, `,` and `/`.
pub fn keywords(query: &str) -> Vec<String> {
  query
    .to_lowercase()
    .split(|c: char| c.is_whitespace() || c == ',' || c == '/')
    .filter(|k| !k.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Lowercased text searched in [`SearchMode::Keywords`].
fn searchable_text(contact: &Contact) -> String {
  let mut parts: Vec<&str> = vec![contact.name.as_str()];
  if let Some(phone) = contact.phone.as_deref() {
    parts.push(phone);
  }
  parts.extend(contact.ewallet.iter().map(|e| e.as_ref()));
  parts
    .into_iter()
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// AND of keyword substring matches, in any order.
pub fn matches_keywords(contact: &Contact, keywords: &[String]) -> bool {
  let text = searchable_text(contact);
  keywords.iter().all(|kw| text.contains(kw.as_str()))
}

/// Plain substring over `name + phone`.
pub fn matches_substring(contact: &Contact, query: &str) -> bool {
  let text = format!("{}{}", contact.name, contact.phone.as_deref().unwrap_or_default());
  text.to_lowercase().contains(&query.to_lowercase())
}

/// Filter `contacts` by `query`, preserving their order.
pub fn filter(contacts: Vec<Contact>, query: &str, mode: SearchMode) -> SearchOutcome {
  if is_admin_trigger(query) {
    return SearchOutcome::AdminTrigger(contacts);
  }
  if query.is_empty() {
    return SearchOutcome::Matches(contacts);
  }
  let matched = match mode {
    SearchMode::Keywords => {
      let kws = keywords(query);
      contacts
        .into_iter()
        .filter(|c| matches_keywords(c, &kws))
        .collect()
    }
    SearchMode::Substring => contacts
      .into_iter()
      .filter(|c| matches_substring(c, query))
      .collect(),
  };
  SearchOutcome::Matches(matched)
}
