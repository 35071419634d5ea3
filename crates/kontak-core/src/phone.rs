//! Phone number normalisation and display.

/// Normalised phones shorter than this are not looked up for duplicates.
pub const MIN_LOOKUP_LEN: usize = 4;

/// Strip whitespace, dashes, dots, parentheses and plus signs.
///
/// Returns `None` when nothing is left. Other characters are kept as typed.
pub fn normalize_phone(raw: &str) -> Option<String> {
  let cleaned: String = raw
    .chars()
    .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')' | '+'))
    .collect();
  (!cleaned.is_empty()).then_some(cleaned)
}

/// Group digits for display: `0821 3613 8339`.
///
/// Non-digits are dropped. The first two groups are four digits wide; the rest
/// goes into the last group.
pub fn format_phone(phone: &str) -> String {
  let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
  match digits.len() {
    0..=4 => digits,
    5..=8 => format!("{} {}", &digits[..4], &digits[4..]),
    _ => format!("{} {} {}", &digits[..4], &digits[4..8], &digits[8..]),
  }
}
