//! Canonical forms for identity numbers.
//!
//! Uniqueness checks compare canonical strings, so every writer must store
//! these forms and every lookup must normalize first.

fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Render a tax-identity number as `000.000.000-00`.
///
/// Returns `None` unless the input holds exactly eleven digits.
pub fn normalize_tax_id(input: &str) -> Option<String> {
    let d = digits(input);
    (d.len() == 11).then(|| format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]))
}

/// Render a phone number as `+55 (00) 00000-0000`.
///
/// A leading `55` country code is dropped before counting; the remainder
/// must be exactly eleven digits.
pub fn normalize_phone(input: &str) -> Option<String> {
    let mut d = digits(input);
    if d.starts_with("55") {
        d.drain(..2);
    }
    (d.len() == 11).then(|| format!("+55 ({}) {}-{}", &d[..2], &d[2..7], &d[7..]))
}
