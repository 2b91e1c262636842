//! Built-in validation rules.
//!
//! Each rule is a plain function so the registry can store it by pointer.

use std::sync::OnceLock;

use regex::Regex;

/// Rule name for the owner tax-identity number.
pub const TAX_ID: &str = "tax_id";
/// Rule name for the owner phone number.
pub const PHONE: &str = "phone";
/// Rule name for the owner display name.
pub const NAME: &str = "name";
/// Rule name for the plaintext account credential.
pub const CREDENTIAL: &str = "credential";

/// Minimum credential length.
pub const MIN_CREDENTIAL_LEN: usize = 8;

/// The outcome of running one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail { reason: String },
}

impl RuleOutcome {
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A validation rule.
pub type Rule = fn(&str) -> RuleOutcome;

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in pattern compiles"))
}

/// `000.000.000-00`, `000000000-00` or eleven bare digits. A number made of
/// one repeated digit is rejected.
pub fn tax_id(input: &str) -> RuleOutcome {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = pattern(&RE, r"^(\d{3}\.?\d{3}\.?\d{3}-\d{2}|\d{11})$");
    if !re.is_match(input) {
        return RuleOutcome::fail("expected 123.456.789-00 or 12345678900");
    }

    let digits: Vec<char> = input.chars().filter(char::is_ascii_digit).collect();
    if digits.windows(2).all(|w| w[0] == w[1]) {
        return RuleOutcome::fail("cannot be composed of repeated digits");
    }
    RuleOutcome::Pass
}

/// Brazilian mobile numbers with the `55` country code.
pub fn phone(input: &str) -> RuleOutcome {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = pattern(
        &RE,
        r"^(\+55 \d{2} 9\d{8}|\+55\d{11}|\+55 \(\d{2}\) 9\d{8}|\+55 \(\d{2}\) 9\d{4}-\d{4}|55\d{11})$",
    );
    if re.is_match(input) {
        RuleOutcome::Pass
    } else {
        RuleOutcome::fail("expected +55 (XX) 9XXXX-XXXX or +55XX9XXXXXXXX")
    }
}

/// Letters and spaces only, 2 to 50 characters.
pub fn name(input: &str) -> RuleOutcome {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = pattern(&RE, r"^[A-Za-zÀ-ÿ\s]{2,50}$");
    if input.trim().is_empty() {
        return RuleOutcome::fail("cannot be empty");
    }
    if re.is_match(input) {
        RuleOutcome::Pass
    } else {
        RuleOutcome::fail("letters and spaces only, between 2 and 50 characters")
    }
}

/// At least eight characters with at least one letter and one digit.
pub fn credential(input: &str) -> RuleOutcome {
    if input.chars().count() < MIN_CREDENTIAL_LEN {
        return RuleOutcome::fail(format!(
            "must be at least {MIN_CREDENTIAL_LEN} characters long"
        ));
    }
    let has_letter = input.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = input.chars().any(|c| c.is_ascii_digit());
    if has_letter && has_digit {
        RuleOutcome::Pass
    } else {
        RuleOutcome::fail("must include both letters and numbers")
    }
}
