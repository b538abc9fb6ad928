//! IBAN syntax and ISO 13616 mod-97 checksum.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static IBAN_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}$").expect("Invalid IBAN regex")
});

/// Why an IBAN was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IbanError {
    /// Not country code + check digits + 1–30 alphanumerics.
    #[error("Invalid IBAN syntax")]
    Syntax,
    /// Well-formed, but the mod-97 remainder is not 1.
    #[error("Invalid IBAN checksum")]
    Checksum,
}

/// Two letters, two digits, then 1–30 alphanumeric characters (any case).
pub fn is_valid_iban_syntax(iban: &str) -> bool {
    IBAN_SYNTAX.is_match(iban)
}

/// Rotate the first four characters to the end, expand letters to their
/// base-36 value (A=10 … Z=35) and require the number mod 97 to equal 1.
///
/// The remainder is folded digit by digit, so IBANs of any length are
/// handled without big integers. Returns `false` for inputs shorter than
/// five characters or containing non-alphanumerics.
pub fn is_valid_iban_checksum(iban: &str) -> bool {
    if iban.len() < 5 || !iban.is_ascii() {
        return false;
    }
    let (head, tail) = iban.split_at(4);

    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    remainder == 1
}

/// Full single-step IBAN check: syntax first, then checksum.
pub fn validate_iban(iban: &str) -> Result<(), IbanError> {
    if !is_valid_iban_syntax(iban) {
        return Err(IbanError::Syntax);
    }
    if !is_valid_iban_checksum(iban) {
        return Err(IbanError::Checksum);
    }
    Ok(())
}
