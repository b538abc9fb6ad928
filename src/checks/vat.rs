//! EU VAT identification number syntax and national checksums.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// National number formats, keyed by VAT country prefix.
///
/// Patterns apply to the part after the two-letter prefix. Greece uses `EL`,
/// Northern Ireland `XI`; Switzerland is included for its UID-based MWST
/// numbers.
const VAT_FORMATS: &[(&str, &str)] = &[
    ("AT", r"U\d{8}"),
    ("BE", r"[01]\d{9}"),
    ("BG", r"\d{9,10}"),
    ("CH", r"E\d{9}(?:MWST|TVA|IVA)?"),
    ("CY", r"\d{8}[A-Z]"),
    ("CZ", r"\d{8,10}"),
    ("DE", r"\d{9}"),
    ("DK", r"\d{8}"),
    ("EE", r"\d{9}"),
    ("EL", r"\d{9}"),
    ("ES", r"[A-Z0-9]\d{7}[A-Z0-9]"),
    ("FI", r"\d{8}"),
    ("FR", r"[A-HJ-NP-Z0-9]{2}\d{9}"),
    ("HR", r"\d{11}"),
    ("HU", r"\d{8}"),
    ("IE", r"\d{7}[A-W][A-I]?|\d[A-Z+*]\d{5}[A-W]"),
    ("IT", r"\d{11}"),
    ("LT", r"\d{9}|\d{12}"),
    ("LU", r"\d{8}"),
    ("LV", r"\d{11}"),
    ("MT", r"\d{8}"),
    ("NL", r"\d{9}B\d{2}"),
    ("PL", r"\d{10}"),
    ("PT", r"\d{9}"),
    ("RO", r"\d{2,10}"),
    ("SE", r"\d{12}"),
    ("SI", r"\d{8}"),
    ("SK", r"\d{10}"),
    ("XI", r"\d{9}|\d{12}|GD\d{3}|HA\d{3}"),
];

static VAT_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    VAT_FORMATS
        .iter()
        .map(|&(country, pattern)| {
            let re = Regex::new(&format!("^(?:{pattern})$")).expect("Invalid VAT format regex");
            (country, re)
        })
        .collect()
});

/// Why a VAT ID was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum VatIdError {
    /// Fewer than two prefix letters plus at least one character.
    #[error("too short: must be at least 3 characters")]
    TooShort,
    /// Prefix is not a known VAT country.
    #[error("unknown country code '{0}'")]
    UnknownCountry(String),
    /// Number does not match the national format.
    #[error("invalid format for country {0}")]
    Syntax(String),
    /// Format is fine but the national check digit does not match.
    #[error("invalid check digit for country {0}")]
    Checksum(String),
}

impl VatIdError {
    /// True for every failure detected before the checksum stage.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, Self::Checksum(_))
    }
}

/// A syntactically valid VAT ID split into prefix and national number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VatId {
    country: String,
    number: String,
}

impl VatId {
    /// Two-letter VAT prefix (e.g. "DE", "EL").
    pub fn country(&self) -> &str {
        &self.country
    }

    /// National part after the prefix.
    pub fn number(&self) -> &str {
        &self.number
    }
}

impl fmt::Display for VatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.country, self.number)
    }
}

/// Trim surrounding whitespace and uppercase.
pub fn normalize_vat_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize and match against the national format table. No checksum.
pub fn parse_vat_id(raw: &str) -> Result<VatId, VatIdError> {
    let normalized = normalize_vat_id(raw);
    if normalized.len() < 3 {
        return Err(VatIdError::TooShort);
    }
    let Some(country) = normalized.get(..2) else {
        return Err(VatIdError::UnknownCountry(normalized));
    };
    let number = &normalized[2..];

    let Some(pattern) = VAT_PATTERNS.get(country) else {
        return Err(VatIdError::UnknownCountry(country.to_string()));
    };
    if !pattern.is_match(number) {
        return Err(VatIdError::Syntax(country.to_string()));
    }

    Ok(VatId {
        country: country.to_string(),
        number: number.to_string(),
    })
}

/// Full fast-phase check: national format, then checksum where one exists.
pub fn check_vat_id(raw: &str) -> Result<VatId, VatIdError> {
    let id = parse_vat_id(raw)?;
    if !has_valid_checksum(id.country(), id.number()) {
        return Err(VatIdError::Checksum(id.country.clone()));
    }
    Ok(id)
}

/// Apply the national checksum for `country` to `number` (prefix removed).
///
/// Countries without a known algorithm are accepted. Inputs too short for
/// the algorithm are rejected rather than panicking.
pub fn has_valid_checksum(country: &str, number: &str) -> bool {
    match country {
        "DE" => de_checksum(number),
        "AT" => at_checksum(number),
        "CH" => ch_checksum(number),
        "IT" => it_checksum(number),
        "NL" => nl_checksum(number),
        "BE" => be_checksum(number),
        "SE" => se_checksum(number),
        _ => true,
    }
}

fn digits(s: &str) -> Option<Vec<u32>> {
    s.chars().map(|c| c.to_digit(10)).collect()
}

/// ISO 7064 MOD 11,10 running product.
fn de_checksum(number: &str) -> bool {
    let Some(d) = digits(number).filter(|d| d.len() == 9) else {
        return false;
    };
    let mut product = 10;
    for &digit in &d[..8] {
        let mut sum = (digit + product) % 10;
        if sum == 0 {
            sum = 10;
        }
        product = (2 * sum) % 11;
    }
    let check = (11 - product) % 10;
    check == d[8]
}

fn at_checksum(number: &str) -> bool {
    let Some(rest) = number.strip_prefix('U') else {
        return false;
    };
    let Some(d) = digits(rest).filter(|d| d.len() == 8) else {
        return false;
    };
    const WEIGHTS: [u32; 7] = [1, 2, 1, 2, 1, 2, 1];
    let total: u32 = d
        .iter()
        .zip(WEIGHTS)
        .map(|(&digit, w)| {
            let p = digit * w;
            if p >= 10 { p / 10 + p % 10 } else { p }
        })
        .sum();
    let check = (10 - (total + 4) % 10) % 10;
    check == d[7]
}

fn ch_checksum(number: &str) -> bool {
    let Some(body) = number.strip_prefix('E') else {
        return false;
    };
    let Some(d) = body.get(..9).and_then(digits) else {
        return false;
    };
    const WEIGHTS: [u32; 8] = [5, 4, 3, 2, 7, 6, 5, 4];
    let total: u32 = d.iter().zip(WEIGHTS).map(|(&digit, w)| digit * w).sum();
    let check = match 11 - total % 11 {
        10 => return false,
        11 => 0,
        c => c,
    };
    check == d[8]
}

/// Luhn over the first ten digits, doubling odd positions.
fn it_checksum(number: &str) -> bool {
    let Some(d) = digits(number).filter(|d| d.len() == 11) else {
        return false;
    };
    let sum: u32 = d[..10]
        .iter()
        .enumerate()
        .map(|(i, &digit)| {
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled >= 10 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    (10 - sum % 10) % 10 == d[10]
}

/// Only the `B01`/`B02` suffixes carry an eleven-test number; other
/// suffixes are accepted unchecked.
fn nl_checksum(number: &str) -> bool {
    let Some(suffix) = number.get(9..) else {
        return false;
    };
    if suffix != "B01" && suffix != "B02" {
        return true;
    }
    let Some(d) = digits(&number[..9]) else {
        return false;
    };
    let total: u32 = d.iter().zip((1..=9).rev()).map(|(&digit, w)| digit * w).sum();
    total % 11 == 0
}

fn be_checksum(number: &str) -> bool {
    let Some(d) = digits(number).filter(|d| d.len() == 10 && d[0] == 0) else {
        return false;
    };
    let base = d[..8].iter().fold(0u64, |acc, &digit| acc * 10 + u64::from(digit));
    let check = u64::from(d[8] * 10 + d[9]);
    97 - base % 97 == check
}

fn se_checksum(number: &str) -> bool {
    let Some(d) = digits(number).filter(|d| d.len() == 12) else {
        return false;
    };
    let total: u32 = d[..10]
        .iter()
        .enumerate()
        .map(|(i, &digit)| {
            if i % 2 == 0 {
                let doubled = digit * 2;
                doubled / 10 + doubled % 10
            } else {
                digit
            }
        })
        .sum();
    (10 - total % 10) % 10 == d[10]
}
