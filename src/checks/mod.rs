//! Pure syntax and checksum validation for IBAN, EU VAT-ID and URL values.
//!
//! Nothing here performs I/O or keeps state; every function is total over
//! arbitrary string input.
//!
//! # Example
//!
//! ```
//! use idsweep::checks::*;
//!
//! assert!(validate_iban("GB82WEST12345698765432").is_ok());
//! assert!(check_vat_id("DE136695976").is_ok());
//! assert!(matches!(check_vat_id("DE136695975"), Err(VatIdError::Checksum(_))));
//! assert!(is_valid_url_syntax(&with_default_scheme("example.com")));
//! ```

mod iban;
mod url;
mod vat;

pub use iban::{IbanError, is_valid_iban_checksum, is_valid_iban_syntax, validate_iban};
pub use url::{DEFAULT_SCHEME, force_secure_scheme, is_valid_url_syntax, with_default_scheme};
pub use vat::{
    VatId, VatIdError, check_vat_id, has_valid_checksum, normalize_vat_id, parse_vat_id,
};
