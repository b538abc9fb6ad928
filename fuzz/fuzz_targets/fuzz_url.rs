#![no_main]

use libfuzzer_sys::fuzz_target;
use idsweep::checks::{force_secure_scheme, is_valid_url_syntax, with_default_scheme};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = is_valid_url_syntax(&with_default_scheme(s));
        assert!(force_secure_scheme(s).starts_with("https://"));
    }
});
