#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = idsweep::checks::check_vat_id(s) {
            // An accepted ID must round-trip through its own display form.
            assert!(idsweep::checks::check_vat_id(&id.to_string()).is_ok());
        }
        if let Some(country) = s.get(..2) {
            let _ = idsweep::checks::has_valid_checksum(country, s.get(2..).unwrap_or(""));
        }
    }
});
