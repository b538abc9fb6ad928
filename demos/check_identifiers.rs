//! Local checks only: no network, no pipeline.
//!
//! Run with: `cargo run --example check_identifiers --no-default-features`

use idsweep::checks::*;

fn main() {
    println!("=== IBAN ===\n");
    for iban in [
        "GB82WEST12345698765432",
        "DE89370400440532013000",
        "DE89370400440532013001", // bad check digits
        "DEXX370400440532013000", // bad syntax
    ] {
        match validate_iban(iban) {
            Ok(()) => println!("  {iban} => ok"),
            Err(e) => println!("  {iban} => {e}"),
        }
    }

    println!("\n=== VAT ID ===\n");
    for id in [
        "DE136695976",
        "de 136695975",
        "ATU13585627",
        "CHE116281710MWST",
        "NL004495446B01",
        "FR12345678901", // format only
        "XX999999999",
    ] {
        match check_vat_id(id) {
            Ok(vat) => println!(
                "  {id:<18} => formal-ok (country={}, number={})",
                vat.country(),
                vat.number()
            ),
            Err(e) => println!("  {id:<18} => {e}"),
        }
    }

    println!("\n=== URL ===\n");
    for url in ["example.com", "https://www.example.com/about", "not a url"] {
        let candidate = with_default_scheme(url);
        if is_valid_url_syntax(&candidate) {
            println!("  {url:<30} => formal-ok, probe {}", force_secure_scheme(url));
        } else {
            println!("  {url:<30} => invalid syntax");
        }
    }
}
