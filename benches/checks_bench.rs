use criterion::{Criterion, black_box, criterion_group, criterion_main};

use idsweep::checks::*;
use idsweep::core::Record;
use idsweep::validator::{IbanValidator, VatValidator};

const IBANS: [&str; 4] = [
    "GB82WEST12345698765432",
    "DE89370400440532013000",
    "NL91ABNA0417164300",
    "DE89370400440532013001",
];

const VAT_IDS: [&str; 8] = [
    "DE136695976",
    "ATU13585627",
    "CHE116281710MWST",
    "IT00743110157",
    "NL004495446B01",
    "BE0776091951",
    "SE556188840401",
    "FR12345678901",
];

const URLS: [&str; 4] = [
    "example.com",
    "https://www.example.com/about?lang=de",
    "http://10.0.0.1:8080/status",
    "not a url",
];

fn bench_iban(c: &mut Criterion) {
    c.bench_function("validate_iban", |b| {
        b.iter(|| {
            for iban in IBANS {
                let _ = black_box(validate_iban(black_box(iban)));
            }
        })
    });
}

fn bench_vat(c: &mut Criterion) {
    c.bench_function("check_vat_id", |b| {
        b.iter(|| {
            for id in VAT_IDS {
                let _ = black_box(check_vat_id(black_box(id)));
            }
        })
    });
}

fn bench_url(c: &mut Criterion) {
    c.bench_function("url_syntax", |b| {
        b.iter(|| {
            for url in URLS {
                black_box(is_valid_url_syntax(&with_default_scheme(black_box(url))));
            }
        })
    });
}

fn bench_fast_batch(c: &mut Criterion) {
    let ibans: Vec<Record> = (0..100)
        .map(|i| Record::new("IBAN", IBANS[i % IBANS.len()]))
        .collect();
    let vat_ids: Vec<Record> = (0..100)
        .map(|i| Record::new("VAT_ID", VAT_IDS[i % VAT_IDS.len()]))
        .collect();

    c.bench_function("fast_batch_100_ibans", |b| {
        b.iter(|| black_box(IbanValidator.validate(ibans.clone())))
    });
    let vat = VatValidator::new();
    c.bench_function("fast_batch_100_vat_ids", |b| {
        b.iter(|| black_box(vat.validate_fast(vat_ids.clone())))
    });
}

criterion_group!(benches, bench_iban, bench_vat, bench_url, bench_fast_batch);
criterion_main!(benches);
