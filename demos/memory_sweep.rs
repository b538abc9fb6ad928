//! Run both sweeps over an in-memory backlog.
//!
//! URLs are probed for real; set `IDSWEEP_VAT_ACCESS_KEY` to verify VAT IDs
//! against the configured service, otherwise they stay `formal-ok`.
//!
//! Run with: `cargo run --example memory_sweep`

use idsweep::config::Config;
use idsweep::core::Record;
use idsweep::orchestrator::{BatchSettings, Orchestrator};
use idsweep::store::MemoryStore;
use idsweep::validator::Registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::default();
    config.batching.fast_batch_size = 2;
    config.apply_env();
    config.validate()?;

    let store = MemoryStore::new(vec![
        Record::new("URL", "example.com"),
        Record::new("URL", "https://www.rust-lang.org"),
        Record::new("URL", "not a url"),
        Record::new("IBAN", "GB82WEST12345698765432"),
        Record::new("IBAN", "DE89370400440532013001"),
        Record::new("VAT_ID", "DE136695976"),
        Record::new("VAT_ID", "DE136695975"),
        Record::new("PHONE", "+49 30 1234567"),
    ]);

    let orchestrator = Orchestrator::new(
        store,
        Registry::from_config(&config)?,
        BatchSettings::from_config(&config),
    );
    let report = orchestrator.run().await?;

    println!(
        "fast: {} records / {} rounds, slow: {} records / {} rounds\n",
        report.fast.records, report.fast.rounds, report.slow.records, report.slow.rounds
    );
    for record in orchestrator.store().snapshot() {
        println!(
            "  {:<7} {:<28} {:<10} {}",
            record.classification.to_string(),
            record.value,
            record.status.to_string(),
            record.status_message
        );
    }
    Ok(())
}
