use crate::app::Services;
use crate::config::Config;
use crate::db::SqliteStore;
use anyhow::Result;
use std::sync::Arc;

/// Run one reconciliation sweep against the configured provider.
pub async fn handle_sweep_command() -> Result<()> {
    let config = Config::load()?;
    let store = Arc::new(SqliteStore::open_default()?);
    let services = Services::build(&config, store)?;

    let report = services.scheduler.sweep().await;

    println!("Sweep {}", report.sweep_id.as_deref().unwrap_or("-"));
    println!("  Bots polled:        {}", report.polled);
    println!("  Status transitions: {}", report.transitioned);
    println!("  Transcripts stored: {}", report.transcripts_stored);
    println!("  Not ready yet:      {}", report.not_ready);
    println!("  Errors:             {}", report.errors);

    if report.errors > 0 {
        println!("\nRun with --verbose for per-bot error details.");
    }
    Ok(())
}
