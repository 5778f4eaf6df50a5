//! Vinyl inventory entry - command line runner
//!
//! ```text
//! vinyl-entry submit <batch.json>   submit a saved batch of draft rows
//! vinyl-entry import <stock.txt>    import a stock list as storage rows
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use shared::import::parse_stock_text;
use shared::models::DraftEntry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vinyl_entry::external::InventoryApiClient;
use vinyl_entry::services::{BatchOutcome, EntrySession, SubmissionPipeline};
use vinyl_entry::Config;

const USAGE: &str = "usage: vinyl-entry <submit <batch.json> | import <stock.txt>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vinyl_entry=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    tracing::info!("Environment: {}", config.environment);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rows = match args.as_slice() {
        [command, path] if command == "submit" => load_batch(Path::new(path))?,
        [command, path] if command == "import" => load_stock_list(Path::new(path))?,
        _ => bail!(USAGE),
    };

    let gateway = Arc::new(InventoryApiClient::new(&config.api)?);
    let pipeline = SubmissionPipeline::new(gateway, config.submission.clone());
    let mut session = EntrySession::with_rows(rows, &config.entry);

    tracing::info!("Loading inventory from {}", config.api.base_url);
    pipeline
        .refresh(&mut session)
        .await
        .context("Could not load inventory; allocation cannot be checked")?;

    match pipeline.submit_batch(&mut session).await {
        BatchOutcome::NothingToSubmit => {
            println!("No complete entries to submit");
            Ok(())
        }
        BatchOutcome::Rejected(messages) => {
            for message in &messages {
                println!("{}", message);
            }
            bail!("Batch rejected with {} validation errors", messages.len())
        }
        BatchOutcome::Submitted(summary) => {
            for result in summary.results.iter() {
                if let Some(warning) = &result.warning {
                    println!("Row {}: {}", result.position, warning);
                }
            }
            println!(
                "{} submitted, {} failed",
                summary.success_count, summary.fail_count
            );
            match summary.failure_message() {
                Some(message) => bail!(message),
                None => Ok(()),
            }
        }
    }
}

fn load_batch(path: &Path) -> anyhow::Result<Vec<DraftEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let rows: Vec<DraftEntry> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a batch of draft rows", path.display()))?;
    tracing::info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn load_stock_list(path: &Path) -> anyhow::Result<Vec<DraftEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let import = parse_stock_text(&text);
    for (line, error) in &import.errors {
        tracing::warn!("Line {} skipped: {}", line, error);
    }
    tracing::info!(
        "Parsed {} stock lines from {} ({} skipped)",
        import.lines.len(),
        path.display(),
        import.errors.len()
    );
    let imported_on = chrono::Local::now().date_naive();
    Ok(import
        .lines
        .iter()
        .map(|line| line.to_store_entry(imported_on))
        .collect())
}
