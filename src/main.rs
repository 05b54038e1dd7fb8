use anyhow::Result;
use clap::Parser;
use data_cleaning::config::EtlConfig;
use data_cleaning::{logging, metrics};
use data_cleaning::pipeline::{LoadOutcome, Pipeline, QueryOutcome};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "data_cleaning")]
#[command(about = "Clean CSV extracts, load them into SQLite and run the analytical queries")]
#[command(version)]
struct Cli {
    /// TOML config file. Without it, ETL_CONFIG or ./etl.toml is used, else the built-in layout.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = EtlConfig::resolve(cli.config.as_deref())?;
    let _log_guard = logging::init_logging(&config.logging)?;
    debug!("Using config: {:?}", config);
    let metrics_sink = metrics::init_metrics();

    let summary = Pipeline::run(&config)?;

    for (table, outcome) in &summary.tables {
        match outcome {
            LoadOutcome::Loaded { rows, dropped, .. } => {
                info!("  {}: {} rows loaded ({} dropped)", table, rows, dropped)
            }
            other => info!("  {}: {:?}", table, other),
        }
    }
    for (query, outcome) in &summary.queries {
        match outcome {
            QueryOutcome::Written { rows, result_file } => {
                info!("  {}: {} rows -> {}", query, rows, result_file.display())
            }
            other => info!("  {}: {:?}", query, other),
        }
    }

    if let Some((handle, path)) = metrics_sink {
        match metrics::write_snapshot(&handle, &path) {
            Ok(()) => info!("Metrics snapshot written to '{}'", path.display()),
            Err(e) => warn!("Failed to write metrics snapshot '{}': {}", path.display(), e),
        }
    }
    Ok(())
}
