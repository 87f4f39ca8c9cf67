use aggregation::{AggregationEngine, EngineSettings};
use anyhow::Context;
use api_client::DatastreamClient;
use catalog::{EntityRegistry, MetricCatalog};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

mod logging;
mod render;

/// The main entry point for the Sector Monitor.
#[tokio::main]
async fn main() {
    // A missing .env is fine; credentials may come from the real environment.
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Snapshot(args) => handle_snapshot(args).await,
        Commands::Catalog => handle_catalog(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Sector-level market dashboard built from Datastream time series.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query every catalog metric for the tracked sectors and print the report.
    Snapshot(SnapshotArgs),
    /// List the metric catalog.
    Catalog,
}

#[derive(Parser)]
struct SnapshotArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Restrict the report to these sectors (comma separated, e.g. "Technology,Energy").
    #[arg(long, value_delimiter = ',')]
    sectors: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// ==============================================================================
// Snapshot Command Logic
// ==============================================================================

/// Loads configuration, builds one snapshot and prints it.
async fn handle_snapshot(args: SnapshotArgs) -> anyhow::Result<()> {
    let config = configuration::load_config(&args.config)
        .with_context(|| format!("Failed to load configuration from '{}'", args.config))?;
    let _log_guard = logging::init_logging(&config.logging);

    // Registry and catalog are validated before any query is sent.
    let registry = EntityRegistry::sectors()?;
    let registry = if args.sectors.is_empty() {
        registry
    } else {
        registry.select(args.sectors.as_slice())?
    };
    let catalog = MetricCatalog::standard()?;

    let client = DatastreamClient::new(&config.datastream)?;
    let engine = AggregationEngine::new(Arc::new(client), EngineSettings::from(&config.snapshot));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!(
        "Running {} queries for {} sectors...",
        catalog.query_count(),
        registry.len()
    ));

    let result = engine.build_snapshot(registry.list_entities(), &catalog).await;
    spinner.finish_and_clear();
    let snapshot = result.context("Snapshot failed")?;

    let table = report::assemble(&snapshot.records, catalog.layout())?;

    match args.format {
        OutputFormat::Table => {
            println!(
                "Sector Monitor - {}",
                snapshot.as_of.format("%Y-%m-%d %H:%M UTC")
            );
            println!("{}", render::render_table(&table));
            if snapshot.is_degraded() {
                eprintln!("{} metric queries returned no data:", snapshot.warnings.len());
                for warning in &snapshot.warnings {
                    eprintln!("  warning: {}", render::warning_line(warning));
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", render::render_json(&snapshot, &table)?);
        }
    }

    Ok(())
}

// ==============================================================================
// Catalog Command Logic
// ==============================================================================

fn handle_catalog() -> anyhow::Result<()> {
    let catalog = MetricCatalog::standard()?;
    println!("{}", render::render_catalog(&catalog));
    println!(
        "{} metrics, {} composites, {} queries per snapshot",
        catalog.list_metrics().len(),
        catalog.composites().len(),
        catalog.query_count()
    );
    Ok(())
}
