use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use reading_log_enricher::common::constants::AUTHORS_OUTPUT_FILE;
use reading_log_enricher::config::Config;
use reading_log_enricher::infra::http_client::build_client;
use reading_log_enricher::logging;
use reading_log_enricher::observability::metrics;
use reading_log_enricher::pipeline::passes::{build_pass, PassKind};
use reading_log_enricher::pipeline::{run_pass_file, PassSummary};
use reading_log_enricher::record_store::RecordStore;
use reading_log_enricher::stats::{summarize, BookFilter, StatsReport};

#[derive(Parser)]
#[command(name = "reading_log_enricher")]
#[command(about = "Enrich a Goodreads library export with genre and author demographics")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file (defaults to enricher.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not wait between calls to the same source
    #[arg(long, global = true)]
    no_pacing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill genre, author and publication year from Open Library
    BooksDetail {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fill remaining genre and publication year from Google Books
    BooksSearch {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fill author gender, nationality and age when written
    Authors {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run all three passes, chaining each output into the next
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for the intermediate and final files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Count books per genre, year published, publisher and rating
    Stats {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Only books on this exclusive shelf (defaults to the configured shelf)
        #[arg(long, conflicts_with = "all_shelves")]
        shelf: Option<String>,
        /// Include books from every shelf
        #[arg(long)]
        all_shelves: bool,
        /// Only books rated at least this many stars
        #[arg(long)]
        min_rating: Option<i64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_summary(summary: &PassSummary, output: &Path) {
    println!("\n📊 Pass Results for {}:", summary.pass);
    println!("   Rows needing enrichment: {}", summary.rows_selected);
    println!("   Lookups: {}", summary.lookups);
    println!("   Empty lookups: {}", summary.empty_lookups);
    println!("   Skipped (no key): {}", summary.skipped_no_key);
    for (column, count) in &summary.filled {
        println!("   Filled {}: {}", column, count);
    }
    if summary.age_failures > 0 {
        println!("   Ages not computable: {}", summary.age_failures);
    }
    println!("   Output file: {}", output.display());
}

async fn run_single(
    kind: PassKind,
    config: &Config,
    client: &reqwest::Client,
    paced: bool,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let pass = build_pass(kind, config, client, paced);
    let summary = run_pass_file(&pass, input, output)
        .await
        .with_context(|| format!("{} pass failed on {}", kind, input.display()))?;
    print_summary(&summary, output);
    Ok(())
}

fn print_report(report: &StatsReport) {
    println!("\n📚 {} books", report.books);
    for breakdown in &report.breakdowns {
        println!("\n📊 Books by {}:", breakdown.column);
        for bucket in &breakdown.buckets {
            println!("   {}: {}", bucket.label, bucket.count);
        }
    }
}

fn run_stats(config: &Config, input: &Path, filter: &BookFilter, json: bool) -> Result<()> {
    let store = RecordStore::load(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let report = summarize(&store, filter, &config.columns, &config.stats);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn or_default(path: Option<PathBuf>, default: &str) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(default))
}

#[tokio::main]
async fn main() -> Result<()> {
    // --help and --version exit here, before any log file is created
    let cli = Cli::parse();

    dotenv().ok();
    let _log_guard = logging::init_logging();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let metrics_handle = match &config.metrics.snapshot_path {
        Some(_) => Some(metrics::init().context("Failed to initialize metrics")?),
        None => None,
    };

    let client = build_client(&config.http).context("Failed to build HTTP client")?;
    let paced = !cli.no_pacing;

    let result = match cli.command {
        Commands::BooksDetail { input, output } => {
            println!("📚 Running books-detail pass...");
            let kind = PassKind::BooksDetail;
            let input = or_default(input, kind.default_input());
            let output = or_default(output, kind.default_output());
            run_single(kind, &config, &client, paced, &input, &output).await
        }
        Commands::BooksSearch { input, output } => {
            println!("🔎 Running books-search pass...");
            let kind = PassKind::BooksSearch;
            let input = or_default(input, kind.default_input());
            let output = or_default(output, kind.default_output());
            run_single(kind, &config, &client, paced, &input, &output).await
        }
        Commands::Authors { input, output } => {
            println!("✍️  Running authors pass...");
            let kind = PassKind::Authors;
            let input = or_default(input, kind.default_input());
            let output = or_default(output, kind.default_output());
            run_single(kind, &config, &client, paced, &input, &output).await
        }
        Commands::Run { input, output_dir } => {
            println!("🚀 Running full enrichment (books-detail + books-search + authors)...");
            let mut current = or_default(input, PassKind::BooksDetail.default_input());
            let mut outcome = Ok(());
            for (step, kind) in PassKind::ALL.into_iter().enumerate() {
                println!("\n▶️  Step {}: {}", step + 1, kind);
                let output = output_dir.join(kind.default_output());
                outcome = run_single(kind, &config, &client, paced, &current, &output).await;
                if outcome.is_err() {
                    break;
                }
                current = output;
            }
            if outcome.is_ok() {
                println!("\n✅ Full enrichment completed: {}", current.display());
            }
            outcome
        }
        Commands::Stats {
            input,
            shelf,
            all_shelves,
            min_rating,
            json,
        } => {
            let input = or_default(input, AUTHORS_OUTPUT_FILE);
            let shelf = if all_shelves {
                None
            } else {
                Some(shelf.unwrap_or_else(|| config.stats.shelf.clone()))
            };
            let filter = BookFilter { shelf, min_rating };
            run_stats(&config, &input, &filter, json)
        }
    };

    if let (Some(handle), Some(path)) = (&metrics_handle, &config.metrics.snapshot_path) {
        if let Err(e) = metrics::write_snapshot(handle, path) {
            error!("Failed to write metrics snapshot: {}", e);
        }
    }

    if let Err(e) = &result {
        error!("Enrichment failed: {:#}", e);
        println!("❌ Enrichment failed: {:#}", e);
    } else {
        info!("Enrichment finished");
    }
    result
}
