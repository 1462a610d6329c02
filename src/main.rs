//! Quakeboard - Seismicity dashboard generator
//!
//! A CLI tool that loads a static earthquake catalogue, aggregates it into
//! summary statistics, distributions and time series, and writes a
//! dashboard report. A fault overlay is fetched once and omitted on failure.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing dataset, malformed dataset, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod overlay;
mod report;
mod session;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{DisplayFields, ReportMetadata};
use report::ReportOptions;
use session::DashboardSession;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration is loaded before logging so `[general] verbose` applies
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet))?;

    info!("Quakeboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_dashboard(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard generation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .quakeboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the dataset path, overlay URL, thresholds and map view.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// `RUST_LOG` wins over the verbosity settings when it is set.
fn init_logging(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete dashboard workflow. Returns the exit code.
async fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load the dataset
    let data_path = dataset_path(&config)?;
    println!("📥 Loading dataset: {}", data_path.display());
    let dataset = dataset::load_dataset(&data_path)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    if dataset.is_empty() {
        warn!("Dataset contains no events");
    }

    // Step 2: Fetch the fault overlay, once
    if let Some(source) = config.overlay_source() {
        println!("🗺️  Loading fault overlay: {}", source);
    }
    let overlay =
        overlay::load_overlay(config.overlay_source(), &config.overlay_options(!args.quiet)).await;

    // Step 3: Aggregate
    println!("\n🔬 Aggregating {} events...", dataset.len());
    let mut session = DashboardSession::new(dataset, overlay, config.session_settings());
    for layer in &args.hide {
        session.set_layer_visible(*layer, false);
        debug!("Hiding layer: {:?}", layer);
    }
    let display = session.dashboard().display.clone();

    // Step 4: Build and save the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        dataset_source: session.dataset().source().to_string(),
        generated_at: Utc::now(),
        min_magnitude: session.settings().min_magnitude,
        duration_seconds: duration,
    };
    let report = session.to_report(metadata);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &ReportOptions::from(&config.report))
        }
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&display, &session, duration);
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Print the header statistics to the console.
fn print_summary(display: &DisplayFields, session: &DashboardSession, duration: f64) {
    let dashboard = session.dashboard();

    println!("\n📊 Dashboard Summary:");
    println!("   Total events: {}", display.total_events);
    println!("   Max magnitude: {}", display.max_magnitude);
    println!("   Strong events: {}", display.strong_events);
    println!("   Avg depth (km): {}", display.avg_depth);
    println!("   Daily average: {}", display.daily_avg);
    println!(
        "   Major events (M ≥ {}): {}",
        session.settings().min_magnitude,
        dashboard.major_events.len()
    );
    match session.overlay().overlay() {
        Some(overlay) => println!("   Fault overlay: {} features", overlay.features.len()),
        None => println!("   Fault overlay: not shown"),
    }
    println!("   Duration: {:.1}s", duration);
}

/// Resolve the dataset path from the merged configuration.
fn dataset_path(config: &Config) -> Result<PathBuf> {
    config
        .dataset
        .path
        .as_ref()
        .map(PathBuf::from)
        .ok_or_else(|| {
            anyhow!(
                "No dataset given. Pass --data or set [dataset] path in {}",
                CONFIG_FILE_NAME
            )
        })
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go to stderr. Returns the
/// path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
