//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::overlay::fetcher::is_remote;
use crate::session::Layer;
use clap::Parser;
use std::path::PathBuf;

/// Quakeboard - seismicity dashboard generator
///
/// Loads a static earthquake dataset (GeoJSON), computes summary
/// statistics, distributions and time series, and writes a dashboard
/// report in Markdown or JSON. An optional fault overlay is fetched
/// once at startup and silently omitted if it cannot be loaded.
///
/// Examples:
///   quakeboard --data quakes.geojson
///   quakeboard --data quakes.geojson --overlay https://example.com/faults.geojson
///   quakeboard --data earthquakes.js --format json -o dashboard.json
///   quakeboard --data quakes.geojson --min-magnitude 6 --top 10
///   quakeboard --data quakes.geojson --hide faults
///   quakeboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Earthquake dataset (GeoJSON FeatureCollection)
    ///
    /// Plain GeoJSON or a JavaScript file of the form
    /// `const earthquakeData = {...};`. Falls back to `[dataset] path`
    /// in the config file.
    #[arg(short, long, value_name = "FILE", env = "QUAKEBOARD_DATA")]
    pub data: Option<PathBuf>,

    /// Fault overlay GeoJSON (URL or local path)
    #[arg(long, value_name = "URL", env = "QUAKEBOARD_OVERLAY_URL")]
    pub overlay: Option<String>,

    /// Skip loading the fault overlay, even if one is configured
    #[arg(long)]
    pub no_overlay: bool,

    /// Map layers to hide in the report (earthquakes, faults)
    #[arg(long, value_name = "LAYER", value_delimiter = ',')]
    pub hide: Vec<Layer>,

    /// Output file path for the report
    ///
    /// Default: from config or quakeboard_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Minimum magnitude for the major events table
    #[arg(long, value_name = "MAG")]
    pub min_magnitude: Option<f64>,

    /// Maximum number of rows in the major events table
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Overlay download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .quakeboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .quakeboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Dataset file does not exist: {}", data.display()));
            }
            if !data.is_file() {
                return Err(format!("Dataset path is not a file: {}", data.display()));
            }
        }

        // Local paths are allowed; a missing file just means no overlay.
        if let Some(ref overlay) = self.overlay {
            if overlay.contains("://") && !is_remote(overlay) {
                return Err("Overlay URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(min_magnitude) = self.min_magnitude {
            if !(0.0..=10.0).contains(&min_magnitude) {
                return Err("Minimum magnitude must be between 0.0 and 10.0".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

}
