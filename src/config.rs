//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.quakeboard.toml` files.

use crate::models::{MapView, Thresholds};
use crate::overlay::OverlayOptions;
use crate::session::SessionSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".quakeboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Fault overlay settings.
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Map viewport settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "quakeboard_report.md".to_string()
}

/// Dataset location and classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the GeoJSON dataset.
    #[serde(default)]
    pub path: Option<String>,

    /// Magnitude counted as a "strong" event.
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f64,

    /// Magnitude counted as a "major" event.
    #[serde(default = "default_major_threshold")]
    pub major_threshold: f64,

    /// Minimum magnitude listed in the major events table.
    #[serde(default = "default_strong_threshold")]
    pub min_magnitude: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            strong_threshold: default_strong_threshold(),
            major_threshold: default_major_threshold(),
            min_magnitude: default_strong_threshold(),
        }
    }
}

fn default_strong_threshold() -> f64 {
    5.0
}

fn default_major_threshold() -> f64 {
    6.0
}

/// Fault overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Load the overlay at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// URL or local path of the overlay GeoJSON.
    #[serde(default)]
    pub url: Option<String>,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

/// Map viewport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    /// Initial zoom level.
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Zoom level used when a major event is selected.
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            zoom: default_zoom(),
            focus_zoom: default_focus_zoom(),
        }
    }
}

// Sagaing Fault, central Myanmar
fn default_center_lat() -> f64 {
    21.9
}

fn default_center_lon() -> f64 {
    96.0
}

fn default_zoom() -> u8 {
    7
}

fn default_focus_zoom() -> u8 {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum rows in the major events table.
    #[serde(default = "default_top_events_limit")]
    pub top_events_limit: usize,

    /// Include per-event popup details.
    #[serde(default = "default_true")]
    pub include_popups: bool,

    /// Number of depth/magnitude pairs listed in the scatter section.
    #[serde(default = "default_scatter_sample")]
    pub scatter_sample: usize,

    /// Number of earthquake markers listed in the markers section.
    #[serde(default = "default_marker_sample")]
    pub marker_sample: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_events_limit: default_top_events_limit(),
            include_popups: true,
            scatter_sample: default_scatter_sample(),
            marker_sample: default_marker_sample(),
        }
    }
}

fn default_top_events_limit() -> usize {
    25
}

fn default_scatter_sample() -> usize {
    20
}

fn default_marker_sample() -> usize {
    100
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.dataset.path = Some(data.display().to_string());
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(min_magnitude) = args.min_magnitude {
            self.dataset.min_magnitude = min_magnitude;
        }
        if let Some(top) = args.top {
            self.report.top_events_limit = top;
        }

        if let Some(ref overlay) = args.overlay {
            self.overlay.url = Some(overlay.clone());
        }
        if let Some(timeout) = args.timeout {
            self.overlay.timeout_seconds = timeout;
        }
        if args.no_overlay {
            self.overlay.enabled = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level from the merged verbosity settings; `quiet` wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Overlay source to load, if the overlay is enabled and configured.
    pub fn overlay_source(&self) -> Option<&str> {
        if self.overlay.enabled {
            self.overlay.url.as_deref()
        } else {
            None
        }
    }

    /// Options for the overlay fetcher.
    pub fn overlay_options(&self, show_progress: bool) -> OverlayOptions {
        OverlayOptions {
            timeout_seconds: self.overlay.timeout_seconds,
            show_progress,
        }
    }

    /// Settings for the dashboard session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            thresholds: Thresholds {
                strong: self.dataset.strong_threshold,
                major: self.dataset.major_threshold,
            },
            min_magnitude: self.dataset.min_magnitude,
            initial_view: MapView {
                center_lat: self.map.center_lat,
                center_lon: self.map.center_lon,
                zoom: self.map.zoom,
            },
            focus_zoom: self.map.focus_zoom,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
