//! One-time overlay download with graceful degradation.
//!
//! The overlay is a nice-to-have: any failure is logged and reported as
//! [`OverlayStatus::Absent`] so the dashboard renders without it.

use crate::error::OverlayError;
use crate::models::{Overlay, OverlayFeature, OverlayStatus};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for loading the overlay.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// HTTP request timeout.
    pub timeout_seconds: u64,
    /// Whether to show a spinner while downloading.
    pub show_progress: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            show_progress: true,
        }
    }
}

/// Load the overlay from a URL or local path.
///
/// Never fails: a missing source or any load error yields `Absent` with the
/// reason, plus a diagnostic log line.
pub async fn load_overlay(source: Option<&str>, options: &OverlayOptions) -> OverlayStatus {
    let Some(source) = source else {
        debug!("No overlay source configured");
        return OverlayStatus::absent("no overlay source configured");
    };

    match fetch_overlay(source, options).await {
        Ok(overlay) => {
            info!(
                "Loaded {} overlay features from {}",
                overlay.features.len(),
                source
            );
            OverlayStatus::Loaded(overlay)
        }
        Err(e) => {
            warn!("Could not load overlay data from {}: {}", source, e);
            OverlayStatus::absent(e.to_string())
        }
    }
}

/// Whether the source should be fetched over HTTP.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_overlay(source: &str, options: &OverlayOptions) -> Result<Overlay, OverlayError> {
    let text = if is_remote(source) {
        fetch_remote(source, options).await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| OverlayError::Io {
                path: Path::new(source).to_path_buf(),
                source: e,
            })?
    };

    parse_overlay(&text, source)
}

async fn fetch_remote(url: &str, options: &OverlayOptions) -> Result<String, OverlayError> {
    debug!("Fetching overlay: {}", url);

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Downloading fault overlay...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = download(url, options.timeout_seconds).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result
}

async fn download(url: &str, timeout_seconds: u64) -> Result<String, OverlayError> {
    let response = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?
        .get(url)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                OverlayError::Timeout(timeout_seconds)
            } else if e.is_connect() {
                OverlayError::Connect(url.to_string())
            } else {
                OverlayError::Http(e)
            }
        })?;

    if !response.status().is_success() {
        return Err(OverlayError::Status(response.status().as_u16()));
    }

    Ok(response.text().await?)
}

/// Parse a GeoJSON feature collection of lines/polygons.
pub fn parse_overlay(text: &str, source: &str) -> Result<Overlay, OverlayError> {
    let document: Value = serde_json::from_str(text)?;

    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(OverlayError::NotFeatureCollection);
    }

    let features = document
        .get("features")
        .and_then(Value::as_array)
        .map(|features| features.iter().map(parse_feature).collect())
        .unwrap_or_default();

    Ok(Overlay {
        source: source.to_string(),
        features,
    })
}

fn parse_feature(feature: &Value) -> OverlayFeature {
    let geometry_type = feature
        .get("geometry")
        .and_then(|g| g.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let metadata = feature
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(key, value)| metadata_value(value).map(|v| (key.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    OverlayFeature {
        geometry_type,
        metadata,
    }
}

/// Render a property value for display, skipping empty ones.
fn metadata_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        other => Some(other.to_string()),
    }
}
