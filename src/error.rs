//! Error types for dataset loading, aggregation and overlay fetching.
//!
//! Dataset and aggregation errors surface to the caller. Overlay errors
//! never do: the overlay fetcher folds them into an absent overlay.

use std::path::PathBuf;

/// Errors raised while loading or validating the event dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON.
    #[error("dataset is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but is not a GeoJSON feature collection.
    #[error("dataset is not a GeoJSON FeatureCollection (type: {found})")]
    NotFeatureCollection {
        /// The `type` member that was found, or `missing`.
        found: String,
    },

    /// A feature is missing a required field or carries an out-of-range value.
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature {
        /// Position of the feature in the `features` array.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised by statistics that need at least one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("dataset is empty: summary statistics require at least one event")]
    EmptyDataset,
}

/// Reasons an overlay could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to {0}")]
    Connect(String),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("overlay is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("overlay is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}
