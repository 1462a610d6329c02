//! Event dataset loading.
//!
//! The dataset is read once at startup and never mutated afterwards. All
//! derived data is computed from the borrowed event slice.

pub mod loader;

pub use loader::load_dataset;

use crate::models::SeismicEvent;

/// Immutable collection of seismic events loaded from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: String,
    events: Vec<SeismicEvent>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, events: Vec<SeismicEvent>) -> Self {
        Self {
            source: source.into(),
            events,
        }
    }

    /// Where the dataset was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn events(&self) -> &[SeismicEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
