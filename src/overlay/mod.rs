//! Fault overlay loading.

pub mod fetcher;

pub use fetcher::{load_overlay, OverlayOptions};
