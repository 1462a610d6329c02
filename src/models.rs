//! Data models for the seismicity dashboard.
//!
//! This module contains the core data structures used throughout the
//! application: seismic events, the derived statistics computed from them,
//! the fault overlay, and the dashboard report.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one day.
pub const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Pass-through metadata: string key/value pairs in document order.
///
/// Only the report layer iterates these; the aggregation core never looks
/// inside.
pub type Metadata = Vec<(String, String)>;

/// Convert epoch milliseconds to a UTC timestamp.
///
/// Out-of-range values collapse to the Unix epoch; the dataset loader
/// rejects them before they reach here.
pub fn datetime_from_ms(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default()
}

/// A single recorded seismic occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    /// Feature id from the source catalogue, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Richter-scale magnitude.
    pub magnitude: f64,
    /// Hypocentre depth in kilometres (non-negative).
    pub depth_km: f64,
    /// Origin time in epoch milliseconds (UTC).
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable location description.
    pub place: String,
    /// Number of "felt" reports submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub felt_reports: Option<u32>,
    /// Link to the event page in the source catalogue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl SeismicEvent {
    /// Origin time as a UTC timestamp.
    pub fn time(&self) -> DateTime<Utc> {
        datetime_from_ms(self.timestamp_ms)
    }

    /// UTC calendar date of the event.
    pub fn date(&self) -> NaiveDate {
        self.time().date_naive()
    }

    /// Magnitude class used for bucketing and map markers.
    pub fn magnitude_class(&self) -> MagnitudeClass {
        MagnitudeClass::from_magnitude(self.magnitude)
    }

    /// Popup text for the event's map marker, title first.
    ///
    /// Felt reports are listed only when at least one was submitted.
    pub fn popup_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("M {} Earthquake", self.magnitude),
            format!("Location: {}", self.place),
            format!("Date: {}", self.time().format("%b %-d, %Y, %H:%M UTC")),
            format!("Depth: {:.1} km", self.depth_km),
            format!("Coords: {:.4}°N, {:.4}°E", self.latitude, self.longitude),
        ];

        if let Some(felt) = self.felt_reports.filter(|&felt| felt > 0) {
            lines.push(format!("Felt Reports: {}", felt));
        }
        if let Some(ref url) = self.reference_url {
            lines.push(format!("[View on USGS →]({})", url));
        }

        lines
    }
}

/// Styled map marker for one event on the earthquake layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    /// Circle radius in pixels.
    pub radius: u8,
    /// Fill colour as a hex string.
    pub color: String,
    pub popup: Vec<String>,
}

impl Marker {
    pub fn for_event(event: &SeismicEvent) -> Self {
        let class = event.magnitude_class();
        Self {
            latitude: event.latitude,
            longitude: event.longitude,
            magnitude: event.magnitude,
            radius: class.marker_radius(),
            color: class.color().to_string(),
            popup: event.popup_lines(),
        }
    }
}

/// Magnitude band of an event.
///
/// Classification is first-match from the top band down, so every value
/// (including anything below 2.5) lands in exactly one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeClass {
    /// M 2.5-3.9 (and anything lower)
    Minor,
    /// M 4.0-4.9
    Light,
    /// M 5.0-5.9
    Moderate,
    /// M 6.0-6.9
    Strong,
    /// M 7.0+
    Major,
}

impl MagnitudeClass {
    /// All classes, lowest band first.
    pub const ALL: [MagnitudeClass; 5] = [
        MagnitudeClass::Minor,
        MagnitudeClass::Light,
        MagnitudeClass::Moderate,
        MagnitudeClass::Strong,
        MagnitudeClass::Major,
    ];

    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude >= 7.0 {
            MagnitudeClass::Major
        } else if magnitude >= 6.0 {
            MagnitudeClass::Strong
        } else if magnitude >= 5.0 {
            MagnitudeClass::Moderate
        } else if magnitude >= 4.0 {
            MagnitudeClass::Light
        } else {
            MagnitudeClass::Minor
        }
    }

    /// Position of this class in [`MagnitudeClass::ALL`].
    pub fn index(&self) -> usize {
        match self {
            MagnitudeClass::Minor => 0,
            MagnitudeClass::Light => 1,
            MagnitudeClass::Moderate => 2,
            MagnitudeClass::Strong => 3,
            MagnitudeClass::Major => 4,
        }
    }

    /// Chart label for the band.
    pub fn label(&self) -> &'static str {
        match self {
            MagnitudeClass::Minor => "M 2.5-3.9",
            MagnitudeClass::Light => "M 4.0-4.9",
            MagnitudeClass::Moderate => "M 5.0-5.9",
            MagnitudeClass::Strong => "M 6.0-6.9",
            MagnitudeClass::Major => "M 7.0+",
        }
    }

    /// Map marker radius in pixels.
    pub fn marker_radius(&self) -> u8 {
        match self {
            MagnitudeClass::Minor => 4,
            MagnitudeClass::Light => 6,
            MagnitudeClass::Moderate => 8,
            MagnitudeClass::Strong => 11,
            MagnitudeClass::Major => 14,
        }
    }

    /// Map marker and chart fill colour.
    pub fn color(&self) -> &'static str {
        match self {
            MagnitudeClass::Minor => "#FFA07A",
            MagnitudeClass::Light => "#FF6347",
            MagnitudeClass::Moderate => "#FF4500",
            MagnitudeClass::Strong => "#DC143C",
            MagnitudeClass::Major => "#8B0000",
        }
    }
}

impl fmt::Display for MagnitudeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Depth band of an event. Upper edges are inclusive except for the top band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthBand {
    UpTo10,
    UpTo20,
    UpTo30,
    Over30,
}

impl DepthBand {
    pub const ALL: [DepthBand; 4] = [
        DepthBand::UpTo10,
        DepthBand::UpTo20,
        DepthBand::UpTo30,
        DepthBand::Over30,
    ];

    pub fn from_depth(depth_km: f64) -> Self {
        if depth_km <= 10.0 {
            DepthBand::UpTo10
        } else if depth_km <= 20.0 {
            DepthBand::UpTo20
        } else if depth_km <= 30.0 {
            DepthBand::UpTo30
        } else {
            DepthBand::Over30
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DepthBand::UpTo10 => 0,
            DepthBand::UpTo20 => 1,
            DepthBand::UpTo30 => 2,
            DepthBand::Over30 => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DepthBand::UpTo10 => "0-10 km",
            DepthBand::UpTo20 => "10-20 km",
            DepthBand::UpTo30 => "20-30 km",
            DepthBand::Over30 => "30+ km",
        }
    }
}

/// One labeled bin of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub label: String,
    pub count: usize,
}

/// Ordered mapping from a fixed set of labeled ranges to counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub bins: Vec<Bin>,
}

impl Distribution {
    /// Build a distribution from `(label, count)` pairs, keeping their order.
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        Self {
            bins: counts
                .into_iter()
                .map(|(label, count)| Bin {
                    label: label.to_string(),
                    count,
                })
                .collect(),
        }
    }

    /// Count for a label, if the label exists.
    #[allow(dead_code)] // Lookup by label for consumers of the JSON report
    pub fn get(&self, label: &str) -> Option<usize> {
        self.bins.iter().find(|b| b.label == label).map(|b| b.count)
    }

    /// Sum of all bin counts.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    #[allow(dead_code)] // Lookup by label for consumers of the JSON report
    pub fn labels(&self) -> Vec<&str> {
        self.bins.iter().map(|b| b.label.as_str()).collect()
    }
}

/// Calendar year and month (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Chart label such as `Mar 2025`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// A `(key, value)` point of a derived time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint<K> {
    pub key: K,
    pub value: usize,
}

/// A `(depth, magnitude)` point for the correlation scatter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub depth_km: f64,
    pub magnitude: f64,
}

/// Magnitude thresholds used for the "strong" and "major" counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub strong: f64,
    pub major: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            strong: 5.0,
            major: 6.0,
        }
    }
}

/// Summary statistics over a non-empty dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub mean_magnitude: f64,
    pub min_depth_km: f64,
    pub max_depth_km: f64,
    pub mean_depth_km: f64,
    /// Events at or above the strong threshold.
    pub strong_events: usize,
    /// Events at or above the major threshold.
    pub major_events: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Time between first and last event, in fractional days.
    pub duration_days: f64,
    /// `count / max(duration_days, 1)`.
    pub daily_rate: f64,
}

/// Shallow / intermediate / deep split of event depths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthClasses {
    /// depth <= 10 km
    pub shallow: usize,
    /// 10 km < depth <= 30 km
    pub intermediate: usize,
    /// depth > 30 km
    pub deep: usize,
}

/// Summary values formatted for the fixed dashboard fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub total_events: String,
    pub max_magnitude: String,
    pub strong_events: String,
    pub avg_depth: String,
    pub daily_avg: String,
}

impl DisplayFields {
    /// Placeholder for a field whose statistic is unavailable.
    pub const ABSENT: &'static str = "—";

    /// Format the display fields. Count-based fields are always present;
    /// the others are absent when there is no summary.
    pub fn new(total_events: usize, strong_events: usize, summary: Option<&SummaryStats>) -> Self {
        let absent = || Self::ABSENT.to_string();
        Self {
            total_events: total_events.to_string(),
            max_magnitude: summary.map_or_else(absent, |s| format!("{:.1}", s.max_magnitude)),
            strong_events: strong_events.to_string(),
            avg_depth: summary.map_or_else(absent, |s| format!("{:.1}", s.mean_depth_km)),
            daily_avg: summary.map_or_else(absent, |s| format!("{:.2}", s.daily_rate)),
        }
    }
}

/// Every derived structure the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// `None` when the dataset is empty.
    pub summary: Option<SummaryStats>,
    pub display: DisplayFields,
    pub magnitude_distribution: Distribution,
    pub depth_distribution: Distribution,
    pub depth_classes: DepthClasses,
    pub daily_counts: Vec<SeriesPoint<NaiveDate>>,
    pub monthly_counts: Vec<SeriesPoint<YearMonth>>,
    /// Cumulative count keyed by epoch milliseconds.
    pub cumulative: Vec<SeriesPoint<i64>>,
    pub scatter: Vec<ScatterPoint>,
    /// Events at or above the table threshold, strongest first.
    pub major_events: Vec<SeismicEvent>,
    /// One marker per event, in dataset order.
    pub markers: Vec<Marker>,
}

/// A map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl MapView {
    /// A view centred on an event.
    pub fn centered_on(event: &SeismicEvent, zoom: u8) -> Self {
        Self {
            center_lat: event.latitude,
            center_lon: event.longitude,
            zoom,
        }
    }
}

/// One line or polygon of the fault overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayFeature {
    /// GeoJSON geometry type (`LineString`, `MultiPolygon`, ...).
    pub geometry_type: String,
    pub metadata: Metadata,
}

/// Auxiliary geographic overlay (fault traces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub source: String,
    pub features: Vec<OverlayFeature>,
}

/// Outcome of the one-time overlay load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OverlayStatus {
    Loaded(Overlay),
    Absent { reason: String },
}

impl OverlayStatus {
    pub fn absent(reason: impl Into<String>) -> Self {
        OverlayStatus::Absent {
            reason: reason.into(),
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            OverlayStatus::Loaded(overlay) => Some(overlay),
            OverlayStatus::Absent { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.overlay().is_some()
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the dataset file.
    pub dataset_source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Minimum magnitude for the major events table.
    pub min_magnitude: f64,
    /// Time spent loading and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
    pub overlay: OverlayStatus,
    pub initial_view: MapView,
    /// Zoom used when a major event row is selected.
    pub focus_zoom: u8,
    /// View for each row of the major events table, in table order.
    pub focus_views: Vec<MapView>,
    pub earthquakes_visible: bool,
    pub faults_visible: bool,
}
