//! Dashboard rendering session.
//!
//! Owns everything the renderers need: the loaded dataset, the overlay
//! outcome, the map viewport settings and the layer toggles. Derived data
//! is computed once on first access and reused, since the dataset never
//! changes after load.

use crate::analysis::{
    bucket_by_depth, bucket_by_magnitude, compute_summary_with, count_at_or_above,
    cumulative_series, daily_counts, depth_classes, event_markers, magnitude_depth_pairs,
    monthly_counts, top_events,
};
use crate::dataset::Dataset;
use crate::models::{
    Dashboard, DisplayFields, MapView, OverlayStatus, Report, ReportMetadata, SeismicEvent,
    Thresholds,
};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Settings that shape the derived data and map behaviour.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub thresholds: Thresholds,
    /// Minimum magnitude for the major events table.
    pub min_magnitude: f64,
    pub initial_view: MapView,
    /// Zoom applied when a major event is selected.
    pub focus_zoom: u8,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            min_magnitude: 5.0,
            initial_view: MapView {
                center_lat: 21.9,
                center_lon: 96.0,
                zoom: 7,
            },
            focus_zoom: 10,
        }
    }
}

/// Toggleable map layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layer {
    Earthquakes,
    Faults,
}

/// Compute every derived structure for a set of events.
pub fn build_dashboard(events: &[SeismicEvent], settings: &SessionSettings) -> Dashboard {
    let summary = match compute_summary_with(events, &settings.thresholds) {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!("Summary statistics unavailable: {}", e);
            None
        }
    };

    let strong_events = count_at_or_above(events, settings.thresholds.strong);

    Dashboard {
        display: DisplayFields::new(events.len(), strong_events, summary.as_ref()),
        summary,
        magnitude_distribution: bucket_by_magnitude(events),
        depth_distribution: bucket_by_depth(events),
        depth_classes: depth_classes(events),
        daily_counts: daily_counts(events),
        monthly_counts: monthly_counts(events),
        cumulative: cumulative_series(events),
        scatter: magnitude_depth_pairs(events),
        major_events: top_events(events, settings.min_magnitude)
            .into_iter()
            .cloned()
            .collect(),
        markers: event_markers(events),
    }
}

/// A dashboard over one immutable dataset.
pub struct DashboardSession {
    dataset: Dataset,
    overlay: OverlayStatus,
    settings: SessionSettings,
    dashboard: OnceLock<Dashboard>,
    earthquakes_visible: bool,
    faults_visible: bool,
}

impl DashboardSession {
    pub fn new(dataset: Dataset, overlay: OverlayStatus, settings: SessionSettings) -> Self {
        let faults_visible = overlay.is_loaded();
        Self {
            dataset,
            overlay,
            settings,
            dashboard: OnceLock::new(),
            earthquakes_visible: true,
            faults_visible,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn overlay(&self) -> &OverlayStatus {
        &self.overlay
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Derived data, computed on first call.
    pub fn dashboard(&self) -> &Dashboard {
        self.dashboard.get_or_init(|| {
            debug!("Aggregating {} events", self.dataset.len());
            build_dashboard(self.dataset.events(), &self.settings)
        })
    }

    /// The map view shown before any interaction.
    pub fn initial_view(&self) -> MapView {
        self.settings.initial_view
    }

    /// View centred on the `rank`-th row of the major events table.
    pub fn focus_event(&self, rank: usize) -> Option<MapView> {
        self.dashboard()
            .major_events
            .get(rank)
            .map(|event| MapView::centered_on(event, self.settings.focus_zoom))
    }

    /// Show or hide a layer and return whether it is now visible.
    ///
    /// The fault layer stays hidden when the overlay did not load.
    pub fn set_layer_visible(&mut self, layer: Layer, visible: bool) -> bool {
        match layer {
            Layer::Earthquakes => {
                self.earthquakes_visible = visible;
                self.earthquakes_visible
            }
            Layer::Faults => {
                self.faults_visible = visible && self.overlay.is_loaded();
                self.faults_visible
            }
        }
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        match layer {
            Layer::Earthquakes => self.earthquakes_visible,
            Layer::Faults => self.faults_visible,
        }
    }

    /// Snapshot the session into a serializable report.
    pub fn to_report(&self, metadata: ReportMetadata) -> Report {
        Report {
            metadata,
            dashboard: self.dashboard().clone(),
            overlay: self.overlay.clone(),
            initial_view: self.initial_view(),
            focus_zoom: self.settings.focus_zoom,
            focus_views: (0..self.dashboard().major_events.len())
                .filter_map(|rank| self.focus_event(rank))
                .collect(),
            earthquakes_visible: self.is_layer_visible(Layer::Earthquakes),
            faults_visible: self.is_layer_visible(Layer::Faults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Overlay, OverlayFeature};

    fn create_test_event(magnitude: f64, depth_km: f64, lat: f64, lon: f64) -> SeismicEvent {
        SeismicEvent {
            id: None,
            magnitude,
            depth_km,
            timestamp_ms: 1_743_120_000_000,
            latitude: lat,
            longitude: lon,
            place: "Myanmar".to_string(),
            felt_reports: None,
            reference_url: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            "test",
            vec![
                create_test_event(5.2, 12.0, 21.5, 95.9),
                create_test_event(7.7, 10.0, 22.0, 95.9),
                create_test_event(4.1, 35.0, 20.1, 96.2),
            ],
        )
    }

    fn loaded_overlay() -> OverlayStatus {
        OverlayStatus::Loaded(Overlay {
            source: "faults.geojson".to_string(),
            features: vec![OverlayFeature {
                geometry_type: "LineString".to_string(),
                metadata: vec![("name".to_string(), "Sagaing Fault".to_string())],
            }],
        })
    }

    #[test]
    fn test_dashboard_is_cached() {
        let session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        let first = session.dashboard() as *const Dashboard;
        let second = session.dashboard() as *const Dashboard;
        assert_eq!(first, second);
    }

    #[test]
    fn test_dashboard_contents() {
        let session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        let dashboard = session.dashboard();

        assert_eq!(dashboard.summary.as_ref().map(|s| s.count), Some(3));
        assert_eq!(dashboard.display.max_magnitude, "7.7");
        assert_eq!(dashboard.display.strong_events, "2");
        assert_eq!(dashboard.magnitude_distribution.total(), 3);
        assert_eq!(dashboard.cumulative.last().map(|p| p.value), Some(3));
        assert_eq!(dashboard.major_events.len(), 2);
        assert_eq!(dashboard.major_events[0].magnitude, 7.7);
        assert_eq!(dashboard.markers.len(), 3);
        assert_eq!(dashboard.markers[2].magnitude, 4.1);
    }

    #[test]
    fn test_empty_dataset_dashboard() {
        let session = DashboardSession::new(
            Dataset::new("empty", Vec::new()),
            OverlayStatus::absent("disabled"),
            SessionSettings::default(),
        );
        let dashboard = session.dashboard();

        assert!(dashboard.summary.is_none());
        assert_eq!(dashboard.display.total_events, "0");
        assert_eq!(dashboard.display.max_magnitude, DisplayFields::ABSENT);
        assert!(dashboard.daily_counts.is_empty());
        assert!(dashboard.markers.is_empty());
        assert!(session.focus_event(0).is_none());
    }

    #[test]
    fn test_focus_event_recenters_at_focus_zoom() {
        let session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());

        let view = session.focus_event(0).unwrap();
        assert_eq!(view.center_lat, 22.0);
        assert_eq!(view.center_lon, 95.9);
        assert_eq!(view.zoom, 10);
        assert!(session.focus_event(5).is_none());

        let initial = session.initial_view();
        assert_eq!((initial.center_lat, initial.center_lon, initial.zoom), (21.9, 96.0, 7));
    }

    #[test]
    fn test_fault_layer_requires_overlay() {
        let mut session = DashboardSession::new(
            dataset(),
            OverlayStatus::absent("offline"),
            SessionSettings::default(),
        );
        assert!(!session.is_layer_visible(Layer::Faults));
        assert!(!session.set_layer_visible(Layer::Faults, true));

        let mut session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        assert!(session.is_layer_visible(Layer::Faults));
        assert!(!session.set_layer_visible(Layer::Faults, false));
        assert!(session.set_layer_visible(Layer::Faults, true));
    }

    #[test]
    fn test_earthquake_layer_toggle() {
        let mut session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        assert!(session.is_layer_visible(Layer::Earthquakes));
        assert!(!session.set_layer_visible(Layer::Earthquakes, false));
        assert!(!session.is_layer_visible(Layer::Earthquakes));
    }

    #[test]
    fn test_to_report_snapshot() {
        let session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        let report = session.to_report(ReportMetadata {
            dataset_source: session.dataset().source().to_string(),
            generated_at: chrono::Utc::now(),
            min_magnitude: session.settings().min_magnitude,
            duration_seconds: 0.1,
        });

        assert_eq!(&report.dashboard, session.dashboard());
        assert!(report.overlay.is_loaded());
        assert_eq!(report.focus_zoom, 10);
        assert_eq!(report.focus_views.len(), 2);
        assert_eq!(report.focus_views[0].center_lat, 22.0);
        assert!(report.earthquakes_visible);
        assert!(report.faults_visible);
    }

    #[test]
    fn test_to_report_reflects_hidden_layers() {
        let mut session = DashboardSession::new(dataset(), loaded_overlay(), SessionSettings::default());
        session.set_layer_visible(Layer::Faults, false);

        let report = session.to_report(ReportMetadata {
            dataset_source: "test".to_string(),
            generated_at: chrono::Utc::now(),
            min_magnitude: 5.0,
            duration_seconds: 0.0,
        });
        assert!(report.earthquakes_visible);
        assert!(!report.faults_visible);
        assert!(report.overlay.is_loaded());
    }
}
