//! Dashboard report generation.
//!
//! This module renders the derived dashboard data as a Markdown document
//! (tables standing in for the charts, map focus links standing in for the
//! interactive table) or as JSON for an external renderer.

use crate::config::ReportConfig;
use crate::models::{
    datetime_from_ms, Dashboard, DisplayFields, Distribution, MagnitudeClass, MapView, Marker,
    Overlay, OverlayFeature, OverlayStatus, Report, ReportMetadata, SummaryStats,
};
use anyhow::Result;

/// Rendering knobs for the Markdown report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Maximum rows in the major events table.
    pub top_events_limit: usize,
    /// Include per-marker popup details.
    pub include_popups: bool,
    /// Depth/magnitude pairs listed in the scatter section.
    pub scatter_sample: usize,
    /// Earthquake markers listed in the markers section.
    pub marker_sample: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_events_limit: 25,
            include_popups: true,
            scatter_sample: 20,
            marker_sample: 100,
        }
    }
}

impl From<&ReportConfig> for ReportOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            top_events_limit: config.top_events_limit,
            include_popups: config.include_popups,
            scatter_sample: config.scatter_sample,
            marker_sample: config.marker_sample,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportOptions) -> String {
    let dashboard = &report.dashboard;
    let mut output = String::new();

    output.push_str("# Seismicity Dashboard Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(
        &dashboard.display,
        dashboard.summary.as_ref(),
    ));
    output.push_str(&generate_distribution_section(dashboard));
    output.push_str(&generate_timeline_section(dashboard));
    output.push_str(&generate_scatter_section(dashboard, options.scatter_sample));
    output.push_str(&generate_major_events_section(report, options));
    output.push_str(&generate_markers_section(report, options));
    output.push_str(&generate_overlay_section(&report.overlay, report.faults_visible));
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(report: &Report) -> String {
    let metadata: &ReportMetadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Events:** {}\n",
        report.dashboard.display.total_events
    ));
    section.push_str(&format!(
        "- **Major Events Threshold:** M {}\n",
        metadata.min_magnitude
    ));
    section.push_str(&format!(
        "- **Fault Overlay:** {}\n",
        match &report.overlay {
            OverlayStatus::Loaded(overlay) => format!("{} features", overlay.features.len()),
            OverlayStatus::Absent { .. } => "unavailable".to_string(),
        }
    ));
    section.push_str(&format!(
        "- **Initial Map View:** {}\n",
        format_view(&report.initial_view)
    ));
    section.push_str(&format!(
        "- **Processing Time:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Distributions](#distributions)\n");
    toc.push_str("- [Timeline](#timeline)\n");
    toc.push_str("- [Depth vs Magnitude](#depth-vs-magnitude)\n");
    toc.push_str("- [Major Events](#major-events)\n");
    toc.push_str("- [Earthquake Markers](#earthquake-markers)\n");
    if report.overlay.is_loaded() && report.faults_visible {
        toc.push_str("- [Fault Overlay](#fault-overlay)\n");
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(display: &DisplayFields, summary: Option<&SummaryStats>) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(
        "| Total Events | Max Magnitude | Strong Events | Avg Depth (km) | Daily Average |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        display.total_events,
        display.max_magnitude,
        display.strong_events,
        display.avg_depth,
        display.daily_avg
    ));

    let Some(stats) = summary else {
        section.push_str("*No events in dataset; statistics unavailable.*\n\n");
        return section;
    };

    section.push_str("### Statistics\n\n");
    section.push_str("| Measure | Min | Max | Mean |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| Magnitude | {:.1} | {:.1} | {:.2} |\n",
        stats.min_magnitude, stats.max_magnitude, stats.mean_magnitude
    ));
    section.push_str(&format!(
        "| Depth (km) | {:.1} | {:.1} | {:.1} |\n\n",
        stats.min_depth_km, stats.max_depth_km, stats.mean_depth_km
    ));

    section.push_str(&format!(
        "- **Period:** {} to {} ({} days)\n",
        stats.start.format("%Y-%m-%d"),
        stats.end.format("%Y-%m-%d"),
        stats.duration_days.round()
    ));
    section.push_str(&format!("- **Strong events:** {}\n", stats.strong_events));
    section.push_str(&format!("- **Major events:** {}\n\n", stats.major_events));

    section
}

fn generate_distribution_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Distributions\n\n");

    section.push_str("### Magnitude\n\n");
    section.push_str("| Band | Events | Colour | Marker Radius |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");
    for (bin, class) in dashboard
        .magnitude_distribution
        .bins
        .iter()
        .zip(MagnitudeClass::ALL)
    {
        section.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            bin.label,
            bin.count,
            class.color(),
            class.marker_radius()
        ));
    }
    section.push_str(&format!(
        "| **Total** | {} | | |\n\n",
        dashboard.magnitude_distribution.total()
    ));

    section.push_str("### Depth\n\n");
    section.push_str(&distribution_table("Range", &dashboard.depth_distribution));

    let classes = &dashboard.depth_classes;
    section.push_str(&format!(
        "Shallow (≤10 km): {} | Intermediate (10-30 km): {} | Deep (>30 km): {}\n\n",
        classes.shallow, classes.intermediate, classes.deep
    ));

    section
}

fn distribution_table(heading: &str, distribution: &Distribution) -> String {
    let mut table = String::new();
    table.push_str(&format!("| {} | Events |\n", heading));
    table.push_str("|:---|:---:|\n");
    for bin in &distribution.bins {
        table.push_str(&format!("| {} | {} |\n", bin.label, bin.count));
    }
    table.push_str(&format!("| **Total** | {} |\n\n", distribution.total()));
    table
}

fn generate_timeline_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Timeline\n\n");

    if dashboard.daily_counts.is_empty() {
        section.push_str("No events to plot.\n\n");
        return section;
    }

    section.push_str("### Earthquakes per Day\n\n");
    section.push_str("| Date | Events |\n");
    section.push_str("|:---|:---:|\n");
    for point in &dashboard.daily_counts {
        section.push_str(&format!(
            "| {} | {} |\n",
            point.key.format("%b %-d"),
            point.value
        ));
    }
    section.push('\n');

    section.push_str("### Events per Month\n\n");
    section.push_str("| Month | Events |\n");
    section.push_str("|:---|:---:|\n");
    for point in &dashboard.monthly_counts {
        section.push_str(&format!("| {} | {} |\n", point.key.label(), point.value));
    }
    section.push('\n');

    if let (Some(first), Some(last)) = (dashboard.cumulative.first(), dashboard.cumulative.last()) {
        section.push_str("### Cumulative Events\n\n");
        section.push_str(&format!(
            "From {} (1 event) to {} ({} events).\n\n",
            datetime_from_ms(first.key).format("%Y-%m-%d %H:%M UTC"),
            datetime_from_ms(last.key).format("%Y-%m-%d %H:%M UTC"),
            last.value
        ));
    }

    section
}

fn generate_scatter_section(dashboard: &Dashboard, sample: usize) -> String {
    let mut section = String::new();

    section.push_str("## Depth vs Magnitude\n\n");

    if dashboard.scatter.is_empty() || sample == 0 {
        section.push_str("No points to show.\n\n");
        return section;
    }

    section.push_str("| Depth (km) | Magnitude |\n");
    section.push_str("|:---:|:---:|\n");
    for point in dashboard.scatter.iter().take(sample) {
        section.push_str(&format!("| {} | {} |\n", point.depth_km, point.magnitude));
    }
    if dashboard.scatter.len() > sample {
        section.push_str(&format!(
            "\n*Showing {} of {} points.*\n",
            sample,
            dashboard.scatter.len()
        ));
    }
    section.push('\n');

    section
}

fn generate_major_events_section(report: &Report, options: &ReportOptions) -> String {
    let events = &report.dashboard.major_events;
    let mut section = String::new();

    section.push_str("## Major Events\n\n");

    if events.is_empty() {
        section.push_str(&format!(
            "No events at or above M {}.\n\n",
            report.metadata.min_magnitude
        ));
        return section;
    }

    section.push_str("| Date | Magnitude | Depth | Location | Map |\n");
    section.push_str("|:---|:---:|:---:|:---|:---|\n");

    let shown = events.iter().take(options.top_events_limit);
    for (event, view) in shown.clone().zip(&report.focus_views) {
        section.push_str(&format!(
            "| {} | <span class=\"mag-badge {}\">M {}</span> | {:.1} km | {} | {} |\n",
            event.time().format("%b %-d, %Y"),
            magnitude_badge(event.magnitude),
            event.magnitude,
            event.depth_km,
            escape_cell(&event.place),
            format_view(view)
        ));
    }
    if events.len() > options.top_events_limit {
        section.push_str(&format!(
            "\n*Showing {} of {} events.*\n",
            options.top_events_limit,
            events.len()
        ));
    }
    section.push('\n');

    section
}

fn generate_markers_section(report: &Report, options: &ReportOptions) -> String {
    let markers = &report.dashboard.markers;
    let mut section = String::new();

    section.push_str("## Earthquake Markers\n\n");

    if !report.earthquakes_visible {
        section.push_str("*Earthquake layer hidden.*\n\n");
        return section;
    }
    if markers.is_empty() || options.marker_sample == 0 {
        section.push_str("No markers to show.\n\n");
        return section;
    }

    section.push_str("| Magnitude | Coordinates | Radius | Colour |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");

    let shown = &markers[..markers.len().min(options.marker_sample)];
    for marker in shown {
        section.push_str(&format!(
            "| M {} | {:.4}, {:.4} | {} px | `{}` |\n",
            marker.magnitude, marker.latitude, marker.longitude, marker.radius, marker.color
        ));
    }
    if markers.len() > shown.len() {
        section.push_str(&format!(
            "\n*Showing {} of {} markers.*\n",
            shown.len(),
            markers.len()
        ));
    }
    section.push('\n');

    if options.include_popups {
        section.push_str("### Marker Popups\n\n");
        for marker in shown {
            section.push_str(&generate_marker_popup(marker));
        }
    }

    section
}

/// Badge class for a magnitude in the major events table.
pub fn magnitude_badge(magnitude: f64) -> &'static str {
    if magnitude >= 6.0 {
        "mag-high"
    } else {
        "mag-medium"
    }
}

fn generate_marker_popup(marker: &Marker) -> String {
    let mut lines = marker.popup.iter();
    let mut block = String::new();

    if let Some(title) = lines.next() {
        block.push_str(&format!("#### {}\n\n", title));
    }
    for line in lines {
        block.push_str(&format!("- {}\n", escape_cell(line)));
    }
    block.push('\n');

    block
}

/// Escape text placed in a Markdown table cell or list item.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn generate_overlay_section(overlay: &OverlayStatus, visible: bool) -> String {
    match overlay {
        OverlayStatus::Loaded(_) if !visible => {
            "## Fault Overlay\n\n*Fault layer hidden.*\n\n".to_string()
        }
        OverlayStatus::Loaded(overlay) => generate_loaded_overlay_section(overlay),
        OverlayStatus::Absent { reason } => {
            format!("## Fault Overlay\n\n*Overlay unavailable: {}.*\n\n", reason)
        }
    }
}

fn generate_loaded_overlay_section(overlay: &Overlay) -> String {
    let mut section = String::new();

    section.push_str("## Fault Overlay\n\n");
    section.push_str(&format!(
        "{} features loaded from `{}`.\n\n",
        overlay.features.len(),
        overlay.source
    ));

    for feature in &overlay.features {
        section.push_str(&generate_overlay_popup(feature));
    }

    section
}

fn generate_overlay_popup(feature: &OverlayFeature) -> String {
    let mut block = String::new();

    block.push_str(&format!("#### Tectonic Feature ({})\n\n", feature.geometry_type));
    for (key, value) in &feature.metadata {
        block.push_str(&format!(
            "- **{}:** {}\n",
            escape_cell(key),
            escape_cell(value)
        ));
    }
    block.push('\n');

    block
}

fn format_view(view: &MapView) -> String {
    format!(
        "{:.4}, {:.4} @ z{}",
        view.center_lat, view.center_lon, view.zoom
    )
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by Quakeboard*\n");

    footer
}
