//! Event aggregation and statistics.
//!
//! Every function here is a pure, single-pass transformation of an event
//! slice into a derived structure. Nothing is cached or mutated, so the
//! functions can be called in any order, repeatedly, and from any thread.

use crate::error::AggregateError;
use crate::models::{
    datetime_from_ms, DepthBand, DepthClasses, Distribution, MagnitudeClass, Marker, ScatterPoint,
    SeismicEvent, SeriesPoint, SummaryStats, Thresholds, YearMonth, MS_PER_DAY,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Compute summary statistics with the default strong/major thresholds.
#[allow(dead_code)] // Convenience wrapper
pub fn compute_summary(events: &[SeismicEvent]) -> Result<SummaryStats, AggregateError> {
    compute_summary_with(events, &Thresholds::default())
}

/// Compute summary statistics.
///
/// Fails with [`AggregateError::EmptyDataset`] when `events` is empty, since
/// min, max and mean are undefined. The daily rate divides by the day span
/// clamped to at least one day.
pub fn compute_summary_with(
    events: &[SeismicEvent],
    thresholds: &Thresholds,
) -> Result<SummaryStats, AggregateError> {
    if events.is_empty() {
        return Err(AggregateError::EmptyDataset);
    }

    let mut min_magnitude = f64::INFINITY;
    let mut max_magnitude = f64::NEG_INFINITY;
    let mut sum_magnitude = 0.0;
    let mut min_depth = f64::INFINITY;
    let mut max_depth = f64::NEG_INFINITY;
    let mut sum_depth = 0.0;
    let mut min_time = i64::MAX;
    let mut max_time = i64::MIN;
    let mut strong_events = 0;
    let mut major_events = 0;

    for event in events {
        min_magnitude = min_magnitude.min(event.magnitude);
        max_magnitude = max_magnitude.max(event.magnitude);
        sum_magnitude += event.magnitude;

        min_depth = min_depth.min(event.depth_km);
        max_depth = max_depth.max(event.depth_km);
        sum_depth += event.depth_km;

        min_time = min_time.min(event.timestamp_ms);
        max_time = max_time.max(event.timestamp_ms);

        if event.magnitude >= thresholds.strong {
            strong_events += 1;
        }
        if event.magnitude >= thresholds.major {
            major_events += 1;
        }
    }

    let count = events.len();
    let n = count as f64;
    let duration_days = (max_time - min_time) as f64 / MS_PER_DAY;

    Ok(SummaryStats {
        count,
        min_magnitude,
        max_magnitude,
        mean_magnitude: sum_magnitude / n,
        min_depth_km: min_depth,
        max_depth_km: max_depth,
        mean_depth_km: sum_depth / n,
        strong_events,
        major_events,
        start: datetime_from_ms(min_time),
        end: datetime_from_ms(max_time),
        duration_days,
        daily_rate: n / duration_days.max(1.0),
    })
}

/// Number of events with magnitude at or above `threshold`.
pub fn count_at_or_above(events: &[SeismicEvent], threshold: f64) -> usize {
    events.iter().filter(|e| e.magnitude >= threshold).count()
}

/// Count events per magnitude band, lowest band first.
pub fn bucket_by_magnitude(events: &[SeismicEvent]) -> Distribution {
    let mut counts = [0usize; MagnitudeClass::ALL.len()];
    for event in events {
        counts[event.magnitude_class().index()] += 1;
    }

    Distribution::from_counts(
        MagnitudeClass::ALL
            .iter()
            .map(MagnitudeClass::label)
            .zip(counts),
    )
}

/// Count events per depth band, shallowest band first.
pub fn bucket_by_depth(events: &[SeismicEvent]) -> Distribution {
    let mut counts = [0usize; DepthBand::ALL.len()];
    for event in events {
        counts[DepthBand::from_depth(event.depth_km).index()] += 1;
    }

    Distribution::from_counts(DepthBand::ALL.iter().map(DepthBand::label).zip(counts))
}

/// Shallow (<= 10 km), intermediate (<= 30 km) and deep event counts.
pub fn depth_classes(events: &[SeismicEvent]) -> DepthClasses {
    let mut classes = DepthClasses::default();
    for event in events {
        if event.depth_km <= 10.0 {
            classes.shallow += 1;
        } else if event.depth_km <= 30.0 {
            classes.intermediate += 1;
        } else {
            classes.deep += 1;
        }
    }
    classes
}

/// Events per UTC calendar date, ascending. Dates without events are omitted.
pub fn daily_counts(events: &[SeismicEvent]) -> Vec<SeriesPoint<NaiveDate>> {
    count_by_key(events, SeismicEvent::date)
}

/// Events per UTC calendar month, ascending. Months without events are omitted.
pub fn monthly_counts(events: &[SeismicEvent]) -> Vec<SeriesPoint<YearMonth>> {
    count_by_key(events, |e| YearMonth::of(e.date()))
}

fn count_by_key<K, F>(events: &[SeismicEvent], key: F) -> Vec<SeriesPoint<K>>
where
    K: Ord,
    F: Fn(&SeismicEvent) -> K,
{
    let mut grouped: BTreeMap<K, usize> = BTreeMap::new();
    for event in events {
        *grouped.entry(key(event)).or_default() += 1;
    }

    grouped
        .into_iter()
        .map(|(key, value)| SeriesPoint { key, value })
        .collect()
}

/// Running event count ordered by occurrence time.
///
/// Each point is `(timestamp_ms, rank)` where rank is 1-indexed; the last
/// value equals the number of events.
pub fn cumulative_series(events: &[SeismicEvent]) -> Vec<SeriesPoint<i64>> {
    let mut ordered: Vec<&SeismicEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp_ms);

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, event)| SeriesPoint {
            key: event.timestamp_ms,
            value: i + 1,
        })
        .collect()
}

/// `(depth, magnitude)` pairs in input order, one per event.
pub fn magnitude_depth_pairs(events: &[SeismicEvent]) -> Vec<ScatterPoint> {
    events
        .iter()
        .map(|e| ScatterPoint {
            depth_km: e.depth_km,
            magnitude: e.magnitude,
        })
        .collect()
}

/// Map markers for every event, in input order.
pub fn event_markers(events: &[SeismicEvent]) -> Vec<Marker> {
    events.iter().map(Marker::for_event).collect()
}

/// Events with magnitude >= `min_magnitude`, strongest first.
///
/// The sort is stable: events of equal magnitude keep their input order.
pub fn top_events(events: &[SeismicEvent], min_magnitude: f64) -> Vec<&SeismicEvent> {
    let mut selected: Vec<&SeismicEvent> = events
        .iter()
        .filter(|e| e.magnitude >= min_magnitude)
        .collect();

    selected.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;
    // 2025-03-28T00:00:00Z
    const BASE_MS: i64 = 1_743_120_000_000;

    fn create_test_event(magnitude: f64, depth_km: f64, timestamp_ms: i64) -> SeismicEvent {
        SeismicEvent {
            id: None,
            magnitude,
            depth_km,
            timestamp_ms,
            latitude: 21.9,
            longitude: 96.0,
            place: "Sagaing Region, Myanmar".to_string(),
            felt_reports: None,
            reference_url: None,
        }
    }

    fn scenario_events() -> Vec<SeismicEvent> {
        vec![
            create_test_event(5.2, 12.0, BASE_MS),
            create_test_event(6.8, 8.0, BASE_MS + DAY_MS),
            create_test_event(4.1, 35.0, BASE_MS + 2 * DAY_MS),
        ]
    }

    #[test]
    fn test_bucket_by_magnitude_scenario() {
        let dist = bucket_by_magnitude(&scenario_events());

        assert_eq!(
            dist.labels(),
            vec!["M 2.5-3.9", "M 4.0-4.9", "M 5.0-5.9", "M 6.0-6.9", "M 7.0+"]
        );
        assert_eq!(dist.get("M 2.5-3.9"), Some(0));
        assert_eq!(dist.get("M 4.0-4.9"), Some(1));
        assert_eq!(dist.get("M 5.0-5.9"), Some(1));
        assert_eq!(dist.get("M 6.0-6.9"), Some(1));
        assert_eq!(dist.get("M 7.0+"), Some(0));
    }

    #[test]
    fn test_bucket_by_depth_scenario() {
        let dist = bucket_by_depth(&scenario_events());

        assert_eq!(dist.labels(), vec!["0-10 km", "10-20 km", "20-30 km", "30+ km"]);
        assert_eq!(dist.get("0-10 km"), Some(1));
        assert_eq!(dist.get("10-20 km"), Some(1));
        assert_eq!(dist.get("20-30 km"), Some(0));
        assert_eq!(dist.get("30+ km"), Some(1));
    }

    #[test]
    fn test_buckets_partition_events() {
        let events: Vec<_> = [1.0, 2.5, 3.9, 4.0, 4.99, 5.0, 6.0, 6.99, 7.0, 8.2]
            .iter()
            .enumerate()
            .map(|(i, &m)| create_test_event(m, i as f64 * 7.5, BASE_MS + i as i64))
            .collect();

        assert_eq!(bucket_by_magnitude(&events).total(), events.len());
        assert_eq!(bucket_by_depth(&events).total(), events.len());
        // Below 2.5 falls into the lowest band; exactly 4.0 into the next one.
        assert_eq!(bucket_by_magnitude(&events).get("M 2.5-3.9"), Some(3));
        assert_eq!(bucket_by_magnitude(&events).get("M 4.0-4.9"), Some(2));
    }

    #[test]
    fn test_compute_summary_single_event() {
        let events = vec![create_test_event(5.5, 10.0, BASE_MS)];
        let summary = compute_summary(&events).unwrap();

        assert_eq!(summary.count, 1);
        assert_eq!(summary.min_magnitude, 5.5);
        assert_eq!(summary.max_magnitude, 5.5);
        assert_eq!(summary.mean_magnitude, 5.5);
        assert_eq!(summary.duration_days, 0.0);
        assert_eq!(summary.daily_rate, 1.0);
        assert_eq!(summary.start, summary.end);
    }

    #[test]
    fn test_compute_summary_scenario() {
        let events = scenario_events();
        let summary = compute_summary(&events).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.max_magnitude, 6.8);
        assert_eq!(summary.min_magnitude, 4.1);
        assert!((summary.mean_magnitude - (5.2 + 6.8 + 4.1) / 3.0).abs() < 1e-9);
        assert_eq!(summary.min_depth_km, 8.0);
        assert_eq!(summary.max_depth_km, 35.0);
        assert!((summary.mean_depth_km - 55.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.strong_events, 2);
        assert_eq!(summary.major_events, 1);
        assert_eq!(summary.duration_days, 2.0);
        assert_eq!(summary.daily_rate, 1.5);
    }

    #[test]
    fn test_compute_summary_clamps_short_spans() {
        let events = vec![
            create_test_event(4.0, 5.0, BASE_MS),
            create_test_event(4.0, 5.0, BASE_MS + DAY_MS / 4),
        ];
        let summary = compute_summary(&events).unwrap();
        assert_eq!(summary.duration_days, 0.25);
        assert_eq!(summary.daily_rate, 2.0);
    }

    #[test]
    fn test_compute_summary_custom_thresholds() {
        let thresholds = Thresholds {
            strong: 4.0,
            major: 7.0,
        };
        let summary = compute_summary_with(&scenario_events(), &thresholds).unwrap();
        assert_eq!(summary.strong_events, 3);
        assert_eq!(summary.major_events, 0);
    }

    #[test]
    fn test_compute_summary_empty_dataset() {
        assert_eq!(compute_summary(&[]), Err(AggregateError::EmptyDataset));
    }

    #[test]
    fn test_count_based_outputs_on_empty_dataset() {
        assert_eq!(count_at_or_above(&[], 5.0), 0);
        assert_eq!(bucket_by_magnitude(&[]).total(), 0);
        assert_eq!(bucket_by_depth(&[]).bins.len(), 4);
        assert!(daily_counts(&[]).is_empty());
        assert!(monthly_counts(&[]).is_empty());
        assert!(cumulative_series(&[]).is_empty());
        assert!(top_events(&[], 5.0).is_empty());
    }

    #[test]
    fn test_daily_counts_sparse_and_sorted() {
        let events = vec![
            create_test_event(4.0, 5.0, BASE_MS + 5 * DAY_MS),
            create_test_event(4.0, 5.0, BASE_MS),
            create_test_event(4.0, 5.0, BASE_MS + 3_600_000),
            create_test_event(4.0, 5.0, BASE_MS + 2 * DAY_MS),
        ];
        let daily = daily_counts(&events);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].key, NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
        assert_eq!(daily[0].value, 2);
        assert_eq!(daily[1].key, NaiveDate::from_ymd_opt(2025, 3, 30).unwrap());
        assert_eq!(daily[2].key, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert!(daily.windows(2).all(|w| w[0].key < w[1].key));
        assert_eq!(daily.iter().map(|p| p.value).sum::<usize>(), events.len());
    }

    #[test]
    fn test_daily_counts_use_utc_dates() {
        // 23:30 UTC stays on the same calendar date.
        let late = BASE_MS + DAY_MS - 1_800_000;
        let daily = daily_counts(&[create_test_event(4.0, 5.0, late)]);
        assert_eq!(daily[0].key, NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
    }

    #[test]
    fn test_monthly_counts() {
        let events = vec![
            create_test_event(4.0, 5.0, BASE_MS + 10 * DAY_MS),
            create_test_event(4.0, 5.0, BASE_MS),
            create_test_event(4.0, 5.0, BASE_MS + DAY_MS),
        ];
        let monthly = monthly_counts(&events);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].key, YearMonth { year: 2025, month: 3 });
        assert_eq!(monthly[0].value, 2);
        assert_eq!(monthly[1].key, YearMonth { year: 2025, month: 4 });
        assert_eq!(monthly[1].value, 1);
    }

    #[test]
    fn test_cumulative_series() {
        let events = vec![
            create_test_event(4.0, 5.0, BASE_MS + 300),
            create_test_event(4.0, 5.0, BASE_MS + 100),
            create_test_event(4.0, 5.0, BASE_MS + 200),
            create_test_event(4.0, 5.0, BASE_MS + 100),
        ];
        let series = cumulative_series(&events);

        let keys: Vec<i64> = series.iter().map(|p| p.key - BASE_MS).collect();
        assert_eq!(keys, vec![100, 100, 200, 300]);
        let values: Vec<usize> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        assert_eq!(series.last().map(|p| p.value), Some(events.len()));
    }

    #[test]
    fn test_magnitude_depth_pairs_preserve_order() {
        let pairs = magnitude_depth_pairs(&scenario_events());
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].depth_km, 12.0);
        assert_eq!(pairs[0].magnitude, 5.2);
        assert_eq!(pairs[2].depth_km, 35.0);
        assert_eq!(pairs[2].magnitude, 4.1);
    }

    #[test]
    fn test_event_markers_cover_every_event() {
        let events = vec![
            create_test_event(3.1, 5.0, BASE_MS),
            create_test_event(4.2, 15.0, BASE_MS + DAY_MS),
            create_test_event(5.5, 25.0, BASE_MS + 2 * DAY_MS),
        ];
        let markers = event_markers(&events);

        assert_eq!(markers.len(), events.len());
        let radii: Vec<u8> = markers.iter().map(|m| m.radius).collect();
        assert_eq!(radii, vec![4, 6, 8]);
        assert_eq!(markers[0].popup[0], "M 3.1 Earthquake");
        assert!(event_markers(&[]).is_empty());
    }

    #[test]
    fn test_top_events_filter_and_order() {
        let events = scenario_events();
        let top = top_events(&events, 5.0);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].magnitude, 6.8);
        assert_eq!(top[1].magnitude, 5.2);
        assert!(top.iter().all(|e| e.magnitude >= 5.0));
    }

    #[test]
    fn test_top_events_stable_ties() {
        let mut first = create_test_event(5.5, 5.0, BASE_MS);
        first.place = "first".to_string();
        let mut second = create_test_event(5.5, 5.0, BASE_MS - DAY_MS);
        second.place = "second".to_string();
        let events = vec![create_test_event(4.0, 5.0, BASE_MS), first, second];

        let top = top_events(&events, 5.0);
        assert_eq!(top[0].place, "first");
        assert_eq!(top[1].place, "second");
    }

    #[test]
    fn test_operations_are_idempotent() {
        let events = scenario_events();
        assert_eq!(compute_summary(&events), compute_summary(&events));
        assert_eq!(bucket_by_magnitude(&events), bucket_by_magnitude(&events));
        assert_eq!(daily_counts(&events), daily_counts(&events));
        assert_eq!(cumulative_series(&events), cumulative_series(&events));
        assert_eq!(top_events(&events, 5.0), top_events(&events, 5.0));
    }

    #[test]
    fn test_depth_classes() {
        let classes = depth_classes(&scenario_events());
        assert_eq!(classes.shallow, 1);
        assert_eq!(classes.intermediate, 1);
        assert_eq!(classes.deep, 1);
    }
}
