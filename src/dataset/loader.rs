//! GeoJSON dataset parsing and validation.
//!
//! Accepts a USGS-style `FeatureCollection` of point features, either as a
//! plain JSON document or wrapped in a single JavaScript variable
//! assignment (`const earthquakeData = {...};`). Every feature is checked
//! up front so malformed records fail fast instead of turning into `NaN`
//! further down the pipeline.

use super::Dataset;
use crate::error::DatasetError;
use crate::models::SeismicEvent;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

const UNKNOWN_PLACE: &str = "Unknown location";

/// Load and validate a dataset from a file.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    info!("Loading dataset: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&text, &path.display().to_string())?;
    info!("Loaded {} events from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Parse and validate a dataset from text.
pub fn parse_dataset(text: &str, source: &str) -> Result<Dataset, DatasetError> {
    let body = strip_js_assignment(text);
    let document: Value = serde_json::from_str(body)?;

    let kind = document.get("type").and_then(Value::as_str);
    if kind != Some("FeatureCollection") {
        return Err(DatasetError::NotFeatureCollection {
            found: kind.unwrap_or("missing").to_string(),
        });
    }

    let features = match document.get("features") {
        Some(Value::Array(features)) => features,
        Some(_) => {
            return Err(DatasetError::NotFeatureCollection {
                found: "FeatureCollection with non-array features".to_string(),
            })
        }
        None => {
            debug!("FeatureCollection has no features member, treating as empty");
            return Ok(Dataset::new(source, Vec::new()));
        }
    };

    let events = features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            parse_event(feature).map_err(|reason| DatasetError::InvalidFeature { index, reason })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::new(source, events))
}

/// Strip a `[export] const|let|var name = ... ;` wrapper around a JSON object.
///
/// Leading `//` and `/* */` comments are skipped. Text that does not look
/// like such an assignment is returned trimmed but otherwise untouched.
fn strip_js_assignment(text: &str) -> &str {
    let trimmed = skip_leading_comments(text);
    let Some(brace) = trimmed.find('{') else {
        return trimmed;
    };

    let prefix = trimmed[..brace].trim();
    let declaration = prefix
        .strip_prefix("export ")
        .map_or(prefix, str::trim_start);
    let is_assignment = prefix.ends_with('=')
        && ["const ", "let ", "var "]
            .iter()
            .any(|kw| declaration.starts_with(kw));

    if !is_assignment {
        return trimmed;
    }

    trimmed[brace..].trim_end().trim_end_matches(';').trim_end()
}

fn skip_leading_comments(text: &str) -> &str {
    let mut rest = text.trim();
    loop {
        if let Some(comment) = rest.strip_prefix("//") {
            rest = comment.split_once('\n').map_or("", |(_, after)| after).trim();
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.split_once("*/").map_or("", |(_, after)| after).trim();
        } else {
            return rest;
        }
    }
}

/// Convert one GeoJSON feature into an event, or describe why it is invalid.
fn parse_event(feature: &Value) -> Result<SeismicEvent, String> {
    let properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .ok_or("missing properties object")?;

    let coordinates = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or("missing geometry coordinates")?;

    if coordinates.len() < 3 {
        return Err(format!(
            "expected [longitude, latitude, depth] coordinates, found {} values",
            coordinates.len()
        ));
    }

    let longitude = finite_number(&coordinates[0], "longitude")?;
    let latitude = finite_number(&coordinates[1], "latitude")?;
    let depth_km = finite_number(&coordinates[2], "depth")?;

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {} out of range", longitude));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {} out of range", latitude));
    }
    if depth_km < 0.0 {
        return Err(format!("depth {} km is negative", depth_km));
    }

    let magnitude = properties
        .get("mag")
        .ok_or_else(|| "missing magnitude".to_string())
        .and_then(|v| finite_number(v, "magnitude"))?;

    let timestamp_ms = properties
        .get("time")
        .and_then(Value::as_i64)
        .ok_or("missing or non-integer time")?;

    if chrono::DateTime::<chrono::Utc>::from_timestamp_millis(timestamp_ms).is_none() {
        return Err(format!("time {} is out of range", timestamp_ms));
    }

    let place = properties
        .get("place")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(UNKNOWN_PLACE)
        .to_string();

    let felt_reports = match properties.get("felt") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let felt = v.as_u64().ok_or("felt reports must be a non-negative integer")?;
            Some(u32::try_from(felt).map_err(|_| format!("felt reports {} too large", felt))?)
        }
    };

    let reference_url = properties
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty() && *url != "#")
        .map(String::from);

    let id = match feature.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(SeismicEvent {
        id,
        magnitude,
        depth_km,
        timestamp_ms,
        latitude,
        longitude,
        place,
        felt_reports,
        reference_url,
    })
}

fn finite_number(value: &Value, field: &str) -> Result<f64, String> {
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        Some(_) => Err(format!("{} is not finite", field)),
        None => Err(format!("{} must be a number, found {}", field, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feature(mag: &str, time: &str, coords: &str) -> String {
        format!(
            r#"{{"type":"Feature","id":"us7000abcd","properties":{{"mag":{},"place":"10 km S of Sagaing, Myanmar","time":{},"felt":12,"url":"https://earthquake.usgs.gov/event/us7000abcd"}},"geometry":{{"type":"Point","coordinates":{}}}}}"#,
            mag, time, coords
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn test_parse_valid_feature() {
        let text = collection(&[feature("5.2", "1711111111000", "[96.05, 21.88, 12.5]")]);
        let dataset = parse_dataset(&text, "test").unwrap();

        assert_eq!(dataset.len(), 1);
        let event = &dataset.events()[0];
        assert_eq!(event.magnitude, 5.2);
        assert_eq!(event.depth_km, 12.5);
        assert_eq!(event.latitude, 21.88);
        assert_eq!(event.longitude, 96.05);
        assert_eq!(event.timestamp_ms, 1_711_111_111_000);
        assert_eq!(event.felt_reports, Some(12));
        assert_eq!(event.id.as_deref(), Some("us7000abcd"));
        assert!(event.reference_url.is_some());
    }

    #[test]
    fn test_parse_js_wrapped_dataset() {
        let text = format!(
            "// generated\nconst earthquakeData = {};\n",
            collection(&[feature("4.0", "1711111111000", "[96.0, 22.0, 8]")])
        );
        assert_eq!(parse_dataset(&text, "test").unwrap().len(), 1);

        let text = format!(
            "const earthquakeData = {};\n",
            collection(&[feature("4.0", "1711111111000", "[96.0, 22.0, 8]")])
        );
        let dataset = parse_dataset(&text, "test").unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_parse_js_with_header_and_export() {
        let body = collection(&[feature("4.0", "1711111111000", "[96.0, 22.0, 8]")]);

        let text = format!(
            "/* USGS feed snapshot\n * 2025-03-28 */\n// do not edit\nexport const earthquakeData = {};",
            body
        );
        assert_eq!(parse_dataset(&text, "test").unwrap().len(), 1);

        let text = format!("// header\nexport default {};", body);
        assert!(parse_dataset(&text, "test").is_err());
    }

    #[test]
    fn test_skip_leading_comments() {
        assert_eq!(skip_leading_comments("  // a\n// b\n{}"), "{}");
        assert_eq!(skip_leading_comments("/* a */ {}"), "{}");
        assert_eq!(skip_leading_comments("// only a comment"), "");
        assert_eq!(skip_leading_comments("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_rejects_non_feature_collection() {
        let err = parse_dataset(r#"{"type":"Feature"}"#, "test").unwrap_err();
        assert!(matches!(err, DatasetError::NotFeatureCollection { .. }));
        assert!(err.to_string().contains("Feature"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = parse_dataset("{not json", "test").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }

    #[test]
    fn test_rejects_missing_magnitude() {
        let text = collection(&[
            feature("5.0", "1711111111000", "[96.0, 22.0, 8]"),
            feature("null", "1711111111000", "[96.0, 22.0, 8]"),
        ]);
        let err = parse_dataset(&text, "test").unwrap_err();
        match err {
            DatasetError::InvalidFeature { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("magnitude"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_negative_depth() {
        let text = collection(&[feature("5.0", "1711111111000", "[96.0, 22.0, -1.5]")]);
        let err = parse_dataset(&text, "test").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_rejects_short_coordinates() {
        let text = collection(&[feature("5.0", "1711111111000", "[96.0, 22.0]")]);
        let err = parse_dataset(&text, "test").unwrap_err();
        assert!(err.to_string().contains("coordinates"));
    }

    #[test]
    fn test_rejects_out_of_range_latitude() {
        let text = collection(&[feature("5.0", "1711111111000", "[96.0, 122.0, 5]")]);
        assert!(parse_dataset(&text, "test").is_err());
    }

    #[test]
    fn test_placeholder_url_and_missing_place() {
        let text = r##"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"mag":3.1,"time":1700000000000,"url":"#","felt":null},
             "geometry":{"type":"Point","coordinates":[95.9,21.5,10]}}
        ]}"##;
        let dataset = parse_dataset(text, "test").unwrap();
        let event = &dataset.events()[0];
        assert_eq!(event.reference_url, None);
        assert_eq!(event.felt_reports, None);
        assert_eq!(event.place, UNKNOWN_PLACE);
        assert_eq!(event.id, None);
    }

    #[test]
    fn test_empty_collection_loads() {
        let dataset = parse_dataset(r#"{"type":"FeatureCollection","features":[]}"#, "test").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_load_dataset_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let text = collection(&[
            feature("5.2", "1711111111000", "[96.0, 22.0, 12]"),
            feature("6.8", "1711211111000", "[96.1, 22.1, 8]"),
        ]);
        file.write_all(text.as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.source(), file.path().display().to_string());
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/quakes.geojson")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
