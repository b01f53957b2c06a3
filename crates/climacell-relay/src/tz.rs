//! Timezone normalization of arbitrary JSON payloads.
//!
//! The ClimaCell API embeds timestamp strings at unpredictable depths
//! (`sunrise.value`, per-slice `observation_time`, ...). Rather than chase
//! the schema, [`normalize`] walks any JSON tree and rewrites every scalar
//! string that parses as a date-time into the target zone's RFC 3339 form.
//!
//! Two rules keep the walk safe to re-run:
//!
//! - A string with an explicit UTC offset is *converted* to the target
//!   zone, never re-interpreted. Running [`normalize`] over already
//!   normalized output is a no-op.
//! - A string that does not parse as a date-time passes through unchanged;
//!   parsing never surfaces an error to the caller.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Outcome of the permissive date-time parse: the string either carried
/// its own offset or needs one assumed.
enum ParsedTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

/// Naive formats accepted after the offset-aware parsers fail.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Recursively convert every timestamp-like string in `value` from
/// `source` (when no explicit offset is present) to `target`.
///
/// Structure is preserved: objects keep their keys, arrays their order and
/// length; only scalar string leaves ever change.
pub fn normalize(value: Value, source: Tz, target: Tz) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (key, normalize(inner, source, target)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize(item, source, target))
                .collect(),
        ),
        Value::String(text) => match convert(&text, source, target) {
            Some(converted) => Value::String(converted),
            None => Value::String(text),
        },
        other => other,
    }
}

/// Convert a single candidate string, or `None` when it is not a
/// date-time (or falls into a DST gap of the source zone).
fn convert(text: &str, source: Tz, target: Tz) -> Option<String> {
    let instant = match parse_permissive(text)? {
        ParsedTimestamp::Aware(dt) => dt.with_timezone(&Utc),
        ParsedTimestamp::Naive(naive) => source
            .from_local_datetime(&naive)
            .earliest()?
            .with_timezone(&Utc),
    };
    Some(instant.with_timezone(&target).to_rfc3339())
}

/// Permissive date-time parser over an ordered, deterministic format list.
///
/// Accepts RFC 3339, RFC 2822, ISO-like strings with a numeric offset,
/// naive ISO variants, and bare dates (midnight). Fragments such as
/// `"12:00"` deliberately do not parse: there is no implicit "today".
fn parse_permissive(text: &str) -> Option<ParsedTimestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedTimestamp::Aware(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(ParsedTimestamp::Aware(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ParsedTimestamp::Aware(dt));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedTimestamp::Naive(naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(ParsedTimestamp::Naive);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Toronto;
    use chrono_tz::UTC;
    use serde_json::json;

    fn toronto(value: Value) -> Value {
        normalize(value, UTC, Toronto)
    }

    #[test]
    fn test_utc_string_converted_to_toronto() {
        let out = toronto(json!("2023-06-01T12:00:00Z"));
        assert_eq!(out, json!("2023-06-01T08:00:00-04:00"));
    }

    #[test]
    fn test_winter_date_gets_standard_offset() {
        let out = toronto(json!("2023-01-15T12:00:00Z"));
        assert_eq!(out, json!("2023-01-15T07:00:00-05:00"));
    }

    #[test]
    fn test_naive_string_assumed_source_zone() {
        let out = toronto(json!("2023-06-01 12:00:00"));
        assert_eq!(out, json!("2023-06-01T08:00:00-04:00"));
    }

    #[test]
    fn test_offset_aware_is_converted_not_relabeled() {
        let out = toronto(json!("2023-06-01T12:00:00+02:00"));
        assert_eq!(out, json!("2023-06-01T06:00:00-04:00"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = toronto(json!("2023-06-01T12:00:00Z"));
        let twice = toronto(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_date_scalars_unchanged() {
        assert_eq!(toronto(json!("N/A")), json!("N/A"));
        assert_eq!(toronto(json!("si")), json!("si"));
        assert_eq!(toronto(json!(42)), json!(42));
        assert_eq!(toronto(json!(21.5)), json!(21.5));
        assert_eq!(toronto(json!(true)), json!(true));
        assert_eq!(toronto(json!(null)), json!(null));
    }

    #[test]
    fn test_numeric_strings_unchanged() {
        assert_eq!(toronto(json!("42")), json!("42"));
        assert_eq!(toronto(json!("2023")), json!("2023"));
        assert_eq!(toronto(json!("12:00")), json!("12:00"));
    }

    #[test]
    fn test_bare_date_is_midnight_in_source_zone() {
        let out = toronto(json!("2023-06-01"));
        assert_eq!(out, json!("2023-05-31T20:00:00-04:00"));
    }

    #[test]
    fn test_structure_preserved() {
        let input = json!({
            "lat": 43.65,
            "temp": {"value": 21.5, "units": "C"},
            "sunrise": {"value": "2023-06-01T09:04:00.000Z"},
            "observation_time": {"value": "2023-06-01T12:00:00Z"},
        });
        let out = toronto(input.clone());

        let obj = out.as_object().unwrap();
        assert_eq!(obj.len(), input.as_object().unwrap().len());
        assert_eq!(obj["lat"], json!(43.65));
        assert_eq!(obj["temp"], json!({"value": 21.5, "units": "C"}));
        assert_eq!(
            obj["observation_time"]["value"],
            json!("2023-06-01T08:00:00-04:00")
        );
    }

    #[test]
    fn test_array_order_and_length_preserved() {
        let input = json!([
            {"observation_time": {"value": "2023-06-01T01:00:00Z"}},
            {"observation_time": {"value": "2023-06-01T02:00:00Z"}},
            "not a date",
        ]);
        let out = toronto(input);

        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0]["observation_time"]["value"],
            json!("2023-05-31T21:00:00-04:00")
        );
        assert_eq!(
            items[1]["observation_time"]["value"],
            json!("2023-05-31T22:00:00-04:00")
        );
        assert_eq!(items[2], json!("not a date"));
    }

    #[test]
    fn test_deep_nesting() {
        let input = json!({"a": {"b": {"c": {"d": ["2023-06-01T12:00:00Z"]}}}});
        let out = toronto(input);
        assert_eq!(
            out["a"]["b"]["c"]["d"][0],
            json!("2023-06-01T08:00:00-04:00")
        );
    }

    #[test]
    fn test_fractional_seconds_survive() {
        let out = toronto(json!("2023-06-01T12:00:00.500Z"));
        assert_eq!(out, json!("2023-06-01T08:00:00.500-04:00"));
    }

    #[test]
    fn test_rfc2822_accepted() {
        let out = toronto(json!("Thu, 01 Jun 2023 12:00:00 GMT"));
        assert_eq!(out, json!("2023-06-01T08:00:00-04:00"));
    }

    #[test]
    fn test_compact_offset_accepted() {
        let out = toronto(json!("2023-06-01T12:00:00+0000"));
        assert_eq!(out, json!("2023-06-01T08:00:00-04:00"));
    }

    #[test]
    fn test_identity_when_zones_match() {
        let out = normalize(json!("2023-06-01T12:00:00+00:00"), UTC, UTC);
        assert_eq!(out, json!("2023-06-01T12:00:00+00:00"));
    }
}
