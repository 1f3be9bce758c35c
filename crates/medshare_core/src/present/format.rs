//! Field and record formatting per category.
//!
//! Formatting never fails: missing or oddly shaped fields fall back to
//! [`MISSING_VALUE`] or compact JSON.

use crate::model::category::Category;
use crate::model::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Placeholder for fields a record does not carry.
pub const MISSING_VALUE: &str = "n/a";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Formats one record as a single display line for `category`.
pub fn format_record(category: Category, record: &Record) -> String {
    match category {
        Category::Prescriptions => format!(
            "{} - {}",
            field(record, "medicineName"),
            field(record, "dosage")
        ),
        Category::DoctorVisits => format!(
            "{} - {}",
            date_field(record, "date").unwrap_or_else(|| MISSING_VALUE.to_string()),
            field(record, "doctorName")
        ),
        Category::Temperature => dated(
            record,
            with_unit(field(record, "temperature"), optional_field(record, "unit")),
        ),
        Category::Allergies => match record.get("items") {
            Some(items) => display_value(items),
            None => compact_json(&Value::Object(record.clone())),
        },
        Category::BloodGlucose => dated(
            record,
            with_unit(field(record, "level"), optional_field(record, "unit")),
        ),
        Category::LabResults => match optional_field(record, "testName") {
            Some(test_name) => format!("{test_name}: {}", field(record, "result")),
            None => field(record, "result"),
        },
        Category::Radiology => field(record, "imageUrl"),
        Category::HeartRate => dated(record, format!("{} bpm", field(record, "bpm"))),
        Category::BloodPressure => dated(
            record,
            format!(
                "{}/{} mmHg",
                field(record, "systolic"),
                field(record, "diastolic")
            ),
        ),
        Category::VitalSigns => format!("{}: {}", field(record, "name"), field(record, "value")),
    }
}

/// Renders any JSON value as display text.
///
/// - strings are whitespace-normalized
/// - lists are joined with `, `
/// - objects fall back to compact JSON
/// - null, empty strings and empty lists show [`MISSING_VALUE`]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => MISSING_VALUE.to_string(),
        Value::Bool(flag) => String::from(if *flag { "yes" } else { "no" }),
        Value::Number(number) => number.to_string(),
        Value::String(text) => {
            let normalized = normalize_text(text);
            if normalized.is_empty() {
                MISSING_VALUE.to_string()
            } else {
                normalized
            }
        }
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(display_value)
                .filter(|part| part != MISSING_VALUE)
                .collect();
            if parts.is_empty() {
                MISSING_VALUE.to_string()
            } else {
                parts.join(", ")
            }
        }
        Value::Object(_) => compact_json(value),
    }
}

/// Renders a date-like value as `YYYY-MM-DD`.
///
/// Accepts epoch milliseconds, `{seconds, nanoseconds}` timestamp maps,
/// RFC 3339 strings and plain `YYYY-MM-DD` strings. Other strings are
/// returned normalized; other shapes yield `None`.
pub fn format_date(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => {
            let millis = number.as_i64()?;
            let datetime =
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?;
            format_calendar_date(datetime.date())
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let datetime = OffsetDateTime::from_unix_timestamp(seconds).ok()?;
            format_calendar_date(datetime.date())
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(datetime) = OffsetDateTime::parse(trimmed, &Rfc3339) {
                return format_calendar_date(datetime.date());
            }
            if let Ok(date) = Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
                return format_calendar_date(date);
            }
            Some(normalize_text(trimmed))
        }
        _ => None,
    }
}

fn format_calendar_date(date: Date) -> Option<String> {
    date.format(format_description!("[year]-[month]-[day]")).ok()
}

fn field(record: &Record, name: &str) -> String {
    record
        .get(name)
        .map_or_else(|| MISSING_VALUE.to_string(), display_value)
}

fn optional_field(record: &Record, name: &str) -> Option<String> {
    let value = display_value(record.get(name)?);
    (value != MISSING_VALUE).then_some(value)
}

fn date_field(record: &Record, name: &str) -> Option<String> {
    record.get(name).and_then(format_date)
}

fn dated(record: &Record, line: String) -> String {
    match date_field(record, "date") {
        Some(date) => format!("{date}: {line}"),
        None => line,
    }
}

fn with_unit(value: String, unit: Option<String>) -> String {
    match unit {
        Some(unit) if value != MISSING_VALUE => format!("{value} {unit}"),
        _ => value,
    }
}

fn compact_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| MISSING_VALUE.to_string())
}

fn normalize_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{display_value, format_date, format_record, MISSING_VALUE};
    use crate::model::category::Category;
    use crate::model::record::Record;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn prescriptions_join_list_valued_medicine_names() {
        let line = format_record(
            Category::Prescriptions,
            &record(json!({"medicineName": ["Ibuprofen", "Codeine"], "dosage": "200mg"})),
        );
        assert_eq!(line, "Ibuprofen, Codeine - 200mg");
    }

    #[test]
    fn missing_fields_fall_back_to_placeholder() {
        let line = format_record(Category::VitalSigns, &record(json!({"name": "SpO2"})));
        assert_eq!(line, format!("SpO2: {MISSING_VALUE}"));

        let line = format_record(Category::DoctorVisits, &record(json!({})));
        assert_eq!(line, format!("{MISSING_VALUE} - {MISSING_VALUE}"));
    }

    #[test]
    fn allergies_without_items_render_as_compact_json() {
        let line = format_record(Category::Allergies, &record(json!({"allergen": "peanut"})));
        assert_eq!(line, r#"{"allergen":"peanut"}"#);

        let line = format_record(
            Category::Allergies,
            &record(json!({"items": ["peanut", "", "latex"]})),
        );
        assert_eq!(line, "peanut, latex");
    }

    #[test]
    fn measurements_carry_unit_and_date_prefix() {
        let line = format_record(
            Category::Temperature,
            &record(json!({"temperature": 37.2, "unit": "C", "date": "2024-03-05T08:30:00Z"})),
        );
        assert_eq!(line, "2024-03-05: 37.2 C");

        let line = format_record(
            Category::BloodPressure,
            &record(json!({"systolic": 120, "diastolic": 80})),
        );
        assert_eq!(line, "120/80 mmHg");

        let line = format_record(Category::HeartRate, &record(json!({"bpm": 72})));
        assert_eq!(line, "72 bpm");
    }

    #[test]
    fn unit_is_dropped_when_value_is_missing() {
        let line = format_record(Category::BloodGlucose, &record(json!({"unit": "mmol/L"})));
        assert_eq!(line, MISSING_VALUE);
    }

    #[test]
    fn lab_results_prefix_test_name_when_present() {
        let line = format_record(
            Category::LabResults,
            &record(json!({"testName": "HbA1c", "result": "5.9%"})),
        );
        assert_eq!(line, "HbA1c: 5.9%");
    }

    #[test]
    fn format_date_accepts_common_shapes() {
        assert_eq!(
            format_date(&json!(1_704_067_200_000_i64)).as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(
            format_date(&json!({"seconds": 1_704_067_200, "nanoseconds": 0})).as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(format_date(&json!("2024-01-01")).as_deref(), Some("2024-01-01"));
        assert_eq!(format_date(&json!("last  week")).as_deref(), Some("last week"));
        assert_eq!(format_date(&json!(true)), None);
    }

    #[test]
    fn display_value_collapses_whitespace() {
        assert_eq!(display_value(&json!("  two\nlines  ")), "two lines");
        assert_eq!(display_value(&json!("   ")), MISSING_VALUE);
        assert_eq!(display_value(&json!([])), MISSING_VALUE);
    }
}
