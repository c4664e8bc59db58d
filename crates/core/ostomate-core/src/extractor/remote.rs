//! Normalization of language model extraction output
//!
//! Accepted shapes are a bare array of entries or an object with an
//! `entries` array. Anything else, or any entry that cannot be read,
//! rejects the whole response so the caller can fall back.

use super::timing;
use crate::types::{confidence, EntryCategory, ParsedLogEntry};
use crate::{OstomateError, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime};
use serde_json::{Map, Value};

const SOURCE: &str = "language model";

/// Keys that may carry the entry time
const TIME_KEYS: [&str; 3] = ["timestamp", "timestampOrOffset", "time"];

/// Numeric offsets further than a week from the reference are rejected
const MAX_OFFSET_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Map a model response onto entries
pub fn normalize(value: &Value, reference: DateTime<FixedOffset>) -> Result<Vec<ParsedLogEntry>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("entries") {
            Some(Value::Array(items)) => items,
            _ => return Err(malformed("object response without an 'entries' array")),
        },
        other => {
            return Err(malformed(format!(
                "expected an array of entries, got {}",
                type_name(other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| normalize_entry(idx, item, reference))
        .collect()
}

fn normalize_entry(
    idx: usize,
    item: &Value,
    reference: DateTime<FixedOffset>,
) -> Result<ParsedLogEntry> {
    let obj = item
        .as_object()
        .ok_or_else(|| malformed(format!("entry {} is not an object", idx)))?;

    let category: EntryCategory = obj
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("entry {} has no category", idx)))?
        .parse()
        .map_err(|e: OstomateError| malformed(format!("entry {}: {}", idx, e)))?;

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(category.as_str())
        .to_string();

    let time_value = TIME_KEYS.iter().find_map(|k| obj.get(*k));
    let timestamp = parse_time(time_value, reference)
        .map_err(|msg| malformed(format!("entry {}: {}", idx, msg)))?;

    let confidence = parse_confidence(obj.get("confidence"))
        .map_err(|msg| malformed(format!("entry {}: {}", idx, msg)))?;

    let mut details = match obj.get("details") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(details)) => details.clone(),
        Some(other) => {
            return Err(malformed(format!(
                "entry {}: details must be an object, got {}",
                idx,
                type_name(other)
            )))
        }
    };
    if let EntryCategory::Meal(slot) = category {
        details.insert("meal_type".to_string(), Value::from(slot.as_str()));
    }

    let mut entry = ParsedLogEntry::new(category, description, timestamp, confidence);
    entry.details = details;
    Ok(entry)
}

/// RFC 3339 instant, "HH:MM" on the reference day, or minutes from the reference
fn parse_time(
    value: Option<&Value>,
    reference: DateTime<FixedOffset>,
) -> std::result::Result<DateTime<FixedOffset>, String> {
    match value {
        None | Some(Value::Null) => Ok(reference),
        Some(Value::Number(n)) => {
            let minutes = n
                .as_f64()
                .filter(|m| m.is_finite())
                .ok_or_else(|| format!("unusable time offset {}", n))?;
            if minutes.abs() > MAX_OFFSET_MINUTES {
                return Err(format!("time offset {} minutes is out of range", minutes));
            }
            Duration::try_seconds((minutes * 60.0).round() as i64)
                .and_then(|delta| reference.checked_add_signed(delta))
                .ok_or_else(|| format!("time offset {} minutes is out of range", minutes))
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
                return Ok(instant);
            }
            let clock = NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .map_err(|_| format!("unparseable time '{}'", s))?;
            let time = timing::TimeOfDay::new(
                chrono::Timelike::hour(&clock),
                chrono::Timelike::minute(&clock),
            )
            .ok_or_else(|| format!("time out of range '{}'", s))?;
            Ok(timing::on_reference_day(reference, time))
        }
        Some(other) => Err(format!("time must be a string or number, got {}", type_name(other))),
    }
}

fn parse_confidence(value: Option<&Value>) -> std::result::Result<f32, String> {
    match value {
        None | Some(Value::Null) => Ok(confidence::MEDIUM),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|c| c as f32)
            .ok_or_else(|| format!("unusable confidence {}", n)),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "high" => Ok(confidence::HIGH),
            "medium" => Ok(confidence::MEDIUM),
            "low" => Ok(confidence::LOW),
            other => Err(format!("unknown confidence level '{}'", other)),
        },
        Some(other) => Err(format!(
            "confidence must be a number or level, got {}",
            type_name(other)
        )),
    }
}

fn malformed(message: impl Into<String>) -> OstomateError {
    OstomateError::malformed(SOURCE, message)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
