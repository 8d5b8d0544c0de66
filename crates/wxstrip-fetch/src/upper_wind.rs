//! Decoding of the positional upper-wind array.
//!
//! Upstream ships upper winds as a JSON array (often JSON-encoded again
//! inside an item's `text` field):
//!
//! ```text
//! [zone, source, issue_time, valid_start, valid_end, frame_start, frame_end,
//!  _, _, _, _, [[altitude_ft, dir, speed, temp_c, flag], ...]]
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const LEVELS_INDEX: usize = 11;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpperWindError {
    #[error("Malformed upperwind data")]
    Malformed,

    #[error("Upper wind payload is not an array")]
    NotAnArray,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindLevel {
    pub altitude_ft: Option<i64>,
    pub wind_dir: Option<i64>,
    pub wind_spd: Option<i64>,
    pub temp_c: Option<f64>,
    pub flag: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpperWindReport {
    pub id: String,
    pub site: String,
    pub zone: String,
    pub source: String,
    pub issue_time: String,
    pub valid_start: String,
    pub valid_end: String,
    pub frame_start: String,
    pub frame_end: String,
    /// `"HH-HH"` (UTC hours of the frame window), empty when unknown.
    pub use_period: String,
    pub levels: Vec<WindLevel>,
}

/// Decodes one upper-wind item. `item` is either the positional array
/// itself or an object whose `text` holds it (as a value or a JSON string).
///
/// # Errors
///
/// [`UpperWindError::Malformed`] when `text` is a string that is not JSON,
/// [`UpperWindError::NotAnArray`] when the decoded value is not an array.
pub fn parse_upper_wind(item: &Value) -> Result<UpperWindReport, UpperWindError> {
    let decoded;
    let arr = match item.get("text") {
        Some(Value::String(text)) => {
            decoded = serde_json::from_str::<Value>(text).map_err(|_| UpperWindError::Malformed)?;
            &decoded
        }
        Some(text) if !text.is_null() => text,
        _ => item,
    };
    let fields = arr.as_array().ok_or(UpperWindError::NotAnArray)?;

    let field = |i: usize| fields.get(i).map(scalar_string).unwrap_or_default();
    let zone = field(0);
    let frame_start = field(5);
    let frame_end = field(6);

    let levels = fields
        .get(LEVELS_INDEX)
        .and_then(Value::as_array)
        .map(|levels| levels.iter().map(parse_level).collect())
        .unwrap_or_default();

    let first_of = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| item.get(*k))
            .map(scalar_string)
            .find(|s| !s.is_empty())
    };
    let site = first_of(&["site", "station", "icao"]).unwrap_or_else(|| zone.clone());

    Ok(UpperWindReport {
        id: first_of(&["pk", "ID", "id"]).unwrap_or_default(),
        site,
        use_period: use_period(&frame_start, &frame_end),
        source: field(1),
        issue_time: field(2),
        valid_start: field(3),
        valid_end: field(4),
        zone,
        frame_start,
        frame_end,
        levels,
    })
}

fn parse_level(level: &Value) -> WindLevel {
    let at = |i: usize| level.get(i);
    WindLevel {
        altitude_ft: at(0).and_then(lenient_i64),
        wind_dir: at(1).and_then(lenient_i64),
        wind_spd: at(2).and_then(lenient_i64),
        temp_c: at(3).and_then(lenient_f64),
        flag: at(4).and_then(lenient_i64),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Fractional numbers are rounded; `as` saturates out-of-range values.
#[allow(clippy::cast_possible_truncation)]
fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn use_period(frame_start: &str, frame_end: &str) -> String {
    match (parse_utc(frame_start), parse_utc(frame_end)) {
        (Some(start), Some(end)) => format!("{:02}-{:02}", start.hour(), end.hour()),
        _ => String::new(),
    }
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Renders every decodable upper-wind item in `payload` (an item, an array
/// of items, or an object with a `data` array) as a plain-text table.
/// Returns `None` when nothing in the payload decodes.
#[must_use]
pub fn render_upper_winds(payload: &Value) -> Option<String> {
    let items: Vec<&Value> = match payload.get("data").and_then(Value::as_array) {
        Some(data) => data.iter().collect(),
        None => vec![payload],
    };
    let blocks: Vec<String> = items
        .into_iter()
        .filter_map(|item| parse_upper_wind(item).ok())
        .filter(|report| !report.levels.is_empty())
        .map(|report| render_report(&report))
        .collect();
    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

fn render_report(report: &UpperWindReport) -> String {
    let mut out = format!("Upper winds {}", report.site);
    if !report.use_period.is_empty() {
        let _ = write!(out, " (use {}Z)", report.use_period);
    }
    if !report.issue_time.is_empty() {
        let _ = write!(out, ", issued {}", report.issue_time);
    }
    for level in &report.levels {
        let cell = |v: Option<i64>| v.map_or_else(|| "---".to_owned(), |v| v.to_string());
        let temp = level
            .temp_c
            .map_or_else(|| "---".to_owned(), |t| format!("{t:+.0}C"));
        let _ = write!(
            out,
            "\n{:>6} ft  {:>3}/{:>3} kt  {:>4}",
            cell(level.altitude_ft),
            cell(level.wind_dir),
            cell(level.wind_spd),
            temp
        );
    }
    out
}
