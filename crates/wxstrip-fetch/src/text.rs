//! Text-product normalization.
//!
//! Upstream returns the same bulletin as a plain string, a JSON string nested
//! inside JSON, an object with one of several text fields, an array of any of
//! those, or an object wrapping a `data` array. [`normalize_text`] tries each
//! recognized shape in order and falls back to a pretty-printed dump, so it
//! always produces a string.

use serde_json::{Map, Value};

/// Text fields in the order they are preferred.
const PREFERRED_FIELDS: [&str; 10] = [
    "english", "french", "raw", "text", "body", "report", "metar", "taf", "message", "remarks",
];

/// Substrings that identify a raw NOTAM block inside an arbitrary field.
const NOTAM_MARKERS: [&str; 3] = ["E)", "Q)", "NOTAM"];

const MAX_DEPTH: usize = 16;

type TextShape = fn(&Value, usize) -> Option<String>;

/// Recognizers tried in order; the first that yields text wins.
const SHAPES: [(&str, TextShape); 5] = [
    ("string", from_string),
    ("preferred_field", from_preferred_field),
    ("string_array", from_string_array),
    ("data_array", from_data_array),
    ("notam_marker", from_notam_marker),
];

/// Converts an arbitrarily shaped text payload into readable plain text.
///
/// Never fails: unrecognized shapes are pretty-printed.
#[must_use]
pub fn normalize_text(payload: &Value) -> String {
    normalize_at(payload, 0)
}

fn normalize_at(value: &Value, depth: usize) -> String {
    match value {
        Value::Null => return String::new(),
        Value::Bool(b) => return b.to_string(),
        Value::Number(n) => return n.to_string(),
        _ => {}
    }
    if depth > MAX_DEPTH {
        return pretty(value);
    }
    SHAPES
        .iter()
        .find_map(|(name, shape)| {
            let text = shape(value, depth)?;
            tracing::trace!(shape = name, "text payload recognized");
            Some(text)
        })
        .unwrap_or_else(|| pretty(value))
}

fn from_string(value: &Value, depth: usize) -> Option<String> {
    let s = value.as_str()?;
    Some(normalize_str(s, depth))
}

/// Strips upstream's wrapping parentheses, then decodes double-encoded
/// JSON when what remains looks like it.
fn normalize_str(s: &str, depth: usize) -> String {
    let unwrapped = strip_wrapping_parens(s);
    let trimmed = unwrapped.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
            return normalize_at(&decoded, depth + 1);
        }
    }
    unwrapped
}

fn from_preferred_field(value: &Value, depth: usize) -> Option<String> {
    let map = value.as_object()?;
    PREFERRED_FIELDS.iter().find_map(|field| match map.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_str(s, depth)),
        v @ Value::Object(inner) if !inner.is_empty() => Some(normalize_at(v, depth + 1)),
        v @ Value::Array(items) if !items.is_empty() => Some(normalize_at(v, depth + 1)),
        _ => None,
    })
}

fn from_string_array(value: &Value, depth: usize) -> Option<String> {
    let items = value.as_array()?;
    let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
    let joined = strings?
        .into_iter()
        .map(|s| normalize_str(s, depth))
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(joined)
}

fn from_data_array(value: &Value, depth: usize) -> Option<String> {
    let items = value.as_object()?.get("data")?.as_array()?;
    let joined = items
        .iter()
        .map(|item| normalize_at(item, depth + 1))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(joined)
}

fn from_notam_marker(value: &Value, _depth: usize) -> Option<String> {
    let map: &Map<String, Value> = value.as_object()?;
    map.values()
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty() && NOTAM_MARKERS.iter().any(|m| s.contains(m)))
        .map(strip_wrapping_parens)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Removes parentheses that wrap the whole string, e.g. `"(CYYT NOTAM)"`.
///
/// NOTAM bodies contain unmatched `Q)` / `E)` item markers, so the check is
/// on the outer characters only. Strings without a wrapping pair are
/// returned unchanged, whitespace included.
#[must_use]
pub fn strip_wrapping_parens(s: &str) -> String {
    let mut current = s.trim();
    let mut stripped = false;
    while current.len() >= 2 && current.starts_with('(') && current.ends_with(')') {
        current = current[1..current.len() - 1].trim();
        stripped = true;
    }
    if stripped {
        current.to_owned()
    } else {
        s.to_owned()
    }
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
