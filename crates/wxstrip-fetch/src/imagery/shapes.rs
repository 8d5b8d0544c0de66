//! Payload shape recognizers for imagery products.
//!
//! Each recognizer either claims the payload or lets the next one try.
//! Descriptors produced here have no proxy or fallback URLs yet; the
//! normalizer fills those in afterwards.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use wxstrip_core::{DebugInfo, FrameInfo, ImageDescriptor};

static IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>\\]+?\.(?:gif|png|jpe?g)\b"#).expect("valid image url regex")
});
static OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)_(\d{3})\.(?:gif|png|jpe?g)$").expect("valid offset regex"));

const MAX_DEPTH: usize = 8;

const URL_KEYS: [&str; 5] = ["url", "imageUrl", "image_url", "proxyUrl", "proxy_url"];
const FRAME_LIST_KEYS: [&str; 2] = ["frame_lists", "frameLists"];

/// What the recognizer cascade made of a payload.
#[derive(Debug)]
pub(super) enum Outcome {
    Images(Vec<ImageDescriptor>),
    /// Upstream explicitly reported no images; `error` is carried over when
    /// the payload already had one.
    Empty {
        error: Option<String>,
        debug_info: Option<DebugInfo>,
    },
    NoMatch,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Scan<'a> {
    pub frame_image_base_url: &'a str,
    pub depth: usize,
}

impl Scan<'_> {
    fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

type PayloadShape = fn(&Value, Scan<'_>) -> Option<Outcome>;

/// Top-level recognizers tried in order; the first to claim the payload wins.
const SHAPES: [(&str, PayloadShape); 6] = [
    ("images_array", from_images_array),
    ("empty_data", from_empty_data),
    ("data_array", from_data_array),
    ("image_object", from_image_object),
    ("frame_lists", from_top_level_frame_lists),
    ("raw_string", from_raw_string),
];

type DecodedShape = fn(&Value, Scan<'_>, &str) -> Vec<ImageDescriptor>;

/// Searches applied to a decoded `data[].text` value, in order.
const DECODED_SHAPES: [(&str, DecodedShape); 5] = [
    ("frame_lists", frame_list_images),
    ("direct_url", direct_url_image),
    ("url_objects", url_object_images),
    ("nested_images", nested_images),
    ("url_scan", scanned_images),
];

pub(super) fn recognize(payload: &Value, scan: Scan<'_>) -> Outcome {
    if scan.depth > MAX_DEPTH {
        return Outcome::NoMatch;
    }
    SHAPES
        .iter()
        .find_map(|(name, shape)| {
            let outcome = shape(payload, scan)?;
            tracing::debug!(shape = name, "image payload recognized");
            Some(outcome)
        })
        .unwrap_or(Outcome::NoMatch)
}

// -----------------------------------------------------------------------
// top-level shapes
// -----------------------------------------------------------------------

fn from_images_array(payload: &Value, _scan: Scan<'_>) -> Option<Outcome> {
    let items = payload.get("images")?.as_array()?;
    let product = str_field(payload, &["product"]).unwrap_or_default();
    let images: Vec<ImageDescriptor> = items
        .iter()
        .filter_map(|item| image_from_object(item, &product))
        .collect();
    if !images.is_empty() {
        return Some(Outcome::Images(images));
    }
    if !items.is_empty() {
        // Entries without any usable URL: let the remaining shapes try.
        return None;
    }
    Some(Outcome::Empty {
        error: str_field(payload, &["error"]),
        debug_info: payload
            .get("debug_info")
            .and_then(|d| serde_json::from_value(d.clone()).ok()),
    })
}

fn from_empty_data(payload: &Value, _scan: Scan<'_>) -> Option<Outcome> {
    let items = payload.get("data")?.as_array()?;
    items.is_empty().then_some(Outcome::Empty {
        error: None,
        debug_info: None,
    })
}

fn from_data_array(payload: &Value, scan: Scan<'_>) -> Option<Outcome> {
    let items = payload.get("data")?.as_array()?;
    let images: Vec<ImageDescriptor> = items
        .iter()
        .flat_map(|item| data_item_images(item, scan))
        .collect();
    (!images.is_empty()).then_some(Outcome::Images(images))
}

fn from_image_object(payload: &Value, _scan: Scan<'_>) -> Option<Outcome> {
    let images: Vec<ImageDescriptor> = match payload {
        Value::Object(_) => image_from_object(payload, "").into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| image_from_object(item, ""))
            .collect(),
        _ => return None,
    };
    (!images.is_empty()).then_some(Outcome::Images(images))
}

fn from_top_level_frame_lists(payload: &Value, scan: Scan<'_>) -> Option<Outcome> {
    let images = frame_list_images(payload, scan, "");
    (!images.is_empty()).then_some(Outcome::Images(images))
}

fn from_raw_string(payload: &Value, scan: Scan<'_>) -> Option<Outcome> {
    let raw = payload.as_str()?;
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
            match recognize(&decoded, scan.deeper()) {
                Outcome::NoMatch => {}
                outcome => return Some(outcome),
            }
        }
    }
    let images = scan_urls(raw, "");
    (!images.is_empty()).then_some(Outcome::Images(images))
}

// -----------------------------------------------------------------------
// data[] items
// -----------------------------------------------------------------------

/// Images carried by one `data[]` element. Elements without a usable
/// `text` yield nothing rather than failing the batch.
fn data_item_images(item: &Value, scan: Scan<'_>) -> Vec<ImageDescriptor> {
    let product = str_field(item, &["product"]).unwrap_or_default();
    let decoded = match item.get("text") {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(decoded) => decoded,
            Err(_) => return scan_urls(text, &product),
        },
        Some(text) if !text.is_null() => text.clone(),
        _ => return Vec::new(),
    };
    let product = str_field(&decoded, &["product"]).unwrap_or(product);
    DECODED_SHAPES
        .iter()
        .map(|(name, shape)| (name, shape(&decoded, scan, &product)))
        .find(|(_, images)| !images.is_empty())
        .map(|(name, images)| {
            tracing::trace!(shape = name, count = images.len(), "data item decoded");
            images
        })
        .unwrap_or_default()
}

/// `frame_lists[].frames[].images[].id` → canonical frame image URLs.
fn frame_list_images(decoded: &Value, scan: Scan<'_>, product: &str) -> Vec<ImageDescriptor> {
    let Some(lists) = array_field(decoded, &FRAME_LIST_KEYS) else {
        return Vec::new();
    };
    let product = str_field(decoded, &["product"]).unwrap_or_else(|| product.to_owned());
    let geography = str_field(decoded, &["geography"]);

    let mut images = Vec::new();
    for list in lists {
        let list_start = str_field(list, &["sv"]);
        let list_end = str_field(list, &["ev"]);
        for frame in array_field(list, &["frames"]).into_iter().flatten() {
            let start = str_field(frame, &["sv"]).or_else(|| list_start.clone());
            let end = str_field(frame, &["ev"]).or_else(|| list_end.clone());
            for image in array_field(frame, &["images"]).into_iter().flatten() {
                let Some(id) = str_field(image, &["id"]) else {
                    continue;
                };
                images.push(ImageDescriptor {
                    url: format!("{}{id}.image", scan.frame_image_base_url),
                    period: start.clone().unwrap_or_default(),
                    content_type: Some("image/gif".to_owned()),
                    geography: geography.clone(),
                    image_id: Some(id),
                    frame_info: Some(FrameInfo {
                        start_validity: start.clone(),
                        end_validity: end.clone(),
                        created: str_field(image, &["created"]),
                    }),
                    ..bare_descriptor(String::new(), &product)
                });
            }
        }
    }
    images
}

fn direct_url_image(decoded: &Value, _scan: Scan<'_>, product: &str) -> Vec<ImageDescriptor> {
    image_from_object(decoded, product).into_iter().collect()
}

fn url_object_images(decoded: &Value, _scan: Scan<'_>, product: &str) -> Vec<ImageDescriptor> {
    decoded
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| image_from_object(item, product))
        .collect()
}

fn nested_images(decoded: &Value, _scan: Scan<'_>, product: &str) -> Vec<ImageDescriptor> {
    array_field(decoded, &["images"])
        .into_iter()
        .flatten()
        .filter_map(|item| image_from_object(item, product))
        .collect()
}

fn scanned_images(decoded: &Value, _scan: Scan<'_>, product: &str) -> Vec<ImageDescriptor> {
    scan_urls(&decoded.to_string(), product)
}

// -----------------------------------------------------------------------
// helpers
// -----------------------------------------------------------------------

/// Reads an image-bearing object, accepting both the normalized
/// snake_case field names and upstream's camelCase ones.
fn image_from_object(value: &Value, product: &str) -> Option<ImageDescriptor> {
    value.as_object()?;
    let url = str_field(value, &URL_KEYS)?;
    let fallback_urls = array_field(value, &["fallback_urls", "fallbackUrls"])
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect();
    let frame_info = value
        .get("frame_info")
        .or_else(|| value.get("frameInfo"))
        .filter(|fi| fi.is_object())
        .map(|fi| FrameInfo {
            start_validity: str_field(fi, &["start_validity", "startValidity"]),
            end_validity: str_field(fi, &["end_validity", "endValidity"]),
            created: str_field(fi, &["created"]),
        });

    let product = str_field(value, &["product"]).unwrap_or_else(|| product.to_owned());
    let mut image = bare_descriptor(url, &product);
    image.proxy_url = str_field(value, &["proxy_url", "proxyUrl"]).unwrap_or_default();
    image.fallback_urls = fallback_urls;
    image.period = str_field(value, &["period", "sv"]).unwrap_or_default();
    image.content_type = str_field(value, &["content_type", "contentType"])
        .or_else(|| content_type_for(&image.url));
    image.geography = str_field(value, &["geography"]);
    image.image_id = str_field(value, &["image_id", "imageId", "id"]);
    image.frame_info = frame_info;
    Some(image)
}

/// Every distinct image URL found in free text, in order of appearance.
pub(super) fn scan_urls(text: &str, product: &str) -> Vec<ImageDescriptor> {
    let mut seen: Vec<&str> = Vec::new();
    for m in IMAGE_URL_RE.find_iter(text) {
        if !seen.contains(&m.as_str()) {
            seen.push(m.as_str());
        }
    }
    seen.into_iter()
        .map(|url| {
            let period = OFFSET_RE
                .captures(url)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default();
            ImageDescriptor {
                period,
                content_type: content_type_for(url),
                ..bare_descriptor(url.to_owned(), product)
            }
        })
        .collect()
}

fn bare_descriptor(url: String, product: &str) -> ImageDescriptor {
    ImageDescriptor {
        url,
        proxy_url: String::new(),
        fallback_urls: Vec::new(),
        period: String::new(),
        content_type: None,
        product: product.to_owned(),
        geography: None,
        image_id: None,
        frame_info: None,
    }
}

pub(super) fn content_type_for(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    let ext = path.rsplit('.').next()?;
    let mime = match ext {
        "gif" => "image/gif",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(mime.to_owned())
}

/// First non-blank scalar under any of `keys`, as a string.
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn array_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| value.get(*key)?.as_array())
}

/// Shape summary used when nothing recognized the payload.
pub(super) fn debug_info(payload: &Value) -> DebugInfo {
    let payload_type = match payload {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    let len = |keys: &[&str]| array_field(payload, keys).map(Vec::len);
    DebugInfo {
        payload_type: payload_type.to_owned(),
        keys: payload
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default(),
        data_len: len(&["data"]),
        images_len: len(&["images"]),
        frame_lists_len: len(&FRAME_LIST_KEYS),
    }
}
