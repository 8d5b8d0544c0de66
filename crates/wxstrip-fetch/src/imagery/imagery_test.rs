use serde_json::json;

use super::*;

const FRAME_BASE: &str = "https://plan.navcanada.ca/weather/images/";
const RELAY: &str = "https://corsproxy.io/?";

fn normalizer() -> ImageNormalizer {
    ImageNormalizer::new(ProxyTransform::new(RELAY, Vec::new()), FRAME_BASE)
}

fn frame_text() -> Value {
    json!({
        "product": "GFA_CLDWX",
        "geography": "GFACN34",
        "frame_lists": [{
            "sv": "2024-01-12T12:00:00",
            "ev": "2024-01-13T00:00:00",
            "frames": [
                {
                    "sv": "2024-01-12T12:00:00",
                    "ev": "2024-01-12T18:00:00",
                    "images": [{ "id": 4_412_087, "created": "2024-01-12T11:31:00" }]
                },
                { "images": [{ "id": "4412088" }, { "created": "no id here" }] }
            ]
        }]
    })
}

// -----------------------------------------------------------------------
// data[] with encoded text
// -----------------------------------------------------------------------

#[test]
fn frame_lists_in_encoded_text_become_canonical_urls() {
    let payload = json!({ "data": [{ "text": frame_text().to_string() }] });
    let record = normalizer().normalize_images(&payload);

    assert_eq!(record.error, None);
    assert_eq!(record.images.len(), 2, "image without id must be skipped");

    let first = &record.images[0];
    assert_eq!(first.url, "https://plan.navcanada.ca/weather/images/4412087.image");
    assert_eq!(
        first.proxy_url,
        "https://corsproxy.io/?https%3A%2F%2Fplan.navcanada.ca%2Fweather%2Fimages%2F4412087.image"
    );
    assert_eq!(first.fallback_urls, [first.proxy_url.clone(), first.url.clone()]);
    assert_eq!(first.period, "2024-01-12T12:00:00");
    assert_eq!(first.content_type.as_deref(), Some("image/gif"));
    assert_eq!(first.product, "GFA_CLDWX");
    assert_eq!(first.geography.as_deref(), Some("GFACN34"));
    assert_eq!(first.image_id.as_deref(), Some("4412087"));
    let info = first.frame_info.as_ref().unwrap();
    assert_eq!(info.end_validity.as_deref(), Some("2024-01-12T18:00:00"));
    assert_eq!(info.created.as_deref(), Some("2024-01-12T11:31:00"));

    // Second frame has no validity of its own and inherits the list's.
    let second = &record.images[1];
    assert_eq!(second.period, "2024-01-12T12:00:00");
    assert_eq!(
        second.frame_info.as_ref().unwrap().end_validity.as_deref(),
        Some("2024-01-13T00:00:00")
    );
}

#[test]
fn frame_lists_as_object_text_are_accepted() {
    let payload = json!({ "data": [{ "text": frame_text() }] });
    assert_eq!(normalizer().normalize_images(&payload).images.len(), 2);
}

#[test]
fn broken_item_does_not_abort_the_batch() {
    let payload = json!({
        "data": [
            { "text": "{not json" },
            { "type": "no text at all" },
            { "text": frame_text().to_string() }
        ]
    });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.error, None);
    assert_eq!(record.images.len(), 2);
}

#[test]
fn direct_url_field_in_text() {
    let text = json!({ "url": "https://example.com/radar/composite.png", "product": "RADAR" });
    let payload = json!({ "data": [{ "text": text.to_string() }] });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(record.images[0].product, "RADAR");
}

#[test]
fn array_of_url_objects_in_text() {
    let text = json!([
        { "imageUrl": "https://example.com/sat/ir_1.jpg", "period": "1200Z" },
        { "label": "legend only" },
        { "imageUrl": "https://example.com/sat/ir_2.jpg", "period": "1230Z" }
    ]);
    let payload = json!({ "data": [{ "text": text.to_string() }] });
    let record = normalizer().normalize_images(&payload);
    let periods: Vec<&str> = record.images.iter().map(|i| i.period.as_str()).collect();
    assert_eq!(periods, ["1200Z", "1230Z"]);
    assert_eq!(record.images[0].content_type.as_deref(), Some("image/jpeg"));
}

#[test]
fn nested_images_array_in_text() {
    let text = json!({ "images": [{ "url": "https://example.com/sigwx/hi.gif" }] });
    let payload = json!({ "data": [{ "text": text }] });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].url, "https://example.com/sigwx/hi.gif");
}

#[test]
fn urls_are_scanned_out_of_decoded_text() {
    let text = json!({
        "html": "<img src='https://example.com/gfa/gfacn34_cldwx_006.gif'> and again https://example.com/gfa/gfacn34_cldwx_006.gif"
    });
    let payload = json!({ "data": [{ "text": text.to_string() }] });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images.len(), 1, "duplicate urls collapse");
    assert_eq!(record.images[0].period, "006");
}

#[test]
fn urls_are_scanned_out_of_undecodable_text() {
    let payload = json!({
        "data": [{ "text": "see https://example.com/a.png, https://example.com/b.JPEG" }]
    });
    let record = normalizer().normalize_images(&payload);
    let urls: Vec<&str> = record.images.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, ["https://example.com/a.png", "https://example.com/b.JPEG"]);
}

// -----------------------------------------------------------------------
// other top-level shapes
// -----------------------------------------------------------------------

#[test]
fn images_array_passes_through_keeping_proxy_url() {
    let payload = json!({
        "images": [
            { "url": "https://example.com/a.gif", "proxyUrl": "https://relay.test/a" },
            { "url": "https://example.com/b.gif" }
        ]
    });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images[0].proxy_url, "https://relay.test/a");
    assert_eq!(
        record.images[1].proxy_url,
        "https://corsproxy.io/?https%3A%2F%2Fexample.com%2Fb.gif"
    );
}

#[test]
fn empty_data_array_is_an_empty_success() {
    let record = normalizer().normalize_images(&json!({ "data": [] }));
    assert!(record.images.is_empty());
    assert_eq!(record.error, None);
    assert_eq!(record.debug_info, None);
}

#[test]
fn single_image_object() {
    let record = normalizer().normalize_images(&json!({ "imageUrl": "https://example.com/x.gif" }));
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].content_type.as_deref(), Some("image/gif"));
}

#[test]
fn top_level_frame_lists() {
    let payload = json!({
        "frameLists": [{ "frames": [{ "sv": "12Z", "images": [{ "id": 9 }] }] }]
    });
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].url, format!("{FRAME_BASE}9.image"));
    assert_eq!(record.images[0].period, "12Z");
}

#[test]
fn raw_string_is_decoded_and_recursed() {
    let payload = json!(json!({ "data": [{ "text": frame_text().to_string() }] }).to_string());
    assert_eq!(normalizer().normalize_images(&payload).images.len(), 2);
}

#[test]
fn raw_string_falls_back_to_url_scan() {
    let payload = json!("chart at https://example.com/chart.gif");
    let record = normalizer().normalize_images(&payload);
    assert_eq!(record.images.len(), 1);
    assert_eq!(record.images[0].url, "https://example.com/chart.gif");
}

#[test]
fn mirrors_extend_the_fallback_list() {
    let normalizer = ImageNormalizer::new(
        ProxyTransform::new(RELAY, vec!["https://mirror.test/raw?url=".to_owned()]),
        FRAME_BASE,
    );
    let record = normalizer.normalize_images(&json!({ "url": "https://example.com/x.gif" }));
    assert_eq!(
        record.images[0].fallback_urls,
        [
            "https://corsproxy.io/?https%3A%2F%2Fexample.com%2Fx.gif",
            "https://example.com/x.gif",
            "https://mirror.test/raw?url=https%3A%2F%2Fexample.com%2Fx.gif",
        ]
    );
}

// -----------------------------------------------------------------------
// diagnostics
// -----------------------------------------------------------------------

#[test]
fn unknown_object_yields_diagnostic() {
    let record = normalizer().normalize_images(&json!({ "status": "ok", "count": 0 }));
    assert!(record.images.is_empty());
    assert_eq!(record.error.as_deref(), Some(UNSUPPORTED_STRUCTURE));
    let debug = record.debug_info.unwrap();
    assert_eq!(debug.payload_type, "object");
    let mut keys = debug.keys.clone();
    keys.sort();
    assert_eq!(keys, ["count", "status"]);
    assert_eq!(debug.data_len, None);
}

#[test]
fn data_without_images_reports_its_length() {
    let record = normalizer().normalize_images(&json!({ "data": [{ "text": "{}" }] }));
    assert_eq!(record.error.as_deref(), Some(UNSUPPORTED_STRUCTURE));
    assert_eq!(record.debug_info.unwrap().data_len, Some(1));
}

#[test]
fn null_payload_reports_no_data() {
    let record = normalizer().normalize_images(&Value::Null);
    assert_eq!(record.error.as_deref(), Some(NO_DATA));
    assert_eq!(record.debug_info.unwrap().payload_type, "null");
}

#[test]
fn payload_error_message_is_preferred() {
    let record = normalizer().normalize_images(&json!({ "error": "Region not served" }));
    assert_eq!(record.error.as_deref(), Some("Region not served"));
}

#[test]
fn odd_inputs_never_panic() {
    for payload in [json!(true), json!(3), json!([]), json!(""), json!({}), json!([[]])] {
        let record = normalizer().normalize_images(&payload);
        assert!(record.images.is_empty(), "{payload}");
        assert!(record.error.is_some(), "{payload}");
    }
}

// -----------------------------------------------------------------------
// idempotence
// -----------------------------------------------------------------------

#[test]
fn normalizing_serialized_output_is_stable() {
    let payloads = [
        json!({ "data": [{ "text": frame_text().to_string() }] }),
        json!({ "images": [{ "url": "https://example.com/a.gif" }] }),
        json!({ "data": [] }),
        json!({ "status": "ok" }),
        Value::Null,
    ];
    let normalizer = normalizer();
    for payload in payloads {
        let once = normalizer.normalize_images(&payload);
        let twice = normalizer.normalize_images(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice, "not idempotent for {payload}");
    }
}
