//! Normalized per-product records, per-site results and the session snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::regions::GfaRegion;
use crate::site::Site;

/// Outcome of one text product request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEntry {
    Text(String),
    Error(String),
}

impl TextEntry {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, TextEntry::Error(_))
    }

    /// The string shown to a reader: the bulletin text, or `"Error: <msg>"`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            TextEntry::Text(text) => text.clone(),
            TextEntry::Error(msg) => format!("Error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub start_validity: Option<String>,
    pub end_validity: Option<String>,
    pub created: Option<String>,
}

/// One displayable image with everything the viewer needs to retry a broken
/// load: the proxied URL, the direct URL and any mirrors, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    pub proxy_url: String,
    pub fallback_urls: Vec<String>,
    /// Forecast-hour offset (`"006"`) or validity label.
    pub period: String,
    pub content_type: Option<String>,
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_info: Option<FrameInfo>,
}

/// Shape summary of a payload the imagery normalizer could not interpret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub payload_type: String,
    pub keys: Vec<String>,
    pub data_len: Option<usize>,
    pub images_len: Option<usize>,
    pub frame_lists_len: Option<usize>,
}

/// All images for one image product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub images: Vec<ImageDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl ImageRecord {
    #[must_use]
    pub fn from_images(images: Vec<ImageDescriptor>) -> Self {
        Self {
            images,
            error: None,
            debug_info: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            error: Some(message.into()),
            debug_info: None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-site request counters. `total` always equals `succeeded + failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    total: u32,
    succeeded: u32,
    failed: u32,
}

impl RequestSummary {
    pub fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total = self.succeeded + self.failed;
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn succeeded(&self) -> u32 {
        self.succeeded
    }

    #[must_use]
    pub fn failed(&self) -> u32 {
        self.failed
    }
}

/// Everything fetched for one site during one cycle.
///
/// Built incrementally by the site's task; once moved into a
/// [`SessionSnapshot`] it is only reachable through shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResult {
    site: Site,
    region: Option<GfaRegion>,
    text_records: BTreeMap<String, TextEntry>,
    image_records: BTreeMap<String, ImageRecord>,
    request_summary: RequestSummary,
}

impl SiteResult {
    #[must_use]
    pub fn new(site: Site, region: Option<GfaRegion>) -> Self {
        Self {
            site,
            region,
            text_records: BTreeMap::new(),
            image_records: BTreeMap::new(),
            request_summary: RequestSummary::default(),
        }
    }

    pub fn record_text(&mut self, product: impl Into<String>, entry: TextEntry) {
        self.request_summary.record(!entry.is_error());
        self.text_records.insert(product.into(), entry);
    }

    pub fn record_images(&mut self, product: impl Into<String>, record: ImageRecord) {
        self.request_summary.record(!record.is_error());
        self.image_records.insert(product.into(), record);
    }

    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    #[must_use]
    pub fn region(&self) -> Option<GfaRegion> {
        self.region
    }

    #[must_use]
    pub fn text_records(&self) -> &BTreeMap<String, TextEntry> {
        &self.text_records
    }

    #[must_use]
    pub fn image_records(&self) -> &BTreeMap<String, ImageRecord> {
        &self.image_records
    }

    #[must_use]
    pub fn request_summary(&self) -> RequestSummary {
        self.request_summary
    }
}

/// The results of one complete fetch cycle. A new cycle replaces the whole
/// snapshot; nothing is merged across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub site_results: BTreeMap<Site, SiteResult>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, results: impl IntoIterator<Item = SiteResult>) -> Self {
        let site_results = results
            .into_iter()
            .map(|r| (r.site().clone(), r))
            .collect();
        Self {
            timestamp,
            site_results,
        }
    }

    #[must_use]
    pub fn total_failed(&self) -> u32 {
        self.site_results
            .values()
            .map(|r| r.request_summary().failed())
            .sum()
    }

    #[must_use]
    pub fn get(&self, site: &str) -> Option<&SiteResult> {
        self.site_results
            .iter()
            .find(|(s, _)| s.as_str().eq_ignore_ascii_case(site))
            .map(|(_, r)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(s: &str) -> Site {
        Site::parse(s).unwrap()
    }

    #[test]
    fn summary_total_tracks_outcomes() {
        let mut summary = RequestSummary::default();
        summary.record(true);
        summary.record(false);
        summary.record(true);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn site_result_counts_errors_as_failures() {
        let mut result = SiteResult::new(site("CYYT"), Some(GfaRegion::Gfacn34));
        result.record_text("metar", TextEntry::Text("CYYT 121200Z".into()));
        result.record_text("taf", TextEntry::Error("timed out".into()));
        result.record_images("GFA/CLDWX", ImageRecord::failed("no images"));
        result.record_images("RADAR/COMPOSITE", ImageRecord::from_images(vec![]));

        let summary = result.request_summary();
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 2);
        assert_eq!(result.region(), Some(GfaRegion::Gfacn34));
    }

    #[test]
    fn error_entries_render_with_prefix() {
        assert_eq!(
            TextEntry::Error("Data not available".into()).display_text(),
            "Error: Data not available"
        );
        assert_eq!(TextEntry::Text("METAR".into()).display_text(), "METAR");
    }

    #[test]
    fn snapshot_sums_failures_across_sites() {
        let mut a = SiteResult::new(site("CYYT"), None);
        a.record_text("metar", TextEntry::Error("x".into()));
        let mut b = SiteResult::new(site("CYUL"), None);
        b.record_text("metar", TextEntry::Error("y".into()));
        b.record_text("taf", TextEntry::Text("ok".into()));

        let snapshot = SessionSnapshot::new(Utc::now(), [a, b]);
        assert_eq!(snapshot.total_failed(), 2);
        assert_eq!(snapshot.site_results.len(), 2);
        assert!(snapshot.get("cyul").is_some());
    }

    #[test]
    fn image_record_serializes_without_empty_optionals() {
        let json = serde_json::to_value(ImageRecord::from_images(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({ "images": [] }));
    }
}
