//! Graphical Area Forecast resolution.
//!
//! GFA charts are first requested through the structured API. When that
//! fails or comes back without usable frames, the four canonical forecast
//! hours are probed directly on the chart host and whatever answers is kept.

use futures::future::join_all;
use serde_json::Value;

use wxstrip_core::{GfaRegion, ImageRecord, NotFoundPolicy, Site};

use crate::imagery::ImageNormalizer;
use crate::retry::{retriable_under, retry_with_backoff, RetryPolicy};
use crate::transport::Transport;

/// Forecast-hour offsets published for every GFA chart.
pub const PROBE_OFFSETS: [&str; 4] = ["000", "006", "012", "018"];

const FRAME_MARKERS: [&str; 2] = ["frame_lists", "frameLists"];

/// Region serving `site`, if the site is in the lookup table.
#[must_use]
pub fn resolve_site(site: &str) -> Option<GfaRegion> {
    GfaRegion::for_site(site)
}

/// A structured answer counts only if it has frame-list markers or a
/// non-empty `data` array.
#[must_use]
pub fn has_usable_frames(payload: &Value) -> bool {
    if FRAME_MARKERS.iter().any(|k| payload.get(*k).is_some()) {
        return true;
    }
    payload
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// Fetches GFA charts for one site and product.
pub struct GfaResolver<'a> {
    pub transport: &'a Transport,
    pub retry: &'a RetryPolicy,
    pub images: &'a ImageNormalizer,
    pub image_base_url: &'a str,
    pub not_found: NotFoundPolicy,
}

impl GfaResolver<'_> {
    /// Structured API first, direct probes second. Never fails: a record
    /// with no images carries the reason in its `error`.
    pub async fn fetch_gfa_product(
        &self,
        site: &Site,
        region: GfaRegion,
        product: &str,
    ) -> ImageRecord {
        let path = format!("GFA/{}/{product}", region.code());
        let fetched = retry_with_backoff(self.retry, retriable_under(self.not_found), || {
            self.transport.fetch_image(site, &path)
        })
        .await;

        match fetched {
            Ok(payload) => {
                let payload = payload.into_value();
                if has_usable_frames(&payload) {
                    let record = self.images.normalize_images(&payload);
                    if !record.images.is_empty() {
                        return record;
                    }
                }
                tracing::info!(
                    site = %site,
                    region = region.code(),
                    product,
                    "structured GFA response had no frames, probing chart host"
                );
            }
            Err(err) => {
                tracing::warn!(
                    site = %site,
                    region = region.code(),
                    product,
                    error = %err,
                    "structured GFA request failed, probing chart host"
                );
            }
        }
        self.probe_direct(region, product).await
    }

    /// Candidate chart URLs, one per forecast offset.
    #[must_use]
    pub fn probe_urls(&self, region: GfaRegion, product: &str) -> Vec<(&'static str, String)> {
        let region = region.code().to_ascii_lowercase();
        let product = product.to_ascii_lowercase();
        PROBE_OFFSETS
            .iter()
            .map(|offset| {
                (
                    *offset,
                    format!("{}{region}_{product}_{offset}.gif", self.image_base_url),
                )
            })
            .collect()
    }

    async fn probe_direct(&self, region: GfaRegion, product: &str) -> ImageRecord {
        let candidates = self.probe_urls(region, product);
        let probes = candidates.iter().map(|(_, url)| {
            let target = self.transport.proxy().wrap(url);
            async move { self.transport.probe(&target).await }
        });
        let outcomes = join_all(probes).await;

        let product_lower = product.to_ascii_lowercase();
        let images: Vec<_> = candidates
            .iter()
            .zip(outcomes)
            .filter_map(|((offset, url), outcome)| match outcome {
                Ok(hit) => Some(
                    self.images
                        .describe(url, offset, &product_lower, hit.content_type),
                ),
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "GFA probe missed");
                    None
                }
            })
            .collect();

        if images.is_empty() {
            return ImageRecord::failed(format!(
                "No direct GFA images found for {}/{product}.",
                region.code()
            ));
        }
        tracing::info!(
            region = region.code(),
            product,
            found = images.len(),
            "GFA probes found charts"
        );
        ImageRecord::from_images(images)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_known_sites_case_insensitively() {
        assert_eq!(resolve_site("cyyt"), Some(GfaRegion::Gfacn34));
        assert_eq!(resolve_site("KJFK"), None);
    }

    #[test]
    fn empty_data_is_not_usable() {
        assert!(!has_usable_frames(&json!({ "data": [] })));
        assert!(!has_usable_frames(&json!({})));
        assert!(!has_usable_frames(&json!("GFA")));
    }

    #[test]
    fn frame_markers_make_a_response_usable() {
        assert!(has_usable_frames(&json!({ "frameLists": [] })));
        assert!(has_usable_frames(
            &json!({ "data": [{ "text": "{\"frame_lists\":[]}" }] })
        ));
        assert!(has_usable_frames(&json!({ "data": [{ "type": "gfa" }] })));
    }
}
