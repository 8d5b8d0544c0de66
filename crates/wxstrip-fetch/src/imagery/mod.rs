//! Imagery normalization.
//!
//! Image products arrive as a pass-through `images` list, a `data` array
//! whose elements hide JSON in a `text` field (usually frame lists), a bare
//! image object, a top-level frame list, or a string with URLs in it.
//! [`ImageNormalizer::normalize_images`] tries those shapes in order and
//! always returns an [`ImageRecord`]; a payload nothing recognizes yields an
//! empty record with an error and a [`DebugInfo`] describing its shape.

mod shapes;

use serde_json::Value;

use wxstrip_core::{ClientConfig, DebugInfo, ImageDescriptor, ImageRecord};

use crate::proxy::ProxyTransform;

use shapes::{Outcome, Scan};

pub const UNSUPPORTED_STRUCTURE: &str = "Unsupported image data structure.";
pub const NO_DATA: &str = "No data provided to parser.";

#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    proxy: ProxyTransform,
    frame_image_base_url: String,
}

impl ImageNormalizer {
    #[must_use]
    pub fn new(proxy: ProxyTransform, frame_image_base_url: impl Into<String>) -> Self {
        Self {
            proxy,
            frame_image_base_url: frame_image_base_url.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            ProxyTransform::from_config(config),
            config.frame_image_base_url.clone(),
        )
    }

    /// Converts an image-product payload into a uniform [`ImageRecord`].
    ///
    /// Never fails. Every returned descriptor carries a proxy URL and an
    /// ordered fallback list. Running the normalizer on its own serialized
    /// output returns the same record.
    #[must_use]
    pub fn normalize_images(&self, payload: &Value) -> ImageRecord {
        let scan = Scan {
            frame_image_base_url: &self.frame_image_base_url,
            depth: 0,
        };
        match shapes::recognize(payload, scan) {
            Outcome::Images(images) => {
                ImageRecord::from_images(images.into_iter().map(|i| self.finish(i)).collect())
            }
            Outcome::Empty { error, debug_info } => ImageRecord {
                images: Vec::new(),
                error,
                debug_info,
            },
            Outcome::NoMatch => unsupported(payload),
        }
    }

    /// Builds a descriptor for a URL known to point at an image, e.g. a
    /// successful direct probe.
    #[must_use]
    pub fn describe(
        &self,
        url: &str,
        period: &str,
        product: &str,
        content_type: Option<String>,
    ) -> ImageDescriptor {
        self.finish(ImageDescriptor {
            url: url.to_owned(),
            proxy_url: String::new(),
            fallback_urls: Vec::new(),
            period: period.to_owned(),
            content_type: content_type.or_else(|| shapes::content_type_for(url)),
            product: product.to_owned(),
            geography: None,
            image_id: None,
            frame_info: None,
        })
    }

    /// Fills in the proxy URL and rebuilds the fallback list as proxy,
    /// direct, mirrors, then any extra fallbacks the payload already had.
    fn finish(&self, mut image: ImageDescriptor) -> ImageDescriptor {
        if image.proxy_url.is_empty() {
            image.proxy_url = self.proxy.wrap(&image.url);
        }
        let mut fallbacks = self.proxy.fallback_urls(&image.url, &image.proxy_url);
        for extra in std::mem::take(&mut image.fallback_urls) {
            if !extra.is_empty() && !fallbacks.contains(&extra) {
                fallbacks.push(extra);
            }
        }
        image.fallback_urls = fallbacks;
        image
    }
}

fn unsupported(payload: &Value) -> ImageRecord {
    let error = match payload {
        Value::Null => NO_DATA.to_owned(),
        _ => payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.trim().is_empty())
            .map_or_else(|| UNSUPPORTED_STRUCTURE.to_owned(), str::to_owned),
    };
    let debug_info: DebugInfo = shapes::debug_info(payload);
    tracing::warn!(
        payload_type = %debug_info.payload_type,
        keys = ?debug_info.keys,
        error = %error,
        "image payload not recognized"
    );
    ImageRecord {
        images: Vec::new(),
        error: Some(error),
        debug_info: Some(debug_info),
    }
}

#[cfg(test)]
#[path = "imagery_test.rs"]
mod tests;
