//! Product catalog and per-site request construction.

use serde::{Deserialize, Serialize};

use crate::regions::GfaRegion;
use crate::site::Site;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Textual bulletin (METAR, TAF, NOTAM, ...).
    Alpha,
    /// Chart or imagery product.
    Image,
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Alpha => write!(f, "alpha"),
            ProductKind::Image => write!(f, "image"),
        }
    }
}

/// One upstream request for one product at one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRequest {
    pub site: Site,
    pub kind: ProductKind,
    pub product: String,
    pub region: Option<GfaRegion>,
}

impl ProductRequest {
    /// `true` for GFA image products at a site whose region is known. GFA
    /// products at unmapped sites go through the plain image path.
    #[must_use]
    pub fn is_gfa(&self) -> bool {
        self.kind == ProductKind::Image && self.product.contains("GFA") && self.region.is_some()
    }

    /// The chart code of a GFA product path: `"GFA/CLDWX"` → `"CLDWX"`.
    #[must_use]
    pub fn gfa_product_code(&self) -> &str {
        self.product
            .split('/')
            .nth(1)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.product)
    }
}

/// The products the user selected for a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSelection {
    pub alpha: Vec<String>,
    pub image: Vec<String>,
}

impl Default for ProductSelection {
    fn default() -> Self {
        Self {
            alpha: ["metar", "taf", "notam", "sigmet", "pirep"]
                .map(str::to_owned)
                .to_vec(),
            image: ["GFA/CLDWX", "GFA/TURBC", "RADAR/COMPOSITE", "SATELLITE/IR"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

impl ProductSelection {
    /// Builds the ordered request list for one site: alpha products first,
    /// then image products. Repeated product names are collapsed so each
    /// product yields exactly one record.
    #[must_use]
    pub fn requests_for(&self, site: &Site, region: Option<GfaRegion>) -> Vec<ProductRequest> {
        let mut requests: Vec<ProductRequest> = Vec::new();
        let kinds = [
            (ProductKind::Alpha, &self.alpha),
            (ProductKind::Image, &self.image),
        ];
        for (kind, products) in kinds {
            for product in products {
                let product = product.trim();
                if product.is_empty()
                    || requests
                        .iter()
                        .any(|r| r.kind == kind && r.product == product)
                {
                    continue;
                }
                requests.push(ProductRequest {
                    site: site.clone(),
                    kind,
                    product: product.to_owned(),
                    region,
                });
            }
        }
        requests
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty() && self.image.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaProduct {
    pub value: &'static str,
    pub label: &'static str,
    pub essential: bool,
}

pub const ALPHA_PRODUCTS: &[AlphaProduct] = &[
    AlphaProduct { value: "metar", label: "METAR - Current Conditions", essential: true },
    AlphaProduct { value: "taf", label: "TAF - Terminal Forecasts", essential: true },
    AlphaProduct { value: "notam", label: "NOTAM - Notices to Airmen", essential: false },
    AlphaProduct { value: "sigmet", label: "SIGMET - Significant Meteorology", essential: true },
    AlphaProduct { value: "airmet", label: "AIRMET - Airmen's Meteorological", essential: false },
    AlphaProduct { value: "pirep", label: "PIREP - Pilot Reports", essential: true },
    AlphaProduct { value: "upperwind", label: "Upper Winds Aloft", essential: false },
    AlphaProduct { value: "space_weather", label: "Space Weather", essential: false },
    AlphaProduct { value: "vfr_route", label: "VFR Route Information", essential: false },
    AlphaProduct { value: "area_forecast", label: "Area Forecasts", essential: false },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    Satellite,
    Radar,
    Gfa,
    SigWx,
}

impl ImageCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ImageCategory::Satellite => "Satellite Products",
            ImageCategory::Radar => "Radar Products",
            ImageCategory::Gfa => "GFA Products",
            ImageCategory::SigWx => "Significant Weather Charts",
        }
    }

    /// Classifies an image product path. Catalog entries win; unknown paths
    /// are classified by the family name they contain.
    #[must_use]
    pub fn of(product: &str) -> Option<ImageCategory> {
        if let Some(known) = IMAGE_PRODUCTS.iter().find(|p| p.value == product) {
            return Some(known.category);
        }
        let upper = product.to_ascii_uppercase();
        if upper.contains("SATELLITE") {
            Some(ImageCategory::Satellite)
        } else if upper.contains("RADAR") {
            Some(ImageCategory::Radar)
        } else if upper.contains("GFA") {
            Some(ImageCategory::Gfa)
        } else if upper.contains("SIG_WX") || upper.contains("PROG_CHARTS") {
            Some(ImageCategory::SigWx)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProduct {
    pub value: &'static str,
    pub label: &'static str,
    pub category: ImageCategory,
    pub essential: bool,
}

const fn image(
    value: &'static str,
    label: &'static str,
    category: ImageCategory,
    essential: bool,
) -> ImageProduct {
    ImageProduct { value, label, category, essential }
}

pub const IMAGE_PRODUCTS: &[ImageProduct] = &[
    image("SATELLITE/IR", "Infrared Satellite", ImageCategory::Satellite, false),
    image("SATELLITE/VIS", "Visible Satellite", ImageCategory::Satellite, false),
    image("SATELLITE/WV", "Water Vapor", ImageCategory::Satellite, false),
    image("SATELLITE/RGB", "RGB Composite", ImageCategory::Satellite, false),
    image("RADAR/ECHOTOP", "Echo Tops", ImageCategory::Radar, false),
    image("RADAR/CAPPI_RAIN", "CAPPI Rain", ImageCategory::Radar, false),
    image("RADAR/CAPPI_SNOW", "CAPPI Snow", ImageCategory::Radar, false),
    image("RADAR/COMPOSITE", "Radar Composite", ImageCategory::Radar, true),
    image("RADAR/VELOCITY", "Doppler Velocity", ImageCategory::Radar, false),
    image("GFA/CLDWX", "Cloud & Weather", ImageCategory::Gfa, true),
    image("GFA/TURBC", "Icing & Turbulence", ImageCategory::Gfa, true),
    image("GFA/WINDS", "Winds Aloft", ImageCategory::Gfa, false),
    image("GFA/FREEZING", "Freezing Level", ImageCategory::Gfa, false),
    image("SIG_WX/HIGH_LEVEL", "High Level SIGWX", ImageCategory::SigWx, false),
    image("SIG_WX/MID_LEVEL", "Mid Level SIGWX", ImageCategory::SigWx, false),
    image("SIG_WX/DEPICTION/SURFACE", "Surface Analysis", ImageCategory::SigWx, false),
    image("PROG_CHARTS/SURFACE", "Surface Prognosis", ImageCategory::SigWx, false),
];
