use std::str::FromStr;

use crate::products::ProductKind;
use crate::site::Site;
use crate::ConfigError;

/// Upper bound on the per-site inter-request delay.
pub const MAX_REQUEST_DELAY_MS: u64 = 5_000;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 250;

/// What to do when upstream answers 404 for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Retry like any other failure before accepting the product as absent.
    Retry,
    /// Accept the 404 immediately.
    Terminal,
}

impl FromStr for NotFoundPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retry" => Ok(NotFoundPolicy::Retry),
            "terminal" => Ok(NotFoundPolicy::Terminal),
            other => Err(format!("expected \"retry\" or \"terminal\", got \"{other}\"")),
        }
    }
}

/// Transport, proxy and retry settings shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Prefix of the URL-rewriting relay; empty means requests go direct.
    pub proxy_prefix: String,
    /// Extra relay prefixes offered to the viewer as image fallbacks.
    pub mirror_prefixes: Vec<String>,
    pub gfa_image_base_url: String,
    pub frame_image_base_url: String,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    /// Fraction of each backoff delay to randomize, in `[0, 1)`.
    pub retry_jitter: f64,
    pub alpha_not_found: NotFoundPolicy,
    pub image_not_found: NotFoundPolicy,
    pub user_agent: String,
    pub log_level: String,
}

impl ClientConfig {
    #[must_use]
    pub fn not_found_policy(&self, kind: ProductKind) -> NotFoundPolicy {
        match kind {
            ProductKind::Alpha => self.alpha_not_found,
            ProductKind::Image => self.image_not_found,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://plan.navcanada.ca/weather/api/alpha/".to_owned(),
            proxy_prefix: "https://corsproxy.io/?".to_owned(),
            mirror_prefixes: vec!["https://api.allorigins.win/raw?url=".to_owned()],
            gfa_image_base_url: "https://flightplanning.navcanada.ca/Latest/gfa/anglais/images/"
                .to_owned(),
            frame_image_base_url: "https://plan.navcanada.ca/weather/images/".to_owned(),
            request_timeout_ms: 12_000,
            probe_timeout_ms: 8_000,
            max_retries: 2,
            retry_initial_delay_ms: 1_000,
            retry_jitter: 0.0,
            alpha_not_found: NotFoundPolicy::Retry,
            image_not_found: NotFoundPolicy::Retry,
            user_agent: "wxstrip/0.1 (aviation-weather)".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

/// The user's site configuration for a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub primary_site: String,
    pub additional_sites: Vec<String>,
    pub request_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            primary_site: String::new(),
            additional_sites: Vec::new(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

impl SessionConfig {
    /// Deduplicated, uppercased sites in configuration order, primary first.
    /// Blank entries are dropped; malformed identifiers are skipped with a
    /// warning-worthy entry in the second element.
    #[must_use]
    pub fn sites(&self) -> (Vec<Site>, Vec<String>) {
        let mut sites: Vec<Site> = Vec::new();
        let mut rejected = Vec::new();
        let candidates = std::iter::once(&self.primary_site).chain(&self.additional_sites);
        for raw in candidates {
            if raw.trim().is_empty() {
                continue;
            }
            match Site::parse(raw) {
                Ok(site) if !sites.contains(&site) => sites.push(site),
                Ok(_) => {}
                Err(_) => rejected.push(raw.clone()),
            }
        }
        (sites, rejected)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::DelayOutOfRange`] when the delay exceeds
    /// [`MAX_REQUEST_DELAY_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_delay_ms > MAX_REQUEST_DELAY_MS {
            return Err(ConfigError::DelayOutOfRange {
                delay_ms: self.request_delay_ms,
                max_ms: MAX_REQUEST_DELAY_MS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sites_are_uppercased_and_deduplicated() {
        let config = SessionConfig {
            primary_site: "cyyt".into(),
            additional_sites: vec!["CYUL".into(), "CYYT".into(), String::new(), "cyul".into()],
            request_delay_ms: 250,
        };
        let (sites, rejected) = config.sites();
        let names: Vec<&str> = sites.iter().map(Site::as_str).collect();
        assert_eq!(names, ["CYYT", "CYUL"]);
        assert!(rejected.is_empty());
    }

    #[test]
    fn malformed_sites_are_reported_not_fatal() {
        let config = SessionConfig {
            primary_site: String::new(),
            additional_sites: vec!["TOOLONG".into(), "CYHZ".into()],
            request_delay_ms: 0,
        };
        let (sites, rejected) = config.sites();
        assert_eq!(sites.len(), 1);
        assert_eq!(rejected, ["TOOLONG"]);
    }

    #[test]
    fn empty_config_has_no_sites() {
        let (sites, _) = SessionConfig::default().sites();
        assert!(sites.is_empty());
    }

    #[test]
    fn delay_above_maximum_is_rejected() {
        let config = SessionConfig {
            request_delay_ms: 5_001,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DelayOutOfRange { delay_ms: 5_001, .. })
        ));
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn not_found_policy_parses_case_insensitively() {
        assert_eq!("Terminal".parse::<NotFoundPolicy>(), Ok(NotFoundPolicy::Terminal));
        assert_eq!("retry".parse::<NotFoundPolicy>(), Ok(NotFoundPolicy::Retry));
        assert!("sometimes".parse::<NotFoundPolicy>().is_err());
    }

    #[test]
    fn policy_is_chosen_per_product_kind() {
        let config = ClientConfig {
            image_not_found: NotFoundPolicy::Terminal,
            ..ClientConfig::default()
        };
        assert_eq!(config.not_found_policy(ProductKind::Alpha), NotFoundPolicy::Retry);
        assert_eq!(config.not_found_policy(ProductKind::Image), NotFoundPolicy::Terminal);
    }
}
