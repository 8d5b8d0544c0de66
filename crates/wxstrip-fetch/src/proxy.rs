//! URL rewriting through the public relay and its mirrors.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use wxstrip_core::ClientConfig;

/// Characters left untouched by JavaScript's `encodeURIComponent`, which is
/// what the relays expect in their query string.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Rewrites direct upstream URLs through a URL-rewriting relay.
///
/// An empty prefix disables the relay: [`ProxyTransform::wrap`] returns the
/// URL unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTransform {
    prefix: String,
    mirrors: Vec<String>,
}

impl ProxyTransform {
    #[must_use]
    pub fn new(prefix: impl Into<String>, mirrors: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mirrors,
        }
    }

    #[must_use]
    pub fn direct() -> Self {
        Self::new("", Vec::new())
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.proxy_prefix.clone(), config.mirror_prefixes.clone())
    }

    /// Routes `url` through the relay. Already-wrapped URLs are returned as is.
    #[must_use]
    pub fn wrap(&self, url: &str) -> String {
        wrap_with(&self.prefix, url)
    }

    /// Ordered image-load fallbacks: proxied URL, direct URL, then each
    /// mirror. Duplicates and blanks are dropped.
    #[must_use]
    pub fn fallback_urls(&self, url: &str, proxy_url: &str) -> Vec<String> {
        let mirrors = self.mirrors.iter().map(|m| wrap_with(m, url));
        let mut out: Vec<String> = Vec::new();
        for candidate in [proxy_url.to_owned(), url.to_owned()].into_iter().chain(mirrors) {
            if !candidate.is_empty() && !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }
}

fn wrap_with(prefix: &str, url: &str) -> String {
    if prefix.is_empty() || url.is_empty() || url.starts_with(prefix) {
        return url.to_owned();
    }
    format!("{prefix}{}", utf8_percent_encode(url, URI_COMPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> ProxyTransform {
        ProxyTransform::new(
            "https://corsproxy.io/?",
            vec!["https://api.allorigins.win/raw?url=".to_owned()],
        )
    }

    #[test]
    fn wrap_encodes_like_encode_uri_component() {
        let wrapped = relay().wrap("https://plan.navcanada.ca/weather/images/123.image?a=1&b=(x)");
        assert_eq!(
            wrapped,
            "https://corsproxy.io/?https%3A%2F%2Fplan.navcanada.ca%2Fweather%2Fimages%2F123.image%3Fa%3D1%26b%3D(x)"
        );
    }

    #[test]
    fn wrap_does_not_double_wrap() {
        let once = relay().wrap("https://example.com/a.gif");
        assert_eq!(relay().wrap(&once), once);
    }

    #[test]
    fn direct_transform_is_identity() {
        assert_eq!(
            ProxyTransform::direct().wrap("https://example.com/a.gif"),
            "https://example.com/a.gif"
        );
    }

    #[test]
    fn fallbacks_are_ordered_proxy_direct_mirrors() {
        let proxy = relay();
        let url = "https://example.com/a.gif";
        let fallbacks = proxy.fallback_urls(url, &proxy.wrap(url));
        assert_eq!(
            fallbacks,
            [
                "https://corsproxy.io/?https%3A%2F%2Fexample.com%2Fa.gif",
                "https://example.com/a.gif",
                "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2Fa.gif",
            ]
        );
    }

    #[test]
    fn fallbacks_collapse_when_relay_is_disabled() {
        let proxy = ProxyTransform::direct();
        let url = "https://example.com/a.gif";
        assert_eq!(proxy.fallback_urls(url, &proxy.wrap(url)), [url]);
    }
}
