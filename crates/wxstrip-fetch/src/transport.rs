//! Timed HTTP calls against the weather aggregation API.
//!
//! Every call carries its own deadline; a breach cancels the in-flight
//! request and surfaces as [`FetchError::Timeout`]. Bodies that are not
//! JSON are returned verbatim as [`Payload::Raw`] because upstream mixes
//! JSON and plain text on the same endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

use wxstrip_core::{ClientConfig, Site};

use crate::error::FetchError;
use crate::proxy::ProxyTransform;

/// A successfully delivered upstream body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

impl Payload {
    /// The payload as an untyped value; raw text becomes a JSON string.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Raw(text) => Value::String(text),
        }
    }
}

pub type PayloadResult = Result<Payload, FetchError>;

/// Result of a successful existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    pub status: u16,
    pub content_type: Option<String>,
}

/// Per-call options. `timeout` is a hard deadline for the whole exchange,
/// body included.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub timeout: Duration,
}

impl CallOptions {
    #[must_use]
    pub fn get(timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            timeout,
        }
    }

    #[must_use]
    pub fn head(timeout: Duration) -> Self {
        Self {
            method: Method::HEAD,
            timeout,
        }
    }
}

pub struct Transport {
    client: Client,
    api_base_url: Url,
    proxy: ProxyTransform,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl Transport {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FetchError::InvalidUrl`] if the API base URL does not parse.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()?;
        let api_base_url =
            Url::parse(&config.api_base_url).map_err(|e| FetchError::InvalidUrl {
                url: config.api_base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_base_url,
            proxy: ProxyTransform::from_config(config),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        })
    }

    #[must_use]
    pub fn proxy(&self) -> &ProxyTransform {
        &self.proxy
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Fetches one text product for a site.
    ///
    /// # Errors
    ///
    /// See [`Transport::call`].
    pub async fn fetch_alpha(&self, site: &Site, alpha: &str) -> PayloadResult {
        let url = self.api_url(&[
            ("site", site.as_str()),
            ("alpha", alpha),
            ("notam_choice", "default"),
        ]);
        self.call_proxied(url).await
    }

    /// Fetches one image product (e.g. `"RADAR/COMPOSITE"` or
    /// `"GFA/GFACN34/CLDWX"`) for a site.
    ///
    /// # Errors
    ///
    /// See [`Transport::call`].
    pub async fn fetch_image(&self, site: &Site, image: &str) -> PayloadResult {
        let url = self.api_url(&[("site", site.as_str()), ("image", image)]);
        self.call_proxied(url).await
    }

    async fn call_proxied(&self, url: Url) -> PayloadResult {
        let target = self.proxy.wrap(url.as_str());
        tracing::debug!(url = %url, target = %target, "fetching");
        self.call(&target, &CallOptions::get(self.request_timeout))
            .await
    }

    /// Issues one timed call and classifies the response.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotFound`] on 404 (soft).
    /// - [`FetchError::NoData`] on a 2xx with an empty body (soft).
    /// - [`FetchError::Upstream`] on a JSON object body carrying `error` (soft).
    /// - [`FetchError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`FetchError::Timeout`] when the deadline elapses.
    /// - [`FetchError::Http`] on network failure.
    pub async fn call(&self, url: &str, options: &CallOptions) -> PayloadResult {
        with_deadline(url, options.timeout, self.exchange(url, &options.method)).await
    }

    async fn exchange(&self, url: &str, method: &Method) -> PayloadResult {
        let response = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = check_status(url, response.status())?;
        let body = response.text().await?;
        tracing::debug!(url, len = body.len(), "response received");
        classify_body(url, status, body)
    }

    /// Lightweight existence check (HEAD) with the shorter probe deadline.
    ///
    /// # Errors
    ///
    /// Same classification as [`Transport::call`] minus body handling.
    pub async fn probe(&self, url: &str) -> Result<ProbeHit, FetchError> {
        with_deadline(url, self.probe_timeout, self.head(url)).await
    }

    async fn head(&self, url: &str) -> Result<ProbeHit, FetchError> {
        let options = CallOptions::head(self.probe_timeout);
        let response = self.client.request(options.method, url).send().await?;
        let status = check_status(url, response.status())?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(ProbeHit {
            status,
            content_type,
        })
    }

    /// Builds an API URL with properly percent-encoded query parameters and a
    /// trailing cache-buster.
    fn api_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.api_base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("_", &chrono::Utc::now().timestamp_millis().to_string());
        }
        url
    }
}

async fn with_deadline<T, Fut>(url: &str, deadline: Duration, exchange: Fut) -> Result<T, FetchError>
where
    Fut: Future<Output = Result<T, FetchError>>,
{
    let timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
    match tokio::time::timeout(deadline, exchange).await {
        Ok(Err(FetchError::Http(e))) if e.is_timeout() => Err(FetchError::Timeout {
            url: url.to_owned(),
            timeout_ms,
        }),
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url, timeout_ms, "request deadline elapsed");
            Err(FetchError::Timeout {
                url: url.to_owned(),
                timeout_ms,
            })
        }
    }
}

/// 404 is soft-absent; every other non-2xx status is a hard failure.
fn check_status(url: &str, status: StatusCode) -> Result<u16, FetchError> {
    if status == StatusCode::NOT_FOUND {
        tracing::warn!(url, "upstream returned 404");
        return Err(FetchError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "upstream returned error status");
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(status.as_u16())
}

fn classify_body(url: &str, status: u16, body: String) -> PayloadResult {
    if body.trim().is_empty() {
        return Err(FetchError::NoData {
            url: url.to_owned(),
            status,
        });
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => {
            if let Some(message) = value
                .get("error")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
            {
                return Err(FetchError::Upstream {
                    message: message.to_owned(),
                });
            }
            Ok(Payload::Json(value))
        }
        Err(_) => Ok(Payload::Raw(body)),
    }
}
