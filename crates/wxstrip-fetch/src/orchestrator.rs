//! Fetch cycle orchestration.
//!
//! One cycle fans out to every configured site concurrently. Within a site,
//! requests run one at a time through a [`PacedQueue`], each with its own
//! retry budget, and every outcome (success or failure) lands in that
//! site's [`SiteResult`]. When all sites finish, a fresh [`SessionSnapshot`]
//! replaces the previous one and the terminal status is published.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;

use wxstrip_core::{
    ClientConfig, FetchPhase, FetchStatus, ImageRecord, ProductKind, ProductRequest,
    ProductSelection, SessionConfig, SessionSnapshot, Site, SiteResult, TextEntry,
};

use crate::error::FetchError;
use crate::gfa::{resolve_site, GfaResolver};
use crate::imagery::ImageNormalizer;
use crate::pacing::PacedQueue;
use crate::retry::{retriable_under, retry_with_backoff, RetryPolicy};
use crate::state::{CycleGuard, FetchState};
use crate::text::normalize_text;
use crate::transport::Transport;
use crate::upper_wind::render_upper_winds;

const UPPER_WIND_PRODUCT: &str = "upperwind";

pub struct WeatherFetcher {
    config: ClientConfig,
    transport: Transport,
    retry: RetryPolicy,
    images: ImageNormalizer,
    state: watch::Sender<FetchState>,
    in_flight: AtomicBool,
}

impl WeatherFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the API base
    /// URL is invalid.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let transport = Transport::new(&config)?;
        let (state, _) = watch::channel(FetchState::default());
        Ok(Self {
            retry: RetryPolicy::from_config(&config),
            images: ImageNormalizer::from_config(&config),
            transport,
            state,
            in_flight: AtomicBool::new(false),
            config,
        })
    }

    /// Replaces the retry policy, e.g. to disable back-off in tests.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<SessionSnapshot>> {
        self.state.borrow().snapshot.clone()
    }

    #[must_use]
    pub fn status(&self) -> FetchStatus {
        self.state.borrow().status.clone()
    }

    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.state.borrow().is_fetching()
    }

    /// Runs one complete fetch cycle.
    ///
    /// Returns `Ok(None)` without issuing any request when the session has
    /// no valid sites; the status then reads "No sites configured." and the
    /// previous snapshot is kept. Individual request failures never fail the
    /// cycle; they are recorded in the snapshot.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidSession`] if the request delay is out of range.
    /// - [`FetchError::CycleInProgress`] if another cycle is still running.
    pub async fn fetch_weather_data(
        &self,
        session: &SessionConfig,
        products: &ProductSelection,
    ) -> Result<Option<Arc<SessionSnapshot>>, FetchError> {
        session.validate()?;
        let Some(_guard) = CycleGuard::acquire(&self.in_flight, &self.state) else {
            tracing::warn!("fetch requested while a cycle is running");
            return Err(FetchError::CycleInProgress);
        };

        let (sites, rejected) = session.sites();
        for site in &rejected {
            tracing::warn!(site = %site, "ignoring invalid site identifier");
        }
        if sites.is_empty() {
            tracing::warn!("no sites configured, nothing to fetch");
            self.state.send_modify(|state| {
                state.phase = FetchPhase::Idle;
                state.status = FetchStatus::no_sites();
            });
            return Ok(None);
        }

        tracing::info!(
            sites = sites.len(),
            alpha = products.alpha.len(),
            image = products.image.len(),
            delay_ms = session.request_delay_ms,
            "fetch cycle started"
        );
        self.state.send_modify(|state| {
            state.phase = FetchPhase::Fetching;
            state.status = FetchStatus::fetching(sites.len());
        });

        let delay = Duration::from_millis(session.request_delay_ms);
        let results = join_all(
            sites
                .into_iter()
                .map(|site| self.fetch_site(site, products, delay)),
        )
        .await;

        let snapshot = Arc::new(SessionSnapshot::new(Utc::now(), results));
        let failed = snapshot.total_failed();
        let (phase, status) = if failed > 0 {
            (FetchPhase::CompleteWithErrors, FetchStatus::complete_with_errors())
        } else {
            (FetchPhase::Complete, FetchStatus::complete())
        };
        tracing::info!(
            sites = snapshot.site_results.len(),
            failed,
            phase = ?phase,
            "fetch cycle finished"
        );
        self.state.send_modify(|state| {
            state.phase = phase;
            state.status = status;
            state.snapshot = Some(Arc::clone(&snapshot));
        });
        Ok(Some(snapshot))
    }

    async fn fetch_site(
        &self,
        site: Site,
        products: &ProductSelection,
        delay: Duration,
    ) -> SiteResult {
        let region = resolve_site(site.as_str());
        let mut result = SiteResult::new(site.clone(), region);
        let mut queue = PacedQueue::new(products.requests_for(&site, region), delay);

        while let Some(request) = queue.next().await {
            match request.kind {
                ProductKind::Alpha => {
                    let entry = self.fetch_text(&request).await;
                    result.record_text(request.product, entry);
                }
                ProductKind::Image => {
                    let record = self.fetch_images(&request).await;
                    result.record_images(request.product, record);
                }
            }
        }

        let summary = result.request_summary();
        tracing::info!(
            site = %site,
            region = region.map(|r| r.code()),
            total = summary.total(),
            failed = summary.failed(),
            "site finished"
        );
        result
    }

    async fn fetch_text(&self, request: &ProductRequest) -> TextEntry {
        let policy = retriable_under(self.config.not_found_policy(ProductKind::Alpha));
        let fetched = retry_with_backoff(&self.retry, policy, || {
            self.transport.fetch_alpha(&request.site, &request.product)
        })
        .await;

        match fetched {
            Ok(payload) => {
                let value = payload.into_value();
                let text = if request.product == UPPER_WIND_PRODUCT {
                    render_upper_winds(&value).unwrap_or_else(|| normalize_text(&value))
                } else {
                    normalize_text(&value)
                };
                TextEntry::Text(text)
            }
            Err(err) => {
                tracing::warn!(
                    site = %request.site,
                    product = %request.product,
                    error = %err,
                    "text product failed"
                );
                TextEntry::Error(err.to_string())
            }
        }
    }

    async fn fetch_images(&self, request: &ProductRequest) -> ImageRecord {
        let not_found = self.config.not_found_policy(ProductKind::Image);
        if let (true, Some(region)) = (request.is_gfa(), request.region) {
            let resolver = GfaResolver {
                transport: &self.transport,
                retry: &self.retry,
                images: &self.images,
                image_base_url: &self.config.gfa_image_base_url,
                not_found,
            };
            return resolver
                .fetch_gfa_product(&request.site, region, request.gfa_product_code())
                .await;
        }

        let fetched = retry_with_backoff(&self.retry, retriable_under(not_found), || {
            self.transport.fetch_image(&request.site, &request.product)
        })
        .await;

        match fetched {
            Ok(payload) => self.images.normalize_images(&payload.into_value()),
            Err(err) => {
                tracing::warn!(
                    site = %request.site,
                    product = %request.product,
                    error = %err,
                    "image product failed"
                );
                ImageRecord::failed(err.to_string())
            }
        }
    }
}
