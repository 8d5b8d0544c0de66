pub mod error;
pub mod gfa;
pub mod imagery;
pub mod orchestrator;
pub mod pacing;
pub mod proxy;
pub mod retry;
pub mod state;
pub mod text;
pub mod transport;
pub mod upper_wind;

pub use error::FetchError;
pub use gfa::{has_usable_frames, resolve_site, GfaResolver, PROBE_OFFSETS};
pub use imagery::{ImageNormalizer, NO_DATA, UNSUPPORTED_STRUCTURE};
pub use orchestrator::WeatherFetcher;
pub use pacing::PacedQueue;
pub use proxy::ProxyTransform;
pub use retry::{any_failure, retriable_under, retry_with_backoff, RetryPolicy};
pub use state::FetchState;
pub use text::{normalize_text, strip_wrapping_parens};
pub use transport::{CallOptions, Payload, PayloadResult, ProbeHit, Transport};
pub use upper_wind::{parse_upper_wind, render_upper_winds, UpperWindError, UpperWindReport, WindLevel};
