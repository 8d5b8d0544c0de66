pub mod app_config;
pub mod config;
pub mod products;
pub mod records;
pub mod regions;
pub mod site;
pub mod status;

pub use app_config::{
    ClientConfig, NotFoundPolicy, SessionConfig, DEFAULT_REQUEST_DELAY_MS, MAX_REQUEST_DELAY_MS,
};
pub use config::{load_client_config, load_client_config_from_env};
pub use products::{
    AlphaProduct, ImageCategory, ImageProduct, ProductKind, ProductRequest, ProductSelection,
    ALPHA_PRODUCTS, IMAGE_PRODUCTS,
};
pub use records::{
    DebugInfo, FrameInfo, ImageDescriptor, ImageRecord, RequestSummary, SessionSnapshot,
    SiteResult, TextEntry,
};
pub use regions::GfaRegion;
pub use site::Site;
pub use status::{FetchPhase, FetchStatus, Severity};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid site identifier \"{0}\": expected 4 alphanumeric characters")]
    InvalidSite(String),

    #[error("unknown GFA region code \"{0}\"")]
    UnknownRegion(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("request delay {delay_ms}ms exceeds the {max_ms}ms maximum")]
    DelayOutOfRange { delay_ms: u64, max_ms: u64 },
}
