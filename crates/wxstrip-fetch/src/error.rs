use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered 404: the product legitimately does not exist.
    #[error("Data not available (404 Not Found)")]
    NotFound { url: String },

    /// Upstream answered 2xx with an empty body.
    #[error("No data returned from API.")]
    NoData { url: String, status: u16 },

    /// Upstream answered 2xx with a JSON body carrying an `error` message.
    #[error("{message}")]
    Upstream { message: String },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("a fetch cycle is already in progress")]
    CycleInProgress,

    #[error("invalid session configuration: {0}")]
    InvalidSession(#[from] wxstrip_core::ConfigError),
}

impl FetchError {
    /// Soft errors are well-formed "nothing here" answers from upstream, as
    /// opposed to a broken transport.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            FetchError::NotFound { .. } | FetchError::NoData { .. } | FetchError::Upstream { .. }
        )
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// HTTP status associated with the failure, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { .. } => Some(404),
            FetchError::NoData { status, .. } | FetchError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            FetchError::Upstream { .. }
            | FetchError::Timeout { .. }
            | FetchError::InvalidUrl { .. }
            | FetchError::CycleInProgress
            | FetchError::InvalidSession(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_soft_with_status() {
        let err = FetchError::NotFound {
            url: "https://example.com".into(),
        };
        assert!(err.is_soft());
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Data not available (404 Not Found)");
    }

    #[test]
    fn timeout_and_bad_status_are_hard() {
        let timeout = FetchError::Timeout {
            url: "https://example.com".into(),
            timeout_ms: 12_000,
        };
        assert!(!timeout.is_soft());
        assert_eq!(timeout.status(), None);

        let status = FetchError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".into(),
        };
        assert!(!status.is_soft());
        assert_eq!(status.status(), Some(503));
    }
}
