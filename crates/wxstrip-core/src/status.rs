use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Success,
}

/// The session-level status banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStatus {
    pub message: String,
    pub severity: Severity,
}

impl FetchStatus {
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    #[must_use]
    pub fn ready() -> Self {
        Self::new("Ready to fetch weather data.", Severity::Info)
    }

    #[must_use]
    pub fn fetching(site_count: usize) -> Self {
        Self::new(
            format!("Fetching data for {site_count} site(s)..."),
            Severity::Info,
        )
    }

    #[must_use]
    pub fn complete() -> Self {
        Self::new("Fetch complete.", Severity::Success)
    }

    #[must_use]
    pub fn complete_with_errors() -> Self {
        Self::new("Fetch complete with some errors.", Severity::Warning)
    }

    #[must_use]
    pub fn no_sites() -> Self {
        Self::new("No sites configured.", Severity::Warning)
    }
}

impl Default for FetchStatus {
    fn default() -> Self {
        Self::ready()
    }
}

/// Lifecycle of a fetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching,
    Complete,
    CompleteWithErrors,
}

impl FetchPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, FetchPhase::Complete | FetchPhase::CompleteWithErrors)
    }
}
