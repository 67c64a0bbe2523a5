//! Linkreach: paced automation for a professional-networking site
//!
//! This crate drives a browser through login (with a cached session and
//! checkpoint handling), people search and profile engagement (visit,
//! connect, message), pacing every outbound action with a randomized
//! cooldown.

pub mod automation;
pub mod client;
pub mod company;
pub mod config;
pub mod engage;
pub mod output;
pub mod records;
pub mod search;
pub mod session;
pub mod throttle;

use thiserror::Error;

/// Main error type for Linkreach operations
#[derive(Debug, Error)]
pub enum LinkreachError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session cache error: {0}")]
    Session(#[from] session::SessionError),

    /// Retryable by the caller
    #[error("Transient network error during {stage}: {message}")]
    TransientNetwork { stage: String, message: String },

    /// Fatal for the run; needs operator attention
    #[error("Authentication failed at {stage}: {message}")]
    Authentication { stage: String, message: String },

    #[error("Unrecognised UI state on profile {profile_id}: label {label:?}")]
    UnknownUiState { profile_id: String, label: String },

    #[error("Browser resource error during {stage}: {message}")]
    Resource { stage: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkreachError {
    /// Classifies a driver failure raised while performing `stage`
    pub fn from_automation(stage: &str, err: automation::AutomationError) -> Self {
        if err.is_resource() {
            Self::Resource {
                stage: stage.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::TransientNetwork {
                stage: stage.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Returns true if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Linkreach operations
pub type Result<T> = std::result::Result<T, LinkreachError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::Client;
pub use config::Settings;
pub use engage::{EngagementAction, EngagementError, EngagementOutcome};
pub use records::{CompanyRecord, ProfileRecord};
pub use search::SearchParams;
pub use session::{Credentials, SessionArtifact};
