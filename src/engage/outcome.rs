use crate::automation::AutomationError;
use crate::engage::Affordance;
use crate::LinkreachError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What to do with a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngagementAction {
    /// Open the profile, optionally scrolling through lazy-loaded content
    Visit { scroll: bool },

    /// Send a connection request, with an optional personal note
    Connect { note: Option<String> },

    /// Write to an existing connection
    Message { body: String },
}

impl EngagementAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Visit { .. } => "visit",
            Self::Connect { .. } => "connect",
            Self::Message { .. } => "message",
        }
    }
}

/// Why an engagement attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngagementError {
    /// The action label matched none of the configured texts
    #[error("unrecognised action label {label:?}")]
    UnknownState { label: String },

    #[error("profile offers no message action (detected {found})")]
    NoMessageAffordance { found: Affordance },

    #[error("expected element missing: {selector}")]
    MissingAffordance { selector: String },

    /// Navigation or driver failure; retrying may succeed
    #[error("transient failure during {stage}: {message}")]
    Transient { stage: String, message: String },

    #[error("browser resource failure during {stage}: {message}")]
    Resource { stage: String, message: String },

    #[error("cancelled")]
    Cancelled,
}

impl EngagementError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classifies a driver failure; a missing element names its selector
    pub fn from_automation(stage: &str, selector: Option<&str>, err: AutomationError) -> Self {
        match (selector, &err) {
            (_, AutomationError::Resource(message)) => Self::Resource {
                stage: stage.to_string(),
                message: message.clone(),
            },
            (Some(selector), e) if e.is_missing_element() => Self::MissingAffordance {
                selector: selector.to_string(),
            },
            _ => Self::Transient {
                stage: stage.to_string(),
                message: err.to_string(),
            },
        }
    }

    /// Attaches the profile id, producing a run-level error
    pub fn into_error(self, profile_id: &str) -> LinkreachError {
        let stage = format!("engage/{}", profile_id);
        match self {
            Self::UnknownState { label } => LinkreachError::UnknownUiState {
                profile_id: profile_id.to_string(),
                label,
            },
            Self::Transient { message, .. } => LinkreachError::TransientNetwork { stage, message },
            Self::Resource { message, .. } => LinkreachError::Resource { stage, message },
            Self::Cancelled => LinkreachError::Cancelled,
            other => LinkreachError::Resource {
                stage,
                message: other.to_string(),
            },
        }
    }
}

/// Result of one engagement attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementOutcome {
    Sent,

    /// Nothing to do: the profile is already a connection
    AlreadyConnected,

    Skipped(String),

    Failed(EngagementError),
}

impl EngagementOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::AlreadyConnected => "already_connected",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for EngagementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => f.write_str("sent"),
            Self::AlreadyConnected => f.write_str("already connected"),
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
            Self::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}
