//! Run report types
//!
//! A `RunReport` records every engagement attempt of one run so it can be
//! summarized at the end.

use crate::engage::EngagementOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One engagement attempt
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub profile_id: String,
    pub name: String,

    /// `visit`, `connect`, `message` or `invite`
    pub action: String,

    /// `sent`, `already_connected`, `skipped` or `failed`
    pub outcome: String,

    /// Skip reason or failure description
    pub detail: Option<String>,

    pub at: DateTime<Utc>,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Task the run performed, e.g. `connect`
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config_hash: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn start(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            started_at: Utc::now(),
            finished_at: None,
            config_hash: None,
            entries: Vec::new(),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Appends the outcome of one attempt
    pub fn record(&mut self, profile_id: &str, name: &str, action: &str, outcome: &EngagementOutcome) {
        let detail = match outcome {
            EngagementOutcome::Skipped(reason) => Some(reason.clone()),
            EngagementOutcome::Failed(err) => Some(err.to_string()),
            EngagementOutcome::Sent | EngagementOutcome::AlreadyConnected => None,
        };

        self.entries.push(ReportEntry {
            profile_id: profile_id.to_string(),
            name: name.to_string(),
            action: action.to_string(),
            outcome: outcome.kind().to_string(),
            detail,
            at: Utc::now(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Number of entries whose outcome kind is `kind`
    pub fn count(&self, kind: &str) -> usize {
        self.entries.iter().filter(|e| e.outcome == kind).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.outcome == "failed")
    }
}
