//! Output module for run reports
//!
//! This module handles:
//! - Recording the outcome of every engagement attempt
//! - Printing run statistics
//! - Writing markdown reports

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{OutputError, OutputResult, ReportEntry, RunReport};
pub use stats::{print_statistics, RunStatistics};
