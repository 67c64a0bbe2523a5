//! Statistics over a run report
//!
//! This module derives outcome counts from a `RunReport` and prints them.

use crate::output::RunReport;
use std::collections::BTreeMap;

/// Run statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    /// Total number of engagement attempts
    pub total: usize,

    /// Count of attempts by outcome kind
    pub by_outcome: BTreeMap<String, usize>,

    /// Count of attempts by action
    pub by_action: BTreeMap<String, usize>,

    /// Profiles whose attempt failed
    pub failed_profiles: Vec<String>,
}

impl RunStatistics {
    pub fn from_report(report: &RunReport) -> Self {
        let mut by_outcome = BTreeMap::new();
        let mut by_action = BTreeMap::new();

        for entry in &report.entries {
            *by_outcome.entry(entry.outcome.clone()).or_insert(0) += 1;
            *by_action.entry(entry.action.clone()).or_insert(0) += 1;
        }

        Self {
            total: report.entries.len(),
            by_outcome,
            by_action,
            failed_profiles: report.failures().map(|e| e.profile_id.clone()).collect(),
        }
    }

    /// Share of attempts that did not fail, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let failed = self.by_outcome.get("failed").copied().unwrap_or(0);
        ((self.total - failed) as f64 / self.total as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    println!("Overview:");
    println!("  Total attempts: {}", stats.total);
    println!();

    println!("Outcomes:");
    let mut outcome_counts: Vec<_> = stats.by_outcome.iter().collect();
    outcome_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (outcome, count) in outcome_counts {
        let percentage = if stats.total > 0 {
            (*count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    if stats.by_action.len() > 1 {
        println!("Actions:");
        for (action, count) in &stats.by_action {
            println!("  {}: {}", action, count);
        }
        println!();
    }

    if !stats.failed_profiles.is_empty() {
        println!("Failed Profiles ({}):", stats.failed_profiles.len());
        for profile in &stats.failed_profiles {
            println!("  - {}", profile);
        }
        println!();
    }

    println!("Success Rate: {:.1}%", stats.success_rate());
}
