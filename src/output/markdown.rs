//! Markdown report generation
//!
//! This module renders a run report as a human-readable markdown file.

use crate::output::{OutputResult, RunReport, RunStatistics};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown rendering of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The finished run report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport) -> String {
    let stats = RunStatistics::from_report(report);
    let mut md = String::new();

    md.push_str("# Linkreach Run Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Task**: {}\n", report.task));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Outcomes\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    for kind in ["sent", "already_connected", "skipped", "failed"] {
        md.push_str(&format!("| {} | {} |\n", kind, report.count(kind)));
    }
    md.push_str(&format!("\n- **Success Rate**: {:.2}%\n\n", stats.success_rate()));

    if !report.entries.is_empty() {
        md.push_str("## Profiles\n\n");
        md.push_str("| Profile | Name | Action | Outcome | Detail |\n");
        md.push_str("|---------|------|--------|---------|--------|\n");
        for entry in &report.entries {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                entry.profile_id,
                escape_cell(&entry.name),
                entry.action,
                entry.outcome,
                escape_cell(entry.detail.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
