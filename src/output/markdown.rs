//! Markdown summary generation
//!
//! This module renders ledger statistics of a run as a human-readable
//! markdown report, including the outcome breakdown and the exhausted list.

use crate::output::{OutputResult, RunStatistics};
use crate::storage::write_atomic;
use std::path::Path;

/// Exhausted entries listed before the report is truncated
const MAX_EXHAUSTED_LISTED: usize = 200;

/// Writes a markdown summary of a run
///
/// # Arguments
///
/// * `stats` - Statistics loaded from the ledger
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(stats: &RunStatistics, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats);
    write_atomic(output_path, markdown.as_bytes())?;
    Ok(())
}

/// Formats run statistics as markdown
pub fn format_markdown_summary(stats: &RunStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Asset-Sweep Resolution Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", stats.run.id));
    md.push_str(&format!("- **Started**: {}\n", stats.run.started_at));
    if let Some(finished) = &stats.run.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = stats.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", stats.run.status.to_db_string()));
    md.push_str(&format!("- **Config Hash**: {}\n\n", stats.run.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Entities**: {}\n", stats.entities));
    md.push_str(&format!("- **Outcomes**: {}\n", stats.total_outcomes()));
    md.push_str(&format!("- **Resolved Rate**: {:.2}%\n\n", stats.resolved_rate()));

    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    for (label, key) in [
        ("Fetched", "fetched"),
        ("Already Present", "already_present"),
        ("Not Found", "not_found"),
        ("Transport Error", "transport_error"),
    ] {
        md.push_str(&format!("| {} | {} |\n", label, stats.count(key)));
    }
    md.push('\n');

    if !stats.exhausted.is_empty() {
        md.push_str("## Exhausted\n\n");
        md.push_str("No candidate existed for these assets.\n\n");
        md.push_str("| Entity | Kind |\n");
        md.push_str("|--------|------|\n");
        for (entity_id, kind) in stats.exhausted.iter().take(MAX_EXHAUSTED_LISTED) {
            md.push_str(&format!("| {} | {} |\n", entity_id, kind));
        }
        if stats.exhausted.len() > MAX_EXHAUSTED_LISTED {
            md.push_str(&format!(
                "\n... and {} more\n",
                stats.exhausted.len() - MAX_EXHAUSTED_LISTED
            ));
        }
        md.push('\n');
    }

    md
}
