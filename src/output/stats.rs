//! Statistics generation from the run ledger
//!
//! This module reads the outcome rows of a run back out of the ledger
//! for `--stats` and the markdown report.

use crate::locator::AssetKind;
use crate::output::{OutputError, OutputResult};
use crate::storage::{RunLedger, RunRecord};
use std::collections::HashMap;

/// Outcome statistics for one run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// The run the statistics belong to
    pub run: RunRecord,

    /// Wall-clock duration, if the run has finished
    pub duration_seconds: Option<u64>,

    /// Count of (entity, kind) outcomes by outcome name
    pub outcomes: HashMap<String, u64>,

    /// Number of distinct entities with at least one outcome row
    pub entities: u64,

    /// (entity, kind) pairs that ended not found
    pub exhausted: Vec<(String, AssetKind)>,
}

impl RunStatistics {
    pub fn count(&self, outcome: &str) -> u64 {
        self.outcomes.get(outcome).copied().unwrap_or(0)
    }

    pub fn total_outcomes(&self) -> u64 {
        self.outcomes.values().sum()
    }

    /// Percentage of (entity, kind) pairs that ended with a local asset
    pub fn resolved_rate(&self) -> f64 {
        let total = self.total_outcomes();
        if total == 0 {
            return 0.0;
        }
        let resolved = self.count("fetched") + self.count("already_present");
        resolved as f64 / total as f64 * 100.0
    }
}

/// Loads statistics for the latest run in the ledger
///
/// # Arguments
///
/// * `ledger` - The run ledger to query
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Statistics of the most recent run
/// * `Err(OutputError::NoRuns)` - The ledger has no runs yet
pub fn load_statistics(ledger: &dyn RunLedger) -> OutputResult<RunStatistics> {
    let run = ledger.get_latest_run()?.ok_or(OutputError::NoRuns)?;

    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => {
            Some((finished - started).num_seconds().max(0) as u64)
        }
        _ => None,
    };

    let outcomes = ledger.count_outcomes(run.id)?;
    let entities = ledger
        .get_outcomes(run.id)?
        .iter()
        .map(|record| record.entity_id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len() as u64;
    let exhausted = ledger.get_exhausted(run.id)?;

    Ok(RunStatistics {
        run,
        duration_seconds,
        outcomes,
        entities,
        exhausted,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Resolution Statistics ===\n");

    println!("Run:");
    println!("  ID: {}", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    if let Some(duration) = stats.duration_seconds {
        println!("  Duration: {}s", duration);
    }
    println!();

    println!("Outcomes ({} entities):", stats.entities);
    let mut counts: Vec<_> = stats.outcomes.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (outcome, count) in counts {
        println!("  {}: {}", outcome, count);
    }
    println!();

    if !stats.exhausted.is_empty() {
        println!("Exhausted ({}):", stats.exhausted.len());
        for (entity_id, kind) in &stats.exhausted {
            println!("  - {} ({})", entity_id, kind);
        }
        println!();
    }

    println!(
        "Resolved: {:.1}% ({} outcomes)",
        stats.resolved_rate(),
        stats.total_outcomes()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolutionOutcome;
    use crate::storage::{RunStatus, SqliteLedger};

    #[test]
    fn test_empty_ledger_has_no_statistics() {
        let ledger = SqliteLedger::new_in_memory().unwrap();
        assert!(matches!(load_statistics(&ledger), Err(OutputError::NoRuns)));
    }

    #[test]
    fn test_load_statistics_for_latest_run() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        let first = ledger.create_run("a").unwrap();
        ledger.finish_run(first, RunStatus::Completed).unwrap();

        let run_id = ledger.create_run("b").unwrap();
        let fetched = ResolutionOutcome::Fetched {
            path: "/assets/images/games/wg_game_5001_zh.webp".to_string(),
        };
        ledger
            .record_outcome(run_id, "dragon-1", AssetKind::Primary, &fetched)
            .unwrap();
        ledger
            .record_outcome(run_id, "dragon-1", AssetKind::Icon, &ResolutionOutcome::NotFound)
            .unwrap();
        ledger
            .record_outcome(run_id, "gold-2", AssetKind::Icon, &ResolutionOutcome::NotFound)
            .unwrap();
        ledger.finish_run(run_id, RunStatus::Completed).unwrap();

        let stats = load_statistics(&ledger).unwrap();
        assert_eq!(stats.run.id, run_id);
        assert_eq!(stats.entities, 2);
        assert_eq!(stats.count("fetched"), 1);
        assert_eq!(stats.count("not_found"), 2);
        assert_eq!(stats.exhausted.len(), 2);
        assert!(stats.duration_seconds.is_some());
        assert!((stats.resolved_rate() - 100.0 / 3.0).abs() < 0.01);
    }
}
