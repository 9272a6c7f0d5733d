//! Result aggregation.
//!
//! The aggregator keeps exact tallies: every result it is handed counts,
//! in whatever order it arrives, and merging two summaries equals
//! summarizing the concatenation of their inputs.

pub mod render;

use serde::Serialize;

use crate::scenario::{ScenarioResult, ScenarioStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_total_ms: u64,
}

impl RunSummary {
    pub fn merge(self, other: RunSummary) -> RunSummary {
        RunSummary {
            total: self.total + other.total,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            errored: self.errored + other.errored,
            duration_total_ms: self.duration_total_ms + other.duration_total_ms,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

#[derive(Debug, Default)]
pub struct ReportAggregator {
    results: Vec<ScenarioResult>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for result in &self.results {
            summary.total += 1;
            match result.status {
                ScenarioStatus::Passed => summary.passed += 1,
                ScenarioStatus::Failed => summary.failed += 1,
                // Pending/Running never appear in finished results; count
                // them with errored rather than dropping them silently.
                _ => summary.errored += 1,
            }
            summary.duration_total_ms += result.duration_ms;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, status: ScenarioStatus, duration_ms: u64) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            status,
            steps: Vec::new(),
            teardown_failures: Vec::new(),
            duration_ms,
        }
    }

    #[test]
    fn summary_tallies_are_exact() {
        let mut aggregator = ReportAggregator::new();
        aggregator.add(result("a", ScenarioStatus::Passed, 10));
        aggregator.add(result("b", ScenarioStatus::Failed, 20));
        aggregator.add(result("c", ScenarioStatus::Errored, 30));
        aggregator.add(result("d", ScenarioStatus::Passed, 5));

        let summary = aggregator.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.duration_total_ms, 65);
        assert!(!summary.all_passed());
    }

    #[test]
    fn aggregation_is_order_independent() {
        let results = vec![
            result("a", ScenarioStatus::Passed, 1),
            result("b", ScenarioStatus::Errored, 2),
            result("c", ScenarioStatus::Failed, 3),
        ];

        let mut forward = ReportAggregator::new();
        for item in results.clone() {
            forward.add(item);
        }
        let mut reverse = ReportAggregator::new();
        for item in results.into_iter().rev() {
            reverse.add(item);
        }

        assert_eq!(forward.summary(), reverse.summary());
    }

    #[test]
    fn merge_equals_summarizing_concatenation() {
        let first = vec![
            result("a", ScenarioStatus::Passed, 4),
            result("b", ScenarioStatus::Failed, 6),
        ];
        let second = vec![result("c", ScenarioStatus::Errored, 8)];

        let mut left = ReportAggregator::new();
        for item in first.clone() {
            left.add(item);
        }
        let mut right = ReportAggregator::new();
        for item in second.clone() {
            right.add(item);
        }

        let mut combined = ReportAggregator::new();
        for item in first.into_iter().chain(second) {
            combined.add(item);
        }

        assert_eq!(left.summary().merge(right.summary()), combined.summary());
    }

    #[test]
    fn empty_summary_counts_as_all_passed() {
        let aggregator = ReportAggregator::new();
        assert!(aggregator.summary().all_passed());
    }
}
