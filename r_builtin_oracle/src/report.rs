//! Per-case outcomes and the aggregate run report.
//!
//! Report order is registration order, never completion order, so two
//! runs over the same registry produce identical text regardless of how
//! the worker pool interleaved.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compare::{CasePolicy, Diff, IgnoredReason};

/// Why a case was not executed (or its verdict withheld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Ignored(IgnoredReason),
    Cancelled,
}

/// Terminal verdict for one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseOutcome {
    Passed,
    Failed { diff: Diff },
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    /// The case's literal source expression, carried so a failure can be
    /// triaged from the report alone.
    pub source: String,
    pub policy: CasePolicy,
    pub outcome: CaseOutcome,
}

// ==================== case lifecycle ====================

/// Lifecycle of a case inside a run. Transitions are one-way:
/// `Pending -> Running -> Done`, and a terminal outcome never changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaseState {
    #[default]
    Pending,
    Running,
    Done(CaseOutcome),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid case transition: {attempted} from {from}")]
pub struct TransitionError {
    pub from: String,
    pub attempted: String,
}

#[derive(Debug, Clone, Default)]
pub struct CaseTracker {
    state: CaseState,
}

impl CaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CaseState {
        &self.state
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.state {
            CaseState::Pending => {
                self.state = CaseState::Running;
                Ok(())
            }
            _ => Err(self.rejected("start")),
        }
    }

    /// Record the terminal outcome. Skipping straight from `Pending` is
    /// allowed (a cancelled case never starts).
    pub fn finish(&mut self, outcome: CaseOutcome) -> Result<(), TransitionError> {
        match (&self.state, &outcome) {
            (CaseState::Running, _) | (CaseState::Pending, CaseOutcome::Skipped { .. }) => {
                self.state = CaseState::Done(outcome);
                Ok(())
            }
            _ => Err(self.rejected("finish")),
        }
    }

    fn rejected(&self, attempted: &str) -> TransitionError {
        TransitionError {
            from: format!("{:?}", self.state),
            attempted: attempted.to_string(),
        }
    }
}

// ==================== aggregate report ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<CaseResult>,
}

impl RunReport {
    pub fn from_results(results: Vec<CaseResult>) -> Self {
        Self { results }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Cases marked ignored that passed when run anyway: candidates for
    /// dropping their annotation.
    pub fn newly_fixed(&self) -> Vec<&CaseResult> {
        self.results
            .iter()
            .filter(|r| {
                r.policy.ignored_reason().is_some() && matches!(r.outcome, CaseOutcome::Passed)
            })
            .collect()
    }

    /// Untriaged divergences, surfaced separately so they get revisited.
    pub fn unknown_divergences(&self) -> Vec<&CaseResult> {
        self.results
            .iter()
            .filter(|r| r.policy.ignored_reason() == Some(IgnoredReason::Unknown))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text report in registration order.
    pub fn render(&self) -> String {
        let mut out = format!(
            "conformance run: {} cases, {} passed, {} failed, {} skipped\n",
            self.total(),
            self.passed(),
            self.failed(),
            self.skipped()
        );
        for result in &self.results {
            match &result.outcome {
                CaseOutcome::Passed => {}
                CaseOutcome::Failed { diff } => {
                    out.push_str(&format!(
                        "\nFAILED {}\n  source: {}\n  at {}: expected {}, got {}\n",
                        result.name, result.source, diff.path, diff.expected, diff.actual
                    ));
                }
                CaseOutcome::Skipped { reason } => {
                    out.push_str(&format!(
                        "\nSKIPPED {} ({})\n",
                        result.name,
                        skip_label(reason)
                    ));
                }
            }
        }
        let newly_fixed = self.newly_fixed();
        if !newly_fixed.is_empty() {
            out.push_str("\nmarked ignored but passing:\n");
            for result in newly_fixed {
                out.push_str(&format!("  {}\n", result.name));
            }
        }
        let unknown = self.unknown_divergences();
        if !unknown.is_empty() {
            out.push_str("\nuntriaged divergences:\n");
            for result in unknown {
                out.push_str(&format!("  {}\n", result.name));
            }
        }
        out
    }
}

fn skip_label(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Cancelled => "cancelled".to_string(),
        SkipReason::Ignored(r) => format!("Ignored.{:?}", r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed(name: &str, policy: CasePolicy) -> CaseResult {
        CaseResult {
            name: name.to_string(),
            source: "1L".to_string(),
            policy,
            outcome: CaseOutcome::Passed,
        }
    }

    #[test]
    fn test_tracker_happy_path() {
        let mut tracker = CaseTracker::new();
        tracker.start().unwrap();
        tracker.finish(CaseOutcome::Passed).unwrap();
        assert_eq!(*tracker.state(), CaseState::Done(CaseOutcome::Passed));
    }

    #[test]
    fn test_tracker_terminal_state_is_final() {
        let mut tracker = CaseTracker::new();
        tracker.start().unwrap();
        tracker.finish(CaseOutcome::Passed).unwrap();
        assert!(tracker.start().is_err());
        assert!(tracker.finish(CaseOutcome::Passed).is_err());
    }

    #[test]
    fn test_tracker_skip_without_start() {
        let mut tracker = CaseTracker::new();
        tracker
            .finish(CaseOutcome::Skipped {
                reason: SkipReason::Cancelled,
            })
            .unwrap();
        assert!(matches!(tracker.state(), CaseState::Done(_)));
    }

    #[test]
    fn test_tracker_cannot_pass_without_running() {
        let mut tracker = CaseTracker::new();
        assert!(tracker.finish(CaseOutcome::Passed).is_err());
    }

    #[test]
    fn test_report_counts_and_sections() {
        let report = RunReport::from_results(vec![
            passed("a", CasePolicy::Exact),
            CaseResult {
                name: "b".to_string(),
                source: "anyDuplicated(c(1L, 1L))".to_string(),
                policy: CasePolicy::Exact,
                outcome: CaseOutcome::Failed {
                    diff: Diff {
                        path: "$".to_string(),
                        expected: "1L".to_string(),
                        actual: "2L".to_string(),
                    },
                },
            },
            CaseResult {
                name: "c".to_string(),
                source: "class(1i)".to_string(),
                policy: CasePolicy::Ignored(IgnoredReason::Unknown),
                outcome: CaseOutcome::Skipped {
                    reason: SkipReason::Ignored(IgnoredReason::Unknown),
                },
            },
        ]);
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_success());

        let text = report.render();
        assert!(text.contains("FAILED b"));
        assert!(text.contains("source: anyDuplicated(c(1L, 1L))"));
        assert!(text.contains("expected 1L, got 2L"));
        assert!(text.contains("SKIPPED c (Ignored.Unknown)"));
        assert!(text.contains("untriaged divergences:\n  c"));
    }

    #[test]
    fn test_newly_fixed_lists_ignored_passes() {
        let report = RunReport::from_results(vec![passed(
            "was.broken",
            CasePolicy::Ignored(IgnoredReason::ImplementationError),
        )]);
        assert_eq!(report.newly_fixed().len(), 1);
        assert!(report.render().contains("marked ignored but passing:\n  was.broken"));
    }

    #[test]
    fn test_json_round_trips() {
        let report = RunReport::from_results(vec![passed("a", CasePolicy::Exact)]);
        let json = report.to_json().unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
