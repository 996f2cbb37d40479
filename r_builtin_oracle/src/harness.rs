//! Suite execution: a worker pool fanning case results back into
//! registration order.
//!
//! Workers claim cases through a shared atomic cursor and send indexed
//! results over a channel; the collector slots them by index, so the
//! report reads in registry order no matter which worker finished first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::compare::{compare, CompareOutcome};
use crate::registry::{Registry, TestCase};
use crate::report::{CaseOutcome, CaseResult, CaseTracker, RunReport, SkipReason};
use crate::runner::{EvaluatorFactory, Runner, RunResult};

/// How cases annotated `Ignored.*` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IgnoredMode {
    /// Record them as skipped without running.
    #[default]
    Skip,
    /// Run them anyway; a match is recorded as passed (newly fixed), a
    /// mismatch stays a skip rather than a failure.
    RunAnyway,
}

/// Suite-level knobs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub timeout: Duration,
    /// Worker thread count; 0 means one per available core.
    pub workers: usize,
    pub ignored: IgnoredMode,
    pub cancel: CancelToken,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            workers: 0,
            ignored: IgnoredMode::Skip,
            cancel: CancelToken::new(),
        }
    }
}

impl RunConfig {
    fn worker_count(&self, cases: usize) -> usize {
        let requested = if self.workers == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.workers
        };
        requested.clamp(1, cases.max(1))
    }
}

/// Run every registered case against both evaluators and compare.
pub fn run_suite(
    registry: &Registry,
    reference: &dyn EvaluatorFactory,
    candidate: &dyn EvaluatorFactory,
    config: &RunConfig,
) -> RunReport {
    let cases = registry.cases();
    let runner = Runner::new(config.timeout);
    let cursor = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, CaseOutcome)>();

    thread::scope(|scope| {
        for _ in 0..config.worker_count(cases.len()) {
            let tx = tx.clone();
            let runner = runner.clone();
            let cursor = &cursor;
            scope.spawn(move || {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(case) = cases.get(index) else { break };
                    let outcome =
                        run_case(case, reference, candidate, &runner, config);
                    if tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<CaseOutcome>> = vec![None; cases.len()];
        for (index, outcome) in rx {
            slots[index] = Some(outcome);
        }
        let results = cases
            .iter()
            .zip(slots)
            .map(|(case, outcome)| CaseResult {
                name: case.name.clone(),
                source: case.source.clone(),
                policy: case.policy,
                outcome: outcome.unwrap_or(CaseOutcome::Skipped {
                    reason: SkipReason::Cancelled,
                }),
            })
            .collect();
        RunReport::from_results(results)
    })
}

fn run_case(
    case: &TestCase,
    reference: &dyn EvaluatorFactory,
    candidate: &dyn EvaluatorFactory,
    runner: &Runner,
    config: &RunConfig,
) -> CaseOutcome {
    let mut tracker = CaseTracker::new();
    let skip = |tracker: &mut CaseTracker, reason: SkipReason| {
        let outcome = CaseOutcome::Skipped { reason };
        // Skips are valid from any non-terminal state.
        let _ = tracker.finish(outcome.clone());
        outcome
    };

    if config.cancel.is_requested() {
        return skip(&mut tracker, SkipReason::Cancelled);
    }
    let ignored_reason = case.policy.ignored_reason();
    if let (Some(reason), IgnoredMode::Skip) = (ignored_reason, config.ignored) {
        return skip(&mut tracker, SkipReason::Ignored(reason));
    }
    if tracker.start().is_err() {
        return skip(&mut tracker, SkipReason::Cancelled);
    }

    let expected = match runner.run(&case.source, reference, &config.cancel) {
        RunResult::Completed(result) => result,
        RunResult::Cancelled => return skip(&mut tracker, SkipReason::Cancelled),
    };
    let actual = match runner.run(&case.source, candidate, &config.cancel) {
        RunResult::Completed(result) => result,
        RunResult::Cancelled => return skip(&mut tracker, SkipReason::Cancelled),
    };

    let verdict = compare(&expected, &actual, case.policy.laxity());
    let outcome = match (verdict, ignored_reason) {
        // An ignored case run anyway that matches surfaces as newly
        // fixed; a mismatch stays a skip rather than a failure.
        (CompareOutcome::Match, _) => CaseOutcome::Passed,
        (CompareOutcome::Mismatch(diff), None) => CaseOutcome::Failed { diff },
        (CompareOutcome::Mismatch(_), Some(reason)) => CaseOutcome::Skipped {
            reason: SkipReason::Ignored(reason),
        },
    };
    let _ = tracker.finish(outcome.clone());
    outcome
}

/// Convenience for callers that only tune the comparison policy per
/// case: run with the default configuration.
pub fn run_suite_default(
    registry: &Registry,
    reference: &dyn EvaluatorFactory,
    candidate: &dyn EvaluatorFactory,
) -> RunReport {
    run_suite(registry, reference, candidate, &RunConfig::default())
}
