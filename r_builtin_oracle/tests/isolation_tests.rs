//! Isolation, timeout, crash containment and cancellation behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use r_builtin_oracle::runner::{EvaluatorFactory, ExternalEvaluator, RunResult, Runner};
use r_builtin_oracle::{
    run_fixtures_str, BuiltinEvaluatorFactory, CancelToken, CaseOutcome, ErrorKind, EvalResult,
    RunConfig, RValue, SkipReason,
};

/// Reports how many times this particular instance has evaluated.
struct CallCounter {
    calls: usize,
    instances: Arc<AtomicUsize>,
}

struct CountingFactory {
    instances: Arc<AtomicUsize>,
}

impl EvaluatorFactory for CountingFactory {
    fn make(&self) -> Box<dyn ExternalEvaluator> {
        self.instances.fetch_add(1, Ordering::SeqCst);
        Box::new(CallCounter {
            calls: 0,
            instances: Arc::clone(&self.instances),
        })
    }
}

impl ExternalEvaluator for CallCounter {
    fn evaluate(&mut self, _source: &str) -> EvalResult {
        self.calls += 1;
        EvalResult::value(RValue::int1(self.calls as i32))
    }
    fn reset(&mut self) {
        self.calls = 0;
    }
}

#[test]
fn test_each_run_gets_a_fresh_evaluator() {
    let instances = Arc::new(AtomicUsize::new(0));
    let factory = CountingFactory {
        instances: Arc::clone(&instances),
    };
    let runner = Runner::default();
    let cancel = CancelToken::new();

    for _ in 0..3 {
        let result = runner.run("x", &factory, &cancel).completed().unwrap();
        // A leaked instance would report 2 or 3 here.
        assert_eq!(result.payload.unwrap(), RValue::int1(1));
    }
    assert_eq!(instances.load(Ordering::SeqCst), 3);
}

#[test]
fn test_cases_do_not_share_environment() {
    // The first case binds `leak`; if state leaked, the second case
    // would resolve it on the reference side.
    let fixtures = "\
## case: binder
leak <- 42L
## case: prober
## policy: Output.ContainsError
leak
";
    let report = run_fixtures_str(
        fixtures,
        &BuiltinEvaluatorFactory,
        &RunConfig::default(),
    )
    .unwrap();
    assert!(report.is_success(), "{}", report.render());
    assert_eq!(report.passed(), 2);
}

struct Sleepy;

impl ExternalEvaluator for Sleepy {
    fn evaluate(&mut self, _source: &str) -> EvalResult {
        std::thread::sleep(Duration::from_secs(60));
        EvalResult::value(RValue::null())
    }
    fn reset(&mut self) {}
}

#[test]
fn test_hung_candidate_times_out_and_fails_the_case() {
    let fixtures = "## case: quick\n1L\n";
    let candidate = || Box::new(Sleepy) as Box<dyn ExternalEvaluator>;
    let config = RunConfig {
        timeout: Duration::from_millis(50),
        ..RunConfig::default()
    };
    let report = run_fixtures_str(fixtures, &candidate, &config).unwrap();
    assert_eq!(report.failed(), 1);
}

#[test]
fn test_timeout_error_kind() {
    let runner = Runner::new(Duration::from_millis(50));
    let factory = || Box::new(Sleepy) as Box<dyn ExternalEvaluator>;
    let RunResult::Completed(result) = runner.run("x", &factory, &CancelToken::new()) else {
        panic!("not cancelled");
    };
    assert_eq!(result.payload.unwrap_err().kind, ErrorKind::Timeout);
}

struct Panicky;

impl ExternalEvaluator for Panicky {
    fn evaluate(&mut self, _source: &str) -> EvalResult {
        panic!("candidate exploded");
    }
    fn reset(&mut self) {}
}

#[test]
fn test_candidate_panic_is_contained_as_failure() {
    let fixtures = "## case: a\n1L\n## case: b\n2L\n";
    let candidate = || Box::new(Panicky) as Box<dyn ExternalEvaluator>;
    let report = run_fixtures_str(fixtures, &candidate, &RunConfig::default()).unwrap();
    // Both cases still produce verdicts; the run was not aborted.
    assert_eq!(report.total(), 2);
    assert_eq!(report.failed(), 2);
}

#[test]
fn test_cancel_skips_remaining_cases() {
    let fixtures = "## case: a\n1L\n## case: b\n2L\n## case: c\n3L\n";
    let config = RunConfig::default();
    config.cancel.request();
    let report = run_fixtures_str(fixtures, &BuiltinEvaluatorFactory, &config).unwrap();
    assert_eq!(report.total(), 3);
    assert!(report.results.iter().all(|r| matches!(
        r.outcome,
        CaseOutcome::Skipped {
            reason: SkipReason::Cancelled
        }
    )));
}

#[test]
fn test_ignored_only_suite_reports_no_failures() {
    let fixtures = "\
## case: a
## policy: Ignored.Unimplemented
1L
## case: b
## policy: Ignored.WrongCaller
2L
";
    let report =
        run_fixtures_str(fixtures, &BuiltinEvaluatorFactory, &RunConfig::default()).unwrap();
    assert_eq!(report.failed(), 0);
    assert_eq!(report.skipped(), 2);
    assert!(report.is_success());
}
