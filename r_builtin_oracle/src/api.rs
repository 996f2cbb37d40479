//! High-level entry points: one-shot evaluation and suite runs against
//! the built-in reference evaluator.

use std::str::FromStr;

use crate::condition::EvalResult;
use crate::eval::Evaluator;
use crate::harness::{run_suite, RunConfig};
use crate::registry::{Registry, RegistryError};
use crate::report::RunReport;
use crate::runner::{EvaluatorFactory, ExternalEvaluator};

/// Evaluate one fixture source on a fresh built-in evaluator.
pub fn eval_str(source: &str) -> EvalResult {
    Evaluator::new().evaluate(source)
}

/// Factory producing the built-in evaluator; the default reference side
/// of a suite run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluatorFactory;

impl EvaluatorFactory for BuiltinEvaluatorFactory {
    fn make(&self) -> Box<dyn ExternalEvaluator> {
        Box::new(Evaluator::new())
    }
}

/// Parse annotated fixtures and run the candidate against the built-in
/// reference.
pub fn run_fixtures_str(
    fixtures: &str,
    candidate: &dyn EvaluatorFactory,
    config: &RunConfig,
) -> Result<RunReport, RegistryError> {
    let registry = Registry::from_str(fixtures)?;
    Ok(run_suite(
        &registry,
        &BuiltinEvaluatorFactory,
        candidate,
        config,
    ))
}

/// Run the reference against itself. Useful as a sanity gate: every
/// non-ignored case must pass.
pub fn self_check(fixtures: &str, config: &RunConfig) -> Result<RunReport, RegistryError> {
    run_fixtures_str(fixtures, &BuiltinEvaluatorFactory, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_str() {
        let result = eval_str("length(list(1L, 2L))");
        assert_eq!(result.payload.unwrap(), crate::value::RValue::int1(2));
    }

    #[test]
    fn test_self_check_passes() {
        let fixtures = "## case: a\nclass(complex(0L))\n## case: b\ncbind(1:3, 2L)\n";
        let report = self_check(fixtures, &RunConfig::default()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.passed(), 2);
    }
}
