// Prevent accidental debug output in library code; callers render
// reports through `report::RunReport`.
#![deny(clippy::print_stderr)]

// Value model and rendering
pub mod format;
pub mod value;

// Evaluation
pub mod condition;
pub mod dispatch;
pub mod eval;
pub mod frame;

// Comparison
pub mod compare;

// Suite execution
pub mod cancel;
pub mod harness;
pub mod registry;
pub mod report;
pub mod runner;

// High-level entry points
pub mod api;

pub use api::{eval_str, run_fixtures_str, self_check, BuiltinEvaluatorFactory};
pub use cancel::CancelToken;
pub use compare::{compare, CasePolicy, CompareOutcome, Diff, IgnoredReason, Laxity};
pub use condition::{Condition, ConditionKind, ErrorKind, EvalError, EvalResult};
pub use harness::{run_suite, IgnoredMode, RunConfig};
pub use registry::{Registry, RegistryError, TestCase};
pub use report::{CaseOutcome, CaseResult, RunReport, SkipReason};
pub use runner::{EvaluatorFactory, ExternalEvaluator, RunResult, Runner};
pub use value::{RData, RType, RValue};
