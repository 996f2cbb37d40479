//! Evaluation results and the condition stack.
//!
//! R lets non-fatal conditions (warnings, messages) accumulate before or
//! alongside a final value, so a bare `Result` is not enough: a successful
//! evaluation carries its signalled conditions next to the value.

use std::fmt;

use thiserror::Error;

use crate::value::RValue;

/// Non-fatal condition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConditionKind {
    Warning,
    Message,
}

/// One signalled condition, with the call context it was raised from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub message: String,
    pub call: Option<String>,
}

impl Condition {
    pub fn warning(message: impl Into<String>, call: Option<String>) -> Self {
        Self {
            kind: ConditionKind::Warning,
            message: message.into(),
            call,
        }
    }
}

/// Fatal error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Ordinary R-level error raised during evaluation.
    Runtime,
    /// The source text did not parse.
    Parse,
    /// The evaluator exceeded the wall-clock budget.
    Timeout,
    /// The evaluator process/thread died (panic, abort).
    Crash,
}

/// A fatal evaluation error.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("{message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn crash(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Crash,
            message: message.into(),
        }
    }
}

/// The result of evaluating one expression: a value or a fatal error,
/// plus any conditions signalled along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub payload: Result<RValue, EvalError>,
    pub conditions: Vec<Condition>,
}

impl EvalResult {
    pub fn value(v: RValue) -> Self {
        Self {
            payload: Ok(v),
            conditions: Vec::new(),
        }
    }

    pub fn error(e: EvalError) -> Self {
        Self {
            payload: Err(e),
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn is_error(&self) -> bool {
        self.payload.is_err()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Condition> {
        self.conditions
            .iter()
            .filter(|c| c.kind == ConditionKind::Warning)
    }
}

impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Ok(v) => write!(f, "{}", crate::format::render(v)),
            Err(e) => write!(f, "<{:?} error: {}>", e.kind, e.message),
        }
    }
}
