//! Single-expression execution against an evaluator.
//!
//! Each `run` builds a fresh evaluator from the factory, so no state
//! leaks between cases. The evaluation happens on its own thread with a
//! wall-clock deadline; a panic inside the evaluator is captured and
//! reported as a crash-kind error instead of tearing the process down.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::condition::{EvalError, EvalResult};

/// An evaluator the oracle can drive: the reference implementation, the
/// candidate under test, or a test double.
pub trait ExternalEvaluator: Send {
    /// Evaluate one fixture source (possibly several statements) and
    /// report the final value or error plus signalled conditions.
    fn evaluate(&mut self, source: &str) -> EvalResult;

    /// Restore the evaluator to a clean-session state.
    fn reset(&mut self);
}

/// Produces fresh evaluators. One factory is shared across worker
/// threads; each case gets its own evaluator instance.
pub trait EvaluatorFactory: Sync {
    fn make(&self) -> Box<dyn ExternalEvaluator>;
}

impl<F> EvaluatorFactory for F
where
    F: Fn() -> Box<dyn ExternalEvaluator> + Sync,
{
    fn make(&self) -> Box<dyn ExternalEvaluator> {
        self()
    }
}

/// What became of one evaluation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    Completed(EvalResult),
    /// Cancellation was requested before a result arrived.
    Cancelled,
}

impl RunResult {
    pub fn completed(self) -> Option<EvalResult> {
        match self {
            RunResult::Completed(result) => Some(result),
            RunResult::Cancelled => None,
        }
    }
}

/// Runs fixture sources with a timeout and cooperative cancellation.
#[derive(Debug, Clone)]
pub struct Runner {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl Runner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Evaluate `source` on a fresh evaluator. Checks the cancel token
    /// between polls; on timeout the evaluation thread is abandoned and
    /// a Timeout-kind error result is produced.
    pub fn run(
        &self,
        source: &str,
        factory: &dyn EvaluatorFactory,
        cancel: &CancelToken,
    ) -> RunResult {
        if cancel.is_requested() {
            return RunResult::Cancelled;
        }

        let (tx, rx) = mpsc::channel();
        let mut evaluator = factory.make();
        let source = source.to_string();
        thread::spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(&source)));
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => EvalResult::error(EvalError::crash(format!(
                    "evaluator panicked: {}",
                    panic_message(payload.as_ref())
                ))),
            };
            // The receiver may be gone after a timeout; nothing to do.
            let _ = tx.send(result);
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            if cancel.is_requested() {
                return RunResult::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return RunResult::Completed(EvalResult::error(EvalError::timeout(format!(
                    "evaluation did not finish within {:?}",
                    self.timeout
                ))));
            }
            let wait = self.poll_interval.min(deadline - now);
            match rx.recv_timeout(wait) {
                Ok(result) => return RunResult::Completed(result),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return RunResult::Completed(EvalResult::error(EvalError::crash(
                        "evaluator thread exited without producing a result",
                    )))
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
