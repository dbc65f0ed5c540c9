//! Non-local control flow.
//!
//! The evaluator's error channel is a two-variant sum: real errors and
//! escape signals. Keeping them structurally apart means a generic error
//! path can never accidentally swallow a `throw`, and a `catch` region can
//! never accidentally intercept a type error. The host unwind mechanism
//! (`Result` + `?`) is an implementation detail; the distinction is the
//! contract.

use crate::ast::Span;
use crate::diagnostics::{to_source_span, EngineError, ErrorKind, ErrorReporting};
use crate::runtime::value::Value;

/// A `throw` in flight: the tag identifying the target region and the value
/// that becomes that region's result.
#[derive(Debug)]
pub struct EscapeSignal {
    pub tag: Value,
    pub value: Value,
    pub span: Span,
}

/// What travels up through the evaluator when a computation does not
/// produce a value.
#[derive(Debug)]
pub enum Unwind {
    Error(EngineError),
    Escape(EscapeSignal),
}

impl From<EngineError> for Unwind {
    fn from(error: EngineError) -> Self {
        Unwind::Error(error)
    }
}

impl Unwind {
    /// Convert to a plain error at the engine boundary. An escape that got
    /// this far found no matching catch region on the whole dynamic extent;
    /// it surfaces as an uncaught-signal failure naming the missing tag.
    pub fn into_engine_error(self, reporter: &dyn ErrorReporting) -> EngineError {
        match self {
            Unwind::Error(e) => e,
            Unwind::Escape(signal) => reporter.report(
                ErrorKind::UncaughtSignal {
                    tag: signal.tag.to_string(),
                },
                to_source_span(signal.span),
            ),
        }
    }
}
