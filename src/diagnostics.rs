//! Samsara error handling.
//!
//! A single error type, `EngineError`, covers every failure mode of the
//! pipeline: parsing, CPS transformation, evaluation, and uncaught escape
//! signals. Errors are miette diagnostics with a labeled primary span and a
//! stable error code of the form `samsara::<phase>::<kind>`.
//!
//! Construction goes through the `ErrorReporting` trait: each phase context
//! (parser, transformer, evaluator) knows its own source and phase name and
//! builds properly contextualized errors via `report`. `EngineError` structs
//! are never assembled by hand outside this module.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source text plus a display name, used to attach miette source code to
/// diagnostics. Cloning is cheap enough here; the `NamedSource` itself is
/// built on demand and shared via `Arc`.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_source(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Fallback when no real source is available (e.g. values synthesized
    /// at run time).
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "<internal>".to_string(),
            content: format!("; {}", context),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("no source context")
    }
}

// ============================================================================
// ERROR KINDS
// ============================================================================

/// All engine error kinds. Display text is the canonical user-facing
/// message; span and help live in the enclosing `EngineError`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Parse errors
    #[error("Parse error: {message}")]
    Syntax { message: String },
    #[error("Parse error: malformed {construct}: {reason}")]
    MalformedConstruct { construct: String, reason: String },
    #[error("Parse error: invalid {literal_type} '{value}'")]
    InvalidLiteral { literal_type: String, value: String },

    // Transform errors - structural problems caught before any code runs
    #[error("Transform error: unsupported construct '{construct}' in '{function}'")]
    UnsupportedConstruct { construct: String, function: String },
    #[error("Transform error: malformed bind: {reason}")]
    MalformedBind { reason: String },
    #[error("Transform error: 'cc' is a reserved parameter name in '{function}'")]
    ReservedParameter { function: String },
    #[error("Transform error: tail call to '{function}' expects {expected} argument(s), got {actual}")]
    TailCallArity {
        function: String,
        expected: String,
        actual: usize,
    },

    // Runtime errors
    #[error("Runtime error: undefined symbol '{symbol}'")]
    UndefinedSymbol { symbol: String },
    #[error("Type error: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("Runtime error: '{function}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },
    #[error("Runtime error: invalid operation '{operation}' on {operand_type}")]
    InvalidOperation {
        operation: String,
        operand_type: String,
    },
    #[error("Runtime error: division by zero")]
    DivisionByZero,
    #[error("Runtime error: recursion limit exceeded")]
    RecursionLimit,

    // Signal errors - escape control flow that reached top level
    #[error("Uncaught escape signal: no active catch region for tag {tag}")]
    UncaughtSignal { tag: String },

    // Engine bugs
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ErrorKind {
    /// Error category, used by tests to assert on the class of a failure
    /// without string matching.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. }
            | Self::MalformedConstruct { .. }
            | Self::InvalidLiteral { .. } => ErrorCategory::Parse,

            Self::UnsupportedConstruct { .. }
            | Self::MalformedBind { .. }
            | Self::ReservedParameter { .. }
            | Self::TailCallArity { .. } => ErrorCategory::Transform,

            Self::UndefinedSymbol { .. }
            | Self::TypeMismatch { .. }
            | Self::ArityMismatch { .. }
            | Self::InvalidOperation { .. }
            | Self::DivisionByZero
            | Self::RecursionLimit => ErrorCategory::Runtime,

            Self::UncaughtSignal { .. } => ErrorCategory::Signal,

            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "syntax",
            Self::MalformedConstruct { .. } => "malformed_construct",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::UnsupportedConstruct { .. } => "unsupported_construct",
            Self::MalformedBind { .. } => "malformed_bind",
            Self::ReservedParameter { .. } => "reserved_parameter",
            Self::TailCallArity { .. } => "tail_call_arity",
            Self::UndefinedSymbol { .. } => "undefined_symbol",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::InvalidOperation { .. } => "invalid_operation",
            Self::DivisionByZero => "division_by_zero",
            Self::RecursionLimit => "recursion_limit",
            Self::UncaughtSignal { .. } => "uncaught_signal",
            Self::Internal { .. } => "internal",
        }
    }

    fn primary_label(&self) -> String {
        match self {
            Self::Syntax { .. } => "invalid syntax".into(),
            Self::MalformedConstruct { .. } => "malformed form".into(),
            Self::InvalidLiteral { .. } => "invalid literal".into(),
            Self::UnsupportedConstruct { construct, .. } => {
                format!("'{}' cannot cross a continuation boundary", construct)
            }
            Self::MalformedBind { .. } => "malformed bind".into(),
            Self::ReservedParameter { .. } => "reserved name".into(),
            Self::TailCallArity { .. } => "arity mismatch in tail call".into(),
            Self::UndefinedSymbol { .. } => "undefined symbol".into(),
            Self::TypeMismatch { .. } => "type mismatch".into(),
            Self::ArityMismatch { .. } => "arity mismatch".into(),
            Self::InvalidOperation { .. } => "invalid operation".into(),
            Self::DivisionByZero => "division by zero".into(),
            Self::RecursionLimit => "recursion limit exceeded here".into(),
            Self::UncaughtSignal { .. } => "signal raised here".into(),
            Self::Internal { .. } => "internal error".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Transform,
    Runtime,
    Signal,
    Internal,
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

/// Context-specific source information.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// The single engine error type: what went wrong, where, and how to help.
#[derive(Debug)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub source_info: SourceInfo,
    pub diagnostic_info: DiagnosticInfo,
}

impl EngineError {
    /// Attach a help message unless one is already present. The trampoline
    /// uses this to record the logical tail-call chain at the failure point.
    pub fn with_help_if_absent(mut self, help: impl Into<String>) -> Self {
        if self.diagnostic_info.help.is_none() {
            self.diagnostic_info.help = Some(help.into());
        }
        self
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for EngineError {}

impl Diagnostic for EngineError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

// ============================================================================
// ERROR REPORTING
// ============================================================================

/// Context-aware error creation. Each phase context implements `report` with
/// its own source and phase name; the convenience methods cover the common
/// kinds so call sites stay one-liners.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> EngineError;

    fn undefined_symbol(&self, symbol: &str, span: SourceSpan) -> EngineError {
        self.report(
            ErrorKind::UndefinedSymbol {
                symbol: symbol.into(),
            },
            span,
        )
    }

    fn type_mismatch(&self, expected: &str, actual: &str, span: SourceSpan) -> EngineError {
        self.report(
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
            span,
        )
    }

    fn arity_mismatch(
        &self,
        function: &str,
        expected: &str,
        actual: usize,
        span: SourceSpan,
    ) -> EngineError {
        self.report(
            ErrorKind::ArityMismatch {
                function: function.into(),
                expected: expected.into(),
                actual,
            },
            span,
        )
    }

    fn invalid_operation(&self, operation: &str, operand_type: &str, span: SourceSpan) -> EngineError {
        self.report(
            ErrorKind::InvalidOperation {
                operation: operation.into(),
                operand_type: operand_type.into(),
            },
            span,
        )
    }

    /// Internal errors indicate engine bugs, not user mistakes.
    fn internal_error(&self, message: &str, span: SourceSpan) -> EngineError {
        let mut error = self.report(
            ErrorKind::Internal {
                message: message.into(),
            },
            span,
        );
        error.diagnostic_info.help =
            Some("This is an internal engine error. Please report it as a bug.".into());
        error
    }
}

/// General-purpose reporting context tied to one source and one phase.
pub struct PhaseContext {
    pub source: SourceContext,
    pub phase: &'static str,
}

impl PhaseContext {
    pub fn new(source: SourceContext, phase: &'static str) -> Self {
        Self { source, phase }
    }
}

impl ErrorReporting for PhaseContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> EngineError {
        let error_code = format!("samsara::{}::{}", self.phase, kind.code_suffix());
        EngineError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
                phase: self.phase.to_string(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

// ============================================================================
// SPAN UTILITIES
// ============================================================================

/// Converts an AST span to a miette source span.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

/// Placeholder span for errors with no meaningful source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Prints an error with full miette diagnostics. For CLI and REPL use.
pub fn print_error(error: EngineError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PhaseContext {
        PhaseContext::new(SourceContext::from_source("test.sam", "(f 1 2)"), "eval")
    }

    #[test]
    fn categories_are_stable() {
        assert_eq!(
            ErrorKind::UncaughtSignal { tag: "t".into() }.category(),
            ErrorCategory::Signal
        );
        assert_eq!(
            ErrorKind::MalformedBind { reason: "r".into() }.category(),
            ErrorCategory::Transform
        );
        assert_eq!(ErrorKind::DivisionByZero.category(), ErrorCategory::Runtime);
    }

    #[test]
    fn report_builds_code_from_phase_and_kind() {
        let err = ctx().undefined_symbol("nope", to_source_span(Span { start: 1, end: 2 }));
        assert_eq!(err.diagnostic_info.error_code, "samsara::eval::undefined_symbol");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn uncaught_signal_names_the_tag() {
        let err = ctx().report(
            ErrorKind::UncaughtSignal {
                tag: "#<tag amb-exhausted>".into(),
            },
            unspanned(),
        );
        assert!(err.to_string().contains("amb-exhausted"));
        assert_eq!(err.kind.category(), ErrorCategory::Signal);
    }
}
