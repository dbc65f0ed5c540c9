//! Tail-position analysis.
//!
//! Given a function body, computes the set of sub-expression positions that
//! are in tail position: positions where control reaching the expression
//! implies the enclosing function has no further work to do except propagate
//! the value. The CPS transformer consults this set to decide where to
//! thread the continuation parameter.
//!
//! The rules, applied recursively from the outermost tail position inward:
//!
//! - the final form of the function body is in tail position;
//! - both branches of a tail-position `if` are in tail position (which branch
//!   runs is not known statically);
//! - the lexically last operand of a tail-position `and`/`or` chain is in
//!   tail position;
//! - the last form of a tail-position `do` or `let` body is in tail position;
//! - nothing else is.
//!
//! `bind` is itself a terminal: its body belongs to the continuation the
//! transformer synthesizes for it and is analyzed when that continuation is
//! transformed. `catch` is opaque: the form as a whole can be a tail value,
//! but its body runs in direct style inside the dynamic region.
//!
//! Markers are compile-time-only: the set is keyed by source span (every
//! parsed node occupies a distinct range) and nothing survives to run time.
//!
//! Constructs that bypass this analysis entirely (`while`) are rejected here
//! with an error naming the construct and the enclosing function, before any
//! code runs.

use std::collections::HashSet;

use crate::ast::{AstNode, Expr, Span};
use crate::diagnostics::{to_source_span, EngineError, ErrorKind, ErrorReporting, PhaseContext};

/// The tail-position set for one function body.
#[derive(Debug, Default)]
pub struct TailPositions {
    tails: HashSet<Span>,
}

impl TailPositions {
    pub fn is_tail(&self, span: Span) -> bool {
        self.tails.contains(&span)
    }

    pub fn len(&self) -> usize {
        self.tails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }

    fn mark(&mut self, node: &AstNode) {
        self.tails.insert(node.span);
    }
}

/// Analyze one function body. `function` names the function for diagnostics.
pub fn analyze(
    function: &str,
    body: &[AstNode],
    ctx: &PhaseContext,
) -> Result<TailPositions, EngineError> {
    for form in body {
        reject_unsupported(function, form, ctx)?;
    }

    let mut tails = TailPositions::default();
    if let Some(last) = body.last() {
        mark_tail(&mut tails, last);
    }
    Ok(tails)
}

// ============================================================================
// TAIL MARKING
// ============================================================================

fn mark_tail(tails: &mut TailPositions, node: &AstNode) {
    tails.mark(node);

    match &*node.value {
        Expr::If {
            then_branch,
            else_branch,
            ..
        } => {
            mark_tail(tails, then_branch);
            mark_tail(tails, else_branch);
        }
        Expr::Seq(items) | Expr::And(items) | Expr::Or(items) => {
            if let Some(last) = items.last() {
                mark_tail(tails, last);
            }
        }
        Expr::Let { body, .. } => {
            if let Some(last) = body.last() {
                mark_tail(tails, last);
            }
        }
        // Terminals: calls, binds, catches, literals, symbols, lambdas.
        _ => {}
    }
}

// ============================================================================
// STATIC REJECTION
// ============================================================================

/// Walks every position of the body, including non-tail ones, and rejects
/// constructs the CPS transform cannot express. Nested lambdas and `bind`
/// bodies are skipped: each is analyzed separately when it is transformed.
fn reject_unsupported(
    function: &str,
    node: &AstNode,
    ctx: &PhaseContext,
) -> Result<(), EngineError> {
    let unsupported = |construct: &str| {
        ctx.report(
            ErrorKind::UnsupportedConstruct {
                construct: construct.into(),
                function: function.into(),
            },
            to_source_span(node.span),
        )
    };

    match &*node.value {
        Expr::While { .. } => return Err(unsupported("while")),
        Expr::Region(_) => return Err(unsupported("with-continuations")),
        Expr::Jump { .. } => {
            return Err(ctx.internal_error(
                "jump node present before CPS transformation",
                to_source_span(node.span),
            ))
        }

        Expr::Call { target, args, cc } => {
            reject_unsupported(function, target, ctx)?;
            for a in args {
                reject_unsupported(function, a, ctx)?;
            }
            if let Some(cc) = cc {
                reject_unsupported(function, cc, ctx)?;
            }
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            reject_unsupported(function, condition, ctx)?;
            reject_unsupported(function, then_branch, ctx)?;
            reject_unsupported(function, else_branch, ctx)?;
        }
        Expr::Seq(items) | Expr::And(items) | Expr::Or(items) => {
            for item in items {
                reject_unsupported(function, item, ctx)?;
            }
        }
        Expr::Catch { tags, body } => {
            for tag in tags {
                reject_unsupported(function, tag, ctx)?;
            }
            for item in body {
                reject_unsupported(function, item, ctx)?;
            }
        }
        Expr::Let { bindings, body } => {
            for b in bindings {
                reject_unsupported(function, &b.value, ctx)?;
            }
            for item in body {
                reject_unsupported(function, item, ctx)?;
            }
        }
        Expr::Define { value, .. } | Expr::Set { value, .. } | Expr::Spread(value) => {
            reject_unsupported(function, value, ctx)?;
        }
        Expr::Bind { call, .. } => {
            // The bind body becomes its own function; only the call is ours.
            reject_unsupported(function, call, ctx)?;
        }

        // Lambda bodies are analyzed when the lambda itself is transformed.
        Expr::Lambda(_) => {}

        Expr::Number(_)
        | Expr::Bool(_)
        | Expr::Str(_)
        | Expr::Symbol(_)
        | Expr::Nil
        | Expr::Quote(_)
        | Expr::ListLit(_) => {}
    }

    Ok(())
}
