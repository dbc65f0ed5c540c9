//! AST module for the Samsara language.
//!
//! This module provides the core Abstract Syntax Tree types for representing
//! Samsara expressions with source location tracking. The tree is shared by
//! the parser, the tail-position analyzer, the CPS transformer, and the
//! evaluator; nodes use `Arc` so transformation passes can reuse untouched
//! subtrees without cloning them structurally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// SPANS
// ============================================================================

/// Represents a span in the source code.
///
/// All AST nodes carry a span for source tracking; spans also serve as node
/// identity for the tail-position analysis (every parsed node occupies a
/// distinct source range).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Wrapper carrying source span information with any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

/// Canonical AST node type with shared ownership for cheap tree rewriting.
pub type AstNode = Spanned<Arc<Expr>>;

/// Helper to construct an `AstNode` from an expression and a span.
pub fn node(expr: Expr, span: Span) -> AstNode {
    Spanned {
        value: Arc::new(expr),
        span,
    }
}

/// Helper to construct a symbol node. Used heavily by the CPS transformer,
/// which synthesizes `cc` references with the span of the rewritten form.
pub fn symbol(name: impl Into<String>, span: Span) -> AstNode {
    node(Expr::Symbol(name.into()), span)
}

// ============================================================================
// PARAMETER LISTS
// ============================================================================

/// Parameter list for function definitions. A trailing `...rest` parameter
/// collects any surplus arguments into a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamList {
    pub required: Vec<String>,
    pub rest: Option<String>,
    pub span: Span,
}

impl ParamList {
    pub fn accepts(&self, argc: usize) -> bool {
        if self.rest.is_some() {
            argc >= self.required.len()
        } else {
            argc == self.required.len()
        }
    }

    /// Human-readable arity, e.g. `"2"` or `"at least 1"`.
    pub fn describe_arity(&self) -> String {
        if self.rest.is_some() {
            format!("at least {}", self.required.len())
        } else {
            self.required.len().to_string()
        }
    }
}

// ============================================================================
// CONTINUATION SLOTS
// ============================================================================

/// How a lambda's reserved `cc` parameter defaults when no explicit `:cc`
/// is supplied at the call site.
///
/// - `None`: the lambda was never CPS-transformed and has no `cc` slot.
/// - `Identity`: transformed function; defaults to the identity continuation
///   so ordinary call sites keep normal return semantics.
/// - `Inherit`: synthesized continuation; defaults to the `cc` of the
///   function that captured it, resolved when the closure is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CcSlot {
    None,
    Identity,
    Inherit,
}

/// A lambda expression. `cc` is `CcSlot::None` straight out of the parser;
/// the CPS transformer flips it for every lambda inside a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaExpr {
    pub params: ParamList,
    pub body: Vec<AstNode>,
    pub cc: CcSlot,
}

/// A single `(name value)` pair in a `let` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub value: AstNode,
    pub span: Span,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// The core AST node for Samsara expressions.
///
/// `Jump` never comes out of the parser: it is produced exclusively by the
/// CPS transformer, which guarantees it only ever occupies tail position.
/// `ListLit` only occurs in datum position (inside `quote`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Str(String),
    Symbol(String),
    Nil,
    Quote(AstNode),
    ListLit(Vec<AstNode>),
    Spread(AstNode),
    Call {
        target: AstNode,
        args: Vec<AstNode>,
        cc: Option<AstNode>,
    },
    If {
        condition: AstNode,
        then_branch: AstNode,
        else_branch: AstNode,
    },
    Seq(Vec<AstNode>),
    And(Vec<AstNode>),
    Or(Vec<AstNode>),
    Let {
        bindings: Vec<Binding>,
        body: Vec<AstNode>,
    },
    Lambda(LambdaExpr),
    Define {
        name: String,
        value: AstNode,
    },
    Set {
        name: String,
        value: AstNode,
    },
    While {
        condition: AstNode,
        body: Vec<AstNode>,
    },
    Bind {
        call: AstNode,
        params: ParamList,
        body: Vec<AstNode>,
    },
    Catch {
        tags: Vec<AstNode>,
        body: Vec<AstNode>,
    },
    Region(Vec<AstNode>),
    Jump {
        target: AstNode,
        args: Vec<AstNode>,
        cc: Option<AstNode>,
    },
}

impl Expr {
    /// Short name of the expression kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "number",
            Expr::Bool(_) => "boolean",
            Expr::Str(_) => "string",
            Expr::Symbol(_) => "symbol",
            Expr::Nil => "nil",
            Expr::Quote(_) => "quote",
            Expr::ListLit(_) => "list literal",
            Expr::Spread(_) => "spread",
            Expr::Call { .. } => "call",
            Expr::If { .. } => "if",
            Expr::Seq(_) => "do",
            Expr::And(_) => "and",
            Expr::Or(_) => "or",
            Expr::Let { .. } => "let",
            Expr::Lambda(_) => "lambda",
            Expr::Define { .. } => "define",
            Expr::Set { .. } => "set!",
            Expr::While { .. } => "while",
            Expr::Bind { .. } => "bind",
            Expr::Catch { .. } => "catch",
            Expr::Region(_) => "with-continuations",
            Expr::Jump { .. } => "jump",
        }
    }

    /// Pretty-prints the expression as a string.
    ///
    /// ```rust
    /// use samsara::ast::{Expr, Span, node};
    /// let n = node(Expr::Number(42.0), Span::default());
    /// assert_eq!(n.value.pretty(), "42");
    /// ```
    pub fn pretty(&self) -> String {
        match self {
            Expr::Number(n) => format_number(*n),
            Expr::Bool(b) => b.to_string(),
            Expr::Str(s) => format!("{:?}", s),
            Expr::Symbol(s) => s.clone(),
            Expr::Nil => "nil".to_string(),
            Expr::Quote(inner) => format!("'{}", inner.value.pretty()),
            Expr::ListLit(items) => format!("({})", pretty_seq(items)),
            Expr::Spread(inner) => format!("...{}", inner.value.pretty()),
            Expr::Call { target, args, cc } => {
                let mut s = format!("({}", target.value.pretty());
                for a in args {
                    s.push(' ');
                    s.push_str(&a.value.pretty());
                }
                if let Some(cc) = cc {
                    s.push_str(" :cc ");
                    s.push_str(&cc.value.pretty());
                }
                s.push(')');
                s
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(if {} {} {})",
                condition.value.pretty(),
                then_branch.value.pretty(),
                else_branch.value.pretty()
            ),
            Expr::Seq(items) => format!("(do {})", pretty_seq(items)),
            Expr::And(items) => format!("(and {})", pretty_seq(items)),
            Expr::Or(items) => format!("(or {})", pretty_seq(items)),
            Expr::Let { bindings, body } => {
                let binds = bindings
                    .iter()
                    .map(|b| format!("({} {})", b.name, b.value.value.pretty()))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("(let ({}) {})", binds, pretty_seq(body))
            }
            Expr::Lambda(lambda) => {
                format!(
                    "(lambda ({}) {})",
                    pretty_params(&lambda.params, lambda.cc),
                    pretty_seq(&lambda.body)
                )
            }
            Expr::Define { name, value } => {
                format!("(define {} {})", name, value.value.pretty())
            }
            Expr::Set { name, value } => format!("(set! {} {})", name, value.value.pretty()),
            Expr::While { condition, body } => {
                format!("(while {} {})", condition.value.pretty(), pretty_seq(body))
            }
            Expr::Bind { call, params, body } => format!(
                "(bind {} ({}) {})",
                call.value.pretty(),
                pretty_params(params, CcSlot::None),
                pretty_seq(body)
            ),
            Expr::Catch { tags, body } => {
                format!("(catch ({}) {})", pretty_seq(tags), pretty_seq(body))
            }
            Expr::Region(forms) => format!("(with-continuations {})", pretty_seq(forms)),
            Expr::Jump { target, args, cc } => {
                let mut s = format!("(jump {}", target.value.pretty());
                for a in args {
                    s.push(' ');
                    s.push_str(&a.value.pretty());
                }
                if let Some(cc) = cc {
                    s.push_str(" :cc ");
                    s.push_str(&cc.value.pretty());
                }
                s.push(')');
                s
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Pretty-printing helpers
// ----------------------------------------------------------------------------

fn pretty_seq(items: &[AstNode]) -> String {
    items
        .iter()
        .map(|e| e.value.pretty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn pretty_params(params: &ParamList, cc: CcSlot) -> String {
    let mut parts: Vec<String> = params.required.clone();
    if let Some(rest) = &params.rest {
        parts.push(format!("...{}", rest));
    }
    match cc {
        CcSlot::None => {}
        CcSlot::Identity => parts.push(":cc".to_string()),
        CcSlot::Inherit => parts.push(":cc*".to_string()),
    }
    parts.join(" ")
}

/// Numbers print without a trailing `.0` when integral, matching the way
/// the surface language writes them.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_round_trips_simple_forms() {
        let span = Span::default();
        let call = Expr::Call {
            target: symbol("f", span),
            args: vec![node(Expr::Number(1.0), span), symbol("x", span)],
            cc: None,
        };
        assert_eq!(call.pretty(), "(f 1 x)");
    }

    #[test]
    fn pretty_marks_cc_slots() {
        let span = Span::default();
        let lambda = Expr::Lambda(LambdaExpr {
            params: ParamList {
                required: vec!["x".into()],
                rest: None,
                span,
            },
            body: vec![symbol("x", span)],
            cc: CcSlot::Identity,
        });
        assert_eq!(lambda.pretty(), "(lambda (x :cc) x)");
    }
}
