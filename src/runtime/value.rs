//! Runtime values.
//!
//! Two variants deserve a note:
//!
//! - `Values` is the tagged multiple-value bundle, deliberately distinct from
//!   `List` so a receiver can tell "one structured value" from "several
//!   independent values" at the boundary of a transformed function.
//! - `Jump` is a tail-call descriptor: "call this target with these arguments
//!   instead of returning normally". It is produced by evaluating a `jump`
//!   node and consumed by the trampoline; it is transient and never a
//!   meaningful user-level datum.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::{format_number, AstNode, ParamList, Span};
use crate::runtime::control::Unwind;
use crate::runtime::env::Env;
use crate::runtime::eval::EvaluationContext;

// ============================================================================
// VALUES
// ============================================================================

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Symbol(String),
    List(Vec<Value>),
    /// Tagged multiple-value bundle.
    Values(Vec<Value>),
    Tag(EscapeTag),
    Closure(Rc<Closure>),
    Native(&'static NativeDef),
    /// Tail-call descriptor, consumed by the trampoline.
    Jump(Rc<TailCall>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Values(_) => "values",
            Value::Tag(_) => "tag",
            Value::Closure(_) => "function",
            Value::Native(_) => "native function",
            Value::Jump(_) => "tail call",
        }
    }

    /// `nil` and `false` are falsey; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Values(a), Value::Values(b)) => a == b,
            (Value::Tag(a), Value::Tag(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(items) => write_seq(f, "(", items, ")"),
            Value::Values(items) => write_seq(f, "(values ", items, ")"),
            Value::Tag(tag) => write!(f, "{}", tag),
            Value::Closure(c) => match &c.name {
                Some(name) => write!(f, "#<fn {}>", name),
                None if c.is_continuation() => write!(f, "#<continuation>"),
                None => write!(f, "#<lambda>"),
            },
            Value::Native(def) => write!(f, "#<native {}>", def.name),
            Value::Jump(_) => write!(f, "#<tail-call>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

// ============================================================================
// CLOSURES
// ============================================================================

/// What the reserved `cc` parameter falls back to when a closure is invoked
/// without an explicit continuation.
#[derive(Clone)]
pub enum CcDefault {
    /// Untransformed closure: no `cc` slot at all.
    None,
    /// Transformed function: identity continuation, so ordinary call sites
    /// get ordinary return values.
    Identity,
    /// Synthesized continuation: the capturing function's `cc`, resolved
    /// when the closure was created.
    Inherited(Value),
}

pub struct Closure {
    pub name: Option<String>,
    pub params: ParamList,
    pub body: Vec<AstNode>,
    pub env: Env,
    pub cc: CcDefault,
    pub span: Span,
}

impl Closure {
    /// Whether this closure participates in continuation threading: it has a
    /// `cc` slot and may produce tail-call descriptors.
    pub fn is_cc_aware(&self) -> bool {
        !matches!(self.cc, CcDefault::None)
    }

    pub fn is_continuation(&self) -> bool {
        matches!(self.cc, CcDefault::Inherited(_))
    }

    pub fn describe(&self) -> &str {
        self.name.as_deref().unwrap_or("lambda")
    }
}

// ============================================================================
// TAIL CALLS
// ============================================================================

/// An immutable "call this instead of returning" record. `cc: None` means
/// the target's own default continuation applies.
#[derive(Clone)]
pub struct TailCall {
    pub target: Value,
    pub args: Vec<Value>,
    pub cc: Option<Value>,
    pub span: Span,
}

// ============================================================================
// ESCAPE TAGS
// ============================================================================

static NEXT_TAG_ID: AtomicU64 = AtomicU64::new(0);

/// A process-wide unique token identifying one family of catch regions.
#[derive(Clone, Debug)]
pub struct EscapeTag {
    inner: Rc<TagData>,
}

#[derive(Debug)]
struct TagData {
    id: u64,
    label: String,
}

impl EscapeTag {
    pub fn fresh(label: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(TagData {
                id: NEXT_TAG_ID.fetch_add(1, Ordering::Relaxed),
                label: label.into(),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }
}

impl PartialEq for EscapeTag {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for EscapeTag {}

impl fmt::Display for EscapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<tag {}>", self.inner.label)
    }
}

// ============================================================================
// NATIVE FUNCTIONS
// ============================================================================

pub type NativeFn =
    fn(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind>;

/// A named native function. Registered definitions are `'static` so values
/// can hold plain references to them.
pub struct NativeDef {
    pub name: &'static str,
    pub func: NativeFn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_even_with_equal_labels() {
        let a = EscapeTag::fresh("done");
        let b = EscapeTag::fresh("done");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "#<tag done>");
    }

    #[test]
    fn bundles_are_distinct_from_lists() {
        let list = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        let bundle = Value::Values(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_ne!(list, bundle);
        assert_eq!(bundle.to_string(), "(values 1 2)");
    }

    #[test]
    fn truthiness_matches_the_surface_language() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }
}
