//! Multiple values and escape signals.

use crate::ast::Span;
use crate::builtins::helpers::{check_arity, expect_string};
use crate::builtins::Registry;
use crate::runtime::control::Unwind;
use crate::runtime::eval::{escape, EvaluationContext};
use crate::runtime::value::{EscapeTag, NativeDef, Value};

pub fn register(registry: &mut Registry) {
    registry.register(&NATIVE_VALUES);
    registry.register(&NATIVE_THROW);
    registry.register(&NATIVE_INVOKE);
    registry.register(&NATIVE_MAKE_TAG);
}

/// `(values a...)` - return several values at once. Zero values collapse to
/// nil and a single value stays itself; only genuinely multiple values
/// produce the tagged bundle. In tail position inside a region the CPS
/// transform delivers the operands straight to the continuation instead of
/// calling this native.
pub static NATIVE_VALUES: NativeDef = NativeDef {
    name: "values",
    func: native_values,
};

fn native_values(args: &[Value], _ctx: &mut EvaluationContext, _span: Span) -> Result<Value, Unwind> {
    Ok(match args.len() {
        0 => Value::Nil,
        1 => args[0].clone(),
        _ => Value::Values(args.to_vec()),
    })
}

/// `(throw tag value)` - unwind to the nearest catch region whose tag group
/// contains `tag`. The signal travels on a channel distinct from ordinary
/// errors, so generic failure handling cannot swallow it; with no matching
/// region it surfaces at the engine boundary naming the tag.
pub static NATIVE_THROW: NativeDef = NativeDef {
    name: "throw",
    func: native_throw,
};

fn native_throw(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("throw", args, 2, ctx, span)?;
    Err(escape(args[0].clone(), args[1].clone(), span))
}

/// `invoke` is the historical alias for `throw`.
pub static NATIVE_INVOKE: NativeDef = NativeDef {
    name: "invoke",
    func: native_invoke,
};

fn native_invoke(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("invoke", args, 2, ctx, span)?;
    Err(escape(args[0].clone(), args[1].clone(), span))
}

/// `(make-tag label)` - a process-wide unique escape tag. Two tags are equal
/// only when they are the same creation, never by label.
pub static NATIVE_MAKE_TAG: NativeDef = NativeDef {
    name: "make-tag",
    func: native_make_tag,
};

fn native_make_tag(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("make-tag", args, 1, ctx, span)?;
    let label = expect_string(&args[0], ctx, span)?;
    Ok(Value::Tag(EscapeTag::fresh(label)))
}
