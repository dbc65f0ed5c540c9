//! List natives.

use crate::ast::Span;
use crate::builtins::helpers::{check_arity, expect_list};
use crate::builtins::Registry;
use crate::diagnostics::{to_source_span, ErrorReporting};
use crate::runtime::control::Unwind;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::{NativeDef, Value};

pub fn register(registry: &mut Registry) {
    registry.register(&NATIVE_LIST);
    registry.register(&NATIVE_LEN);
    registry.register(&NATIVE_CAR);
    registry.register(&NATIVE_CDR);
    registry.register(&NATIVE_CONS);
    registry.register(&NATIVE_APPEND);
    registry.register(&NATIVE_NULLP);
}

pub static NATIVE_LIST: NativeDef = NativeDef {
    name: "list",
    func: native_list,
};

fn native_list(args: &[Value], _ctx: &mut EvaluationContext, _span: Span) -> Result<Value, Unwind> {
    Ok(Value::List(args.to_vec()))
}

pub static NATIVE_LEN: NativeDef = NativeDef {
    name: "len",
    func: native_len,
};

fn native_len(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("len", args, 1, ctx, span)?;
    let length = match &args[0] {
        Value::List(items) => items.len(),
        Value::Str(s) => s.chars().count(),
        other => {
            return Err(ctx
                .type_mismatch("list or string", other.type_name(), to_source_span(span))
                .into())
        }
    };
    Ok(Value::Number(length as f64))
}

pub static NATIVE_CAR: NativeDef = NativeDef {
    name: "car",
    func: native_car,
};

fn native_car(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("car", args, 1, ctx, span)?;
    let items = expect_list(&args[0], ctx, span)?;
    match items.first() {
        Some(first) => Ok(first.clone()),
        None => Err(ctx
            .invalid_operation("car", "an empty list", to_source_span(span))
            .into()),
    }
}

pub static NATIVE_CDR: NativeDef = NativeDef {
    name: "cdr",
    func: native_cdr,
};

fn native_cdr(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("cdr", args, 1, ctx, span)?;
    let items = expect_list(&args[0], ctx, span)?;
    match items.split_first() {
        Some((_, rest)) => Ok(Value::List(rest.to_vec())),
        None => Err(ctx
            .invalid_operation("cdr", "an empty list", to_source_span(span))
            .into()),
    }
}

pub static NATIVE_CONS: NativeDef = NativeDef {
    name: "cons",
    func: native_cons,
};

fn native_cons(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("cons", args, 2, ctx, span)?;
    let tail = expect_list(&args[1], ctx, span)?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(args[0].clone());
    items.extend_from_slice(tail);
    Ok(Value::List(items))
}

pub static NATIVE_APPEND: NativeDef = NativeDef {
    name: "append",
    func: native_append,
};

fn native_append(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    let mut items = Vec::new();
    for arg in args {
        items.extend_from_slice(expect_list(arg, ctx, span)?);
    }
    Ok(Value::List(items))
}

pub static NATIVE_NULLP: NativeDef = NativeDef {
    name: "null?",
    func: native_nullp,
};

fn native_nullp(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("null?", args, 1, ctx, span)?;
    let empty = match &args[0] {
        Value::Nil => true,
        Value::List(items) => items.is_empty(),
        _ => false,
    };
    Ok(Value::Bool(empty))
}
