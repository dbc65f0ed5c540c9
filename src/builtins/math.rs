//! Arithmetic natives.

use crate::ast::Span;
use crate::builtins::helpers::{check_min_arity, expect_number};
use crate::builtins::Registry;
use crate::diagnostics::{to_source_span, ErrorKind, ErrorReporting};
use crate::runtime::control::Unwind;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::{NativeDef, Value};

pub fn register(registry: &mut Registry) {
    registry.register(&NATIVE_ADD);
    registry.register(&NATIVE_SUB);
    registry.register(&NATIVE_MUL);
    registry.register(&NATIVE_DIV);
}

pub static NATIVE_ADD: NativeDef = NativeDef {
    name: "+",
    func: native_add,
};

fn native_add(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    let mut sum = 0.0;
    for arg in args {
        sum += expect_number(arg, ctx, span)?;
    }
    Ok(Value::Number(sum))
}

pub static NATIVE_SUB: NativeDef = NativeDef {
    name: "-",
    func: native_sub,
};

fn native_sub(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_min_arity("-", args, 1, ctx, span)?;
    let first = expect_number(&args[0], ctx, span)?;
    if args.len() == 1 {
        return Ok(Value::Number(-first));
    }
    let mut result = first;
    for arg in &args[1..] {
        result -= expect_number(arg, ctx, span)?;
    }
    Ok(Value::Number(result))
}

pub static NATIVE_MUL: NativeDef = NativeDef {
    name: "*",
    func: native_mul,
};

fn native_mul(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    let mut product = 1.0;
    for arg in args {
        product *= expect_number(arg, ctx, span)?;
    }
    Ok(Value::Number(product))
}

pub static NATIVE_DIV: NativeDef = NativeDef {
    name: "/",
    func: native_div,
};

fn native_div(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_min_arity("/", args, 2, ctx, span)?;
    let mut result = expect_number(&args[0], ctx, span)?;
    for arg in &args[1..] {
        let divisor = expect_number(arg, ctx, span)?;
        if divisor == 0.0 {
            return Err(ctx.report(ErrorKind::DivisionByZero, to_source_span(span)).into());
        }
        result /= divisor;
    }
    Ok(Value::Number(result))
}
