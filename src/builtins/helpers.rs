//! Shared infrastructure for native functions: argument count and type
//! checking with uniform diagnostics.

use crate::ast::Span;
use crate::diagnostics::{to_source_span, ErrorReporting};
use crate::runtime::control::Unwind;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::Value;

pub fn check_arity(
    name: &str,
    args: &[Value],
    expected: usize,
    ctx: &EvaluationContext,
    span: Span,
) -> Result<(), Unwind> {
    if args.len() != expected {
        return Err(ctx
            .arity_mismatch(name, &expected.to_string(), args.len(), to_source_span(span))
            .into());
    }
    Ok(())
}

pub fn check_min_arity(
    name: &str,
    args: &[Value],
    minimum: usize,
    ctx: &EvaluationContext,
    span: Span,
) -> Result<(), Unwind> {
    if args.len() < minimum {
        return Err(ctx
            .arity_mismatch(
                name,
                &format!("at least {}", minimum),
                args.len(),
                to_source_span(span),
            )
            .into());
    }
    Ok(())
}

pub fn expect_number(value: &Value, ctx: &EvaluationContext, span: Span) -> Result<f64, Unwind> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(ctx
            .type_mismatch("number", other.type_name(), to_source_span(span))
            .into()),
    }
}

pub fn expect_list<'a>(
    value: &'a Value,
    ctx: &EvaluationContext,
    span: Span,
) -> Result<&'a [Value], Unwind> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(ctx
            .type_mismatch("list", other.type_name(), to_source_span(span))
            .into()),
    }
}

pub fn expect_string<'a>(
    value: &'a Value,
    ctx: &EvaluationContext,
    span: Span,
) -> Result<&'a str, Unwind> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(ctx
            .type_mismatch("string", other.type_name(), to_source_span(span))
            .into()),
    }
}
