//! The direct evaluator.
//!
//! Evaluates structured AST in the usual recursive way. Every call site
//! routes through the trampoline, so applying a continuation-aware closure
//! never recurses per tail call; only genuinely nested (non-tail) calls
//! consume host stack, guarded by the recursion limit.
//!
//! `jump` nodes evaluate to tail-call descriptor values. The evaluator does
//! not interpret them; the enclosing trampoline does. Since the CPS
//! transformer only ever places `jump` in tail position, a descriptor is
//! always the last value a transformed body produces.

use std::rc::Rc;

use crate::ast::{AstNode, CcSlot, Expr, LambdaExpr, Span};
use crate::builtins::{Registry, SharedOutput};
use crate::diagnostics::{
    to_source_span, EngineError, ErrorKind, ErrorReporting, SourceContext, SourceInfo,
    DiagnosticInfo,
};
use crate::runtime::control::{EscapeSignal, Unwind};
use crate::runtime::env::Env;
use crate::runtime::trampoline::{self, identity_continuation};
use crate::runtime::value::{CcDefault, Closure, TailCall, Value};
use crate::runtime::world::World;

/// The reserved continuation-carrier parameter name.
pub const CC_PARAM: &str = "cc";

/// Default bound on direct (non-trampolined) call nesting. Tail chains do
/// not count against it: the trampoline holds the depth constant across
/// bounces.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

// ============================================================================
// EVALUATION CONTEXT
// ============================================================================

/// Evaluation state threaded through the whole runtime: globals, native
/// registry, output sink, source for diagnostics, and the direct-call depth.
pub struct EvaluationContext {
    pub world: Rc<World>,
    pub natives: Rc<Registry>,
    pub output: SharedOutput,
    pub source: SourceContext,
    pub depth: usize,
    pub max_depth: usize,
}

impl EvaluationContext {
    pub fn new(
        world: Rc<World>,
        natives: Rc<Registry>,
        output: SharedOutput,
        source: SourceContext,
        max_depth: usize,
    ) -> Self {
        Self {
            world,
            natives,
            output,
            source,
            depth: 0,
            max_depth,
        }
    }

    #[cfg(test)]
    pub fn for_tests(source: SourceContext) -> Self {
        Self::new(
            Rc::new(World::new()),
            Rc::new(crate::builtins::core_registry()),
            crate::builtins::shared(crate::builtins::NullSink),
            source,
            DEFAULT_MAX_DEPTH,
        )
    }
}

impl ErrorReporting for EvaluationContext {
    fn report(&self, kind: ErrorKind, span: miette::SourceSpan) -> EngineError {
        let error_code = format!("samsara::eval::{}", kind.code_suffix());
        EngineError {
            kind,
            source_info: SourceInfo {
                source: self.source.to_named_source(),
                primary_span: span,
                phase: "eval".to_string(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate a body: each form in order, producing the last value.
pub fn eval_body(
    body: &[AstNode],
    env: &Env,
    ctx: &mut EvaluationContext,
) -> Result<Value, Unwind> {
    let mut last = Value::Nil;
    for form in body {
        last = evaluate(form, env, ctx)?;
    }
    Ok(last)
}

/// Core recursive evaluator.
pub fn evaluate(expr: &AstNode, env: &Env, ctx: &mut EvaluationContext) -> Result<Value, Unwind> {
    let span = expr.span;
    match &*expr.value {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Nil => Ok(Value::Nil),

        Expr::Symbol(name) => resolve_symbol(name, span, env, ctx),

        Expr::Quote(datum) => datum_to_value(datum, ctx),

        Expr::ListLit(_) => Err(ctx
            .internal_error("datum list outside quote", to_source_span(span))
            .into()),

        Expr::Spread(_) => Err(ctx
            .invalid_operation("spread", "a position outside call arguments", to_source_span(span))
            .into()),

        Expr::Call { target, args, cc } => {
            let target_value = evaluate(target, env, ctx)?;
            let arg_values = eval_args(args, env, ctx)?;
            let cc_value = cc.as_ref().map(|c| evaluate(c, env, ctx)).transpose()?;
            apply(ctx, target_value, arg_values, cc_value, span)
        }

        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = evaluate(condition, env, ctx)?;
            if cond.is_truthy() {
                evaluate(then_branch, env, ctx)
            } else {
                evaluate(else_branch, env, ctx)
            }
        }

        Expr::Seq(items) => eval_body(items, env, ctx),

        Expr::And(items) => {
            let mut last = Value::Bool(true);
            for item in items {
                let value = evaluate(item, env, ctx)?;
                if !value.is_truthy() {
                    return Ok(value);
                }
                last = value;
            }
            Ok(last)
        }

        Expr::Or(items) => {
            let mut last = Value::Bool(false);
            for item in items {
                let value = evaluate(item, env, ctx)?;
                if value.is_truthy() {
                    return Ok(value);
                }
                last = value;
            }
            Ok(last)
        }

        Expr::Let { bindings, body } => {
            // Bindings are sequential: each value sees the previous names.
            let frame = env.child();
            for binding in bindings {
                let value = evaluate(&binding.value, &frame, ctx)?;
                frame.define(&binding.name, value);
            }
            eval_body(body, &frame, ctx)
        }

        Expr::Lambda(lambda) => Ok(make_closure(lambda, None, env, span)),

        Expr::Define { name, value } => {
            let bound = match &*value.value {
                Expr::Lambda(lambda) => make_closure(lambda, Some(name.clone()), env, value.span),
                _ => evaluate(value, env, ctx)?,
            };
            env.define(name, bound.clone());
            Ok(bound)
        }

        Expr::Set { name, value } => {
            let bound = evaluate(value, env, ctx)?;
            if env.assign(name, bound.clone()) {
                Ok(bound)
            } else {
                Err(ctx.undefined_symbol(name, to_source_span(span)).into())
            }
        }

        Expr::While { condition, body } => {
            loop {
                let cond = evaluate(condition, env, ctx)?;
                if !cond.is_truthy() {
                    break;
                }
                eval_body(body, env, ctx)?;
            }
            Ok(Value::Nil)
        }

        Expr::Catch { tags, body } => {
            let mut tag_values = Vec::with_capacity(tags.len());
            for tag in tags {
                tag_values.push(evaluate(tag, env, ctx)?);
            }
            let frame = env.child();
            match eval_body(body, &frame, ctx) {
                Err(Unwind::Escape(signal)) if tag_values.contains(&signal.tag) => {
                    Ok(signal.value)
                }
                other => other,
            }
        }

        Expr::Bind { .. } => Err(ctx
            .report(
                ErrorKind::MalformedBind {
                    reason: "bind is only available inside a with-continuations region".into(),
                },
                to_source_span(span),
            )
            .into()),

        Expr::Region(_) => Err(ctx
            .invalid_operation(
                "with-continuations",
                "a nested expression (regions are top-level forms)",
                to_source_span(span),
            )
            .into()),

        Expr::Jump { target, args, cc } => {
            let target_value = evaluate(target, env, ctx)?;
            let arg_values = eval_args(args, env, ctx)?;
            let cc_value = cc.as_ref().map(|c| evaluate(c, env, ctx)).transpose()?;
            Ok(Value::Jump(Rc::new(TailCall {
                target: target_value,
                args: arg_values,
                cc: cc_value,
                span,
            })))
        }
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

/// Apply a callable from an ordinary (non-tail) position: one trampoline,
/// one unit of direct-call depth.
pub fn apply(
    ctx: &mut EvaluationContext,
    target: Value,
    args: Vec<Value>,
    cc: Option<Value>,
    span: Span,
) -> Result<Value, Unwind> {
    if ctx.depth >= ctx.max_depth {
        return Err(ctx.report(ErrorKind::RecursionLimit, to_source_span(span)).into());
    }
    ctx.depth += 1;
    let result = trampoline::run(ctx, target, args, cc, span);
    ctx.depth -= 1;
    result
}

fn eval_args(
    args: &[AstNode],
    env: &Env,
    ctx: &mut EvaluationContext,
) -> Result<Vec<Value>, Unwind> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if let Expr::Spread(inner) = &*arg.value {
            let spliced = evaluate(inner, env, ctx)?;
            let Value::List(items) = spliced else {
                return Err(ctx
                    .type_mismatch("list", spliced.type_name(), to_source_span(inner.span))
                    .into());
            };
            out.extend(items);
        } else {
            out.push(evaluate(arg, env, ctx)?);
        }
    }
    Ok(out)
}

fn resolve_symbol(
    name: &str,
    span: Span,
    env: &Env,
    ctx: &EvaluationContext,
) -> Result<Value, Unwind> {
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    if let Some(def) = ctx.natives.lookup(name) {
        return Ok(Value::Native(def));
    }
    Err(ctx.undefined_symbol(name, to_source_span(span)).into())
}

fn make_closure(lambda: &LambdaExpr, name: Option<String>, env: &Env, span: Span) -> Value {
    let cc = match lambda.cc {
        CcSlot::None => CcDefault::None,
        CcSlot::Identity => CcDefault::Identity,
        // The capturing function's continuation, or identity when the
        // continuation was synthesized at region top level.
        CcSlot::Inherit => {
            CcDefault::Inherited(env.get(CC_PARAM).unwrap_or_else(identity_continuation))
        }
    };
    Value::Closure(Rc::new(Closure {
        name,
        params: lambda.params.clone(),
        body: lambda.body.clone(),
        env: env.clone(),
        cc,
        span,
    }))
}

// ============================================================================
// DATUMS
// ============================================================================

fn datum_to_value(datum: &AstNode, ctx: &EvaluationContext) -> Result<Value, Unwind> {
    match &*datum.value {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Nil => Ok(Value::Nil),
        Expr::Symbol(s) => Ok(Value::Symbol(s.clone())),
        Expr::ListLit(items) => {
            let values: Result<Vec<_>, _> =
                items.iter().map(|i| datum_to_value(i, ctx)).collect();
            Ok(Value::List(values?))
        }
        Expr::Quote(inner) => Ok(Value::List(vec![
            Value::Symbol("quote".to_string()),
            datum_to_value(inner, ctx)?,
        ])),
        _ => Err(ctx
            .internal_error("non-datum under quote", to_source_span(datum.span))
            .into()),
    }
}

/// Helper used by the escape natives.
pub fn escape(tag: Value, value: Value, span: Span) -> Unwind {
    Unwind::Escape(EscapeSignal { tag, value, span })
}
