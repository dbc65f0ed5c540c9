//! The trampoline.
//!
//! Drives a pending call description to completion: invoke the target; if
//! the result is a tail-call descriptor, replace the pending call and loop;
//! any other value is the final result. What would be unbounded call-stack
//! growth becomes unbounded loop iteration at O(1) stack depth.
//!
//! The loop deliberately has no iteration bound. Infinite tail recursion is
//! a supported feature, exactly as proper tail calls are in Scheme; only the
//! caller's own logic (or killing the process) ends such a chain.
//!
//! Dispatch is a tagged-variant match on the callee's *result*, never an
//! inspection of the callee: a callable is polymorphic over "returns a plain
//! value" and "returns a tail-call descriptor". Applying a target that is
//! not continuation-aware (a native, an untransformed closure) terminates
//! the chain with that target's raw return value. That ends the chain by
//! design: any pending continuation is discarded, which is also what makes
//! transformed functions transparently callable from ordinary code.
//!
//! Errors and escape signals propagate unmodified; the only decoration is
//! that errors pick up the recent logical call chain as help text, so a
//! failure deep in a bounced chain names the responsible functions instead
//! of an opaque loop frame.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::diagnostics::{to_source_span, ErrorReporting};
use crate::runtime::control::Unwind;
use crate::runtime::env::Env;
use crate::runtime::eval::{self, EvaluationContext, CC_PARAM};
use crate::runtime::value::{CcDefault, Closure, NativeDef, TailCall, Value};

// ============================================================================
// IDENTITY CONTINUATION
// ============================================================================

/// The chain terminator: returns its argument unchanged, or bundles several
/// arguments into a tagged multiple-value record.
pub static IDENTITY: NativeDef = NativeDef {
    name: "identity-continuation",
    func: identity,
};

fn identity(
    args: &[Value],
    _ctx: &mut EvaluationContext,
    _span: crate::ast::Span,
) -> Result<Value, Unwind> {
    Ok(match args.len() {
        0 => Value::Nil,
        1 => args[0].clone(),
        _ => Value::Values(args.to_vec()),
    })
}

pub fn identity_continuation() -> Value {
    Value::Native(&IDENTITY)
}

// ============================================================================
// THE LOOP
// ============================================================================

enum Step {
    Done(Value),
    Bounce(TailCall),
}

/// Drive one call to a final value.
pub fn run(
    ctx: &mut EvaluationContext,
    target: Value,
    args: Vec<Value>,
    cc: Option<Value>,
    span: crate::ast::Span,
) -> Result<Value, Unwind> {
    let mut chain = CallChain::default();
    let mut call = TailCall {
        target,
        args,
        cc,
        span,
    };
    loop {
        chain.note(&call.target);
        match step(ctx, call) {
            Ok(Step::Done(value)) => return Ok(value),
            Ok(Step::Bounce(next)) => call = next,
            Err(Unwind::Error(error)) => return Err(Unwind::Error(chain.decorate(error))),
            Err(escape) => return Err(escape),
        }
    }
}

fn step(ctx: &mut EvaluationContext, call: TailCall) -> Result<Step, Unwind> {
    let TailCall {
        target,
        mut args,
        cc,
        span,
    } = call;

    match target {
        Value::Closure(closure) => {
            if closure.is_cc_aware() {
                // A single tagged bundle delivers as several values.
                if args.len() == 1 {
                    if let Value::Values(items) = &args[0] {
                        args = items.clone();
                    }
                }
            }

            let frame = bind_frame(ctx, &closure, args, span)?;

            if closure.is_cc_aware() {
                let cont = match cc {
                    Some(explicit) => explicit,
                    None => match &closure.cc {
                        CcDefault::Identity => identity_continuation(),
                        CcDefault::Inherited(captured) => captured.clone(),
                        // is_cc_aware excludes None
                        CcDefault::None => identity_continuation(),
                    },
                };
                frame.define(CC_PARAM, cont);
            }

            let result = eval::eval_body(&closure.body, &frame, ctx)?;
            match result {
                Value::Jump(descriptor) => Ok(Step::Bounce(
                    Rc::try_unwrap(descriptor).unwrap_or_else(|rc| (*rc).clone()),
                )),
                value => Ok(Step::Done(value)),
            }
        }

        Value::Native(def) => Ok(Step::Done((def.func)(&args, ctx, span)?)),

        other => Err(ctx
            .type_mismatch("a callable value", other.type_name(), to_source_span(span))
            .into()),
    }
}

/// Fresh frame for one closure application: arity check, positional binding,
/// rest collection.
fn bind_frame(
    ctx: &EvaluationContext,
    closure: &Closure,
    args: Vec<Value>,
    span: crate::ast::Span,
) -> Result<Env, Unwind> {
    let params = &closure.params;
    if !params.accepts(args.len()) {
        return Err(ctx
            .arity_mismatch(
                closure.describe(),
                &params.describe_arity(),
                args.len(),
                to_source_span(span),
            )
            .into());
    }

    let frame = closure.env.child();
    let mut args = args.into_iter();
    for name in &params.required {
        frame.define(name, args.next().expect("arity checked above"));
    }
    if let Some(rest) = &params.rest {
        frame.define(rest, Value::List(args.collect()));
    }
    Ok(frame)
}

// ============================================================================
// CALL-CHAIN DIAGNOSTICS
// ============================================================================

const CHAIN_WINDOW: usize = 8;

/// Ring of recently bounced-through callee names, attached to errors so the
/// failure names the logical frames.
#[derive(Default)]
struct CallChain {
    names: VecDeque<String>,
    truncated: bool,
}

impl CallChain {
    fn note(&mut self, target: &Value) {
        let name = match target {
            Value::Closure(c) if c.is_continuation() => "<continuation>".to_string(),
            Value::Closure(c) => c.describe().to_string(),
            Value::Native(def) => def.name.to_string(),
            other => other.type_name().to_string(),
        };
        if self.names.len() == CHAIN_WINDOW {
            self.names.pop_front();
            self.truncated = true;
        }
        self.names.push_back(name);
    }

    fn decorate(&self, error: crate::diagnostics::EngineError) -> crate::diagnostics::EngineError {
        if self.names.len() <= 1 {
            return error;
        }
        let mut chain = self
            .names
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" -> ");
        if self.truncated {
            chain = format!("... -> {}", chain);
        }
        error.with_help_if_absent(format!("in tail-call chain: {}", chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::diagnostics::SourceContext;

    #[test]
    fn identity_bundles_multiple_arguments() {
        let mut ctx = EvaluationContext::for_tests(SourceContext::fallback("trampoline test"));
        let span = Span::default();
        let one = identity(&[Value::Number(7.0)], &mut ctx, span).unwrap();
        assert_eq!(one, Value::Number(7.0));
        let many = identity(&[Value::Number(1.0), Value::Number(2.0)], &mut ctx, span).unwrap();
        assert_eq!(many, Value::Values(vec![Value::Number(1.0), Value::Number(2.0)]));
        let none = identity(&[], &mut ctx, span).unwrap();
        assert_eq!(none, Value::Nil);
    }

    #[test]
    fn applying_a_non_callable_is_a_type_error() {
        let mut ctx = EvaluationContext::for_tests(SourceContext::fallback("trampoline test"));
        let err = run(&mut ctx, Value::Number(3.0), vec![], None, Span::default());
        match err {
            Err(Unwind::Error(e)) => assert!(e.to_string().contains("callable")),
            _ => panic!("expected a type error"),
        }
    }
}
