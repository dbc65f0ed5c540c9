//! Continuation-passing-style transformation.
//!
//! Rewrites every function and lambda lexically inside a
//! `(with-continuations ...)` region so that, instead of returning normally,
//! every tail position becomes a `jump` node that threads an explicit
//! continuation parameter. The evaluator turns a `jump` into a tail-call
//! descriptor, and the trampoline consumes those descriptors without growing
//! the host stack.
//!
//! Transformation rules, per function:
//!
//! - a reserved `cc` slot is injected: ordinary functions default it to the
//!   identity continuation, synthesized continuations inherit the capturing
//!   function's `cc`. Declaring a parameter literally named `cc` is an error.
//! - a tail call `(g a...)` becomes `(jump g a... :cc cc)`, forwarding the
//!   current continuation unless the source already supplies an explicit
//!   `:cc`. Arity is validated against the region's function registry when
//!   the target is a registered name.
//! - a tail call `(cc v...)` to the current continuation itself carries no
//!   override: the value is delivered and the target continues with its own
//!   default chain.
//! - a plain tail value `E` becomes `(jump cc E)`; tail `(values a...)`
//!   delivers all of its operands to `cc` at once.
//! - tail `and`/`or` chains are rewritten through a gensym temporary into
//!   `let`/`if` so the short-circuited result still flows through `cc` while
//!   only the lexically last operand is treated as a tail expression.
//! - `(bind (f a...) names body...)` in tail position synthesizes a
//!   continuation lambda from `names`/`body` and becomes
//!   `(jump f a... :cc <continuation>)`. At region top level it lowers to a
//!   normal call instead; anywhere else it is a structural error.
//!
//! After transformation no function in the region ever returns by falling
//! off the end without its value passing through `cc`, except where the
//! source supplied an alternate continuation explicitly. Transformed
//! functions remain callable from ordinary code: with no `cc` supplied they
//! fall back to the identity continuation and return plain values.

use crate::analysis::{self, RegionRegistry, TailPositions};
use crate::ast::{node, symbol, AstNode, Binding, CcSlot, Expr, LambdaExpr, Span};
use crate::diagnostics::{
    to_source_span, EngineError, ErrorKind, ErrorReporting, PhaseContext, SourceContext,
};

pub use crate::runtime::eval::CC_PARAM;

/// Transform the top-level forms of one continuations region.
pub fn transform_region(
    forms: &[AstNode],
    source: &SourceContext,
) -> Result<Vec<AstNode>, EngineError> {
    let mut transformer = CpsTransformer {
        ctx: PhaseContext::new(source.clone(), "transform"),
        registry: RegionRegistry::collect(forms),
        gensym: 0,
    };
    forms.iter().map(|f| transformer.transform_top(f)).collect()
}

struct CpsTransformer {
    ctx: PhaseContext,
    registry: RegionRegistry,
    gensym: u32,
}

impl CpsTransformer {
    // ------------------------------------------------------------------------
    // Region top level
    // ------------------------------------------------------------------------

    fn transform_top(&mut self, form: &AstNode) -> Result<AstNode, EngineError> {
        match &*form.value {
            Expr::Define { name, value } => {
                let value = match &*value.value {
                    Expr::Lambda(lambda) => {
                        let transformed =
                            self.transform_function(lambda, name, CcSlot::Identity)?;
                        node(Expr::Lambda(transformed), value.span)
                    }
                    _ => self.transform_expr(value, false)?,
                };
                Ok(node(
                    Expr::Define {
                        name: name.clone(),
                        value,
                    },
                    form.span,
                ))
            }
            // A top-level bind lowers to a normal call carrying the
            // synthesized continuation. The call's first-time return value
            // cannot be intercepted here: top level is not itself
            // continuation-enabled. This asymmetry is documented behavior.
            Expr::Bind { call, params, body } => {
                let (target, args) = self.split_bind_call(call, false)?;
                let cont = self.synthesize_continuation(params, body, "<toplevel>", form.span)?;
                Ok(node(
                    Expr::Call {
                        target,
                        args,
                        cc: Some(cont),
                    },
                    form.span,
                ))
            }
            _ => self.transform_expr(form, false),
        }
    }

    // ------------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------------

    /// Transform one function: inject the `cc` slot and rewrite the body so
    /// every tail position jumps through the continuation.
    fn transform_function(
        &mut self,
        lambda: &LambdaExpr,
        name: &str,
        slot: CcSlot,
    ) -> Result<LambdaExpr, EngineError> {
        let declares_cc = lambda.params.required.iter().any(|p| p == CC_PARAM)
            || lambda.params.rest.as_deref() == Some(CC_PARAM);
        if declares_cc {
            return Err(self.ctx.report(
                ErrorKind::ReservedParameter {
                    function: name.to_string(),
                },
                to_source_span(lambda.params.span),
            ));
        }

        let tails = analysis::analyze(name, &lambda.body, &self.ctx)?;
        let body = self.transform_body(&lambda.body, &tails, name)?;

        Ok(LambdaExpr {
            params: lambda.params.clone(),
            body,
            cc: slot,
        })
    }

    fn transform_body(
        &mut self,
        body: &[AstNode],
        tails: &TailPositions,
        fname: &str,
    ) -> Result<Vec<AstNode>, EngineError> {
        let (last, init) = body.split_last().expect("parser guarantees a body");
        let mut out = Vec::with_capacity(body.len());
        for stmt in init {
            out.push(self.transform_expr(stmt, true)?);
        }
        out.push(self.transform_tail(last, tails, fname)?);
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // Tail positions
    // ------------------------------------------------------------------------

    fn transform_tail(
        &mut self,
        expr: &AstNode,
        tails: &TailPositions,
        fname: &str,
    ) -> Result<AstNode, EngineError> {
        debug_assert!(
            tails.is_tail(expr.span),
            "transformer walked off the analyzed tail spine"
        );
        let span = expr.span;

        match &*expr.value {
            Expr::Call { target, args, cc } => {
                // (values a...) delivers its operands to cc all at once.
                if cc.is_none() && is_symbol(target, "values") {
                    let args = self.transform_args(args, true)?;
                    return Ok(node(
                        Expr::Jump {
                            target: symbol(CC_PARAM, span),
                            args,
                            cc: None,
                        },
                        span,
                    ));
                }

                // (cc v...) delivers to the current continuation, which then
                // continues with its own chain: no override is forwarded.
                if cc.is_none() && is_symbol(target, CC_PARAM) {
                    let args = self.transform_args(args, true)?;
                    return Ok(node(
                        Expr::Jump {
                            target: symbol(CC_PARAM, span),
                            args,
                            cc: None,
                        },
                        span,
                    ));
                }

                self.registry
                    .validate_tail_call(target, args, span, &self.ctx)?;
                let target = self.transform_expr(target, true)?;
                let args = self.transform_args(args, true)?;
                let cc = match cc {
                    Some(explicit) => self.transform_expr(explicit, true)?,
                    None => symbol(CC_PARAM, span),
                };
                Ok(node(
                    Expr::Jump {
                        target,
                        args,
                        cc: Some(cc),
                    },
                    span,
                ))
            }

            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => Ok(node(
                Expr::If {
                    condition: self.transform_expr(condition, true)?,
                    then_branch: self.transform_tail(then_branch, tails, fname)?,
                    else_branch: self.transform_tail(else_branch, tails, fname)?,
                },
                span,
            )),

            Expr::Seq(items) => match items.split_last() {
                None => Ok(self.jump_to_cc(node(Expr::Nil, span), span)),
                Some((last, init)) => {
                    let mut out = Vec::with_capacity(items.len());
                    for stmt in init {
                        out.push(self.transform_expr(stmt, true)?);
                    }
                    out.push(self.transform_tail(last, tails, fname)?);
                    Ok(node(Expr::Seq(out), span))
                }
            },

            Expr::And(items) => self.rewrite_chain(items, span, tails, fname, true),
            Expr::Or(items) => self.rewrite_chain(items, span, tails, fname, false),

            Expr::Let { bindings, body } => {
                let bindings = bindings
                    .iter()
                    .map(|b| {
                        Ok(Binding {
                            name: b.name.clone(),
                            value: self.transform_expr(&b.value, true)?,
                            span: b.span,
                        })
                    })
                    .collect::<Result<Vec<_>, EngineError>>()?;
                let (last, init) = body.split_last().expect("parser guarantees a let body");
                let mut out = Vec::with_capacity(body.len());
                for stmt in init {
                    out.push(self.transform_expr(stmt, true)?);
                }
                out.push(self.transform_tail(last, tails, fname)?);
                Ok(node(Expr::Let { bindings, body: out }, span))
            }

            // The capture primitive: the rest of the body becomes a fresh
            // continuation, installed as the callee's cc.
            Expr::Bind { call, params, body } => {
                let (target, args) = self.split_bind_call(call, true)?;
                self.registry
                    .validate_tail_call(&target, &args, span, &self.ctx)?;
                let cont = self.synthesize_continuation(params, body, fname, span)?;
                Ok(node(
                    Expr::Jump {
                        target,
                        args,
                        cc: Some(cont),
                    },
                    span,
                ))
            }

            // Catch bodies run in direct style inside the dynamic region;
            // the region's result is then delivered to the continuation.
            Expr::Catch { .. } => {
                let direct = self.transform_expr(expr, true)?;
                Ok(self.jump_to_cc(direct, span))
            }

            Expr::While { .. } | Expr::Region(_) | Expr::Jump { .. } => Err(self
                .ctx
                .internal_error("analyzer admitted an unsupported tail form", to_source_span(span))),

            // Plain values: literals, symbols, quotes, lambdas, defines.
            _ => {
                let value = self.transform_expr(expr, true)?;
                Ok(self.jump_to_cc(value, span))
            }
        }
    }

    /// Rewrite a tail `and`/`or` chain. Short-circuit exits deliver the
    /// deciding value through `cc`; only the last operand stays a tail
    /// expression. `(and a b)` becomes
    /// `(let ((%t0 a)) (if %t0 <tail b> (jump cc %t0)))`, `or` the mirror.
    fn rewrite_chain(
        &mut self,
        operands: &[AstNode],
        span: Span,
        tails: &TailPositions,
        fname: &str,
        is_and: bool,
    ) -> Result<AstNode, EngineError> {
        match operands {
            [] => {
                let neutral = node(Expr::Bool(is_and), span);
                Ok(self.jump_to_cc(neutral, span))
            }
            [last] => self.transform_tail(last, tails, fname),
            [first, rest @ ..] => {
                let tmp = self.fresh_temp();
                let condition = symbol(&tmp, first.span);
                let deliver = self.jump_to_cc(symbol(&tmp, first.span), first.span);
                let value = self.transform_expr(first, true)?;
                let continue_chain = self.rewrite_chain(rest, span, tails, fname, is_and)?;
                let (then_branch, else_branch) = if is_and {
                    (continue_chain, deliver)
                } else {
                    (deliver, continue_chain)
                };
                Ok(node(
                    Expr::Let {
                        bindings: vec![Binding {
                            name: tmp,
                            value,
                            span: first.span,
                        }],
                        body: vec![node(
                            Expr::If {
                                condition,
                                then_branch,
                                else_branch,
                            },
                            span,
                        )],
                    },
                    span,
                ))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Non-tail positions
    // ------------------------------------------------------------------------

    /// Structural recursion over non-tail positions. Nested lambdas become
    /// full continuation-enabled functions; `bind` is only legal in tail
    /// position (or at region top level), and `while` cannot occur inside a
    /// function here because the analyzer already rejected it.
    fn transform_expr(&mut self, expr: &AstNode, in_function: bool) -> Result<AstNode, EngineError> {
        let span = expr.span;
        match &*expr.value {
            Expr::Lambda(lambda) => {
                let transformed = self.transform_function(lambda, "lambda", CcSlot::Identity)?;
                Ok(node(Expr::Lambda(transformed), span))
            }

            Expr::Bind { .. } => Err(self.ctx.report(
                ErrorKind::MalformedBind {
                    reason: if in_function {
                        "bind must be the final expression of a function body".into()
                    } else {
                        "bind must be a top-level form or a function tail expression".into()
                    },
                },
                to_source_span(span),
            )),

            Expr::Region(_) => Err(self.ctx.report(
                ErrorKind::UnsupportedConstruct {
                    construct: "with-continuations".into(),
                    function: "<nested region>".into(),
                },
                to_source_span(span),
            )),

            Expr::Jump { .. } => Err(self
                .ctx
                .internal_error("jump node present before CPS transformation", to_source_span(span))),

            Expr::Call { target, args, cc } => Ok(node(
                Expr::Call {
                    target: self.transform_expr(target, in_function)?,
                    args: self.transform_args(args, in_function)?,
                    cc: cc
                        .as_ref()
                        .map(|c| self.transform_expr(c, in_function))
                        .transpose()?,
                },
                span,
            )),

            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => Ok(node(
                Expr::If {
                    condition: self.transform_expr(condition, in_function)?,
                    then_branch: self.transform_expr(then_branch, in_function)?,
                    else_branch: self.transform_expr(else_branch, in_function)?,
                },
                span,
            )),

            Expr::Seq(items) => Ok(node(Expr::Seq(self.transform_args(items, in_function)?), span)),
            Expr::And(items) => Ok(node(Expr::And(self.transform_args(items, in_function)?), span)),
            Expr::Or(items) => Ok(node(Expr::Or(self.transform_args(items, in_function)?), span)),

            Expr::Let { bindings, body } => Ok(node(
                Expr::Let {
                    bindings: bindings
                        .iter()
                        .map(|b| {
                            Ok(Binding {
                                name: b.name.clone(),
                                value: self.transform_expr(&b.value, in_function)?,
                                span: b.span,
                            })
                        })
                        .collect::<Result<Vec<_>, EngineError>>()?,
                    body: self.transform_args(body, in_function)?,
                },
                span,
            )),

            Expr::Define { name, value } => {
                let value = match &*value.value {
                    Expr::Lambda(lambda) => {
                        let transformed = self.transform_function(lambda, name, CcSlot::Identity)?;
                        node(Expr::Lambda(transformed), value.span)
                    }
                    _ => self.transform_expr(value, in_function)?,
                };
                Ok(node(
                    Expr::Define {
                        name: name.clone(),
                        value,
                    },
                    span,
                ))
            }

            Expr::Set { name, value } => Ok(node(
                Expr::Set {
                    name: name.clone(),
                    value: self.transform_expr(value, in_function)?,
                },
                span,
            )),

            Expr::Catch { tags, body } => Ok(node(
                Expr::Catch {
                    tags: self.transform_args(tags, in_function)?,
                    body: self.transform_args(body, in_function)?,
                },
                span,
            )),

            Expr::While { condition, body } => {
                if in_function {
                    return Err(self.ctx.internal_error(
                        "analyzer admitted a while loop inside a transformed function",
                        to_source_span(span),
                    ));
                }
                Ok(node(
                    Expr::While {
                        condition: self.transform_expr(condition, false)?,
                        body: self.transform_args(body, false)?,
                    },
                    span,
                ))
            }

            Expr::Spread(inner) => Ok(node(
                Expr::Spread(self.transform_expr(inner, in_function)?),
                span,
            )),

            Expr::Number(_)
            | Expr::Bool(_)
            | Expr::Str(_)
            | Expr::Symbol(_)
            | Expr::Nil
            | Expr::Quote(_)
            | Expr::ListLit(_) => Ok(expr.clone()),
        }
    }

    fn transform_args(
        &mut self,
        args: &[AstNode],
        in_function: bool,
    ) -> Result<Vec<AstNode>, EngineError> {
        args.iter()
            .map(|a| self.transform_expr(a, in_function))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Capture support
    // ------------------------------------------------------------------------

    /// Build the continuation lambda for a `bind`: parameters are the bound
    /// names, the body is CPS-transformed like any function, and the `cc`
    /// slot inherits the capturing function's continuation so running off
    /// the end of the body continues the surrounding tail-call chain.
    fn synthesize_continuation(
        &mut self,
        params: &crate::ast::ParamList,
        body: &[AstNode],
        fname: &str,
        span: Span,
    ) -> Result<AstNode, EngineError> {
        let cont_name = format!("{}#continuation", fname);
        let lambda = LambdaExpr {
            params: params.clone(),
            body: body.to_vec(),
            cc: CcSlot::None,
        };
        let transformed = self.transform_function(&lambda, &cont_name, CcSlot::Inherit)?;
        Ok(node(Expr::Lambda(transformed), span))
    }

    /// Pull the target/args out of a bind's call, rejecting an explicit
    /// `:cc`: the whole point of bind is to install the synthesized
    /// continuation in that slot.
    fn split_bind_call(
        &mut self,
        call: &AstNode,
        in_function: bool,
    ) -> Result<(AstNode, Vec<AstNode>), EngineError> {
        let Expr::Call { target, args, cc } = &*call.value else {
            return Err(self.ctx.report(
                ErrorKind::MalformedBind {
                    reason: "first argument must be a call".into(),
                },
                to_source_span(call.span),
            ));
        };
        if cc.is_some() {
            return Err(self.ctx.report(
                ErrorKind::MalformedBind {
                    reason: "the bound call already supplies :cc".into(),
                },
                to_source_span(call.span),
            ));
        }
        let target = self.transform_expr(target, in_function)?;
        let args = self.transform_args(args, in_function)?;
        Ok((target, args))
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn jump_to_cc(&self, value: AstNode, span: Span) -> AstNode {
        node(
            Expr::Jump {
                target: symbol(CC_PARAM, span),
                args: vec![value],
                cc: None,
            },
            span,
        )
    }

    /// Gensym for chain temporaries. `%` is not a legal symbol character in
    /// the surface grammar, so these cannot collide with user bindings.
    fn fresh_temp(&mut self) -> String {
        let n = self.gensym;
        self.gensym += 1;
        format!("%t{}", n)
    }
}

fn is_symbol(node: &AstNode, name: &str) -> bool {
    matches!(&*node.value, Expr::Symbol(s) if s == name)
}
