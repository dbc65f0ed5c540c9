//! Samsara lowering - special-form recognition.
//!
//! Takes the generic datum trees produced by `syntax/parser.rs` and produces
//! the structured AST the rest of the pipeline works on: `if`, `do`, `let`,
//! `lambda`, `bind`, `catch` and friends become dedicated node shapes, and
//! everything else becomes a `Call` (with an optional trailing `:cc`
//! keyword argument split out).

use crate::ast::{node, AstNode, Binding, CcSlot, Expr, LambdaExpr, ParamList, Span};
use crate::diagnostics::{
    to_source_span, EngineError, ErrorKind, ErrorReporting, PhaseContext, SourceContext,
};

/// Lower a parsed program. Every datum becomes a structured expression.
pub fn lower_program(
    datums: &[AstNode],
    source: &SourceContext,
) -> Result<Vec<AstNode>, EngineError> {
    let ctx = PhaseContext::new(source.clone(), "parse");
    datums.iter().map(|d| lower(d, &ctx)).collect()
}

fn lower(datum: &AstNode, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    let span = datum.span;
    match &*datum.value {
        Expr::ListLit(items) => lower_list(items, span, ctx),
        // Quoted data stays a raw datum; validate it holds only data shapes.
        Expr::Quote(inner) => {
            validate_datum(inner, ctx)?;
            Ok(node(Expr::Quote(inner.clone()), span))
        }
        Expr::Spread(inner) => {
            let lowered = lower(inner, ctx)?;
            Ok(node(Expr::Spread(lowered), span))
        }
        Expr::Symbol(s) if s == ":cc" => Err(malformed(ctx, "call", ":cc outside a call", span)),
        // Atoms pass through unchanged.
        _ => Ok(datum.clone()),
    }
}

fn lower_list(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    let Some(head) = items.first() else {
        return Err(malformed(ctx, "call", "empty application", span));
    };

    if let Expr::Symbol(name) = &*head.value {
        match name.as_str() {
            "quote" => return lower_quote(items, span, ctx),
            "if" => return lower_if(items, span, ctx),
            "do" => {
                let body = lower_all(&items[1..], ctx)?;
                return Ok(node(Expr::Seq(body), span));
            }
            "and" => {
                let operands = lower_all(&items[1..], ctx)?;
                return Ok(node(Expr::And(operands), span));
            }
            "or" => {
                let operands = lower_all(&items[1..], ctx)?;
                return Ok(node(Expr::Or(operands), span));
            }
            "let" => return lower_let(items, span, ctx),
            "lambda" => return lower_lambda(items, span, ctx),
            "define" => return lower_define(items, span, ctx),
            "set!" => return lower_set(items, span, ctx),
            "while" => return lower_while(items, span, ctx),
            "bind" => return lower_bind(items, span, ctx),
            "catch" => return lower_catch(items, span, ctx),
            "with-continuations" => {
                let forms = lower_all(&items[1..], ctx)?;
                return Ok(node(Expr::Region(forms), span));
            }
            ":cc" => return Err(malformed(ctx, "call", ":cc cannot be a call target", span)),
            _ => {}
        }
    }

    lower_call(items, span, ctx)
}

fn lower_all(items: &[AstNode], ctx: &PhaseContext) -> Result<Vec<AstNode>, EngineError> {
    items.iter().map(|i| lower(i, ctx)).collect()
}

// ============================================================================
// SPECIAL FORMS
// ============================================================================

fn lower_quote(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() != 2 {
        return Err(malformed(ctx, "quote", "expected exactly one datum", span));
    }
    validate_datum(&items[1], ctx)?;
    Ok(node(Expr::Quote(items[1].clone()), span))
}

fn lower_if(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 || items.len() > 4 {
        return Err(malformed(
            ctx,
            "if",
            "expected a condition, a then-branch, and an optional else-branch",
            span,
        ));
    }
    let condition = lower(&items[1], ctx)?;
    let then_branch = lower(&items[2], ctx)?;
    let else_branch = match items.get(3) {
        Some(e) => lower(e, ctx)?,
        None => node(Expr::Nil, span),
    };
    Ok(node(
        Expr::If {
            condition,
            then_branch,
            else_branch,
        },
        span,
    ))
}

fn lower_let(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 {
        return Err(malformed(ctx, "let", "expected a binding list and a body", span));
    }
    let Expr::ListLit(pairs) = &*items[1].value else {
        return Err(malformed(ctx, "let", "first argument must be a binding list", span));
    };

    let mut bindings = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Expr::ListLit(entry) = &*pair.value else {
            return Err(malformed(ctx, "let", "bindings must be (name value) pairs", pair.span));
        };
        let [name_node, value_node] = entry.as_slice() else {
            return Err(malformed(ctx, "let", "bindings must be (name value) pairs", pair.span));
        };
        let Expr::Symbol(name) = &*name_node.value else {
            return Err(malformed(ctx, "let", "binding names must be symbols", name_node.span));
        };
        bindings.push(Binding {
            name: name.clone(),
            value: lower(value_node, ctx)?,
            span: pair.span,
        });
    }

    let body = lower_all(&items[2..], ctx)?;
    Ok(node(Expr::Let { bindings, body }, span))
}

fn lower_lambda(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 {
        return Err(malformed(ctx, "lambda", "expected a parameter list and a body", span));
    }
    let params = lower_params(&items[1], ctx)?;
    let body = lower_all(&items[2..], ctx)?;
    Ok(node(
        Expr::Lambda(LambdaExpr {
            params,
            body,
            cc: CcSlot::None,
        }),
        span,
    ))
}

fn lower_define(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 {
        return Err(malformed(ctx, "define", "expected a name and a value", span));
    }

    match &*items[1].value {
        // (define name value)
        Expr::Symbol(name) => {
            if items.len() != 3 {
                return Err(malformed(ctx, "define", "expected exactly one value", span));
            }
            let value = lower(&items[2], ctx)?;
            Ok(node(
                Expr::Define {
                    name: name.clone(),
                    value,
                },
                span,
            ))
        }
        // (define (name params...) body...) - function sugar
        Expr::ListLit(sig) => {
            let Some(name_node) = sig.first() else {
                return Err(malformed(ctx, "define", "function signature needs a name", items[1].span));
            };
            let Expr::Symbol(name) = &*name_node.value else {
                return Err(malformed(ctx, "define", "function name must be a symbol", name_node.span));
            };
            let params = params_from_items(&sig[1..], items[1].span, ctx)?;
            let body = lower_all(&items[2..], ctx)?;
            let lambda = node(
                Expr::Lambda(LambdaExpr {
                    params,
                    body,
                    cc: CcSlot::None,
                }),
                span,
            );
            Ok(node(
                Expr::Define {
                    name: name.clone(),
                    value: lambda,
                },
                span,
            ))
        }
        _ => Err(malformed(ctx, "define", "first argument must be a symbol or signature", items[1].span)),
    }
}

fn lower_set(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() != 3 {
        return Err(malformed(ctx, "set!", "expected a name and a value", span));
    }
    let Expr::Symbol(name) = &*items[1].value else {
        return Err(malformed(ctx, "set!", "first argument must be a symbol", items[1].span));
    };
    let value = lower(&items[2], ctx)?;
    Ok(node(
        Expr::Set {
            name: name.clone(),
            value,
        },
        span,
    ))
}

fn lower_while(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 {
        return Err(malformed(ctx, "while", "expected a condition and a body", span));
    }
    let condition = lower(&items[1], ctx)?;
    let body = lower_all(&items[2..], ctx)?;
    Ok(node(Expr::While { condition, body }, span))
}

/// `(bind (f args...) names body...)` - the continuation capture primitive.
/// `names` is either a single symbol or a parameter list.
fn lower_bind(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 4 {
        return Err(malformed(
            ctx,
            "bind",
            "expected a call, bound name(s), and a body",
            span,
        ));
    }

    let call = lower(&items[1], ctx)?;
    if !matches!(&*call.value, Expr::Call { .. }) {
        return Err(malformed(ctx, "bind", "first argument must be a call", items[1].span));
    }

    let params = match &*items[2].value {
        Expr::Symbol(name) => ParamList {
            required: vec![name.clone()],
            rest: None,
            span: items[2].span,
        },
        Expr::ListLit(_) => lower_params(&items[2], ctx)?,
        _ => {
            return Err(malformed(
                ctx,
                "bind",
                "bound names must be a symbol or a parameter list",
                items[2].span,
            ))
        }
    };

    let body = lower_all(&items[3..], ctx)?;
    Ok(node(Expr::Bind { call, params, body }, span))
}

/// `(catch (tag...) body...)` - the first argument is always a tag group;
/// each element is an ordinary expression evaluated to a tag value.
fn lower_catch(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    if items.len() < 3 {
        return Err(malformed(ctx, "catch", "expected a tag group and a body", span));
    }
    let Expr::ListLit(tag_items) = &*items[1].value else {
        return Err(malformed(
            ctx,
            "catch",
            "first argument must be a parenthesized tag group",
            items[1].span,
        ));
    };
    if tag_items.is_empty() {
        return Err(malformed(ctx, "catch", "tag group cannot be empty", items[1].span));
    }
    let tags = lower_all(tag_items, ctx)?;
    let body = lower_all(&items[2..], ctx)?;
    Ok(node(Expr::Catch { tags, body }, span))
}

// ============================================================================
// CALLS
// ============================================================================

fn lower_call(items: &[AstNode], span: Span, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    let target = lower(&items[0], ctx)?;
    let mut raw_args = &items[1..];
    let mut cc = None;

    // A trailing `:cc expr` pair overrides the threaded continuation.
    if let Some(pos) = raw_args
        .iter()
        .position(|a| matches!(&*a.value, Expr::Symbol(s) if s == ":cc"))
    {
        if raw_args.len() < 2 || pos != raw_args.len() - 2 {
            return Err(malformed(
                ctx,
                "call",
                ":cc must be the second-to-last argument, followed by one expression",
                raw_args[pos].span,
            ));
        }
        cc = Some(lower(&raw_args[pos + 1], ctx)?);
        raw_args = &raw_args[..pos];
    }

    let args = lower_all(raw_args, ctx)?;
    Ok(node(Expr::Call { target, args, cc }, span))
}

// ============================================================================
// PARAMETERS & DATUMS
// ============================================================================

fn lower_params(list: &AstNode, ctx: &PhaseContext) -> Result<ParamList, EngineError> {
    let Expr::ListLit(items) = &*list.value else {
        return Err(malformed(ctx, "parameter list", "expected a parenthesized list", list.span));
    };
    params_from_items(items, list.span, ctx)
}

fn params_from_items(
    items: &[AstNode],
    span: Span,
    ctx: &PhaseContext,
) -> Result<ParamList, EngineError> {
    let mut required = Vec::new();
    let mut rest = None;

    for (i, item) in items.iter().enumerate() {
        match &*item.value {
            Expr::Symbol(name) => required.push(name.clone()),
            Expr::Spread(inner) => {
                let Expr::Symbol(name) = &*inner.value else {
                    return Err(malformed(ctx, "parameter list", "rest parameter must be a symbol", item.span));
                };
                if i != items.len() - 1 {
                    return Err(malformed(
                        ctx,
                        "parameter list",
                        "rest parameter must come last",
                        item.span,
                    ));
                }
                rest = Some(name.clone());
            }
            _ => {
                return Err(malformed(ctx, "parameter list", "parameters must be symbols", item.span))
            }
        }
    }

    Ok(ParamList {
        required,
        rest,
        span,
    })
}

/// Quoted data may contain only atoms, lists, and nested quotes.
fn validate_datum(datum: &AstNode, ctx: &PhaseContext) -> Result<(), EngineError> {
    match &*datum.value {
        Expr::ListLit(items) => {
            for item in items {
                validate_datum(item, ctx)?;
            }
            Ok(())
        }
        Expr::Quote(inner) => validate_datum(inner, ctx),
        Expr::Spread(_) => Err(malformed(ctx, "quote", "spread is not a datum", datum.span)),
        Expr::Number(_) | Expr::Bool(_) | Expr::Str(_) | Expr::Symbol(_) | Expr::Nil => Ok(()),
        _ => Err(malformed(ctx, "quote", "not a datum", datum.span)),
    }
}

fn malformed(ctx: &PhaseContext, construct: &str, reason: &str, span: Span) -> EngineError {
    ctx.report(
        ErrorKind::MalformedConstruct {
            construct: construct.into(),
            reason: reason.into(),
        },
        to_source_span(span),
    )
}
