//! Samsara parser - datum stage.
//!
//! Converts source text into generic datum trees (atoms, lists, quotes) with
//! source location tracking. This stage is purely syntactic; special-form
//! recognition happens in `syntax/forms.rs`.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{node, AstNode, Expr, Span};
use crate::diagnostics::{
    to_source_span, EngineError, ErrorKind, ErrorReporting, PhaseContext, SourceContext,
};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SamsaraParser;

/// Parse source text into datum trees. The result is a flat sequence of
/// top-level forms; lists are generic `ListLit` nodes at this stage.
pub fn parse_datums(source_text: &str, source: &SourceContext) -> Result<Vec<AstNode>, EngineError> {
    if source_text.trim().is_empty() {
        return Ok(vec![]);
    }

    let ctx = PhaseContext::new(source.clone(), "parse");

    let pairs = SamsaraParser::parse(Rule::program, source_text)
        .map_err(|e| convert_parse_error(e, &ctx))?;

    let program = pairs.peek().expect("pest guarantees the program rule");

    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| build_datum(p, &ctx))
        .collect()
}

// ============================================================================
// DATUM BUILDERS
// ============================================================================

fn build_datum(pair: Pair<Rule>, ctx: &PhaseContext) -> Result<AstNode, EngineError> {
    let span = get_span(&pair);

    match pair.as_rule() {
        Rule::expr | Rule::atom => {
            let inner = pair.into_inner().next().expect("grammar guarantees inner");
            build_datum(inner, ctx)
        }

        Rule::quoted => {
            let inner = pair.into_inner().next().expect("grammar guarantees inner");
            let quoted = build_datum(inner, ctx)?;
            Ok(node(Expr::Quote(quoted), span))
        }

        Rule::list => {
            let children: Result<Vec<_>, _> =
                pair.into_inner().map(|p| build_datum(p, ctx)).collect();
            Ok(node(Expr::ListLit(children?), span))
        }

        Rule::number => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|_| {
                ctx.report(
                    ErrorKind::InvalidLiteral {
                        literal_type: "number".into(),
                        value: text.into(),
                    },
                    to_source_span(span),
                )
            })?;
            Ok(node(Expr::Number(value), span))
        }

        Rule::boolean => Ok(node(Expr::Bool(pair.as_str() == "true"), span)),

        Rule::nil => Ok(node(Expr::Nil, span)),

        Rule::string => {
            let content = unescape_string(pair.as_str(), span, ctx)?;
            Ok(node(Expr::Str(content), span))
        }

        // Represented as a symbol in the datum tree; `:` is not a legal
        // symbol character, so this cannot collide with user code.
        Rule::cc_key => Ok(node(Expr::Symbol(":cc".into()), span)),

        Rule::spread => {
            let inner = pair.into_inner().next().expect("grammar guarantees symbol");
            let sym_span = get_span(&inner);
            let sym = node(Expr::Symbol(inner.as_str().to_string()), sym_span);
            Ok(node(Expr::Spread(sym), span))
        }

        Rule::symbol => Ok(node(Expr::Symbol(pair.as_str().to_string()), span)),

        rule => Err(ctx.report(
            ErrorKind::Internal {
                message: format!("unexpected grammar rule {:?}", rule),
            },
            to_source_span(span),
        )),
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    let s = pair.as_span();
    Span {
        start: s.start(),
        end: s.end(),
    }
}

fn unescape_string(raw: &str, span: Span, ctx: &PhaseContext) -> Result<String, EngineError> {
    // The grammar guarantees surrounding double quotes.
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            other => {
                return Err(ctx.report(
                    ErrorKind::InvalidLiteral {
                        literal_type: "string escape".into(),
                        value: format!("\\{}", other.map(String::from).unwrap_or_default()),
                    },
                    to_source_span(span),
                ))
            }
        }
    }
    Ok(out)
}

fn convert_parse_error(error: pest::error::Error<Rule>, ctx: &PhaseContext) -> EngineError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(p) => (p, p + 1),
        pest::error::InputLocation::Span((s, e)) => (s, e),
    };
    let message = match &error.variant {
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected token".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    };
    ctx.report(
        ErrorKind::Syntax { message },
        to_source_span(Span { start, end }),
    )
}
