//! Function registry for one continuations region.
//!
//! Records, per region-top-level function, its declared arity and the fact
//! that it will expect a `cc` parameter after transformation. Built in a
//! first pass over the region, immutable afterwards; the CPS transformer
//! consults it to validate tail-call wiring before any code runs.

use std::collections::HashMap;

use crate::ast::{AstNode, Expr, ParamList, Span};
use crate::diagnostics::{to_source_span, EngineError, ErrorKind, ErrorReporting, PhaseContext};

/// One registered function.
#[derive(Debug, Clone)]
pub struct FnEntry {
    pub name: String,
    pub params: ParamList,
    pub takes_cc: bool,
    pub span: Span,
}

/// All functions defined at the top level of a region.
#[derive(Debug, Default)]
pub struct RegionRegistry {
    entries: HashMap<String, FnEntry>,
}

impl RegionRegistry {
    /// Collect entries from the region's top-level forms. Nested lambdas are
    /// not registered: they are transformed but have no stable name to
    /// validate calls against.
    pub fn collect(forms: &[AstNode]) -> Self {
        let mut entries = HashMap::new();
        for form in forms {
            if let Expr::Define { name, value } = &*form.value {
                if let Expr::Lambda(lambda) = &*value.value {
                    entries.insert(
                        name.clone(),
                        FnEntry {
                            name: name.clone(),
                            params: lambda.params.clone(),
                            takes_cc: true,
                            span: form.span,
                        },
                    );
                }
            }
        }
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&FnEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the wiring of a tail call against a registered entry. Calls
    /// to unknown targets pass (they may be natives, locals, or continuation
    /// values); calls with spread arguments pass (argument count is dynamic).
    pub fn validate_tail_call(
        &self,
        target: &AstNode,
        args: &[AstNode],
        span: Span,
        ctx: &PhaseContext,
    ) -> Result<(), EngineError> {
        let Expr::Symbol(name) = &*target.value else {
            return Ok(());
        };
        let Some(entry) = self.lookup(name) else {
            return Ok(());
        };
        if args.iter().any(|a| matches!(&*a.value, Expr::Spread(_))) {
            return Ok(());
        }
        if !entry.params.accepts(args.len()) {
            return Err(ctx.report(
                ErrorKind::TailCallArity {
                    function: name.clone(),
                    expected: entry.params.describe_arity(),
                    actual: args.len(),
                },
                to_source_span(span),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SourceContext;
    use crate::syntax;

    #[test]
    fn collects_region_functions_and_checks_arity() {
        let src = "(define (f a b) a) (define x 1) (define (g ...rest) rest)";
        let source = SourceContext::from_source("test.sam", src);
        let forms = syntax::parse(src, &source).expect("parse failed");
        let registry = RegionRegistry::collect(&forms);

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("f").is_some());
        assert!(registry.lookup("x").is_none());
        assert!(registry.lookup("g").unwrap().takes_cc);

        let ctx = PhaseContext::new(SourceContext::from_source("call.sam", "(f 1)"), "transform");
        let call = syntax::parse("(f 1)", &ctx.source).expect("parse failed");
        let Expr::Call { target, args, .. } = &*call[0].value else {
            panic!("expected call");
        };
        let err = registry
            .validate_tail_call(target, args, call[0].span, &ctx)
            .unwrap_err();
        assert!(err.to_string().contains("'f'"));
        assert!(err.to_string().contains("expects 2"));
    }
}
