//! Syntax module for the Samsara language.
//!
//! Two stages: `parser` turns source text into generic datum trees (pest
//! grammar in `grammar.pest`), and `forms` lowers those into the structured
//! AST. `parse` runs both.

pub mod forms;
pub mod parser;

use crate::ast::AstNode;
use crate::diagnostics::{EngineError, SourceContext};

/// Parse source text into structured top-level forms.
pub fn parse(source_text: &str, source: &SourceContext) -> Result<Vec<AstNode>, EngineError> {
    let datums = parser::parse_datums(source_text, source)?;
    forms::lower_program(&datums, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn parse_one(src: &str) -> AstNode {
        let source = SourceContext::from_source("test.sam", src);
        let mut forms = parse(src, &source).expect("parse failed");
        assert_eq!(forms.len(), 1);
        forms.remove(0)
    }

    #[test]
    fn lowers_if_with_default_else() {
        let form = parse_one("(if (eq? x 1) 2)");
        let Expr::If { else_branch, .. } = &*form.value else {
            panic!("expected if, got {}", form.value.type_name());
        };
        assert!(matches!(&*else_branch.value, Expr::Nil));
    }

    #[test]
    fn lowers_trailing_cc_keyword() {
        let form = parse_one("(f 1 2 :cc k)");
        let Expr::Call { args, cc, .. } = &*form.value else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(cc.is_some());
    }

    #[test]
    fn rejects_misplaced_cc_keyword() {
        let source = SourceContext::from_source("test.sam", "(f :cc k 2)");
        assert!(parse("(f :cc k 2)", &source).is_err());
    }

    #[test]
    fn lowers_bind_with_single_name() {
        let form = parse_one("(bind (f 1) k (list k))");
        let Expr::Bind { params, .. } = &*form.value else {
            panic!("expected bind");
        };
        assert_eq!(params.required, vec!["k".to_string()]);
    }

    #[test]
    fn lowers_rest_parameters() {
        let form = parse_one("(lambda (a ...rest) a)");
        let Expr::Lambda(lambda) = &*form.value else {
            panic!("expected lambda");
        };
        assert_eq!(lambda.params.required, vec!["a".to_string()]);
        assert_eq!(lambda.params.rest.as_deref(), Some("rest"));
    }

    #[test]
    fn spans_point_into_the_source() {
        let src = "(if cond then else)";
        let form = parse_one(src);
        let Expr::If { condition, .. } = &*form.value else {
            panic!("expected if");
        };
        assert_eq!(&src[condition.span.start..condition.span.end], "cond");
    }
}
