//! Comparison and negation natives.

use crate::ast::Span;
use crate::builtins::helpers::{check_arity, expect_number};
use crate::builtins::Registry;
use crate::runtime::control::Unwind;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::{NativeDef, Value};

pub fn register(registry: &mut Registry) {
    registry.register(&NATIVE_EQ);
    registry.register(&NATIVE_LT);
    registry.register(&NATIVE_GT);
    registry.register(&NATIVE_LTE);
    registry.register(&NATIVE_GTE);
    registry.register(&NATIVE_NOT);
}

pub static NATIVE_EQ: NativeDef = NativeDef {
    name: "eq?",
    func: native_eq,
};

fn native_eq(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("eq?", args, 2, ctx, span)?;
    Ok(Value::Bool(args[0] == args[1]))
}

macro_rules! comparison_native {
    ($static_name:ident, $name:literal, $func:ident, $op:tt) => {
        pub static $static_name: NativeDef = NativeDef {
            name: $name,
            func: $func,
        };

        fn $func(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
            check_arity($name, args, 2, ctx, span)?;
            let a = expect_number(&args[0], ctx, span)?;
            let b = expect_number(&args[1], ctx, span)?;
            Ok(Value::Bool(a $op b))
        }
    };
}

comparison_native!(NATIVE_LT, "lt?", native_lt, <);
comparison_native!(NATIVE_GT, "gt?", native_gt, >);
comparison_native!(NATIVE_LTE, "lte?", native_lte, <=);
comparison_native!(NATIVE_GTE, "gte?", native_gte, >=);

pub static NATIVE_NOT: NativeDef = NativeDef {
    name: "not",
    func: native_not,
};

fn native_not(args: &[Value], ctx: &mut EvaluationContext, span: Span) -> Result<Value, Unwind> {
    check_arity("not", args, 1, ctx, span)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}
