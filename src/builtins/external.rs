//! Output natives.

use crate::ast::Span;
use crate::builtins::Registry;
use crate::runtime::control::Unwind;
use crate::runtime::eval::EvaluationContext;
use crate::runtime::value::{NativeDef, Value};

pub fn register(registry: &mut Registry) {
    registry.register(&NATIVE_PRINT);
}

/// `(print a...)` - write the arguments, space-separated, followed by a
/// newline, to the engine's output sink.
pub static NATIVE_PRINT: NativeDef = NativeDef {
    name: "print",
    func: native_print,
};

fn native_print(args: &[Value], ctx: &mut EvaluationContext, _span: Span) -> Result<Value, Unwind> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    ctx.output.borrow_mut().emit(&line);
    ctx.output.borrow_mut().emit("\n");
    Ok(Value::Nil)
}
