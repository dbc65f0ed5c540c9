//! The Samsara runtime: values, environments, the trampoline, the direct
//! evaluator, and non-local control flow.
//!
//! Concurrency model: one logical thread of control per trampoline loop.
//! Values are `Rc`-based and deliberately not `Send`; independent engines on
//! independent host threads share nothing. Continuation closures may close
//! over shared mutable globals (backtracking code does); protecting that
//! state is the caller's obligation, the runtime imposes no locking.

pub mod control;
pub mod env;
pub mod eval;
pub mod trampoline;
pub mod value;
pub mod world;

pub use control::{EscapeSignal, Unwind};
pub use env::Env;
pub use eval::{EvaluationContext, CC_PARAM, DEFAULT_MAX_DEPTH};
pub use value::{CcDefault, Closure, EscapeTag, NativeDef, NativeFn, TailCall, Value};
pub use world::World;
