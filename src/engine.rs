//! The engine facade: the full pipeline in one place.
//!
//! `eval_source` runs parse -> (per region) CPS transform -> evaluate, and
//! converts everything that can go wrong, including escape signals that
//! reached top level, into a single `EngineError` at the boundary.
//!
//! An engine owns its world: definitions persist across `eval_source`
//! calls, so a continuation captured by one source chunk can be invoked by
//! a later one. `snapshot`/`restore` expose the world's persistent map for
//! harnesses that want isolation between cases sharing one engine.

use std::rc::Rc;

use crate::ast::{node, AstNode, Expr};
use crate::builtins::{self, Registry, SharedOutput};
use crate::cps;
use crate::diagnostics::{EngineError, PhaseContext, SourceContext};
use crate::runtime::env::Env;
use crate::runtime::eval::{self, EvaluationContext, DEFAULT_MAX_DEPTH};
use crate::runtime::value::Value;
use crate::runtime::world::World;
use crate::syntax;

pub struct Engine {
    world: Rc<World>,
    natives: Rc<Registry>,
    output: SharedOutput,
    max_depth: usize,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_output(builtins::shared(builtins::StdoutSink))
    }

    pub fn with_output(output: SharedOutput) -> Self {
        Self {
            world: Rc::new(World::new()),
            natives: Rc::new(builtins::core_registry()),
            output,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Bound on direct (non-trampolined) call nesting.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Parse, transform, and evaluate a source chunk. Returns the value of
    /// the last top-level form.
    pub fn eval_source(&mut self, name: &str, text: &str) -> Result<Value, EngineError> {
        let source = SourceContext::from_source(name, text);
        let forms = self.prepare(text, &source)?;

        let reporter = PhaseContext::new(source.clone(), "eval");
        let env = Env::global(Rc::clone(&self.world));
        let mut ctx = EvaluationContext::new(
            Rc::clone(&self.world),
            Rc::clone(&self.natives),
            self.output.clone(),
            source,
            self.max_depth,
        );

        let mut last = Value::Nil;
        for form in &forms {
            last = eval::evaluate(form, &env, &mut ctx)
                .map_err(|unwind| unwind.into_engine_error(&reporter))?;
        }
        Ok(last)
    }

    /// Parse and CPS-transform without evaluating. Regions come back with
    /// their forms rewritten, still wrapped in the region marker so the
    /// output reads like the input. The CLI `expand` command and the
    /// transform tests use this.
    pub fn expand_source(&self, name: &str, text: &str) -> Result<Vec<AstNode>, EngineError> {
        let source = SourceContext::from_source(name, text);
        let forms = syntax::parse(text, &source)?;
        forms
            .iter()
            .map(|form| match &*form.value {
                Expr::Region(inner) => {
                    let transformed = cps::transform_region(inner, &source)?;
                    Ok(node(Expr::Region(transformed), form.span))
                }
                _ => Ok(form.clone()),
            })
            .collect()
    }

    /// O(1) snapshot of the global bindings.
    pub fn snapshot(&self) -> im::HashMap<String, Value> {
        self.world.snapshot()
    }

    pub fn restore(&self, snapshot: im::HashMap<String, Value>) {
        self.world.restore(snapshot)
    }

    /// Parse + transform: the evaluable form sequence with regions spliced
    /// open. Top-level region forms evaluate in order like any others.
    fn prepare(&self, text: &str, source: &SourceContext) -> Result<Vec<AstNode>, EngineError> {
        let forms = syntax::parse(text, source)?;
        let mut prepared = Vec::with_capacity(forms.len());
        for form in forms {
            if let Expr::Region(inner) = &*form.value {
                prepared.extend(cps::transform_region(inner, source)?);
            } else {
                prepared.push(form);
            }
        }
        Ok(prepared)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
