//! # Samsara native functions
//!
//! Natives are the primitive operations the surface language bottoms out in.
//!
//! ## Module structure
//!
//! - **`helpers`**: shared argument checking for all natives
//! - **`math`**: arithmetic (`+`, `-`, `*`, `/`)
//! - **`logic`**: comparison and negation (`eq?`, `lt?`, `not`, ...)
//! - **`collections`**: list operations (`list`, `car`, `append`, ...)
//! - **`control`**: multiple values and escape signals (`values`, `throw`,
//!   `invoke`, `make-tag`)
//! - **`external`**: output (`print`)
//!
//! All natives share the `NativeFn` signature and are registered as
//! `&'static NativeDef`s, so values can refer to them without allocation.
//! Natives are not continuation-aware: invoked in tail position they end
//! the tail-call chain with their raw return value.

pub mod collections;
pub mod control;
pub mod external;
pub mod helpers;
pub mod logic;
pub mod math;

use std::cell::RefCell;
use std::rc::Rc;

use im::HashMap;
use once_cell::sync::Lazy;

use crate::runtime::value::NativeDef;

// ============================================================================
// OUTPUT SINKS
// ============================================================================

/// Output sink for `print`, to make I/O testable and injectable.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Discards all output.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
}

/// Collects output in memory; the test helpers read it back.
#[derive(Default)]
pub struct BufferSink {
    pub buffer: String,
}

impl OutputSink for BufferSink {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// Writes straight to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        print!("{}", text);
    }
}

pub type SharedOutput = Rc<RefCell<dyn OutputSink>>;

pub fn shared(sink: impl OutputSink + 'static) -> SharedOutput {
    Rc::new(RefCell::new(sink))
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Registry of all natives, inspectable at runtime. Cloning is cheap: the
/// map is persistent.
#[derive(Clone, Default)]
pub struct Registry {
    natives: HashMap<String, &'static NativeDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: &'static NativeDef) {
        self.natives.insert(def.name.to_string(), def);
    }

    pub fn lookup(&self, name: &str) -> Option<&'static NativeDef> {
        self.natives.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.natives.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.natives.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.natives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }
}

static CORE: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::new();
    math::register(&mut registry);
    logic::register(&mut registry);
    collections::register(&mut registry);
    control::register(&mut registry);
    external::register(&mut registry);
    registry
});

/// The standard native set.
pub fn core_registry() -> Registry {
    CORE.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_has_the_standard_set() {
        let registry = core_registry();
        for name in ["+", "eq?", "list", "values", "throw", "make-tag", "print"] {
            assert!(registry.has(name), "missing native '{}'", name);
        }
    }
}
