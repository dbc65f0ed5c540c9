//! Global state for one engine instance.
//!
//! Globals live in a persistent map so the engine can snapshot and restore
//! them in O(1); the script test harness uses this to isolate test cases
//! that share an engine.

use std::cell::RefCell;

use im::HashMap;

use crate::runtime::value::Value;

#[derive(Debug, Default)]
pub struct World {
    globals: RefCell<HashMap<String, Value>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.borrow().contains_key(name)
    }

    pub fn define(&self, name: &str, value: Value) {
        let next = self.globals.borrow().update(name.to_string(), value);
        *self.globals.borrow_mut() = next;
    }

    /// O(1) copy of the current global bindings.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.globals.borrow().clone()
    }

    pub fn restore(&self, snapshot: HashMap<String, Value>) {
        *self.globals.borrow_mut() = snapshot;
    }
}
