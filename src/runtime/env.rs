//! Lexical environments.
//!
//! An `Env` is a chain of frames ending at the global world. Closures (and
//! therefore continuations) hold an `Env` by reference: everything a captured
//! continuation needs to re-run its body later stays reachable through it.
//! Frames are shared, not copied, so `set!` through one closure is visible
//! through every other closure sharing the frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::value::Value;
use crate::runtime::world::World;

#[derive(Clone)]
pub struct Env {
    scope: Rc<Scope>,
}

enum Scope {
    Global(Rc<World>),
    Local {
        vars: RefCell<HashMap<String, Value>>,
        parent: Env,
    },
}

impl Env {
    pub fn global(world: Rc<World>) -> Self {
        Self {
            scope: Rc::new(Scope::Global(world)),
        }
    }

    /// A fresh frame on top of this environment.
    pub fn child(&self) -> Self {
        Self {
            scope: Rc::new(Scope::Local {
                vars: RefCell::new(HashMap::new()),
                parent: self.clone(),
            }),
        }
    }

    pub fn define(&self, name: &str, value: Value) {
        match &*self.scope {
            Scope::Global(world) => world.define(name, value),
            Scope::Local { vars, .. } => {
                vars.borrow_mut().insert(name.to_string(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match &*self.scope {
            Scope::Global(world) => world.get(name),
            Scope::Local { vars, parent } => match vars.borrow().get(name) {
                Some(v) => Some(v.clone()),
                None => parent.get(name),
            },
        }
    }

    /// Assign to the nearest frame that already binds `name`. Returns false
    /// when no such binding exists anywhere on the chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        match &*self.scope {
            Scope::Global(world) => {
                if world.contains(name) {
                    world.define(name, value);
                    true
                } else {
                    false
                }
            }
            Scope::Local { vars, parent } => {
                let mut borrow = vars.borrow_mut();
                if let Some(slot) = borrow.get_mut(name) {
                    *slot = value;
                    true
                } else {
                    drop(borrow);
                    parent.assign(name, value)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Env {
        Env::global(Rc::new(World::new()))
    }

    #[test]
    fn child_frames_shadow_and_share() {
        let root = setup();
        root.define("x", Value::Number(1.0));
        let inner = root.child();
        inner.define("x", Value::Number(2.0));
        assert_eq!(inner.get("x"), Some(Value::Number(2.0)));
        assert_eq!(root.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_reaches_the_defining_frame() {
        let root = setup();
        root.define("counter", Value::Number(0.0));
        let inner = root.child().child();
        assert!(inner.assign("counter", Value::Number(5.0)));
        assert_eq!(root.get("counter"), Some(Value::Number(5.0)));
        assert!(!inner.assign("missing", Value::Nil));
    }
}
