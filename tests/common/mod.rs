//! Shared setup for the integration tests: an engine wired to a buffer sink
//! plus one-line helpers for running source chunks.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use samsara::builtins::{BufferSink, SharedOutput};
use samsara::{Engine, EngineError, Value};

/// Engine with captured output.
pub fn engine() -> Engine {
    Engine::with_output(buffer().1)
}

/// Engine plus a handle on its output buffer.
pub fn engine_with_buffer() -> (Engine, Rc<RefCell<BufferSink>>) {
    let (sink, shared) = buffer();
    (Engine::with_output(shared), sink)
}

fn buffer() -> (Rc<RefCell<BufferSink>>, SharedOutput) {
    let sink = Rc::new(RefCell::new(BufferSink::default()));
    let shared: SharedOutput = sink.clone();
    (sink, shared)
}

pub fn run(src: &str) -> Result<Value, EngineError> {
    engine().eval_source("test.sam", src)
}

pub fn run_val(src: &str) -> Value {
    match run(src) {
        Ok(value) => value,
        Err(error) => panic!("evaluation failed: {error}\nsource:\n{src}"),
    }
}

pub fn number(n: f64) -> Value {
    Value::Number(n)
}

pub fn string(s: &str) -> Value {
    Value::Str(s.to_string())
}

pub fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

pub fn number_list(ns: &[f64]) -> Value {
    Value::List(ns.iter().map(|n| Value::Number(*n)).collect())
}
