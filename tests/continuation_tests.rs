//! Continuation capture: bind, stored continuations, multiple values, and
//! the top-level capture asymmetry.

mod common;

use common::{list, number, run_val, string};
use samsara::Value;

#[test]
fn bind_destructures_multiple_values_into_names() {
    let value = run_val(
        "(with-continuations
           (define (two) (values 1 2))
           (define (use-two) (bind (two) (a b) (list a b))))
         (use-two)",
    );
    assert_eq!(value, common::number_list(&[1.0, 2.0]));
}

#[test]
fn plain_calls_receive_the_tagged_bundle() {
    let value = run_val(
        "(with-continuations
           (define (two) (values 1 2)))
         (two)",
    );
    assert_eq!(value, Value::Values(vec![number(1.0), number(2.0)]));
}

#[test]
fn capture_then_reinvoke_is_deterministic() {
    let mut engine = common::engine();
    let program = "
      (with-continuations
        (define k nil)
        (define (setk ...args)
          (set! k cc)
          (values ...args))
        (define (doit)
          (bind (setk \"A\") (...more)
            (append (list \"the call returned\") more))))
      (doit)";

    let first = engine.eval_source("setk.sam", program).expect("first run");
    assert_eq!(
        first,
        list(vec![string("the call returned"), string("A")])
    );

    // The captured continuation is an ordinary value: invoking it re-runs
    // the bind body with fresh bindings, as many times as we like.
    let again = engine.eval_source("again.sam", "(k \"again\")").expect("second run");
    assert_eq!(
        again,
        list(vec![string("the call returned"), string("again")])
    );

    let thrice = engine
        .eval_source("thrice.sam", "(k \"thrice\" \"!\")")
        .expect("third run");
    assert_eq!(
        thrice,
        list(vec![
            string("the call returned"),
            string("thrice"),
            string("!")
        ])
    );

    // And the most recent arguments win every time.
    let once_more = engine.eval_source("more.sam", "(k \"again\")").expect("fourth run");
    assert_eq!(
        once_more,
        list(vec![string("the call returned"), string("again")])
    );
}

#[test]
fn top_level_bind_is_a_normal_call() {
    // At region top level the capture lowers to an ordinary call: the chain
    // still flows through the continuation, but the first-time result is
    // simply the value the chain produces.
    let mut engine = common::engine();
    let value = engine
        .eval_source(
            "toplevel.sam",
            "(with-continuations
               (define k2 nil)
               (define (grab x) (set! k2 cc) (values x))
               (bind (grab 10) (v) (* v 2)))",
        )
        .expect("top-level bind");
    assert_eq!(value, number(20.0));

    // The continuation captured inside the call still works afterwards.
    let reinvoked = engine.eval_source("re.sam", "(k2 7)").expect("reinvoke");
    assert_eq!(reinvoked, number(14.0));
}

#[test]
fn continuations_run_off_the_end_into_the_capturing_chain() {
    // g captures a continuation; falling off its end must continue g's own
    // chain, here the continuation supplied explicitly by the caller.
    let value = run_val(
        "(with-continuations
           (define (final n) (cc (list \"final\" n)))
           (define (g)
             (bind (step 1) (v)
               (cc (+ v 100))))
           (define (step n) (cc n)))
         (g :cc final)",
    );
    assert_eq!(value, list(vec![string("final"), number(101.0)]));
}

#[test]
fn stored_continuations_see_current_global_state() {
    // Continuations snapshot control, not data: globals mutated between
    // re-invocations are observed, explicit storage is the caller's tool.
    let mut engine = common::engine();
    engine
        .eval_source(
            "state.sam",
            "(with-continuations
               (define k nil)
               (define counter 0)
               (define (capture) (set! k cc) (values 0))
               (define (observe)
                 (bind (capture) (ignored)
                   counter)))",
        )
        .expect("setup");
    let first = engine.eval_source("go.sam", "(observe)").expect("observe");
    assert_eq!(first, number(0.0));
    engine
        .eval_source("bump.sam", "(set! counter (+ counter 1))")
        .expect("bump");
    let second = engine.eval_source("rego.sam", "(k 0)").expect("reinvoke");
    assert_eq!(second, number(1.0));
}
