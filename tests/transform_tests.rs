//! Tests for the CPS transformation: shape of the rewritten code and the
//! structural errors it raises before any code runs.

mod common;

use samsara::{Engine, ErrorCategory};

fn expand(src: &str) -> String {
    let engine = Engine::new();
    let forms = engine
        .expand_source("test.sam", src)
        .expect("expansion failed");
    forms
        .iter()
        .map(|f| f.value.pretty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn expand_err(src: &str) -> samsara::EngineError {
    let engine = Engine::new();
    engine
        .expand_source("test.sam", src)
        .expect_err("expected a transform error")
}

#[test]
fn tail_self_call_becomes_a_jump_with_threaded_cc() {
    let out = expand(
        "(with-continuations
           (define (fact n acc)
             (if (eq? n 0) acc (fact (- n 1) (* n acc)))))",
    );
    assert!(out.contains("(jump fact (- n 1) (* n acc) :cc cc)"), "got: {out}");
    assert!(out.contains("(jump cc acc)"), "got: {out}");
    // The injected cc slot shows up in the parameter list.
    assert!(out.contains("(lambda (n acc :cc)"), "got: {out}");
}

#[test]
fn non_tail_calls_stay_ordinary() {
    let out = expand(
        "(with-continuations
           (define (f n) (g (h n))))",
    );
    // The inner call is untouched; only the outer one jumps.
    assert!(out.contains("(jump g (h n) :cc cc)"), "got: {out}");
    assert!(!out.contains("jump h"), "got: {out}");
}

#[test]
fn explicit_cc_at_the_call_site_is_preserved() {
    let out = expand(
        "(with-continuations
           (define (f n) (g n :cc k)))",
    );
    assert!(out.contains("(jump g n :cc k)"), "got: {out}");
}

#[test]
fn calling_the_current_continuation_carries_no_override() {
    // Delivering through cc is not a call that threads cc again: the
    // continuation proceeds with its own captured chain.
    let out = expand(
        "(with-continuations
           (define (f n) (cc (+ n 1))))",
    );
    assert!(out.contains("(jump cc (+ n 1))"), "got: {out}");
    assert!(!out.contains("(jump cc (+ n 1) :cc"), "got: {out}");
}

#[test]
fn tail_values_delivers_operands_to_cc() {
    let out = expand(
        "(with-continuations
           (define (two) (values 1 2)))",
    );
    assert!(out.contains("(jump cc 1 2)"), "got: {out}");
}

#[test]
fn tail_chains_rewrite_through_a_temporary() {
    let out = expand(
        "(with-continuations
           (define (f a b) (and a b)))",
    );
    assert!(out.contains("(let ((%t0 a))"), "got: {out}");
    assert!(out.contains("(jump cc %t0)"), "got: {out}");
    assert!(out.contains("(jump cc b)"), "got: {out}");
}

#[test]
fn bind_synthesizes_an_inheriting_continuation() {
    let out = expand(
        "(with-continuations
           (define (f) (bind (g 1) v (list v))))",
    );
    assert!(out.contains("(jump g 1 :cc (lambda (v :cc*)"), "got: {out}");
}

#[test]
fn tail_call_arity_is_validated_against_the_registry() {
    let err = expand_err(
        "(with-continuations
           (define (f a) a)
           (define (g) (f 1 2)))",
    );
    assert_eq!(err.kind.category(), ErrorCategory::Transform);
    assert!(err.to_string().contains("'f'"), "got: {err}");
    assert!(err.to_string().contains("expects 1"), "got: {err}");
}

#[test]
fn while_inside_a_region_function_is_rejected() {
    let err = expand_err(
        "(with-continuations
           (define (spin n)
             (while (gt? n 0) (set! n (- n 1)))))",
    );
    assert_eq!(err.kind.category(), ErrorCategory::Transform);
    assert!(err.to_string().contains("while"), "got: {err}");
    assert!(err.to_string().contains("spin"), "got: {err}");
}

#[test]
fn declaring_a_cc_parameter_is_rejected() {
    let err = expand_err(
        "(with-continuations
           (define (f cc) cc))",
    );
    assert_eq!(err.kind.category(), ErrorCategory::Transform);
    assert!(err.to_string().contains("reserved"), "got: {err}");
}

#[test]
fn bind_outside_tail_position_is_rejected() {
    let err = expand_err(
        "(with-continuations
           (define (f)
             (list (bind (g) v v))))",
    );
    assert_eq!(err.kind.category(), ErrorCategory::Transform);
    assert!(err.to_string().contains("bind"), "got: {err}");
}

#[test]
fn bind_whose_call_supplies_cc_is_rejected() {
    let err = expand_err(
        "(with-continuations
           (define (f) (bind (g 1 :cc k) v v)))",
    );
    assert!(err.to_string().contains("already supplies"), "got: {err}");
}

#[test]
fn bind_outside_a_region_fails_at_evaluation() {
    let err = common::run("(define (f) (bind (g) v v)) (f)")
        .expect_err("expected an error");
    assert!(err.to_string().contains("with-continuations"), "got: {err}");
}

#[test]
fn while_outside_functions_in_a_region_still_works() {
    // Region top level is not itself CPS-transformed, so direct-style
    // loops remain legal there.
    let value = common::run_val(
        "(with-continuations
           (define total 0)
           (define i 0)
           (while (lt? i 4)
             (set! total (+ total i))
             (set! i (+ i 1)))
           total)",
    );
    assert_eq!(value, common::number(6.0));
}
