//! Trampoline behavior: flat-stack tail recursion, identity-continuation
//! defaults, explicit continuation overrides, and chain termination.

mod common;

use common::{number, run, run_val, string};
use samsara::{ErrorCategory, Value};

#[test]
fn transformed_functions_return_plain_values_to_ordinary_callers() {
    let value = run_val(
        "(with-continuations
           (define (fact n acc)
             (if (eq? n 0) acc (fact (- n 1) (* n acc)))))
         (fact 4 1)",
    );
    assert_eq!(value, number(24.0));

    // 5000 levels of what would be recursion: completes as 5000 bounces.
    // The product saturates to infinity long before n reaches 0; what
    // matters is that the chain runs to completion on a flat stack.
    let value = run_val(
        "(with-continuations
           (define (fact n acc)
             (if (eq? n 0) acc (fact (- n 1) (* n acc)))))
         (fact 5000 1)",
    );
    assert!(matches!(value, Value::Number(n) if n.is_infinite()));
}

#[test]
fn deep_self_tail_recursion_runs_on_flat_stack() {
    // 100000 bounces through one trampoline; the direct-recursion limit
    // (1000) would trip immediately if any bounce consumed call depth.
    let value = run_val(
        "(with-continuations
           (define (count-down n)
             (if (eq? n 0) \"done\" (count-down (- n 1)))))
         (count-down 100000)",
    );
    assert_eq!(value, string("done"));
}

#[test]
fn mutual_tail_recursion_threads_through_multiple_functions() {
    let value = run_val(
        "(with-continuations
           (define (even? n) (if (eq? n 0) true (odd? (- n 1))))
           (define (odd? n) (if (eq? n 0) false (even? (- n 1)))))
         (even? 100001)",
    );
    assert_eq!(value, Value::Bool(false));
}

#[test]
fn long_chains_do_not_overflow_where_direct_recursion_would() {
    // The same computation written without tail calls trips the
    // direct-recursion limit...
    let err = run(
        "(define (sum n) (if (eq? n 0) 0 (+ n (sum (- n 1)))))
         (sum 5000)",
    )
    .expect_err("expected recursion limit");
    assert_eq!(err.kind.category(), ErrorCategory::Runtime);
    assert!(err.to_string().contains("recursion limit"), "got: {err}");

    // ...while the accumulator version under the transform completes.
    let value = run_val(
        "(with-continuations
           (define (sum n acc)
             (if (eq? n 0) acc (sum (- n 1) (+ acc n)))))
         (sum 5000 0)",
    );
    assert_eq!(value, number(12502500.0));
}

#[test]
fn explicit_cc_overrides_the_threaded_continuation() {
    let value = run_val(
        "(with-continuations
           (define (add1 n) (cc (+ n 1)))
           (define (double n) (cc (* n 2))))
         (add1 5 :cc double)",
    );
    assert_eq!(value, number(12.0));
}

#[test]
fn applying_a_non_aware_target_ends_the_chain_with_its_raw_value() {
    // `+` is a native: it has no cc slot, so a tail call to it terminates
    // the trampoline loop with the raw sum.
    let value = run_val(
        "(with-continuations
           (define (f) (+ 1 2)))
         (f)",
    );
    assert_eq!(value, number(3.0));
}

#[test]
fn runtime_errors_propagate_with_the_logical_call_chain() {
    let err = run(
        "(with-continuations
           (define (f n) (g n))
           (define (g n) (/ n 0)))
         (f 1)",
    )
    .expect_err("expected division by zero");
    assert_eq!(err.kind.category(), ErrorCategory::Runtime);
    assert!(err.to_string().contains("division by zero"), "got: {err}");
    let help = err.diagnostic_info.help.as_deref().unwrap_or_default();
    assert!(help.contains("f"), "help was: {help}");
    assert!(help.contains("g"), "help was: {help}");
}

#[test]
fn transformed_lambdas_work_as_first_class_values() {
    let value = run_val(
        "(with-continuations
           (define (apply-twice f x) (f (f x) :cc cc))
           (define (inc n) (cc (+ n 1))))
         (apply-twice inc 5)",
    );
    assert_eq!(value, number(7.0));
}
