//! Escape continuations: catch/throw, signal/error separation, uncaught
//! signals, and the amb/fail backtracking round-trip.

mod common;

use common::{number, run, run_val, string};
use samsara::{ErrorCategory, Value};

#[test]
fn throw_unwinds_to_the_matching_region() {
    let value = run_val(
        "(define t (make-tag \"done\"))
         (catch (t) (+ 1 (throw t 42)))",
    );
    assert_eq!(value, number(42.0));
}

#[test]
fn throw_crosses_function_frames() {
    let value = run_val(
        "(define t (make-tag \"out\"))
         (define (inner) (throw t \"escaped\"))
         (define (outer) (inner) \"not reached\")
         (catch (t) (outer))",
    );
    assert_eq!(value, string("escaped"));
}

#[test]
fn symbols_work_as_tags() {
    let value = run_val("(catch ('done) (throw 'done 5))");
    assert_eq!(value, number(5.0));
}

#[test]
fn a_region_matches_any_tag_in_its_group() {
    let value = run_val("(catch ('red 'green) (throw 'green 1))");
    assert_eq!(value, number(1.0));
    let value = run_val("(catch ('red 'green) (invoke 'red 2))");
    assert_eq!(value, number(2.0));
}

#[test]
fn non_matching_signals_pass_through_inner_regions() {
    let value = run_val(
        "(catch ('outer)
           (catch ('inner)
             (throw 'outer \"skipped the inner region\")))",
    );
    assert_eq!(value, string("skipped the inner region"));
}

#[test]
fn distinct_tags_with_equal_labels_do_not_match() {
    let err = run(
        "(define a (make-tag \"same\"))
         (define b (make-tag \"same\"))
         (catch (a) (throw b 1))",
    )
    .expect_err("expected uncaught signal");
    assert_eq!(err.kind.category(), ErrorCategory::Signal);
}

#[test]
fn uncaught_throw_is_reported_naming_the_tag() {
    let err = run("(throw (make-tag \"missing-region\") 1)").expect_err("expected uncaught signal");
    assert_eq!(err.kind.category(), ErrorCategory::Signal);
    assert!(err.to_string().contains("missing-region"), "got: {err}");
    assert!(err.to_string().contains("no active catch region"), "got: {err}");
}

#[test]
fn catch_does_not_intercept_ordinary_errors() {
    let err = run("(catch ('x) (car (list)))").expect_err("expected runtime error");
    assert_eq!(err.kind.category(), ErrorCategory::Runtime);
}

#[test]
fn escapes_cross_trampolined_chains() {
    // The throw happens thousands of bounces into a tail chain; it must
    // unwind straight to the catch without disturbing the chain's result
    // semantics.
    let value = run_val(
        "(define t (make-tag \"depth\"))
         (with-continuations
           (define (dive n)
             (if (eq? n 0) (throw t \"bottom\") (dive (- n 1)))))
         (catch (t) (dive 10000))",
    );
    assert_eq!(value, string("bottom"));
}

// ----------------------------------------------------------------------------
// amb/fail backtracking
// ----------------------------------------------------------------------------

const AMB: &str = "
  (with-continuations
    (define *alts* (list))
    (define *results* (list))
    (define exhausted (make-tag \"amb-exhausted\"))

    (define (fail)
      (if (null? *alts*)
          (throw exhausted nil)
          (let ((next (car *alts*)))
            (do (set! *alts* (cdr *alts*))
                (next)))))

    (define (push-alts choices k)
      (if (null? choices)
          nil
          (do
            (push-alts (cdr choices) k)
            (set! *alts* (cons (lambda () (k (car choices))) *alts*)))))

    (define (amb ...choices)
      (if (null? choices)
          (fail)
          (do
            (push-alts (cdr choices) cc)
            (cc (car choices)))))

    (define (range lo hi)
      (if (gt? lo hi)
          (list)
          (cons lo (range (+ lo 1) hi))))

    (define (amb-range lo hi)
      (amb ...(range lo hi)))

    (define (search)
      (bind (amb-range 1 20) (c)
        (bind (amb-range 1 c) (b)
          (bind (amb-range 1 b) (a)
            (do
              (if (eq? (* c c) (+ (* a a) (* b b)))
                  (set! *results* (cons (list a b c) *results*))
                  nil)
              (fail))))))

    (define (run-search)
      (catch (exhausted)
        (search))))
  (run-search)
  *results*";

#[test]
fn amb_enumerates_pythagorean_triples_exactly_once() {
    let mut engine = common::engine();
    let results = engine.eval_source("amb.sam", AMB).expect("search failed");

    // Found in ascending hypotenuse order, consed on, so reversed.
    let expected = Value::List(vec![
        common::number_list(&[12.0, 16.0, 20.0]),
        common::number_list(&[8.0, 15.0, 17.0]),
        common::number_list(&[9.0, 12.0, 15.0]),
        common::number_list(&[5.0, 12.0, 13.0]),
        common::number_list(&[6.0, 8.0, 10.0]),
        common::number_list(&[3.0, 4.0, 5.0]),
    ]);
    assert_eq!(results, expected);

    // Every alternative was consumed: one more fail has nowhere to go and
    // surfaces as an uncaught signal naming the exhaustion tag.
    let err = engine
        .eval_source("fail.sam", "(fail)")
        .expect_err("expected exhaustion");
    assert_eq!(err.kind.category(), ErrorCategory::Signal);
    assert!(err.to_string().contains("amb-exhausted"), "got: {err}");
}
