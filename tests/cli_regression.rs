//! End-to-end CLI tests against the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn samsara() -> Command {
    Command::cargo_bin("samsara").expect("binary builds")
}

fn script(name: &str) -> String {
    format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn run_prints_the_final_value() {
    samsara()
        .args(["run", &script("scripts/factorial.sam")])
        .assert()
        .success()
        .stdout(predicate::str::contains("2432902008176640000"));
}

#[test]
fn run_completes_deep_tail_recursion() {
    samsara()
        .args(["run", &script("scripts/countdown.sam")])
        .assert()
        .success()
        .stdout(predicate::str::contains("done"));
}

#[test]
fn expand_shows_the_cps_transformed_code() {
    samsara()
        .args(["expand", &script("scripts/factorial.sam")])
        .assert()
        .success()
        .stdout(predicate::str::contains("(jump fact"))
        .stdout(predicate::str::contains(":cc cc"));
}

#[test]
fn expand_json_emits_serialized_ast() {
    samsara()
        .args(["expand", "--json", &script("scripts/factorial.sam")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Jump\""));
}

#[test]
fn ast_emits_parsed_forms_as_json() {
    samsara()
        .args(["ast", &script("scripts/mutual.sam")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Region\""));
}

#[test]
fn uncaught_signals_fail_with_a_diagnostic() {
    samsara()
        .args(["run", &script("fixtures/uncaught.sam")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nobody-home"));
}

#[test]
fn missing_files_fail_cleanly() {
    samsara()
        .args(["run", "no-such-file.sam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
