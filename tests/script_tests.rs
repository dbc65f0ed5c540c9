//! Script-suite harness: discovers every `.sam` file under `tests/scripts/`,
//! runs it in a fresh engine, and compares the displayed result against the
//! script's `; expect:` header.

use std::fs;
use std::path::{Path, PathBuf};

use samsara::builtins::{shared, NullSink};
use samsara::Engine;
use walkdir::WalkDir;

fn scripts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts")
}

fn expectation(source: &str, path: &Path) -> String {
    source
        .lines()
        .find_map(|line| line.trim().strip_prefix("; expect:"))
        .unwrap_or_else(|| panic!("{} has no '; expect:' header", path.display()))
        .trim()
        .to_string()
}

#[test]
fn all_scripts_produce_their_expected_results() {
    let mut ran = 0;
    for entry in WalkDir::new(scripts_dir()) {
        let entry = entry.expect("cannot walk tests/scripts");
        if entry.path().extension().map_or(true, |ext| ext != "sam") {
            continue;
        }
        let path = entry.path();
        let source = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
        let expected = expectation(&source, path);

        let mut engine = Engine::with_output(shared(NullSink));
        let name = path.display().to_string();
        match engine.eval_source(&name, &source) {
            Ok(value) => assert_eq!(
                value.to_string(),
                expected,
                "script {} produced the wrong result",
                path.display()
            ),
            Err(error) => panic!("script {} failed: {error}", path.display()),
        }
        ran += 1;
    }
    assert!(ran >= 4, "expected at least 4 scripts, ran {ran}");
}
