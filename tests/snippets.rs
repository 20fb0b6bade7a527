//! Snippet tests for the compiler pipeline as a whole. Each file in
//! `tests/programs/` starts with a heading comment naming the
//! expected outcome:
//!
//! ```plain
//! ; expect: 42              the program compiles; running it prints 42
//! ; expect-error: <kind>    compilation fails and names this error kind
//! ```
//!
//! This test exercises parse + emit through the public API; actually
//! executing the `expect:` programs needs a C toolchain and lives in
//! `tests/exec.rs`.

use std::fs;
use std::path::PathBuf;

use junco::compiler::{emit_program, parse_program, Labels};
use junco::error::Error;
use junco::Source;

fn programs() -> Vec<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/programs");
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("tests/programs exists")
        .map(|entry| entry.expect("readable entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "scm"))
        .collect();
    paths.sort();
    paths
}

fn heading<'a>(source: &'a str, key: &str) -> Option<&'a str> {
    source
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .map(str::trim)
}

fn compile(source: &str) -> Result<String, Error> {
    let ast = parse_program(Source::source(source))?;
    emit_program(&ast, &mut Labels::new())
}

#[test]
fn every_snippet_meets_its_expectation() {
    let programs = programs();
    assert!(!programs.is_empty(), "no snippet programs found");

    for path in programs {
        let text = fs::read_to_string(&path).expect("readable snippet");

        if let Some(kind) = heading(&text, "; expect-error:") {
            let error = match compile(&text) {
                Err(error) => error,
                Ok(_) => panic!("{} compiled but should not have", path.display()),
            };
            assert!(
                error.to_string().starts_with(kind),
                "{} failed with `{}`, expected `{}`",
                path.display(),
                error,
                kind
            );
        } else if heading(&text, "; expect:").is_some() {
            if let Err(error) = compile(&text) {
                panic!("{} failed to compile: {}", path.display(), error);
            }
        } else {
            panic!("{} has no expectation heading", path.display());
        }
    }
}

#[test]
fn compiled_snippets_share_one_label_counter() {
    // one driver-owned counter must stay collision-free across
    // compilations in a process
    let mut labels = Labels::new();
    let mut seen = std::collections::HashSet::new();

    for path in programs() {
        let text = fs::read_to_string(&path).expect("readable snippet");
        let Ok(ast) = parse_program(Source::source(&text)) else {
            continue;
        };
        let Ok(asm) = emit_program(&ast, &mut labels) else {
            continue;
        };
        for line in asm.lines() {
            if let Some(label) = line.strip_suffix(':') {
                if label.starts_with(".Ljunco") {
                    assert!(seen.insert(label.to_string()), "label {} reused", label);
                }
            }
        }
    }
}
