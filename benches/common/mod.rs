#![allow(dead_code)]
use std::fmt::Write;
use std::fs;
use std::path::Path;

use minijs::ast::Node;
use minijs::{lexer, parser};

const PROGRAMS_DIR: &str = "tests/programs";

/// `(label, source)` pairs: fixture cases tagged for `tag`, plus a generated
/// program large enough to dominate setup noise.
pub fn workloads(tag: &str) -> Vec<(String, String)> {
    let cases = test_support::bench_cases(Path::new(PROGRAMS_DIR), tag)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"));
    let mut workloads = cases
        .into_iter()
        .map(|case| {
            let source = fs::read_to_string(&case.program_path)
                .unwrap_or_else(|err| panic!("read {}: {err}", case.program_path.display()));
            (case.name, source)
        })
        .collect::<Vec<_>>();
    workloads.push(("long".to_string(), long_program(400)));
    workloads
}

/// `count` functions, each with a nested block, arithmetic and builtin calls.
pub fn long_program(count: usize) -> String {
    let mut source = String::from("let total = 0;\n");
    for index in 0..count {
        let _ = writeln!(
            source,
            "function step{index}() {{\n    const base = {index} * 3 + (total - 1) % 7;\n    {{\n        let label = \"paso\";\n        console.log(label, base / 2);\n    }}\n}}\nstep{index}();"
        );
    }
    source
}

/// Like `long_program`, but every other statement lacks its `;`.
pub fn broken_program(count: usize) -> String {
    let mut source = String::new();
    for index in 0..count {
        let end = if index % 2 == 0 { "" } else { ";" };
        let _ = writeln!(source, "let v{index} = {index} + (v{index} * 2){end}");
    }
    source
}

pub fn load_program(source: &str) -> Node {
    parser::parse_tokens(lexer::tokenize(source)).program
}
