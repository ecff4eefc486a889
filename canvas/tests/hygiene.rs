//! Hygiene: source-scan budgets for the editor core.
//!
//! Each pattern has a budget (ideally zero) counted over non-test files in
//! `src/`. Budgets only ever go down.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
    note: &'static str,
}

// Panics crash the host page.
const UNWRAP: Budget = Budget { pattern: ".unwrap()", max: 0, note: "propagate or log instead" };
const EXPECT: Budget = Budget { pattern: ".expect(", max: 0, note: "propagate or log instead" };
const PANIC: Budget = Budget { pattern: "panic!(", max: 0, note: "return an error" };
const UNREACHABLE: Budget = Budget { pattern: "unreachable!(", max: 0, note: "restructure the match" };
const TODO: Budget = Budget { pattern: "todo!(", max: 0, note: "finish the stub" };
const UNIMPLEMENTED: Budget = Budget { pattern: "unimplemented!(", max: 0, note: "finish the stub" };

// Silent loss discards errors without inspecting them.
const SILENT_DISCARD: Budget = Budget { pattern: "let _ =", max: 0, note: "log the error" };
const DOT_OK: Budget = Budget { pattern: ".ok()", max: 0, note: "log the error" };

// Output goes through `tracing`.
const PRINTLN: Budget = Budget { pattern: "println!(", max: 0, note: "use tracing" };
const EPRINTLN: Budget = Budget { pattern: "eprintln!(", max: 0, note: "use tracing" };

const ALLOW_DEAD_CODE: Budget = Budget { pattern: "#[allow(dead_code)]", max: 0, note: "delete the code" };

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`, excluding `*_test.rs`.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn check(budget: &Budget) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    let found = hits(&files, budget.pattern);
    let count: usize = found.iter().map(|(_, c)| c).sum();
    let listing = found
        .iter()
        .map(|(path, c)| format!("  {path}: {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(
        count <= budget.max,
        "`{}` budget exceeded: found {count}, max {} ({}).\n{listing}",
        budget.pattern,
        budget.max,
        budget.note
    );
}

// =============================================================
// Panics
// =============================================================

#[test]
fn unwrap_budget() {
    check(&UNWRAP);
}

#[test]
fn expect_budget() {
    check(&EXPECT);
}

#[test]
fn panic_budget() {
    check(&PANIC);
}

#[test]
fn unreachable_budget() {
    check(&UNREACHABLE);
}

#[test]
fn todo_budget() {
    check(&TODO);
}

#[test]
fn unimplemented_budget() {
    check(&UNIMPLEMENTED);
}

// =============================================================
// Silent loss and output
// =============================================================

#[test]
fn silent_discard_budget() {
    check(&SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    check(&DOT_OK);
}

#[test]
fn print_budget() {
    check(&PRINTLN);
    check(&EPRINTLN);
}

// =============================================================
// Structure
// =============================================================

#[test]
fn allow_dead_code_budget() {
    check(&ALLOW_DEAD_CODE);
}

#[test]
fn every_module_with_logic_has_tests() {
    let missing: Vec<String> = source_files()
        .into_iter()
        .filter(|file| !file.path.ends_with("lib.rs") && !file.path.ends_with("consts.rs"))
        .filter(|file| {
            let stem = Path::new(&file.path)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            !file.content.contains(&format!("#[path = \"{stem}_test.rs\"]"))
        })
        .map(|file| file.path)
        .collect();
    assert!(missing.is_empty(), "modules without a sibling test file:\n  {}", missing.join("\n  "));
}
