//! Hygiene checks over the production sources in `src/`.
//!
//! The engine runs inside a browser tab, where a panic kills the whole board
//! and an index out of bounds is a panic. These tests scan the source tree
//! and hold each risk to a budget. If you must add one, retire an existing
//! one first; budgets never grow.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

/// Text patterns that abort or swallow errors, with their budgets.
const PATTERN_BUDGETS: &[(&str, usize)] = &[
    (".unwrap()", 0),
    (".expect(", 0),
    ("panic!(", 0),
    ("unreachable!(", 0),
    // Canvas calls return `Result<_, JsValue>`; they are propagated, not dropped.
    ("let _ =", 0),
    (".ok()", 0),
];

/// Modules that walk variable-length point lists. They use iterators,
/// slice patterns and `get`, never `xs[i]`.
const NO_INDEX_MODULES: &[&str] = &["geometry.rs", "eraser.rs", "render.rs"];

/// Numeric casts must sit inside a function that opts in with
/// `#[allow(clippy::cast_*)]`; none are allowed elsewhere.
const MAX_UNGUARDED_CASTS: usize = 0;

/// Every `#[allow(...)]` in production code. Today: three cast sites and the
/// modifier-key flags struct.
const MAX_LINT_ALLOWS: usize = 4;

const NUMERIC_TYPES: &[&str] =
    &["u8", "u16", "u32", "u64", "usize", "i8", "i16", "i32", "i64", "isize", "f32", "f64"];

struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    fn name(&self) -> &str {
        Path::new(&self.path).file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }

    /// Lines that are code rather than comments.
    fn code_lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines().filter(|line| !line.trim_start().starts_with("//"))
    }
}

/// Collect production `.rs` files from `src/`, excluding `_test.rs` files.
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

fn count_lines(files: &[SourceFile], matches: impl Fn(&str) -> bool) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.code_lines().filter(|&line| matches(line)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn total(hits: &[(String, usize)]) -> usize {
    hits.iter().map(|(_, c)| c).sum()
}

fn format_hits(hits: &[(String, usize)]) -> String {
    hits.iter().map(|(path, count)| format!("  {path}: {count}")).collect::<Vec<_>>().join("\n")
}

/// `xs[i]`-style indexing: a `[` directly after an identifier, `)` or `]`.
/// Attributes, macros (`vec![`), array types and slice patterns don't match.
fn indexes(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.windows(2).any(|w| match w {
        [prev, b'['] => prev.is_ascii_alphanumeric() || matches!(*prev, b'_' | b')' | b']'),
        _ => false,
    }) && !line.trim_start().starts_with("#[")
}

fn numeric_cast(line: &str) -> bool {
    NUMERIC_TYPES.iter().any(|ty| {
        let needle = format!(" as {ty}");
        line.match_indices(&needle).any(|(at, _)| {
            line[at + needle.len()..].chars().next().is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_')
        })
    })
}

/// Numeric casts outside any function preceded by `#[allow(clippy::cast_...)]`.
fn unguarded_casts(file: &SourceFile) -> usize {
    let mut armed = false;
    let mut guarded_until: Option<String> = None;
    let mut count = 0;
    for line in file.code_lines() {
        if let Some(end) = &guarded_until {
            if line == end {
                guarded_until = None;
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[allow(clippy::cast_") {
            armed = true;
            continue;
        }
        if armed && trimmed.contains("fn ") {
            armed = false;
            let indent = &line[..line.len() - trimmed.len()];
            guarded_until = Some(format!("{indent}}}"));
            continue;
        }
        if numeric_cast(line) {
            count += 1;
        }
    }
    count
}

// =============================================================
// Budgets
// =============================================================

#[test]
fn panic_and_discard_budgets() {
    let files = source_files();
    for &(pattern, budget) in PATTERN_BUDGETS {
        let hits = count_lines(&files, |line| line.contains(pattern));
        let count = total(&hits);
        assert!(count <= budget, "{pattern} budget exceeded: found {count}, max {budget}.\n{}", format_hits(&hits));
    }
}

#[test]
fn point_walkers_do_not_index() {
    let files: Vec<SourceFile> =
        source_files().into_iter().filter(|f| NO_INDEX_MODULES.contains(&f.name())).collect();
    assert_eq!(files.len(), NO_INDEX_MODULES.len(), "expected modules missing from src/");
    let hits = count_lines(&files, indexes);
    assert!(hits.is_empty(), "direct indexing found; use get, iterators or slice patterns.\n{}", format_hits(&hits));
}

#[test]
fn casts_are_guarded() {
    let files = source_files();
    let hits: Vec<(String, usize)> = files
        .iter()
        .map(|f| (f.path.clone(), unguarded_casts(f)))
        .filter(|(_, count)| *count > 0)
        .collect();
    let count = total(&hits);
    assert!(
        count <= MAX_UNGUARDED_CASTS,
        "numeric casts outside a #[allow(clippy::cast_*)] fn: found {count}, max {MAX_UNGUARDED_CASTS}.\n{}",
        format_hits(&hits)
    );
}

#[test]
fn lint_allow_budget() {
    let files = source_files();
    let hits = count_lines(&files, |line| line.trim_start().starts_with("#[allow("));
    let count = total(&hits);
    assert!(count <= MAX_LINT_ALLOWS, "#[allow] budget exceeded: found {count}, max {MAX_LINT_ALLOWS}.\n{}", format_hits(&hits));
}

// =============================================================
// Scanners
// =============================================================

#[test]
fn index_scanner_ignores_macros_and_patterns() {
    assert!(indexes("let p = points[i];"));
    assert!(indexes("call()[0]"));
    assert!(!indexes("let v = vec![a, b];"));
    assert!(!indexes("let [from, to] = pair else {"));
    assert!(!indexes("fn corners(&self) -> [Point; 4] {"));
    assert!(!indexes("#[derive(Debug)]"));
}

#[test]
fn cast_scanner_needs_a_numeric_target() {
    assert!(numeric_cast("let n = x as usize;"));
    assert!(numeric_cast("(i as f64)"));
    assert!(!numeric_cast("treated as a dot"));
    assert!(!numeric_cast("x as u8x4"));
}

#[test]
fn guarded_cast_region_ends_at_fn_close() {
    let file = SourceFile {
        path: "src/sample.rs".to_owned(),
        content: "#[allow(clippy::cast_sign_loss)]\nfn a() -> usize {\n    x as usize\n}\nfn b() -> u32 {\n    y as u32\n}\n"
            .to_owned(),
    };
    assert_eq!(unguarded_casts(&file), 1);
}
