//! Hygiene: source-level budgets checked at test time.
//!
//! Scans `src/` (minus `*_test.rs` files and the test-only `testing.rs`
//! backend) for patterns that crash the process, drop errors on the floor,
//! or bypass `tracing`. A budget only ever goes down: adding a hit means
//! removing another one first.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
    hint: &'static str,
}

const BUDGETS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, hint: "propagate with `?`" },
    Budget { pattern: ".expect(", max: 0, hint: "propagate with `?`" },
    // Scope::expect_session: running a view outside a provider is a wiring bug.
    Budget { pattern: "panic!(", max: 1, hint: "return an error instead" },
    Budget { pattern: "unreachable!(", max: 0, hint: "make the state unrepresentable" },
    Budget { pattern: "todo!(", max: 0, hint: "finish the stub" },
    Budget { pattern: "unimplemented!(", max: 0, hint: "finish the stub" },
    Budget { pattern: "let _ =", max: 0, hint: "inspect or log the discarded value" },
    // Optional env vars in config.rs.
    Budget { pattern: ".ok()", max: 3, hint: "log why the error is ignored" },
    Budget { pattern: "#[allow(dead_code)]", max: 0, hint: "delete unused code" },
    // Also matches `eprintln!(`.
    Budget { pattern: "println!(", max: 0, hint: "use tracing, or the shell's output" },
];

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        if path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if path_str.ends_with("_test.rs") || path.file_name().is_some_and(|name| name == "testing.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
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

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("session.rs")), "run from the crate root");
}

#[test]
fn budgets_hold() {
    let files = source_files();
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(&files, budget.pattern);
        let count: usize = found.iter().map(|(_, n)| n).sum();
        if count > budget.max {
            let detail: Vec<String> = found.iter().map(|(path, n)| format!("    {path}: {n}")).collect();
            failures.push(format!(
                "`{}` budget exceeded: found {count}, max {} ({})\n{}",
                budget.pattern,
                budget.max,
                budget.hint,
                detail.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn tests_live_in_sibling_files() {
    // Inline `mod tests { ... }` blocks belong in `<module>_test.rs`.
    let inline: Vec<String> = source_files()
        .into_iter()
        .filter(|f| f.content.lines().any(|line| line.trim_start().starts_with("mod tests {")))
        .map(|f| f.path)
        .collect();
    assert!(inline.is_empty(), "inline test modules: {inline:?}");
}

fn every_source(dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            every_source(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(fs::read_to_string(&path).unwrap_or_default());
        }
    }
}

fn mentions(line: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    line.match_indices(name).any(|(at, _)| {
        let before = line[..at].chars().next_back();
        let after = line[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

#[test]
fn public_fns_have_callers() {
    let mut sources = Vec::new();
    every_source(Path::new("src"), &mut sources);
    every_source(Path::new("tests"), &mut sources);

    let mut unused = Vec::new();
    for module in ["src/state/auth.rs", "src/net/api.rs", "src/nav/counts.rs"] {
        let content = fs::read_to_string(module).unwrap_or_default();
        assert!(!content.is_empty(), "missing {module}");
        for line in content.lines() {
            let Some(rest) = line.trim_start().strip_prefix("pub ") else {
                continue;
            };
            let rest = rest.strip_prefix("async ").unwrap_or(rest);
            let Some(rest) = rest.strip_prefix("fn ") else {
                continue;
            };
            let name: String = rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
            let definition = format!("fn {name}");
            let called = sources
                .iter()
                .flat_map(|s| s.lines())
                .any(|l| !l.contains(&definition) && mentions(l, &name));
            if !called {
                unused.push(format!("{module}: {name}"));
            }
        }
    }
    assert!(unused.is_empty(), "public fns nobody calls: {unused:?}");
}
