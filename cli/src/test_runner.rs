use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use latte::{Compiler, CompilerConfig};

const FIXTURE_SUFFIX: &str = ".test.latte";

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Salt seed; fixtures compile deterministically.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// Initial content type. Defaults to html.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Expected compile error: the error message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// 1-based line the expected error must be reported on.
    #[serde(default)]
    pub error_line: Option<usize>,

    /// Substrings that must all appear in the generated host code.
    #[serde(default)]
    pub expect_code: Vec<String>,

    /// Substrings that must not appear in the generated host code.
    #[serde(default)]
    pub reject_code: Vec<String>,

    /// Exact list of named blocks, in declaration order.
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,
}

fn default_salt() -> String {
    "fixture".to_string()
}

/// Split a `.test.latte` file into its TOML config and template source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let mut compiler_config = CompilerConfig {
        salt: Some(config.salt.clone()),
        ..CompilerConfig::default()
    };
    if let Some(content_type) = &config.content_type {
        compiler_config.content_type = content_type.clone();
    }
    let delimiters = compiler_config.delimiters();
    let compiler = match Compiler::with_config(compiler_config) {
        Ok(compiler) => compiler,
        Err(e) => return fail(description, format!("macro table error: {}", e)),
    };

    let result = compiler.compile_named(&path.to_string_lossy(), source, 0);
    let outcome = match (&config.expect_error, result) {
        (Some(expected), Err(error)) => {
            let message = error.kind.to_string();
            if !message.contains(expected.as_str()) {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                ))
            } else {
                match config.error_line {
                    Some(line) if line != error.line => Some(format!(
                        "expected error on line {}, but it is on line {}",
                        line, error.line
                    )),
                    _ => None,
                }
            }
        }
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but compilation succeeded",
            expected
        )),
        (None, Err(error)) => Some(format!("unexpected compile error: {}", error)),
        (None, Ok(compiled)) => {
            let code = compiled.to_code(&delimiters);
            let names: Vec<&str> = compiled.block_names().collect();
            check_code(&code, &config).or_else(|| match &config.expect_blocks {
                Some(expected) if *expected != names => Some(format!(
                    "block mismatch\n  expected: {:?}\n  actual:   {:?}",
                    expected, names
                )),
                _ => None,
            })
        }
    };

    match outcome {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Returns `Some(reason)` on the first code expectation that does not hold.
fn check_code(code: &str, config: &TestConfig) -> Option<String> {
    if let Some(missing) = config.expect_code.iter().find(|s| !code.contains(s.as_str())) {
        return Some(format!(
            "generated code does not contain \"{}\"\n  code:\n{}",
            missing,
            indent(code)
        ));
    }
    if let Some(present) = config.reject_code.iter().find(|s| code.contains(s.as_str())) {
        return Some(format!(
            "generated code unexpectedly contains \"{}\"\n  code:\n{}",
            present,
            indent(code)
        ));
    }
    None
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Discover fixture files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(FIXTURE_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_of<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(FIXTURE_SUFFIX))
            .unwrap_or("?")
    })
}

/// Run all fixtures under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        if categories.is_empty() {
            all_categories
        } else {
            select_categories(all_categories, categories)
        }
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", bold(header, no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_of(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), label_of(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let status = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            status,
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Keep the requested categories and their subfolders.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let matching: Vec<&String> = all
            .keys()
            .filter(|cat| *cat == req || cat.starts_with(&format!("{}/", req)))
            .collect();
        if matching.is_empty() {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        for cat in matching {
            selected.insert(cat.clone(), all[cat].clone());
        }
    }
    selected
}
