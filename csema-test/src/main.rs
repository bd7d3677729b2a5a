// Fixture-driven end-to-end test harness for the semantic analyser.
//
// Each fixture is a JSON-encoded `ast::File` (`<name>.ast.json`), optionally
// paired with a JSON package map (`<name>.pkgs.json`) and a locked list of
// expected diagnostics (`<name>.diagnostics.json`, a list of
// `{severity, code}` pairs compared unordered — message text and spans are
// allowed to drift). A fixture with no `.diagnostics.json` is expected to
// analyse clean (zero diagnostics).

mod html_report;

use clap::Parser;
use colored::Colorize;
use csema_core::pkgs::PackageMap;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use html_report::{HtmlReportGenerator, TestReportEntry};

#[derive(Parser)]
#[command(name = "csema-test")]
#[command(about = "Fixture-driven test harness for the semantic analyser")]
struct Cli {
    /// Optional filter pattern (substring match against the fixture name)
    filter: Option<String>,

    /// Write actual diagnostics as the new expected output
    #[arg(long)]
    update: bool,

    /// Show detailed diff on failures
    #[arg(long)]
    verbose: bool,

    /// Write an HTML report summarising every fixture to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ExpectedDiagnostic {
    severity: String,
    code: Option<String>,
}

#[derive(Debug)]
struct TestCase {
    name: String,
    ast_path: PathBuf,
    pkgs_path: Option<PathBuf>,
    expected_path: Option<PathBuf>,
}

#[derive(Debug)]
enum TestResult {
    Passed,
    Failed { message: String, diff: Option<String> },
}

fn main() {
    let cli = Cli::parse();
    let tests_dir = find_tests_dir();

    if !tests_dir.exists() {
        eprintln!(
            "{} fixtures directory not found: {}",
            "error:".red().bold(),
            tests_dir.display()
        );
        std::process::exit(1);
    }

    let test_cases = discover_tests(&tests_dir, cli.filter.as_deref());
    if test_cases.is_empty() {
        println!("{}", "No fixtures found.".yellow());
        std::process::exit(0);
    }

    println!("{} {} fixture(s)\n", "Running".green().bold(), test_cases.len());

    let mut passed = 0;
    let mut failed = 0;
    let mut report = HtmlReportGenerator::new();

    for test in &test_cases {
        let (result, expected, actual) = run_test(test, cli.update);

        match &result {
            TestResult::Passed => {
                println!("  {} {}", "PASS".green(), test.name);
                passed += 1;
            }
            TestResult::Failed { message, diff } => {
                println!("  {} {}", "FAIL".red(), test.name);
                println!("       {}", message);
                if cli.verbose {
                    if let Some(d) = diff {
                        println!("{}", d);
                    }
                }
                failed += 1;
            }
        }

        report.push(TestReportEntry {
            name: test.name.clone(),
            passed: matches!(result, TestResult::Passed),
            expected,
            actual,
        });
    }

    println!();
    println!(
        "Results: {} passed, {} failed",
        passed.to_string().green(),
        failed.to_string().red()
    );

    if let Some(report_path) = &cli.report {
        if let Err(e) = report.generate(report_path) {
            eprintln!("{} failed to write report: {}", "error:".red().bold(), e);
        } else {
            println!("Report written to {}", report_path.display());
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn find_tests_dir() -> PathBuf {
    let candidates = [
        PathBuf::from("test-data"),
        PathBuf::from("csema-test/test-data"),
        PathBuf::from("../test-data"),
    ];
    for candidate in &candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }
    PathBuf::from("test-data")
}

fn discover_tests(tests_dir: &Path, filter: Option<&str>) -> Vec<TestCase> {
    let mut tests = Vec::new();

    for entry in WalkDir::new(tests_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".ast.json"))
    {
        let ast_path = entry.path().to_path_buf();
        let name = ast_path
            .strip_prefix(tests_dir)
            .unwrap_or(&ast_path)
            .to_string_lossy()
            .trim_end_matches(".ast.json")
            .replace(std::path::MAIN_SEPARATOR, "/");

        if let Some(f) = filter {
            if !name.contains(f) {
                continue;
            }
        }

        let base = ast_path.to_string_lossy();
        let base = base.trim_end_matches(".ast.json");
        let pkgs_path = PathBuf::from(format!("{base}.pkgs.json"));
        let expected_path = PathBuf::from(format!("{base}.diagnostics.json"));

        tests.push(TestCase {
            name,
            ast_path,
            pkgs_path: pkgs_path.exists().then_some(pkgs_path),
            expected_path: expected_path.exists().then_some(expected_path),
        });
    }

    tests.sort_by(|a, b| a.name.cmp(&b.name));
    tests
}

fn run_test(test: &TestCase, update: bool) -> (TestResult, Vec<String>, Vec<String>) {
    let ast_json = match fs::read_to_string(&test.ast_path) {
        Ok(s) => s,
        Err(e) => {
            let message = format!("failed to read AST fixture: {e}");
            return (TestResult::Failed { message, diff: None }, vec![], vec![]);
        }
    };
    let file: csema_core::ast::File = match serde_json::from_str(&ast_json) {
        Ok(f) => f,
        Err(e) => {
            let message = format!("failed to parse AST JSON: {e}");
            return (TestResult::Failed { message, diff: None }, vec![], vec![]);
        }
    };
    let pkgs = match &test.pkgs_path {
        Some(path) => match fs::read_to_string(path).ok().and_then(|s| serde_json::from_str(&s).ok()) {
            Some(pkgs) => pkgs,
            None => {
                let message = "failed to load package map fixture".to_string();
                return (TestResult::Failed { message, diff: None }, vec![], vec![]);
            }
        },
        None => PackageMap::new(),
    };

    let (_, diags) = csema_core::analyse_file(&file, &pkgs);
    let mut actual: Vec<ExpectedDiagnostic> = diags
        .iter()
        .map(|d| ExpectedDiagnostic {
            severity: d.severity.as_str().to_string(),
            code: d.code.clone(),
        })
        .collect();
    actual.sort();

    let actual_lines: Vec<String> = actual.iter().map(describe).collect();

    if update {
        let json = serde_json::to_string_pretty(&actual).unwrap_or_default();
        let expected_path = test.expected_path.clone().unwrap_or_else(|| {
            let base = test.ast_path.to_string_lossy();
            let base = base.trim_end_matches(".ast.json");
            PathBuf::from(format!("{base}.diagnostics.json"))
        });
        if let Err(e) = fs::write(&expected_path, json) {
            let message = format!("failed to update expected fixture: {e}");
            return (TestResult::Failed { message, diff: None }, vec![], actual_lines);
        }
        return (TestResult::Passed, actual_lines.clone(), actual_lines);
    }

    let expected: Vec<ExpectedDiagnostic> = match &test.expected_path {
        Some(path) => match fs::read_to_string(path).ok().and_then(|s| serde_json::from_str(&s).ok()) {
            Some(v) => v,
            None => {
                let message = "failed to load expected diagnostics fixture".to_string();
                return (TestResult::Failed { message, diff: None }, vec![], actual_lines);
            }
        },
        None => Vec::new(),
    };
    let mut expected = expected;
    expected.sort();
    let expected_lines: Vec<String> = expected.iter().map(describe).collect();

    if expected == actual {
        (TestResult::Passed, expected_lines, actual_lines)
    } else {
        let diff = generate_diff(&expected_lines.join("\n"), &actual_lines.join("\n"));
        (
            TestResult::Failed {
                message: "diagnostics mismatch".to_string(),
                diff: Some(diff),
            },
            expected_lines,
            actual_lines,
        )
    }
}

fn describe(d: &ExpectedDiagnostic) -> String {
    match &d.code {
        Some(code) => format!("{}[{}]", d.severity, code),
        None => d.severity.clone(),
    }
}

fn generate_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut result = String::new();
    result.push_str("       --- expected\n");
    result.push_str("       +++ actual\n");
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        result.push_str(&format!("       {}{}", sign, change));
    }
    result
}
