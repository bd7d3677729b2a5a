//! HTML report generator for the analyser test harness.
//!
//! Generates a static HTML file summarising every fixture: its expected vs.
//! actual diagnostics, and pass/fail status.

use std::fs;
use std::path::Path;

/// One fixture's outcome for the report.
#[derive(Debug)]
pub struct TestReportEntry {
    pub name: String,
    pub passed: bool,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
}

/// Collects fixture outcomes and renders them to a static HTML page.
pub struct HtmlReportGenerator {
    entries: Vec<TestReportEntry>,
}

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: TestReportEntry) {
        self.entries.push(entry);
    }

    pub fn generate(&self, output_path: &Path) -> Result<(), String> {
        let passed = self.entries.iter().filter(|e| e.passed).count();
        let total = self.entries.len();

        let mut body = String::new();
        for entry in &self.entries {
            let status_class = if entry.passed { "pass" } else { "fail" };
            let status_label = if entry.passed { "PASS" } else { "FAIL" };
            body.push_str(&format!(
                "<section class=\"case {status_class}\">\n  <h2>{} — {status_label}</h2>\n",
                html_escape(&entry.name)
            ));
            body.push_str("  <h3>expected</h3>\n  <ul>\n");
            for d in &entry.expected {
                body.push_str(&format!("    <li>{}</li>\n", html_escape(d)));
            }
            body.push_str("  </ul>\n  <h3>actual</h3>\n  <ul>\n");
            for d in &entry.actual {
                body.push_str(&format!("    <li>{}</li>\n", html_escape(d)));
            }
            body.push_str("  </ul>\n</section>\n");
        }

        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>analyser test report</title>\n<style>\n\
             body {{ font-family: sans-serif; margin: 2rem; }}\n\
             .case {{ border: 1px solid #ccc; border-radius: 4px; padding: 0.75rem 1rem; margin-bottom: 1rem; }}\n\
             .case.pass h2 {{ color: #1a7f37; }}\n\
             .case.fail h2 {{ color: #cf222e; }}\n\
             </style>\n</head>\n<body>\n<h1>{passed} / {total} fixtures passed</h1>\n{body}</body>\n</html>\n"
        );

        fs::write(output_path, html).map_err(|e| e.to_string())
    }
}

impl Default for HtmlReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
