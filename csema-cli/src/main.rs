// csemac: command-line driver for the semantic analyser.
//
// Parsing is out of scope for the analyser itself, so this driver consumes
// already-parsed input: each source path is a JSON-serialised `ast::File`
// (whatever upstream parser produced it). An optional package map, also
// JSON, supplies the cross-package symbol table; omitting it analyses each
// file as if it were the only package in the build.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use csema_core::ast::File as AstFile;
use csema_core::diagnostic::Severity;
use csema_core::pkgs::PackageMap;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csemac")]
#[command(about = "Semantic analyser for already-parsed sources", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON-encoded `ast::File` values to analyse.
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// JSON-encoded `PackageMap` describing sibling packages.
    #[arg(long, value_name = "PKGS")]
    pkgs: Option<PathBuf>,

    /// Emit diagnostics as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv); overridden by RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let pkgs = match &cli.pkgs {
        Some(path) => load_pkgs(path)?,
        None => PackageMap::new(),
    };

    let mut had_errors = false;
    for path in &cli.inputs {
        let file = load_file(path)?;
        let (_, diags) = csema_core::analyse_file(&file, &pkgs);
        had_errors |= diags.has_errors();

        if cli.json {
            let rendered: Vec<_> = diags.iter().collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        } else {
            for diag in diags.iter() {
                print_diagnostic(&file.name, diag);
            }
            if diags.is_empty() {
                println!("{}: ok", path.display());
            }
        }
    }

    if had_errors {
        anyhow::bail!("analysis reported errors");
    }
    Ok(())
}

fn print_diagnostic(file_name: &str, diag: &csema_core::Diagnostic) {
    let level = match diag.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::Hint => "hint",
    };
    let code = diag.code.as_deref().unwrap_or("----");
    println!(
        "{file_name}:{}: {level}[{code}]: {}",
        diag.span.start, diag.message
    );
}

fn load_file(path: &PathBuf) -> Result<AstFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse AST JSON: {}", path.display()))
}

fn load_pkgs(path: &PathBuf) -> Result<PackageMap> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read package map: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse package map JSON: {}", path.display()))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("csema_core={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
