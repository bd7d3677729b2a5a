//! Semantic analyser core.
//!
//! This crate does not parse source text: it consumes an already-built
//! [`ast::File`] (produced by some upstream parser) and runs the fixed
//! seven-pass analysis described in [`file_analyser`] — name resolution,
//! type canonicalisation, struct layout, variable/initialiser checking,
//! function prototype checking, and function body analysis — reporting
//! [`Diagnostic`]s for anything the program gets wrong, and surfacing
//! [`error::Error`] for anything the *caller* gets wrong (a malformed
//! package map, a foreign declaration handle).

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod expr_type_analyser;
pub mod file_analyser;
pub mod function_analyser;
pub mod ids;
pub mod pkgs;
pub mod scope;
pub mod source;
pub mod type_resolver;
pub mod types;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use file_analyser::{FileAnalyser, FileAnalysis};
pub use source::{LineIndex, Span};

/// Analyser version, exposed for `--version` output and diagnostic JSON envelopes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the full seven-pass analysis over one file against a resolved package
/// map, returning the per-function results alongside every diagnostic raised.
pub fn analyse_file(file: &ast::File, pkgs: &pkgs::PackageMap) -> (FileAnalysis, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut analyser = FileAnalyser::new(file, pkgs);
    let analysis = analyser.analyse(&mut diags);
    (analysis, diags)
}
