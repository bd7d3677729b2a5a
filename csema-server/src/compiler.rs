// Analysis driving logic
//
// Handles full builds and single-file incremental re-analysis, the way the
// original always-compiled daemon drove `frel_compiler_core`'s pipeline —
// except there is no parsing or codegen step here, only `analyse_file`.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use csema_core::pkgs::PackageMap;
use tracing::warn;

use crate::state::{hash_content, FileCacheEntry, ProjectState};

/// Result of a full build
pub struct BuildResult {
    pub duration: Duration,
    pub files_analysed: usize,
    pub error_count: usize,
}

/// Result of re-analysing a single file after a change
pub struct IncrementalResult {
    pub duration: Duration,
    pub path: Option<std::path::PathBuf>,
    pub error_count: usize,
}

/// Perform a full build: discover every `*.ast.json` file, load the package
/// map (if configured), and analyse each file against it.
pub fn full_build(state: &mut ProjectState) -> BuildResult {
    let start = Instant::now();

    if let Some(pkgs_path) = state.pkgs_path.clone() {
        state.pkgs = load_pkgs(&pkgs_path).unwrap_or_else(|e| {
            warn!(error = %e, path = %pkgs_path.display(), "failed to load package map");
            PackageMap::new()
        });
    }

    let files = discover_ast_files(&state.root);
    state.generation += 1;
    for path in &files {
        analyse_one(state, &path);
    }

    state.initialized = true;
    let error_count = state.error_count();

    BuildResult {
        duration: start.elapsed(),
        files_analysed: files.len(),
        error_count,
    }
}

/// Handle a file-system change notification for one JSON AST file.
pub fn handle_file_change(state: &mut ProjectState, path: &Path) -> IncrementalResult {
    let start = Instant::now();

    if Some(path.to_path_buf()) == state.pkgs_path {
        state.pkgs = load_pkgs(path).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "failed to reload package map");
            state.pkgs.clone()
        });
        state.generation += 1;
        return IncrementalResult {
            duration: start.elapsed(),
            path: None,
            error_count: state.error_count(),
        };
    }

    let path_buf = path.to_path_buf();
    if !path.exists() {
        state.files.remove(&path_buf);
        return IncrementalResult {
            duration: start.elapsed(),
            path: Some(path_buf),
            error_count: state.error_count(),
        };
    }

    state.generation += 1;
    analyse_one(state, &path_buf);

    IncrementalResult {
        duration: start.elapsed(),
        path: Some(path_buf),
        error_count: state.error_count(),
    }
}

/// Load, parse, and analyse a single JSON AST file, caching the result
/// unless its content hash is unchanged since the last run.
fn analyse_one(state: &mut ProjectState, path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read AST file");
            return;
        }
    };
    let hash = hash_content(&contents);
    if let Some(existing) = state.files.get(path) {
        if existing.content_hash == hash {
            return;
        }
    }

    let file: csema_core::ast::File = match serde_json::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to parse AST JSON");
            return;
        }
    };

    let (_, diagnostics) = csema_core::analyse_file(&file, &state.pkgs);
    state.files.insert(
        path.to_path_buf(),
        FileCacheEntry {
            file,
            diagnostics,
            content_hash: hash,
            generation: state.generation,
        },
    );
}

fn load_pkgs(path: &Path) -> anyhow::Result<PackageMap> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Discover every JSON AST file under a directory.
pub fn discover_ast_files(root: &Path) -> Vec<std::path::PathBuf> {
    let pattern = root.join("**/*.ast.json");
    let pattern_str = pattern.display().to_string();

    glob::glob(&pattern_str)
        .map(|paths| paths.filter_map(Result::ok).collect())
        .unwrap_or_default()
}
