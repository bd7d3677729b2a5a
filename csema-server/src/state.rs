// Project state and cache types
//
// Core data structures for tracking analysis state across a watched
// directory of already-parsed sources.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use csema_core::ast::File as AstFile;
use csema_core::pkgs::PackageMap;
use csema_core::Diagnostics;
use tokio::sync::RwLock;

/// Shared state wrapper for async access
pub type SharedState = Arc<RwLock<ProjectState>>;

/// Daemon-wide analysis state for one watched project directory.
pub struct ProjectState {
    /// Project root directory
    pub root: PathBuf,
    /// Path to the package map JSON, if one was configured
    pub pkgs_path: Option<PathBuf>,
    /// Currently loaded package map (empty if none configured)
    pub pkgs: PackageMap,
    /// Per-file analysis cache, keyed by the JSON AST file's path
    pub files: HashMap<PathBuf, FileCacheEntry>,
    /// Generation counter, bumped on every rebuild
    pub generation: u64,
    /// Whether the initial full build has completed
    pub initialized: bool,
}

impl ProjectState {
    pub fn new(root: PathBuf, pkgs_path: Option<PathBuf>) -> Self {
        Self {
            root,
            pkgs_path,
            pkgs: PackageMap::new(),
            files: HashMap::new(),
            generation: 0,
            initialized: false,
        }
    }

    /// Total error count across every cached file.
    pub fn error_count(&self) -> usize {
        self.files.values().map(|e| e.diagnostics.error_count()).sum()
    }

    /// Total warning count across every cached file.
    pub fn warning_count(&self) -> usize {
        self.files.values().map(|e| e.diagnostics.warning_count()).sum()
    }
}

/// Cached analysis result for a single file.
pub struct FileCacheEntry {
    /// The analysed AST, kept around for the `/ast` inspection endpoint
    pub file: AstFile,
    /// Diagnostics from the most recent analysis
    pub diagnostics: Diagnostics,
    /// Hash of the raw JSON, for change detection
    pub content_hash: u64,
    /// Generation this entry was last (re)built in
    pub generation: u64,
}

/// Compute a hash of raw file content for change detection.
pub fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
