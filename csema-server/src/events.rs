// Compilation events for SSE/WebSocket notifications

use serde::Serialize;

/// Events broadcast to connected clients
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Full-project build started
    BuildStarted { files: usize },
    /// Full-project build completed
    BuildCompleted {
        duration_ms: u64,
        files_analysed: usize,
        error_count: usize,
    },
    /// A watched file changed on disk
    FileChanged { path: String },
    /// A single file finished re-analysis
    FileAnalysed {
        path: String,
        error_count: usize,
        warning_count: usize,
    },
    /// A watched file was removed
    FileRemoved { path: String },
}
