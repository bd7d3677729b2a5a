// csema-server: always-on watch-and-serve daemon.
//
// Watches a directory of already-parsed sources (JSON-encoded `ast::File`
// values) plus a JSON package map, re-running the seven-pass analysis on
// change and serving the resulting diagnostics over HTTP. Ambient-stack
// demonstration: not part of the analyser's tested core.

pub mod api;
pub mod compiler;
pub mod events;
pub mod server;
pub mod state;
pub mod watcher;

pub use events::AnalysisEvent;
pub use state::{ProjectState, SharedState};
