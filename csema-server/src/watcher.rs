// File watching using the notify crate

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::compiler;
use crate::state::SharedState;

fn is_watched(path: &Path) -> bool {
    path.to_str().map(|s| s.ends_with(".ast.json")).unwrap_or(false)
}

/// Watch the project root recursively, re-analysing any `*.ast.json` file
/// (or reloading the package map) on change.
pub async fn run_watcher(state: SharedState, root: impl AsRef<Path>) -> Result<()> {
    let root = root.as_ref().to_path_buf();

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(100)),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), "watching for changes");

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(event) => {
                let mut paths: Vec<_> = event.paths.clone();
                while let Ok(more) = rx.recv_timeout(Duration::from_millis(50)) {
                    paths.extend(more.paths);
                }
                paths.retain(|p| is_watched(p) || Some(p.clone()) == state.read().await.pkgs_path);
                paths.sort();
                paths.dedup();

                for path in paths {
                    debug!(path = %path.display(), "file changed");
                    let result = {
                        let mut state = state.write().await;
                        compiler::handle_file_change(&mut state, &path)
                    };
                    if let Some(path) = result.path {
                        info!(
                            path = %path.display(),
                            duration = ?result.duration,
                            errors = result.error_count,
                            "re-analysed"
                        );
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("watcher channel disconnected, stopping");
                break;
            }
        }
    }

    Ok(())
}
