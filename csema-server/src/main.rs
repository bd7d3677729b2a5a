// csema-server CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use csema_server::state::ProjectState;
use csema_server::{compiler, server, watcher};

#[derive(Parser)]
#[command(name = "csema-server")]
#[command(about = "Semantic analyser watch daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory to watch for `*.ast.json` files
    #[arg(default_value = ".")]
    project: PathBuf,

    /// JSON-encoded `PackageMap` describing sibling packages
    #[arg(long)]
    pkgs: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Run one full analysis pass and exit (for CI/scripts)
    #[arg(long)]
    once: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let project_root = cli.project.canonicalize().unwrap_or(cli.project.clone());
    let pkgs_path = cli.pkgs.clone();

    tracing::info!(project = %project_root.display(), "starting analysis daemon");

    let state = Arc::new(RwLock::new(ProjectState::new(project_root.clone(), pkgs_path)));

    let build_result = {
        let mut state = state.write().await;
        compiler::full_build(&mut state)
    };
    tracing::info!(
        duration = ?build_result.duration,
        files = build_result.files_analysed,
        errors = build_result.error_count,
        "initial build complete"
    );

    if cli.once {
        std::process::exit(if build_result.error_count > 0 { 1 } else { 0 });
    }

    let watcher_state = state.clone();
    let watcher_root = project_root.clone();
    actix_rt::spawn(async move {
        if let Err(e) = watcher::run_watcher(watcher_state, watcher_root).await {
            tracing::error!(error = %e, "file watcher stopped");
        }
    });

    tracing::info!(port = cli.port, "listening");
    server::run_server(state, cli.port)?.await?;

    Ok(())
}
