// src/lib.rs

pub mod cli;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod manager;
pub mod server;
pub mod snapshot;
pub mod store;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::CliArgs;
use crate::manager::Manager;
use crate::server::Server;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - storage directory resolution (flag, env var, or cwd)
/// - the graph manager
/// - the MCP server loop over stdin/stdout
pub async fn run(args: CliArgs) -> Result<()> {
    let dir = resolve_storage_dir(&args);
    let manager = Manager::new(&dir)?;
    let server = Server::new(manager);

    info!(dir = %dir.display(), "trellis MCP server starting");
    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}

/// Figure out where named graphs live.
///
/// - `--dir` wins when provided.
/// - Otherwise a non-empty `TRELLIS_GRAPH_DIR` environment variable.
/// - Otherwise the current working directory.
fn resolve_storage_dir(args: &CliArgs) -> PathBuf {
    if let Some(dir) = &args.dir {
        return PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("TRELLIS_GRAPH_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
