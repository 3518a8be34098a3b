//! Serve command - runs the development HTTP server in the foreground
//!
//! This is the process the supervisor spawns and restarts; it can also be
//! run standalone when supervision is not wanted.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::{port, server};

pub fn execute(port: u16, root: PathBuf) -> Result<()> {
    init_tracing();

    // Evict whatever holds the port before binding. Best-effort: the bind
    // inside `server::run` is the authoritative check.
    port::reclaim(port);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server::run(port, root))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ember=info,tower_http=info".into()),
        )
        .init();
}
