//! Dev command - supervises a serve process with auto-restart
//!
//! Spawns `ember serve` as a child, polls an mtime watch list once per tick,
//! and restarts the child when a watched file changes or the child exits
//! unexpectedly. Ctrl+C tears the child down gracefully.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::console;
use crate::supervise::{ServeCommand, Supervisor, SupervisorConfig, SystemReclaimer};
use crate::watch::MtimeWatcher;

pub fn execute(port: u16, root: PathBuf, watch: Vec<PathBuf>) -> Result<()> {
    let program = std::env::current_exe().context("failed to locate the ember binary")?;

    // With no explicit watch list, watch the binary itself: a rebuild of the
    // harness is the one source change the child cannot observe on its own.
    let watch_list = if watch.is_empty() {
        vec![program.clone()]
    } else {
        watch
    };
    console::dev_banner(port, &watch_list);

    let mut watcher = MtimeWatcher::new(watch_list);
    watcher.scan();

    let config = SupervisorConfig {
        port,
        ..Default::default()
    };
    let tick_interval = config.tick_interval;
    let control = ServeCommand::new(program, port, root);
    let mut supervisor = Supervisor::new(control, SystemReclaimer, watcher, config);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("failed to install signal handler")?;
    }

    // A failed first spawn is fatal; later failures are retried per tick.
    supervisor
        .start()
        .context("failed to start server process")?;

    while running.load(Ordering::SeqCst) {
        thread::sleep(tick_interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }
        supervisor.tick();
    }

    println!("\n{} Shutting down", "→".cyan().bold());
    supervisor.shutdown();
    println!("{} Supervisor stopped", "✓".green().bold());
    Ok(())
}
