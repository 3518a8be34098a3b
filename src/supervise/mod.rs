//! Process supervision for the development server
//!
//! The supervisor owns exactly one child server process and drives it
//! through `{Stopped, Starting, Running, Stopping}`. Each tick checks the
//! mtime watcher and then child liveness; either signal triggers the same
//! restart path (stop, reclaim the port, respawn), at most once per tick.
//! The state machine depends only on injected process-control and
//! port-reclaim capabilities so it can be tested without real subprocesses.

pub mod child;

pub use child::ServeCommand;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use crate::console::timestamp;
use crate::port::ReclaimOutcome;
use crate::watch::MtimeWatcher;

/// Lifecycle state of the supervised process. Only the supervisor writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Spawning the server process failed. Fatal at initial startup; on a later
/// restart it is reported and retried on the next tick.
#[derive(Debug, thiserror::Error)]
#[error("failed to spawn server process: {0}")]
pub struct SpawnError(#[from] pub std::io::Error);

/// A live child under supervision.
pub trait ChildProcess {
    fn pid(&self) -> u32;
    /// Non-blocking liveness check.
    fn is_alive(&mut self) -> bool;
    /// Request graceful termination (SIGTERM on the real backend).
    fn signal_graceful(&mut self) -> Result<()>;
    /// Force termination (SIGKILL on the real backend).
    fn signal_force(&mut self) -> Result<()>;
    /// Wait up to `timeout` for exit; `true` if the child exited.
    fn wait(&mut self, timeout: Duration) -> Result<bool>;
}

/// Capability to create child processes.
pub trait ProcessControl {
    type Child: ChildProcess;
    fn spawn(&mut self) -> Result<Self::Child, SpawnError>;
}

/// Capability to evict foreign listeners from the target port.
pub trait PortReclaimer {
    fn reclaim(&mut self, port: u16) -> ReclaimOutcome;
}

/// Real reclaimer backed by [`crate::port::reclaim`].
pub struct SystemReclaimer;

impl PortReclaimer for SystemReclaimer {
    fn reclaim(&mut self, port: u16) -> ReclaimOutcome {
        crate::port::reclaim(port)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    /// Port the child binds; reclaimed before every spawn.
    pub port: u16,
    /// Poll-loop granularity.
    pub tick_interval: Duration,
    /// Bound on the graceful-exit wait before force-killing the child.
    pub shutdown_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_PORT,
            tick_interval: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do; child healthy, no watched file changed.
    Idle,
    Restarted(RestartReason),
    /// A restart was warranted but the spawn failed; retried next tick.
    RestartFailed(RestartReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    FilesChanged(Vec<PathBuf>),
    ChildExited,
}

pub struct Supervisor<C: ProcessControl, R: PortReclaimer> {
    control: C,
    reclaimer: R,
    watcher: MtimeWatcher,
    config: SupervisorConfig,
    child: Option<C::Child>,
    state: ProcessState,
    ever_started: bool,
}

impl<C: ProcessControl, R: PortReclaimer> Supervisor<C, R> {
    pub fn new(control: C, reclaimer: R, watcher: MtimeWatcher, config: SupervisorConfig) -> Self {
        Self {
            control,
            reclaimer,
            watcher,
            config,
            child: None,
            state: ProcessState::Stopped,
            ever_started: false,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Whether a child was ever spawned successfully. Decides the exit code.
    pub fn ever_started(&self) -> bool {
        self.ever_started
    }

    /// (Re)start the child: stop any previous one, reclaim the port, spawn.
    ///
    /// The previous child is confirmed terminated before the new spawn, so
    /// at most one child is ever live.
    pub fn start(&mut self) -> Result<(), SpawnError> {
        self.stop_child();
        self.reclaimer.reclaim(self.config.port);

        self.state = ProcessState::Starting;
        match self.control.spawn() {
            Ok(child) => {
                println!(
                    "{} Server process started (pid {})",
                    "✓".green().bold(),
                    child.pid()
                );
                self.child = Some(child);
                self.state = ProcessState::Running;
                self.ever_started = true;
                Ok(())
            }
            Err(e) => {
                self.state = ProcessState::Stopped;
                Err(e)
            }
        }
    }

    /// One supervision tick: file-change check, then liveness check.
    /// Performs at most one restart attempt.
    pub fn tick(&mut self) -> Tick {
        let changed = self.watcher.check();
        if !changed.is_empty() {
            let names: Vec<String> = changed.iter().map(|p| p.display().to_string()).collect();
            println!(
                "{}",
                format!("[{}] Files changed: {}", timestamp(), names.join(", ")).yellow()
            );
            println!("{}", "Restarting server...".yellow());
            return self.restart(RestartReason::FilesChanged(changed));
        }

        let alive = match self.child.as_mut() {
            Some(child) => child.is_alive(),
            None => false,
        };
        if !alive {
            println!(
                "{}",
                format!(
                    "[{}] Server process exited unexpectedly, restarting",
                    timestamp()
                )
                .red()
            );
            return self.restart(RestartReason::ChildExited);
        }

        Tick::Idle
    }

    fn restart(&mut self, reason: RestartReason) -> Tick {
        match self.start() {
            Ok(()) => Tick::Restarted(reason),
            Err(e) => {
                eprintln!("{} {e}", "✗".red().bold());
                Tick::RestartFailed(reason)
            }
        }
    }

    /// Stop the child and leave the supervisor in `Stopped`.
    pub fn shutdown(&mut self) {
        self.stop_child();
    }

    /// Graceful termination with a bounded wait, then force-kill.
    /// Synchronous: returns only once the child is gone.
    fn stop_child(&mut self) {
        let Some(mut child) = self.child.take() else {
            self.state = ProcessState::Stopped;
            return;
        };

        self.state = ProcessState::Stopping;
        let _ = child.signal_graceful();

        let exited = child.wait(self.config.shutdown_grace).unwrap_or(false);
        if !exited {
            println!(
                "{}",
                format!("[{}] Server did not exit in time, force-killing", timestamp()).yellow()
            );
            let _ = child.signal_force();
            let _ = child.wait(Duration::from_secs(1));
        }

        self.state = ProcessState::Stopped;
    }
}
