//! Real process controller: spawns `ember serve` as a child process
//!
//! The child's stdout and stderr are piped and forwarded line-by-line to the
//! operator console by detached reader threads; draining the pipes
//! continuously keeps the child from blocking on a full pipe buffer.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use super::{ChildProcess, ProcessControl, SpawnError};

/// Spawns the `serve` subcommand of a given ember binary.
pub struct ServeCommand {
    program: PathBuf,
    port: u16,
    root: PathBuf,
}

impl ServeCommand {
    pub fn new(program: PathBuf, port: u16, root: PathBuf) -> Self {
        Self {
            program,
            port,
            root,
        }
    }
}

impl ProcessControl for ServeCommand {
    type Child = ServeChild;

    fn spawn(&mut self) -> Result<ServeChild, SpawnError> {
        let mut inner = Command::new(&self.program)
            .arg("serve")
            .arg("--port")
            .arg(self.port.to_string())
            .arg("--root")
            .arg(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        forward_output(&mut inner);
        Ok(ServeChild { inner })
    }
}

/// A spawned server process owned by the supervisor.
pub struct ServeChild {
    inner: Child,
}

impl ChildProcess for ServeChild {
    fn pid(&self) -> u32 {
        self.inner.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.inner.try_wait(), Ok(None))
    }

    fn signal_graceful(&mut self) -> anyhow::Result<()> {
        kill(Pid::from_raw(self.inner.id() as i32), Signal::SIGTERM)?;
        Ok(())
    }

    fn signal_force(&mut self) -> anyhow::Result<()> {
        self.inner.kill()?;
        Ok(())
    }

    fn wait(&mut self, timeout: Duration) -> anyhow::Result<bool> {
        Ok(self.inner.wait_timeout(timeout)?.is_some())
    }
}

fn forward_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        thread::spawn(move || forward_lines(stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        thread::spawn(move || forward_lines(stderr));
    }
}

fn forward_lines(stream: impl Read) {
    for line in BufReader::new(stream).lines().map_while(Result::ok) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_maps_to_spawn_error() {
        let mut control = ServeCommand::new(
            PathBuf::from("/nonexistent/ember-binary"),
            8080,
            PathBuf::from("."),
        );
        assert!(control.spawn().is_err());
    }

    #[test]
    fn test_child_lifecycle_with_real_process() {
        // A shell standing in for the server: stays up until signaled.
        let inner = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        let mut child = ServeChild { inner };

        assert!(child.is_alive());
        child.signal_graceful().unwrap();
        assert!(child.wait(Duration::from_secs(5)).unwrap());
        assert!(!child.is_alive());
    }

    #[test]
    fn test_force_kill_reaps() {
        let inner = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        let mut child = ServeChild { inner };

        child.signal_force().unwrap();
        assert!(child.wait(Duration::from_secs(5)).unwrap());
    }
}
