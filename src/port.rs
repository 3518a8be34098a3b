//! Port reclamation
//!
//! Evicts whatever holds a TCP port before a new listener binds it.
//! Strictly best-effort: every discovery or signaling failure degrades to a
//! no-op, and the subsequent bind remains the authoritative check. Discovery
//! uses `lsof` when available and falls back to parsing `netstat` listening
//! tables when it is not.

use colored::Colorize;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use regex::Regex;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use crate::console::timestamp;
use crate::process::is_process_alive;

/// Upper bound on a discovery command; a hung tool must not block the tick.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace between SIGTERM and the liveness re-check.
const TERM_GRACE: Duration = Duration::from_millis(500);

/// Pause after any eviction so the kernel can release the socket.
const SOCKET_SETTLE: Duration = Duration::from_secs(1);

/// What a reclaim attempt did. Informational only; callers are free to
/// ignore it and let the bind decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimOutcome {
    /// Processes we tried to terminate.
    pub attempted: usize,
    /// Processes confirmed gone (or force-killed) afterwards.
    pub terminated: usize,
}

/// Evict any process currently listening on `port`. Never fails.
pub fn reclaim(port: u16) -> ReclaimOutcome {
    reclaim_with(&mut SystemPortOps, port)
}

/// OS surface used by the reclaimer, injectable for tests.
pub(crate) trait PortOps {
    /// PIDs currently listening on the port, excluding our own process.
    fn discover(&mut self, port: u16) -> Vec<u32>;
    /// Graceful termination signal. `false` if the signal was rejected
    /// (typically because the process already exited).
    fn signal_term(&mut self, pid: u32) -> bool;
    /// Forceful kill signal; errors ignored.
    fn signal_kill(&mut self, pid: u32);
    fn is_alive(&mut self, pid: u32) -> bool;
    fn pause(&mut self, duration: Duration);
}

pub(crate) fn reclaim_with(ops: &mut impl PortOps, port: u16) -> ReclaimOutcome {
    let mut outcome = ReclaimOutcome::default();

    for pid in ops.discover(port) {
        println!(
            "{}",
            format!("[{}] Evicting process {pid} holding port {port}", timestamp()).yellow()
        );
        outcome.attempted += 1;

        if !ops.signal_term(pid) {
            // Already gone between discovery and signaling; nothing evicted.
            continue;
        }

        ops.pause(TERM_GRACE);

        if ops.is_alive(pid) {
            println!(
                "{}",
                format!("[{}] Force-killing stubborn process {pid}", timestamp()).red()
            );
            ops.signal_kill(pid);
        }
        outcome.terminated += 1;
    }

    if outcome.terminated > 0 {
        println!(
            "{} Evicted {} process(es) from port {port}",
            "✓".green().bold(),
            outcome.terminated
        );
        ops.pause(SOCKET_SETTLE);
    }

    outcome
}

/// Real backend: lsof/netstat discovery plus POSIX signals.
struct SystemPortOps;

impl PortOps for SystemPortOps {
    fn discover(&mut self, port: u16) -> Vec<u32> {
        let pids = if which::which("lsof").is_ok() {
            discover_lsof(port)
        } else {
            discover_netstat(port)
        };

        let own = std::process::id();
        pids.into_iter().filter(|pid| *pid != own).collect()
    }

    fn signal_term(&mut self, pid: u32) -> bool {
        kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
    }

    fn signal_kill(&mut self, pid: u32) {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }

    fn is_alive(&mut self, pid: u32) -> bool {
        is_process_alive(pid)
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Primary discovery: `lsof -ti :<port>` prints one PID per line.
fn discover_lsof(port: u16) -> Vec<u32> {
    let mut cmd = Command::new("lsof");
    cmd.arg("-ti").arg(format!(":{port}"));

    let Some(stdout) = run_discovery(cmd) else {
        return Vec::new();
    };

    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect()
}

/// Fallback discovery: parse `netstat -tulpn` LISTEN lines for the port.
fn discover_netstat(port: u16) -> Vec<u32> {
    let mut cmd = Command::new("netstat");
    cmd.arg("-tulpn");

    let Some(stdout) = run_discovery(cmd) else {
        return Vec::new();
    };

    parse_netstat(&stdout, port)
}

/// Extract PIDs from netstat output for sockets listening on `port`.
///
/// The local-address column ends in `:<port>`, and the process column is
/// `<pid>/<name>` where the kernel exposes it.
fn parse_netstat(output: &str, port: u16) -> Vec<u32> {
    // Anchored so port 808 does not match :8080.
    let addr = Regex::new(&format!(r":{port}\s")).expect("static pattern");
    let proc_col = Regex::new(r"(?:^|\s)(\d+)/").expect("static pattern");

    let mut pids = Vec::new();
    for line in output.lines() {
        if !line.contains("LISTEN") || !addr.is_match(line) {
            continue;
        }
        if let Some(caps) = proc_col.captures(line) {
            if let Ok(pid) = caps[1].parse::<u32>() {
                pids.push(pid);
            }
        }
    }
    pids
}

/// Run a discovery command with a bounded wait, returning its stdout.
///
/// The pipe is drained on a separate thread before waiting so a chatty tool
/// cannot deadlock against a full pipe buffer. `None` on spawn failure,
/// non-zero exit (lsof reports "nothing found" that way), or timeout.
fn run_discovery(mut cmd: Command) -> Option<String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().ok()?;

    let (tx, rx) = mpsc::channel();
    if let Some(mut stdout) = child.stdout.take() {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout.read_to_string(&mut buf);
            let _ = tx.send(buf);
        });
    } else {
        let _ = tx.send(String::new());
    }

    match child.wait_timeout(DISCOVERY_TIMEOUT).ok()? {
        Some(status) if status.success() => rx.recv().ok(),
        Some(_) => None,
        None => {
            println!(
                "{}",
                format!("[{}] Port discovery timed out, skipping reclaim", timestamp()).yellow()
            );
            let _ = child.kill();
            let _ = child.wait();
            None
        }
    }
}
