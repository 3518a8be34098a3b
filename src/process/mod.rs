//! Process liveness probing
//!
//! Shared by the port reclaimer and the supervisor's system backend.

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

/// Check whether a process with the given PID exists.
///
/// Sends the null signal (signal 0), which delivers nothing but still runs
/// the kernel's existence and permission checks. `EPERM` means the process
/// exists but belongs to someone else, so it counts as alive; `ESRCH` means
/// it is gone.
pub fn is_process_alive(pid: u32) -> bool {
    let pid = match i32::try_from(pid) {
        Ok(v) => v,
        Err(_) => return false,
    };

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}
