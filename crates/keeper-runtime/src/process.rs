//! Signal-based freezing of a task's init process.
//!
//! On Linux a task is paused with `SIGSTOP` and resumed with `SIGCONT`.
//! Other platforms only track the state transition.

use keeper_common::error::Result;

/// Stops scheduling of the process.
///
/// # Errors
///
/// Returns an error if the signal cannot be delivered.
#[cfg(target_os = "linux")]
pub fn freeze(pid: u32) -> Result<()> {
    send(pid, Some(nix::sys::signal::Signal::SIGSTOP))
}

/// Resumes scheduling of a stopped process.
///
/// # Errors
///
/// Returns an error if the signal cannot be delivered.
#[cfg(target_os = "linux")]
pub fn thaw(pid: u32) -> Result<()> {
    send(pid, Some(nix::sys::signal::Signal::SIGCONT))
}

/// Returns whether a process with this PID exists.
#[cfg(target_os = "linux")]
pub fn is_alive(pid: u32) -> bool {
    send(pid, None).is_ok()
}

#[cfg(target_os = "linux")]
fn send(pid: u32, signal: Option<nix::sys::signal::Signal>) -> Result<()> {
    use keeper_common::error::KeeperError;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Pid 0 addresses the caller's own process group.
    if pid == 0 {
        return Err(KeeperError::Runtime {
            message: "pid 0 does not name a single process".into(),
        });
    }
    let raw = i32::try_from(pid).map_err(|_| KeeperError::Runtime {
        message: format!("pid {pid} out of range"),
    })?;
    kill(Pid::from_raw(raw), signal).map_err(|e| KeeperError::Runtime {
        message: format!("signal {signal:?} to pid {pid}: {e}"),
    })?;
    tracing::debug!(pid, ?signal, "signal delivered");
    Ok(())
}

/// Stops scheduling of the process.
///
/// # Errors
///
/// Returns `Ok(())` unconditionally on non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn freeze(pid: u32) -> Result<()> {
    tracing::debug!(pid, "freeze is a state-only transition on this platform");
    Ok(())
}

/// Resumes scheduling of a stopped process.
///
/// # Errors
///
/// Returns `Ok(())` unconditionally on non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn thaw(pid: u32) -> Result<()> {
    tracing::debug!(pid, "thaw is a state-only transition on this platform");
    Ok(())
}

/// Returns whether a process with this PID exists.
#[cfg(not(target_os = "linux"))]
pub const fn is_alive(pid: u32) -> bool {
    pid != 0
}
