//! Process management utilities for local handler processes.
//!
//! The bound-command path spawns a handler process, blocks until it exits,
//! and must still run the leave step when the user interrupts the command.
//! This module provides the signal plumbing and the small amount of libc
//! needed for that: an interrupt flag fed by SIGINT/SIGTERM, liveness
//! checks, and graceful stop with a SIGKILL fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Flag indicating whether the interrupt handler has been installed.
static INTERRUPT_HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Set by the signal handler when SIGINT or SIGTERM arrives.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Poll interval while waiting on a handler process.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default timeout for graceful shutdown before SIGKILL.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a handler that records SIGINT/SIGTERM in [`interrupted`].
///
/// The handler is only installed once; subsequent calls are no-ops. The
/// handler itself only stores to an atomic, which is async-signal-safe.
pub fn install_interrupt_handler() {
    if INTERRUPT_HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = interrupt_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);

        let mut failed = false;
        for sig in [libc::SIGINT, libc::SIGTERM] {
            if libc::sigaction(sig, &sa, std::ptr::null_mut()) != 0 {
                failed = true;
            }
        }
        if failed {
            INTERRUPT_HANDLER_INSTALLED.store(false, Ordering::SeqCst);
            tracing::warn!("failed to install interrupt handler");
        } else {
            tracing::debug!("installed interrupt handler");
        }
    }
}

extern "C" fn interrupt_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// True once SIGINT or SIGTERM has been observed.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Check if a process is alive.
pub fn is_alive(pid: libc::pid_t) -> bool {
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Send SIGTERM to a process.
///
/// Returns true if the signal was sent successfully.
pub fn terminate(pid: libc::pid_t) -> bool {
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

/// Send SIGKILL to a process.
///
/// Returns true if the signal was sent successfully.
pub fn kill(pid: libc::pid_t) -> bool {
    unsafe { libc::kill(pid, libc::SIGKILL) == 0 }
}

/// Stop a process: SIGTERM, wait up to `timeout`, then SIGKILL if
/// `force` is set and the process is still alive.
///
/// Returns true if the process is gone when this returns.
pub fn stop_process(pid: libc::pid_t, timeout: Duration, force: bool) -> bool {
    if !is_alive(pid) {
        return true;
    }

    terminate(pid);

    let start = Instant::now();
    while start.elapsed() < timeout {
        if !is_alive(pid) {
            return true;
        }
        std::thread::sleep(WAIT_POLL_INTERVAL);
    }

    if force {
        tracing::debug!(pid, "process did not stop gracefully, sending SIGKILL");
        kill(pid);
        std::thread::sleep(WAIT_POLL_INTERVAL);
        return !is_alive(pid);
    }

    false
}

/// Wait for a child process to exit or for an interrupt to arrive.
///
/// On interrupt the child is stopped (SIGTERM, then SIGKILL) before this
/// returns, so the caller can proceed straight to its cleanup step.
/// Returns the exit code, or `None` when the wait ended in an interrupt.
pub fn wait_child(child: &mut std::process::Child) -> std::io::Result<Option<i32>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        if interrupted() {
            let pid = child.id() as libc::pid_t;
            tracing::debug!(pid, "interrupt observed, stopping handler process");
            terminate(pid);
            let deadline = Instant::now() + DEFAULT_STOP_TIMEOUT;
            while child.try_wait()?.is_none() {
                if Instant::now() >= deadline {
                    kill(pid);
                    break;
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            // Reap the child so it doesn't linger as a zombie.
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(WAIT_POLL_INTERVAL);
    }
}
