//! Kill-on-timeout watchdog for spawned processes.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{error, warn};

/// Watchdog that force-kills a process group if it outlives its timeout.
///
/// The runner spawns every command as the leader of a fresh process group,
/// so the kill reaches the shell and anything it forked, not just the shell
/// itself. Armed right after spawn and disarmed once the wait completes.
/// Dropping an armed watchdog performs the same release, so the timer
/// thread never outlives the command invocation even when an error
/// propagates out of the caller with `?`.
pub struct Watchdog {
    cancel: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<bool>>,
}

impl Watchdog {
    /// Arm a watchdog for the process group led by `pgid`.
    ///
    /// The timer thread blocks until either the timeout elapses or the
    /// watchdog is disarmed. On timeout it logs the display command and
    /// SIGKILLs the whole group; the caller's wait then observes the
    /// killed leader's exit status.
    pub fn arm(pgid: u32, display_cmd: String, timeout: Duration) -> Self {
        let (cancel, armed) = mpsc::channel();

        let handle = thread::spawn(move || match armed.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                // The leader may have been reaped while the timer lapsed;
                // honor a cancellation that raced the timeout.
                if armed.try_recv().is_ok() {
                    return false;
                }
                error!(
                    command = %display_cmd,
                    timeout_secs = timeout.as_secs(),
                    "local command over timeout, killing"
                );
                if let Err(e) = kill(Pid::from_raw(-(pgid as i32)), Signal::SIGKILL) {
                    warn!(
                        command = %display_cmd,
                        error = %e,
                        "failed to kill timed-out process group"
                    );
                }
                true
            }
            // Disarmed, or the sender was dropped.
            _ => false,
        });

        Self {
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// Cancel the timer, wait for the thread to exit, and report whether
    /// the timeout fired before cancellation.
    pub fn disarm(mut self) -> bool {
        self.release().unwrap_or(false)
    }

    fn release(&mut self) -> Option<bool> {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.handle.take().map(|h| h.join().unwrap_or(false))
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::CommandExt;
    use std::process::{Child, Command, Stdio};
    use std::time::Instant;

    /// Spawn a child leading its own process group, as the runner does.
    fn spawn_group(program: &str, args: &[&str]) -> Child {
        Command::new(program)
            .args(args)
            .process_group(0)
            .stdout(Stdio::null())
            .spawn()
            .unwrap()
    }

    #[test]
    fn test_watchdog_kills_group_on_timeout() {
        let mut child = spawn_group("sleep", &["30"]);

        let watchdog = Watchdog::arm(child.id(), "sleep 30".to_string(), Duration::from_millis(200));
        let status = child.wait().unwrap();
        let fired = watchdog.disarm();

        assert!(fired);
        assert!(!status.success());
    }

    #[test]
    fn test_disarm_cancels_promptly() {
        let mut child = spawn_group("true", &[]);
        let pgid = child.id();
        child.wait().unwrap();

        let start = Instant::now();
        let watchdog = Watchdog::arm(pgid, "true".to_string(), Duration::from_secs(30));
        let fired = watchdog.disarm();

        assert!(!fired);
        // Disarm must not wait out the 30s timer.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_drop_releases_timer() {
        let mut child = spawn_group("true", &[]);
        let pgid = child.id();
        child.wait().unwrap();

        let start = Instant::now();
        {
            let _watchdog = Watchdog::arm(pgid, "true".to_string(), Duration::from_secs(30));
        }
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
