// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process-group termination and liveness checks.
//!
//! ```text
//! ProcessGroup::attach(pid, signal)      right after spawn
//!   Unix:    the child leads its own group (pgid == pid)
//!   Windows: the child is assigned to a JobObject(KILL_ON_JOB_CLOSE)
//!
//! terminate()
//!   Unix:    killpg(pgid, signal)    ESRCH --> already gone, Ok
//!   Windows: TerminateJobObject      empty job --> Ok
//!   anything else --> TeardownError::Signal
//! ```

use tracing::{debug, trace};

use crate::error::TeardownError;

#[cfg(windows)]
use super::job::JobObject;

/// Everything a spawned program started, as one killable unit.
pub(super) struct ProcessGroup {
    pgid: u32,
    #[cfg(unix)]
    signal: String,
    #[cfg(windows)]
    job: std::io::Result<JobObject>,
}

#[cfg(unix)]
impl ProcessGroup {
    /// Wraps the group led by `pid`, to be sent `signal` on teardown.
    ///
    /// An unknown signal name falls back to `SIGTERM`.
    pub(super) fn attach(pid: u32, signal: &str) -> Self {
        Self {
            pgid: pid,
            signal: signal.to_string(),
        }
    }

    /// Sends the teardown signal to every process in the group.
    pub(super) fn terminate(&self) -> Result<(), TeardownError> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        use std::str::FromStr;

        let signal = Signal::from_str(&self.signal).unwrap_or(Signal::SIGTERM);
        let raw = i32::try_from(self.pgid).map_err(|_| TeardownError::Failed {
            name: format!("process group {}", self.pgid),
            message: "process group id out of range".to_string(),
        })?;

        match killpg(Pid::from_raw(raw), signal) {
            Ok(()) => {
                debug!(pgid = raw, signal = signal.as_str(), "signalled process group");
                Ok(())
            }
            Err(Errno::ESRCH) => {
                trace!(pgid = raw, "process group already exited");
                Ok(())
            }
            Err(errno) => Err(TeardownError::Signal {
                pgid: raw,
                source: std::io::Error::from(errno),
            }),
        }
    }
}

#[cfg(windows)]
impl ProcessGroup {
    /// Puts `pid` into a fresh job object so its whole tree can be killed.
    ///
    /// Windows has no signals; `_signal` is ignored. A failure here is kept
    /// and reported when the group is terminated.
    pub(super) fn attach(pid: u32, _signal: &str) -> Self {
        let job = JobObject::new().and_then(|job| job.assign_pid(pid).map(|()| job));
        if let Err(e) = &job {
            tracing::warn!(pid, error = %e, "failed to place process in a job object");
        }
        Self { pgid: pid, job }
    }

    /// Terminates every process in the job.
    pub(super) fn terminate(&self) -> Result<(), TeardownError> {
        let pgid = i32::try_from(self.pgid).unwrap_or(i32::MAX);
        match &self.job {
            Ok(job) => {
                job.terminate(1)
                    .map_err(|source| TeardownError::Signal { pgid, source })?;
                debug!(pid = self.pgid, "terminated job object");
                Ok(())
            }
            Err(e) => {
                trace!(pid = self.pgid, "no job object to terminate");
                Err(TeardownError::Signal {
                    pgid,
                    source: std::io::Error::new(
                        e.kind(),
                        format!("process was never placed in a job object: {e}"),
                    ),
                })
            }
        }
    }
}

impl ProcessGroup {
    /// Id of the group (the leader's pid).
    pub(super) const fn id(&self) -> u32 {
        self.pgid
    }
}

/// Returns `true` if `pid` names a live process.
///
/// Zombies (exited but not yet reaped) count as not running.
#[must_use]
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => !is_zombie(pid),
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    // Field 3 of /proc/<pid>/stat is the state; the command name before it
    // is parenthesised and may itself contain spaces.
    std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
        stat.rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state == "Z" || state == "X")
    })
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(pid: u32) -> bool {
    std::process::Command::new("ps")
        .args(["-o", "stat=", "-p", &pid.to_string()])
        .output()
        .is_ok_and(|out| String::from_utf8_lossy(&out.stdout).trim_start().starts_with('Z'))
}

/// Returns `true` if `pid` names a process that has not exited.
///
/// A process we may not open (access denied) counts as running.
#[must_use]
#[cfg(windows)]
pub fn is_process_running(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows::core::HRESULT;

    const STILL_ACTIVE: u32 = 259;
    const ERROR_ACCESS_DENIED: u32 = 5;

    // SAFETY: the handle comes from OpenProcess, is only used for the query
    // and is closed before returning.
    unsafe {
        let process = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(process) => process,
            Err(e) => return e.code() == HRESULT::from_win32(ERROR_ACCESS_DENIED),
        };
        let mut code = 0u32;
        let alive = GetExitCodeProcess(process, &raw mut code).is_ok() && code == STILL_ACTIVE;
        let _ = CloseHandle(process);
        alive
    }
}
