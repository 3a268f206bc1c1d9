// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Windows job object holding a test program and everything it spawns.
//!
//! ```text
//! JobObject (Windows-only)
//!   new()          --> KILL_ON_JOB_CLOSE
//!   assign_pid()   --> add the spawned program; its children follow
//!   terminate()    --> kill the whole tree now
//!   drop()         --> closing the handle kills whatever is left
//! ```

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
    JOBOBJECT_BASIC_ACCOUNTING_INFORMATION, JOBOBJECT_EXTENDED_LIMIT_INFORMATION,
    JobObjectBasicAccountingInformation, JobObjectExtendedLimitInformation,
    QueryInformationJobObject, SetInformationJobObject, TerminateJobObject,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_SET_QUOTA, PROCESS_TERMINATE};

fn to_io(err: &windows::core::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(err.code().0)
}

/// A job object that kills its processes when closed.
pub(super) struct JobObject(HANDLE);

// SAFETY: HANDLE is a pointer-sized value and job objects may be used from
// any thread.
unsafe impl Send for JobObject {}
unsafe impl Sync for JobObject {}

impl JobObject {
    /// Creates a job with `JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE` set.
    pub(super) fn new() -> std::io::Result<Self> {
        // SAFETY: CreateJobObjectW takes no pointers here; the handle is
        // closed again if configuration fails.
        unsafe {
            let job = CreateJobObjectW(None, None).map_err(|e| to_io(&e))?;

            let mut info = JOBOBJECT_EXTENDED_LIMIT_INFORMATION::default();
            info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;

            let result = SetInformationJobObject(
                job,
                JobObjectExtendedLimitInformation,
                (&raw const info).cast(),
                u32::try_from(std::mem::size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>())
                    .unwrap_or(u32::MAX),
            );
            if let Err(e) = result {
                let _ = CloseHandle(job);
                return Err(to_io(&e));
            }

            Ok(Self(job))
        }
    }

    /// Adds the process `pid` to the job.
    pub(super) fn assign_pid(&self, pid: u32) -> std::io::Result<()> {
        // SAFETY: the process handle is opened with the rights assignment
        // needs and closed whatever the outcome.
        unsafe {
            let process = OpenProcess(PROCESS_SET_QUOTA | PROCESS_TERMINATE, false, pid)
                .map_err(|e| to_io(&e))?;
            let result = AssignProcessToJobObject(self.0, process);
            let _ = CloseHandle(process);
            result.map_err(|e| to_io(&e))
        }
    }

    /// Terminates every process in the job. An empty job is not an error.
    pub(super) fn terminate(&self, exit_code: u32) -> std::io::Result<()> {
        // SAFETY: self.0 is a live job handle owned by this value.
        unsafe { TerminateJobObject(self.0, exit_code).map_err(|e| to_io(&e)) }
    }

    /// `(active, total)` process counts.
    #[cfg(test)]
    pub(super) fn process_count(&self) -> std::io::Result<(u32, u32)> {
        // SAFETY: the buffer is a correctly sized, writable accounting struct.
        unsafe {
            let mut info = JOBOBJECT_BASIC_ACCOUNTING_INFORMATION::default();
            QueryInformationJobObject(
                Some(self.0),
                JobObjectBasicAccountingInformation,
                (&raw mut info).cast(),
                u32::try_from(std::mem::size_of::<JOBOBJECT_BASIC_ACCOUNTING_INFORMATION>())
                    .unwrap_or(u32::MAX),
                None,
            )
            .map_err(|e| to_io(&e))?;
            Ok((info.ActiveProcesses, info.TotalProcesses))
        }
    }
}

impl Drop for JobObject {
    fn drop(&mut self) {
        // SAFETY: the handle is owned by this value and closed exactly once.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

#[cfg(test)]
mod tests;
