// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The live handle returned by [`super::run_process`].
//!
//! ```text
//! wait_for_output(pattern, timeout)
//!   subscribe(OUTPUT|EXIT|ERROR)   replays everything read so far
//!   select!
//!     scan:  Output  --> seen += chunk, pattern matches seen? Ok
//!            Exit    --> PrematureExit { code, output }
//!            Error   --> Drain
//!            closed  --> Spawn error from the outcome
//!     wait(timeout)  --> Timeout { output }
//!
//! wait_until_exit()
//!   watch cell, written once by the exit watcher
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::events::{Bus, Channels, ProgramEvent, Subscription};
use super::group::ProcessGroup;
use super::pattern::Pattern;
use crate::config::types::ProcessSection;
use crate::error::{ProcessError, TeardownError};
use crate::wait;

/// Write-once result of a program: its exit code or why it never ran.
pub(super) type ExitOutcome = Result<i32, ProcessError>;

struct ProgramInner {
    name: String,
    pid: Option<u32>,
    group: Option<Arc<ProcessGroup>>,
    bus: Arc<Bus>,
    exit: watch::Receiver<Option<ExitOutcome>>,
    defaults: ProcessSection,
}

/// A process started by a test.
///
/// Cheap to clone; every clone refers to the same process, output buffer
/// and exit outcome.
#[derive(Clone)]
pub struct RunningProgram {
    inner: Arc<ProgramInner>,
}

impl RunningProgram {
    pub(super) fn new(
        name: String,
        pid: Option<u32>,
        group: Option<Arc<ProcessGroup>>,
        bus: Arc<Bus>,
        exit: watch::Receiver<Option<ExitOutcome>>,
        defaults: ProcessSection,
    ) -> Self {
        Self {
            inner: Arc::new(ProgramInner {
                name,
                pid,
                group,
                bus,
                exit,
                defaults,
            }),
        }
    }

    /// Display name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// OS process id; `None` if spawning failed.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Id of the process group the program leads.
    ///
    /// The program is started as its own group leader, so this equals the
    /// pid. On Windows it names the job object's leader.
    #[must_use]
    pub fn process_group(&self) -> Option<u32> {
        self.inner.group.as_ref().map(|group| group.id())
    }

    /// Everything written to stdout and stderr so far, in read order.
    #[must_use]
    pub fn output(&self) -> String {
        self.inner.bus.output()
    }

    /// `true` once the exit outcome is known.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.inner.exit.borrow().is_some()
    }

    /// Subscribes to `channels`.
    ///
    /// The subscription first replays what was already published on those
    /// channels, then delivers new events as they happen.
    #[must_use]
    pub fn subscribe(&self, channels: Channels) -> Subscription {
        self.inner.bus.subscribe(channels)
    }

    /// Tears the program's process group down now.
    ///
    /// The registered teardown still runs later and finds nothing to do.
    ///
    /// # Errors
    ///
    /// Returns `TeardownError::Signal` if the signal could not be delivered
    /// for a reason other than the group having exited already.
    pub fn kill(&self) -> Result<(), TeardownError> {
        self.inner
            .group
            .as_ref()
            .map_or(Ok(()), |group| group.terminate())
    }

    /// Waits until the output contains `pattern`, using the configured
    /// default budget (1000 ms unless overridden).
    ///
    /// # Errors
    ///
    /// See [`RunningProgram::wait_for_output_timeout`].
    pub async fn wait_for_output(&self, pattern: impl Into<Pattern>) -> Result<(), ProcessError> {
        self.wait_for_output_timeout(pattern, self.inner.defaults.wait_timeout())
            .await
    }

    /// Waits until the output contains `pattern`.
    ///
    /// The pattern is checked against the output accumulated so far (even
    /// when that is still empty) and again after every new chunk.
    ///
    /// # Errors
    ///
    /// - `ProcessError::Timeout` if `timeout` elapses first.
    /// - `ProcessError::PrematureExit` if the process exits first.
    /// - `ProcessError::Drain` if reading the output fails.
    /// - `ProcessError::Spawn` if the process never started.
    pub async fn wait_for_output_timeout(
        &self,
        pattern: impl Into<Pattern>,
        timeout: Duration,
    ) -> Result<(), ProcessError> {
        let pattern = pattern.into();
        let subscription = self.subscribe(Channels::OUTPUT | Channels::EXIT | Channels::ERROR);

        tokio::select! {
            result = self.scan(&pattern, &subscription) => result,
            () = wait::wait_for(timeout) => Err(ProcessError::Timeout {
                pattern: pattern.to_string(),
                timeout_ms: timeout.as_millis(),
                output: self.output(),
            }),
        }
    }

    async fn scan(&self, pattern: &Pattern, subscription: &Subscription) -> Result<(), ProcessError> {
        let never_started = self
            .inner
            .exit
            .borrow()
            .as_ref()
            .and_then(|outcome| outcome.as_ref().err().cloned());
        if let Some(error) = never_started {
            return Err(error);
        }

        // The empty buffer counts too: a predicate may already hold.
        let mut seen = String::new();
        if pattern.matches(&seen) {
            return Ok(());
        }
        while let Some(event) = subscription.recv().await {
            match event {
                ProgramEvent::Output(chunk) => {
                    seen.push_str(&chunk);
                    if pattern.matches(&seen) {
                        return Ok(());
                    }
                }
                ProgramEvent::Exit(code) => {
                    return Err(ProcessError::PrematureExit {
                        pattern: pattern.to_string(),
                        code,
                        output: self.output(),
                    });
                }
                ProgramEvent::Error(error) => return Err(error),
                ProgramEvent::Stdout(_) | ProgramEvent::Stderr(_) => {}
            }
        }

        // Closed without an Exit event: the process never ran.
        let code = self.wait_until_exit().await?;
        Err(ProcessError::PrematureExit {
            pattern: pattern.to_string(),
            code,
            output: self.output(),
        })
    }

    /// Waits for the process to exit and returns its exit code.
    ///
    /// May be called any number of times, concurrently; every call yields
    /// the same result.
    ///
    /// # Errors
    ///
    /// - `ProcessError::Spawn` if the process never started.
    /// - `ProcessError::ExitLost` if the runtime dropped the exit watcher.
    pub async fn wait_until_exit(&self) -> Result<i32, ProcessError> {
        let mut exit = self.inner.exit.clone();
        let waited = exit
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone());
        let outcome = match waited {
            Ok(outcome) => outcome,
            Err(_) => exit.borrow().clone(),
        };
        outcome.unwrap_or_else(|| {
            Err(ProcessError::ExitLost {
                command: self.inner.name.clone(),
            })
        })
    }
}

impl std::fmt::Debug for RunningProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningProgram")
            .field("name", &self.inner.name)
            .field("pid", &self.inner.pid)
            .field("exited", &self.has_exited())
            .finish_non_exhaustive()
    }
}
