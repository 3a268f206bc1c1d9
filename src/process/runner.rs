// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Spawning and supervising the test's process.
//!
//! ```text
//! run_process(t, spec)
//!              |
//!              v
//!      build_command()
//!   args, cwd, env, pipes,
//!   own process group
//!              |
//!              v
//!          spawn() ---- Err --> outcome = Spawn error, bus closed
//!              |
//!   ProcessGroup::attach + t.register_teardown
//!              |
//!     +--------+---------+
//!     v        v         v
//!  reader   reader   exit watcher
//!  stdout   stderr   wait child, join readers,
//!     |        |     publish Exit, set outcome
//!     +---> Bus <----+
//!              |
//!              v
//!       RunningProgram
//! ```

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::builder::ProcessSpec;
use super::events::{Bus, OutputStream};
use super::group::ProcessGroup;
use super::io::spawn_reader;
use super::program::{ExitOutcome, RunningProgram};
use crate::error::ProcessError;
use crate::lifecycle::TestContext;

impl ProcessSpec {
    /// Returns the display name for this process.
    pub(super) fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                std::path::Path::new(self.program()).file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    pub(super) fn command_line(&self) -> String {
        use std::fmt::Write as _;
        let mut cmd = self.program().to_string();
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Builds the tokio Command from this spec.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());

        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }

        // Merged over the inherited environment.
        command.envs(self.environment());

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        // New group led by the child, so teardown reaches its descendants.
        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        {
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        command
    }
}

/// Starts `spec` and ties its lifetime to the test `t`.
///
/// Returns immediately; output is drained in the background. If the
/// process cannot be spawned, the failure is reported by
/// [`RunningProgram::wait_until_exit`] (and by every wait), and no teardown
/// is registered.
///
/// Must be called from within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use testbed_rs::lifecycle::TestContext;
/// use testbed_rs::process::{ProcessSpec, run_process};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let t = TestContext::new("server starts");
/// let program = run_process(&t, ProcessSpec::from_command(["my-server", "--port", "8080"]));
/// program.wait_for_output("Listening").await?;
/// # Ok(())
/// # }
/// ```
pub fn run_process(t: &TestContext, spec: ProcessSpec) -> RunningProgram {
    let name = spec.display_name();
    let cmd_line = spec.command_line();
    let defaults = t.config().process.clone();

    if let Some(cwd) = spec.working_dir() {
        debug!(cwd = %cwd.display(), "cd");
    }
    debug!(cmd = %cmd_line, "exec");

    let bus = Arc::new(Bus::new());
    let (exit_tx, exit_rx) = watch::channel::<Option<ExitOutcome>>(None);

    let spawned = if spec.program().is_empty() {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty command",
        ))
    } else {
        spec.build_command().spawn()
    };

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            warn!(process = %name, error = %e, "failed to spawn");
            bus.close();
            exit_tx.send_replace(Some(Err(ProcessError::Spawn {
                command: cmd_line,
                source: Arc::new(e),
            })));
            return RunningProgram::new(name, None, None, bus, exit_rx, defaults);
        }
    };

    let pid = child.id();
    trace!(process = %name, pid = ?pid, "spawned");

    let group = pid.map(|pid| Arc::new(ProcessGroup::attach(pid, &defaults.teardown_signal)));
    if let Some(group) = &group {
        let group = Arc::clone(group);
        t.register_teardown(format!("terminate {name} (pgid {})", group.id()), move || {
            group.terminate()
        });
    }

    let readers: Vec<JoinHandle<()>> = [
        child
            .stdout
            .take()
            .map(|pipe| spawn_reader(pipe, OutputStream::Stdout, Arc::clone(&bus), name.clone())),
        child
            .stderr
            .take()
            .map(|pipe| spawn_reader(pipe, OutputStream::Stderr, Arc::clone(&bus), name.clone())),
    ]
    .into_iter()
    .flatten()
    .collect();

    tokio::spawn(watch_exit(
        child,
        readers,
        Arc::clone(&bus),
        exit_tx,
        name.clone(),
    ));

    RunningProgram::new(name, pid, group, bus, exit_rx, defaults)
}

impl RunningProgram {
    /// Same as [`run_process`].
    pub fn start(t: &TestContext, spec: ProcessSpec) -> Self {
        run_process(t, spec)
    }
}

/// Resolves the exit outcome once the child has exited and both pipes are
/// drained, so that `Exit` is always the last event.
async fn watch_exit(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    bus: Arc<Bus>,
    exit_tx: watch::Sender<Option<ExitOutcome>>,
    name: String,
) {
    let status = child.wait().await;

    for reader in readers {
        if let Err(e) = reader.await {
            warn!(process = %name, error = %e, "output reader task failed");
        }
    }

    let outcome = match status {
        Ok(status) => {
            let code = exit_code(status);
            trace!(process = %name, exit_code = code, "completed");
            bus.close_with_exit(code);
            Ok(code)
        }
        Err(e) => {
            warn!(process = %name, error = %e, "failed waiting for process to exit");
            bus.close();
            Err(ProcessError::ExitLost { command: name })
        }
    };

    exit_tx.send_replace(Some(outcome));
}

/// Exit code of a finished process; `128 + signal` when killed by a signal.
pub(super) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
