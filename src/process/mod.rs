// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process runner for tests.
//!
//! ```text
//! run_process(&t, ProcessSpec::from_command(["server", "--port", "0"]))
//!   --> tokio::process::Command, own process group
//!       stdout/stderr drained into one accumulated buffer
//!       events: stdout, stderr, output, exit, error
//!   --> RunningProgram
//!         .wait_for_output("Listening")   match | exit | error | timeout
//!         .wait_until_exit()              same code for every caller
//!         .output()                       interleaved stdout+stderr
//!   test end: t's teardown signals the whole group (ESRCH ignored),
//!             or terminates the job object on Windows
//! ```

pub mod builder;
mod events;
mod group;
mod io;
#[cfg(windows)]
mod job;
pub mod pattern;
mod program;
mod runner;

pub use builder::ProcessSpec;
pub use events::{Channels, OutputStream, ProgramEvent, Subscription};
pub use group::is_process_running;
pub use pattern::Pattern;
pub use program::RunningProgram;
pub use runner::run_process;
