// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                     test body
//!                         |
//!                         v
//!              ,---------------------,
//!              |     lifecycle       |
//!              |  TestContext, LIFO  |
//!              |     teardowns       |
//!              '--+--------+------+--'
//!                 |        |      |
//!                 v        v      v
//!             process   tempdir  http
//!           spawn, bus,  scratch  GET /
//!           wait, kill   dirs     request
//!                 |
//!                 v
//!               wait
//!            (delays)
//!
//!   +-----------------------------------------+
//!   |  foundation   error, logging, config    |
//!   +-----------------------------------------+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use testbed_rs::lifecycle::TestContext;
//! use testbed_rs::process::{ProcessSpec, run_process};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let t = TestContext::new("server answers");
//! let server = run_process(&t, ProcessSpec::from_command(["my-server", "--port", "8080"]));
//! server.wait_for_output("Listening").await?;
//! let body = testbed_rs::http::http_get("http://127.0.0.1:8080/").await?;
//! assert!(body.contains("hello"));
//! t.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod process;
pub mod tempdir;
pub mod wait;
