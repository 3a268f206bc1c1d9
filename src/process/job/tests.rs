// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::JobObject;
use crate::error::TeardownError;
use crate::process::group::ProcessGroup;
use crate::process::is_process_running;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn long_running() -> std::process::Child {
    Command::new("cmd")
        .args(["/C", "ping -n 30 127.0.0.1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn exits_within(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if !is_process_running(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn test_new_job_is_empty() {
    let job = JobObject::new().unwrap();
    assert_eq!(job.process_count().unwrap(), (0, 0));
    job.terminate(1).unwrap();
}

#[test]
fn test_terminate_kills_assigned_tree() {
    let mut child = long_running();
    let pid = child.id();

    let group = ProcessGroup::attach(pid, "SIGTERM");
    assert_eq!(group.id(), pid);
    assert!(is_process_running(pid));

    group.terminate().unwrap();
    child.wait().unwrap();
    assert!(exits_within(pid, Duration::from_secs(5)));

    // Nothing left in the job: a second teardown is still fine.
    group.terminate().unwrap();
}

#[test]
fn test_missing_job_is_escalated() {
    let mut child = long_running();
    let pid = child.id();
    child.kill().unwrap();
    child.wait().unwrap();
    drop(child);

    let group = ProcessGroup::attach(pid, "SIGTERM");
    match group.terminate() {
        Err(TeardownError::Signal { pgid, .. }) => assert_eq!(u32::try_from(pgid).unwrap(), pid),
        other => panic!("expected a signal error, got {other:?}"),
    }
}

#[test]
fn test_liveness_of_current_and_exited_process() {
    assert!(is_process_running(std::process::id()));

    let mut child = long_running();
    let pid = child.id();
    child.kill().unwrap();
    child.wait().unwrap();
    assert!(!is_process_running(pid));
}
