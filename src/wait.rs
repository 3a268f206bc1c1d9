// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Delay utility.
//!
//! Dropping the returned future cancels the delay, which is how a losing
//! branch of a `tokio::select!` race is abandoned.

use std::time::Duration;

/// Suspends the current task for `millis` milliseconds.
pub async fn wait(millis: u64) {
    wait_for(Duration::from_millis(millis)).await;
}

/// Suspends the current task for `duration`.
pub async fn wait_for(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::{wait, wait_for};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_waiting_for_an_amount_of_time() {
        let start = Instant::now();
        wait(200).await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_losing_a_race_abandons_the_delay() {
        let start = Instant::now();
        tokio::select! {
            () = wait_for(Duration::from_secs(30)) => panic!("delay should lose the race"),
            () = wait(10) => {}
        }
        assert!(start.elapsed() < Duration::from_secs(30));
    }
}
