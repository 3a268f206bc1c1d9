// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish/subscribe bus for a running program.
//!
//! ```text
//! reader(stdout) --+                     +--> Subscription (STDOUT|EXIT)
//!                  |   Bus (one Mutex)   |
//! reader(stderr) --+-> output  += chunk -+--> Subscription (OUTPUT)
//!                  |   history += event  |
//! exit watcher ----+   dispatch          +--> waiter (OUTPUT|EXIT|ERROR)
//!
//! per chunk: Stdout|Stderr(chunk), Output(chunk)
//! once, last: Exit(code)  --> bus closed, queues end
//! ```
//!
//! Appending and dispatching happen under the same lock, so every
//! subscriber sees one total order and a new subscriber can replay the
//! history without missing or duplicating anything.

use bitflags::bitflags;
use futures_util::Stream;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ProcessError;

bitflags! {
    /// Event channels a subscriber can listen on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        /// Chunks read from stdout
        const STDOUT = 0x01;
        /// Chunks read from stderr
        const STDERR = 0x02;
        /// Chunks from either stream, in the order they were read
        const OUTPUT = 0x04;
        /// The exit code, published once as the final event
        const EXIT = 0x08;
        /// Failures while draining stdout or stderr
        const ERROR = 0x10;
    }
}

/// Which pipe a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// A notification published by a running program.
#[derive(Debug, Clone)]
pub enum ProgramEvent {
    /// A chunk of stdout.
    Stdout(Arc<str>),
    /// A chunk of stderr.
    Stderr(Arc<str>),
    /// The same chunk again, on the combined channel.
    Output(Arc<str>),
    /// The process exited with this code.
    Exit(i32),
    /// Reading one of the pipes failed.
    Error(ProcessError),
}

impl ProgramEvent {
    /// The channel this event is delivered on.
    #[must_use]
    pub const fn channel(&self) -> Channels {
        match self {
            Self::Stdout(_) => Channels::STDOUT,
            Self::Stderr(_) => Channels::STDERR,
            Self::Output(_) => Channels::OUTPUT,
            Self::Exit(_) => Channels::EXIT,
            Self::Error(_) => Channels::ERROR,
        }
    }
}

/// An ordered queue of events for one subscriber.
///
/// Ends after the `Exit` event, or right after the replayed history if
/// the program never started.
#[derive(Debug)]
pub struct Subscription {
    rx: flume::Receiver<ProgramEvent>,
}

impl Subscription {
    /// Waits for the next event. `None` once the program is finished and
    /// every event has been delivered.
    pub async fn recv(&self) -> Option<ProgramEvent> {
        self.rx.recv_async().await.ok()
    }

    /// Returns the next already-queued event without waiting.
    #[must_use]
    pub fn try_recv(&self) -> Option<ProgramEvent> {
        self.rx.try_recv().ok()
    }

    /// Converts into a `futures` stream.
    pub fn into_stream(self) -> impl Stream<Item = ProgramEvent> + Send + 'static {
        self.rx.into_stream()
    }
}

struct Subscriber {
    channels: Channels,
    tx: flume::Sender<ProgramEvent>,
}

#[derive(Default)]
struct BusState {
    output: String,
    history: Vec<ProgramEvent>,
    subscribers: Vec<Subscriber>,
    closed: bool,
}

impl BusState {
    fn publish(&mut self, event: ProgramEvent) {
        let channel = event.channel();
        self.subscribers.retain(|sub| {
            !sub.channels.contains(channel) || sub.tx.send(event.clone()).is_ok()
        });
        self.history.push(event);
    }

    fn close(&mut self) {
        self.closed = true;
        self.subscribers.clear();
    }
}

/// Shared state of one running program.
#[derive(Default)]
pub(super) struct Bus {
    state: Mutex<BusState>,
}

impl Bus {
    pub(super) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a chunk to the accumulated output and publishes it.
    pub(super) fn publish_chunk(&self, stream: OutputStream, chunk: &str) {
        let chunk: Arc<str> = Arc::from(chunk);
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.output.push_str(&chunk);
        let tagged = match stream {
            OutputStream::Stdout => ProgramEvent::Stdout(Arc::clone(&chunk)),
            OutputStream::Stderr => ProgramEvent::Stderr(Arc::clone(&chunk)),
        };
        state.publish(tagged);
        state.publish(ProgramEvent::Output(chunk));
    }

    pub(super) fn publish_error(&self, error: ProcessError) {
        let mut state = self.lock();
        if !state.closed {
            state.publish(ProgramEvent::Error(error));
        }
    }

    /// Publishes the final `Exit` event and closes every queue.
    pub(super) fn close_with_exit(&self, code: i32) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.publish(ProgramEvent::Exit(code));
        state.close();
    }

    /// Closes every queue without an `Exit` event.
    pub(super) fn close(&self) {
        self.lock().close();
    }

    pub(super) fn subscribe(&self, channels: Channels) -> Subscription {
        let (tx, rx) = flume::unbounded();
        let mut state = self.lock();
        for event in state
            .history
            .iter()
            .filter(|event| channels.contains(event.channel()))
        {
            // The receiver is still held locally, so this cannot fail.
            let _ = tx.send(event.clone());
        }
        if !state.closed {
            state.subscribers.push(Subscriber { channels, tx });
        }
        Subscription { rx }
    }

    pub(super) fn output(&self) -> String {
        self.lock().output.clone()
    }
}
