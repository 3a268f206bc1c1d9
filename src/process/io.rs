// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Draining stdout/stderr into the bus.
//!
//! ```text
//! spawn_reader(pipe, stream)
//!   loop read(8 KiB)
//!     Utf8Chunker: carry split code points, invalid --> U+FFFD
//!     Bus::publish_chunk(stream, text)
//!   EOF   --> flush carried bytes, end
//!   error --> Bus::publish_error(Drain), end
//! ```

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::events::{Bus, OutputStream};
use crate::error::ProcessError;

const CHUNK_SIZE: usize = 8 * 1024;

/// Spawns a task that drains `reader` until EOF.
pub(super) fn spawn_reader<R>(
    reader: R,
    stream: OutputStream,
    bus: Arc<Bus>,
    process_name: String,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        read_stream(reader, stream, &bus, &process_name).await;
    })
}

async fn read_stream<R>(mut reader: R, stream: OutputStream, bus: &Bus, process_name: &str)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = Utf8Chunker::default();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() {
                    trace!(process = %process_name, stream = stream.as_str(), chunk = %text, "output");
                    bus.publish_chunk(stream, &text);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!(
                    process = %process_name,
                    stream = stream.as_str(),
                    error = %e,
                    "error reading stream"
                );
                bus.publish_error(ProcessError::Drain {
                    command: process_name.to_string(),
                    stream: stream.as_str().to_string(),
                    message: e.to_string(),
                });
                break;
            }
        }
    }

    let rest = decoder.finish();
    if !rest.is_empty() {
        bus.publish_chunk(stream, &rest);
    }
}

/// Incremental UTF-8 decoder for pipe chunks.
///
/// A code point split across two reads is held back until its remaining
/// bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub(super) struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub(super) fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        let mut input: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    out.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    if let Some(len) = e.error_len() {
                        out.push(char::REPLACEMENT_CHARACTER);
                        input = &rest[len..];
                    } else {
                        // Incomplete sequence at the end: wait for more bytes.
                        input = rest;
                        break;
                    }
                }
            }
        }

        let consumed = self.pending.len() - input.len();
        self.pending.drain(..consumed);
        out
    }

    /// Flushes whatever is still held back.
    pub(super) fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
