//! Streaming redaction for the combined output of a wrapped shell command.
//!
//! The pipe sits behind `( command ) 2>&1 | hookwarden filter`. With no
//! filters configured it is a plain copy. Otherwise it buffers the whole
//! input, bounded by a timeout, and writes the redacted result. A command
//! that produces no output at all must not hang the pipe, so the read runs
//! on a blocking worker that the caller abandons once the deadline passes.

use hookwarden_core::{HookwardenError, HookwardenResult};
use hookwarden_security::FilterSet;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 64 * 1024;

/// How a filter run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// No filters configured; this many bytes were copied through.
    Passthrough(u64),
    /// Input was read in full and written back redacted.
    Redacted {
        /// Bytes written.
        bytes: usize,
    },
    /// Input ended without any data; nothing was written.
    Empty,
    /// The deadline passed before input ended; nothing was written.
    TimedOut,
}

/// Copies `input` to `output` unchanged without buffering the whole stream.
pub async fn passthrough<R, W>(input: &mut R, output: &mut W) -> HookwardenResult<StreamOutcome>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let copied = tokio::io::copy(input, output).await?;
    output.flush().await?;
    Ok(StreamOutcome::Passthrough(copied))
}

/// Reads `input` to its end within `timeout`, replaces every filter string
/// with the sentinel and writes the result to `output`.
///
/// On timeout the reader is told to stop and left to finish on its own; a
/// read blocked in the kernel ends with the process.
pub async fn redact_stream<R, W>(
    filters: &FilterSet,
    input: R,
    output: &mut W,
    timeout: Duration,
) -> HookwardenResult<StreamOutcome>
where
    R: Read + Send + 'static,
    W: AsyncWrite + Unpin + ?Sized,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let worker = {
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || read_until_cancelled(input, &cancel))
    };

    let data = match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => return Ok(StreamOutcome::TimedOut),
        Ok(Err(e)) => {
            return Err(HookwardenError::Io(std::io::Error::other(format!(
                "stream reader failed: {e}"
            ))))
        }
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            debug!(timeout_secs = timeout.as_secs(), "No end of input before deadline");
            return Ok(StreamOutcome::TimedOut);
        }
    };

    if data.is_empty() {
        return Ok(StreamOutcome::Empty);
    }
    let redacted = filters.redact_bytes(&data);
    output.write_all(&redacted).await?;
    output.flush().await?;
    Ok(StreamOutcome::Redacted {
        bytes: redacted.len(),
    })
}

/// Reads chunks until end of input. Returns `None` when cancelled. A read
/// error ends the stream with whatever arrived before it.
fn read_until_cancelled<R: Read>(mut input: R, cancel: &AtomicBool) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        match input.read(&mut chunk) {
            Ok(0) => return Some(data),
            Ok(n) => data.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!(error = %e, "Input read failed, keeping partial data");
                return Some(data);
            }
        }
    }
}
