//! JSON-lines notification sink on stdout.
//!
//! Each notification becomes one line:
//!
//! ```text
//! {"name":"RECORDING_LIST_CHANGE","payload":["ADD","1001"]}
//! ```
//!
//! Lines end with an explicit `\n` and are flushed immediately so a
//! supervising process can read them as they arrive. Logs belong on
//! stderr, never here.

use std::io::Write;

use super::EventSink;
use crate::protocol::Notification;

/// Write a line to stdout.
///
/// Writes the string followed by a single `\n` and flushes.
pub fn write_stdout_line(line: &str) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(line.as_bytes())?;
    handle.write_all(b"\n")?;
    handle.flush()?;
    Ok(())
}

/// Write a JSON value to stdout as a single line.
pub fn write_stdout_json<T: serde::Serialize>(value: &T) -> crate::error::Result<()> {
    let json = serde_json::to_string(value)?;
    write_stdout_line(&json)?;
    Ok(())
}

/// Prints every notification to stdout as a JSON line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn dispatch(&self, notification: Notification) {
        if let Err(e) = write_stdout_json(&notification) {
            tracing::warn!("Failed to write notification {}: {}", notification.name, e);
        }
    }
}
