//! Event sink module - where diverted notifications go.
//!
//! The exchange engine hands every notification it drains to an
//! [`EventSink`] supplied at construction. Delivery is fire-and-forget:
//! the sink cannot refuse a notification or slow the engine down.
//!
//! Provided sinks:
//! - closures `Fn(Notification)`
//! - [`ChannelSink`] - forwards into an unbounded tokio channel
//! - [`TracingSink`] - logs and drops (the default)
//! - [`StdoutSink`] - one JSON line per notification on stdout
//!
//! # Example
//!
//! ```
//! use peerwire::sink::ChannelSink;
//!
//! let (sink, mut events) = ChannelSink::new();
//! # let _ = (&sink, &mut events);
//! ```

mod stdio;

use tokio::sync::mpsc;

use crate::protocol::Notification;

pub use stdio::{write_stdout_json, write_stdout_line, StdoutSink};

/// Receiver of out-of-band notifications.
pub trait EventSink: Send + Sync + 'static {
    /// Deliver one notification.
    fn dispatch(&self, notification: Notification);
}

impl<F> EventSink for F
where
    F: Fn(Notification) + Send + Sync + 'static,
{
    fn dispatch(&self, notification: Notification) {
        self(notification)
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn dispatch(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::trace!("Notification receiver dropped, discarding event");
        }
    }
}

/// Logs notifications at debug level and discards them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn dispatch(&self, notification: Notification) {
        tracing::debug!(
            event = %notification.name,
            fields = notification.payload.len(),
            "Discarding notification"
        );
    }
}
