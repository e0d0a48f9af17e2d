//! Request–reply engine.
//!
//! One exchange writes a request frame and then reads frames until one is
//! not a notification. Notifications drained on the way are handed to the
//! [`EventSink`] in wire order; the first other frame is the reply.
//!
//! ```text
//! caller ── request ──► transport
//!                       │
//!          ◄── BACKEND_MESSAGE … ──► sink
//!          ◄── BACKEND_MESSAGE … ──► sink
//! caller ◄── reply ─────┘
//! ```
//!
//! The exchange lock is the transport's mutex and is held for the whole
//! round trip, so two callers never see each other's replies. The guard
//! owns an `Arc` of the transport, which keeps it alive for the duration
//! of the call regardless of the connection's reference count.
//!
//! A round trip that ends without reading its reply (a bound fired, a read
//! failed, or the caller dropped the future) leaves that reply on the
//! stream. The slot is then out of step and every later exchange fails
//! with [`PeerwireError::OutOfStep`] instead of reading a stale frame.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{PeerwireError, Result};
use crate::protocol::Frame;
use crate::sink::EventSink;
use crate::transport::Transport;

/// A transport plus whether its stream is still aligned with our requests.
pub struct TransportSlot {
    transport: Box<dyn Transport>,
    in_step: bool,
}

impl TransportSlot {
    /// Wrap a freshly opened transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            in_step: true,
        }
    }

    /// Check if the next frame read can be trusted as a reply.
    pub fn is_in_step(&self) -> bool {
        self.in_step
    }
}

/// Transport slot shared between a connection and its in-flight exchanges.
pub type SharedTransport = Arc<Mutex<TransportSlot>>;

/// Optional bounds on how long an exchange may wait for its reply.
///
/// Both bounds are off by default: a peer that streams notifications and
/// never replies stalls the caller indefinitely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Fail once more than this many notifications precede the reply.
    pub max_notifications: Option<usize>,
    /// Fail if the reply has not arrived this long after the request was written.
    pub reply_timeout: Option<Duration>,
}

impl ExchangeConfig {
    /// Unbounded drain (the default).
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set the notification cap.
    pub fn max_notifications(mut self, limit: usize) -> Self {
        self.max_notifications = Some(limit);
        self
    }

    /// Set the reply deadline.
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }
}

/// Performs exchanges and diverts notifications.
pub struct ExchangeEngine {
    sink: Arc<dyn EventSink>,
    config: ExchangeConfig,
}

impl ExchangeEngine {
    /// Create an engine delivering notifications to `sink`.
    pub fn new(sink: Arc<dyn EventSink>, config: ExchangeConfig) -> Self {
        Self { sink, config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Run one exchange on a shared transport.
    ///
    /// Waits for any exchange already in flight on the same transport.
    /// Returns the reply frame, or an error if the write or a read fails,
    /// a configured bound is hit, the slot is out of step, or the reply has
    /// fewer than `min_reply_length` fields (`0` disables the check).
    pub async fn exchange(
        &self,
        transport: &SharedTransport,
        request: &Frame,
        min_reply_length: usize,
    ) -> Result<Frame> {
        let mut slot = Arc::clone(transport).lock_owned().await;
        if !slot.in_step {
            tracing::debug!(
                "Refusing {}: connection out of step",
                request.verb().unwrap_or_default()
            );
            return Err(PeerwireError::OutOfStep);
        }

        // Cleared only once a reply is read, so a dropped future leaves it set.
        slot.in_step = false;
        let result = self.round_trip(&mut *slot.transport, request).await;
        slot.in_step = result.is_ok();
        drop(slot);

        let reply = result.map_err(|e| {
            tracing::warn!(
                "No response to {}: {}",
                request.verb().unwrap_or_default(),
                e
            );
            e
        })?;

        check_reply_length(request, reply, min_reply_length)
    }

    async fn round_trip(&self, transport: &mut dyn Transport, request: &Frame) -> Result<Frame> {
        transport.write_frame(request).await?;

        match self.config.reply_timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_reply(transport))
                .await
                .map_err(|_| PeerwireError::ReplyTimeout)?,
            None => self.read_reply(transport).await,
        }
    }

    async fn read_reply(&self, transport: &mut dyn Transport) -> Result<Frame> {
        let mut drained = 0usize;

        loop {
            let frame = transport.read_frame().await?;

            match frame.try_into_notification() {
                Ok(notification) => {
                    drained += 1;
                    tracing::trace!("Diverting notification {}", notification.name);
                    self.sink.dispatch(notification);

                    if let Some(limit) = self.config.max_notifications {
                        if drained > limit {
                            return Err(PeerwireError::NotificationFlood(drained));
                        }
                    }
                }
                Err(reply) => return Ok(reply),
            }
        }
    }
}

fn check_reply_length(request: &Frame, reply: Frame, min_reply_length: usize) -> Result<Frame> {
    if min_reply_length > 0 && reply.len() < min_reply_length {
        tracing::warn!(
            "Response to {} too short: {} of {} fields",
            request.verb().unwrap_or_default(),
            reply.len(),
            min_reply_length
        );
        return Err(PeerwireError::ShortReply {
            expected: min_reply_length,
            actual: reply.len(),
        });
    }

    Ok(reply)
}
