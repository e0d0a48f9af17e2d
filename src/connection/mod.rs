//! Connection module - one shared handle per peer.
//!
//! A [`PeerConnection`] wraps a single transport and is shared by any
//! number of callers through `Arc`. Exchanges on it are serialized by the
//! engine's exchange lock; the reference count is a separate atomic that
//! callers move with [`acquire`](PeerConnection::acquire) and
//! [`release`](PeerConnection::release). A release that takes the count
//! below zero tears the handle down: it is removed from its
//! [`ConnectionRegistry`] and the transport is dropped once the last
//! in-flight exchange finishes.
//!
//! # Example
//!
//! ```ignore
//! use peerwire::connection::ConnectionRegistry;
//! use peerwire::transport::StreamTransport;
//!
//! let registry = ConnectionRegistry::with_defaults();
//! let stream = tokio::net::TcpStream::connect("10.0.0.2:6543").await?;
//! let conn = registry
//!     .connection("slave-1")
//!     .backend(true)
//!     .build(StreamTransport::new(stream));
//!
//! let asleep = conn.catalog().go_to_sleep().await;
//! ```

pub mod registry;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::engine::{ExchangeConfig, ExchangeEngine, SharedTransport, TransportSlot};
use crate::error::Result;
use crate::protocol::Frame;
use crate::sink::{EventSink, TracingSink};
use crate::transport::Transport;

pub use registry::{ConnectionRegistry, RegistryConfig, DEFAULT_LOCAL_HOSTNAME};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A shared handle to one peer.
pub struct PeerConnection {
    id: ConnectionId,
    hostname: String,
    is_local: bool,
    is_backend: AtomicBool,
    wants_events: bool,
    blocks_shutdown: AtomicBool,
    ref_count: AtomicI64,
    torn_down: AtomicBool,
    pending_replies: AtomicUsize,
    transport: SharedTransport,
    engine: ExchangeEngine,
    owner: Weak<ConnectionRegistry>,
}

impl PeerConnection {
    /// Start building a connection not owned by any registry.
    pub fn builder(hostname: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(hostname)
    }

    /// Get the connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer's host name.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Check if the peer runs on the local host.
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Check if the peer is a backend.
    pub fn is_backend(&self) -> bool {
        self.is_backend.load(Ordering::Acquire)
    }

    /// Mark the peer as a backend (or not).
    pub fn set_backend(&self, backend: bool) {
        self.is_backend.store(backend, Ordering::Release);
    }

    /// Check if the peer asked for event delivery.
    pub fn wants_events(&self) -> bool {
        self.wants_events
    }

    /// Check if the peer currently blocks shutdown of the local process.
    pub fn blocks_shutdown(&self) -> bool {
        self.blocks_shutdown.load(Ordering::Acquire)
    }

    /// Set whether the peer blocks shutdown.
    pub fn set_block_shutdown(&self, block: bool) {
        self.blocks_shutdown.store(block, Ordering::Release);
    }

    /// Check if any exchange is waiting for its reply.
    ///
    /// Advisory only; the answer may be stale by the time it is read.
    pub fn is_expecting_reply(&self) -> bool {
        self.pending_replies.load(Ordering::Acquire) > 0
    }

    /// Current reference count. Zero is the baseline.
    pub fn ref_count(&self) -> i64 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Check if a release has already torn this handle down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Take a reference.
    pub fn acquire(&self) {
        self.ref_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Drop a reference.
    ///
    /// Returns `true` when this release took the count below zero and tore
    /// the handle down. That happens at most once per handle; later
    /// releases return `false`.
    pub fn release(&self) -> bool {
        let remaining = self.ref_count.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining >= 0 || self.torn_down.swap(true, Ordering::AcqRel) {
            return false;
        }

        tracing::debug!("Tearing down {} to {}", self.id, self.hostname);
        if let Some(registry) = self.owner.upgrade() {
            registry.remove(self.id);
        }
        true
    }

    /// Send a request and wait for its reply.
    ///
    /// Notifications that arrive first go to the connection's event sink.
    /// `min_reply_length` of `0` accepts any reply.
    pub async fn exchange(&self, request: &Frame, min_reply_length: usize) -> Result<Frame> {
        let _pending = PendingReply::new(&self.pending_replies);
        self.engine
            .exchange(&self.transport, request, min_reply_length)
            .await
    }

    /// Typed verbs over this connection.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("id", &self.id)
            .field("hostname", &self.hostname)
            .field("is_local", &self.is_local)
            .field("is_backend", &self.is_backend())
            .field("ref_count", &self.ref_count())
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}

/// Counts an exchange as waiting for its reply until dropped.
struct PendingReply<'a>(&'a AtomicUsize);

impl<'a> PendingReply<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Builder for a [`PeerConnection`].
///
/// Obtained from [`ConnectionRegistry::connection`] (the connection is
/// registered on build and inherits the registry's sink and exchange
/// config) or [`PeerConnection::builder`] (detached).
pub struct ConnectionBuilder {
    hostname: String,
    local_hostname: Option<String>,
    is_backend: bool,
    wants_events: bool,
    blocks_shutdown: bool,
    sink: Option<Arc<dyn EventSink>>,
    exchange: Option<ExchangeConfig>,
    owner: Option<Arc<ConnectionRegistry>>,
}

impl ConnectionBuilder {
    fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            local_hostname: None,
            is_backend: false,
            wants_events: false,
            blocks_shutdown: true,
            sink: None,
            exchange: None,
            owner: None,
        }
    }

    pub(crate) fn owned_by(mut self, registry: Arc<ConnectionRegistry>) -> Self {
        self.owner = Some(registry);
        self
    }

    /// Override the local host name used to decide locality.
    pub fn local_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.local_hostname = Some(hostname.into());
        self
    }

    /// Mark the peer as a backend.
    pub fn backend(mut self, backend: bool) -> Self {
        self.is_backend = backend;
        self
    }

    /// Record that the peer asked for events.
    pub fn wants_events(mut self, wants: bool) -> Self {
        self.wants_events = wants;
        self
    }

    /// Initial shutdown-blocking flag (default: `true`).
    pub fn block_shutdown(mut self, block: bool) -> Self {
        self.blocks_shutdown = block;
        self
    }

    /// Send diverted notifications to `sink`.
    pub fn event_sink(mut self, sink: impl EventSink) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Send diverted notifications to a shared sink.
    pub fn shared_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the exchange configuration.
    pub fn exchange_config(mut self, config: ExchangeConfig) -> Self {
        self.exchange = Some(config);
        self
    }

    /// Cap the notifications drained per exchange.
    pub fn max_notifications(mut self, limit: usize) -> Self {
        self.exchange = Some(self.exchange_or_default().max_notifications(limit));
        self
    }

    /// Bound the wait for each reply.
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.exchange = Some(self.exchange_or_default().reply_timeout(timeout));
        self
    }

    fn exchange_or_default(&self) -> ExchangeConfig {
        match (&self.exchange, &self.owner) {
            (Some(config), _) => config.clone(),
            (None, Some(registry)) => registry.config().exchange.clone(),
            (None, None) => ExchangeConfig::default(),
        }
    }

    /// Build the connection around `transport`.
    pub fn build(self, transport: impl Transport) -> Arc<PeerConnection> {
        let exchange = self.exchange_or_default();
        let (id, local_hostname, sink, owner) = match &self.owner {
            Some(registry) => (
                ConnectionId::next(),
                self.local_hostname
                    .unwrap_or_else(|| registry.local_hostname().to_string()),
                self.sink.unwrap_or_else(|| registry.event_sink()),
                Arc::downgrade(registry),
            ),
            None => (
                ConnectionId::next(),
                self.local_hostname
                    .unwrap_or_else(registry::system_hostname),
                self.sink
                    .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn EventSink>),
                Weak::new(),
            ),
        };

        let transport: Box<dyn Transport> = Box::new(transport);
        let conn = Arc::new(PeerConnection {
            id,
            is_local: self.hostname == local_hostname,
            hostname: self.hostname,
            is_backend: AtomicBool::new(self.is_backend),
            wants_events: self.wants_events,
            blocks_shutdown: AtomicBool::new(self.blocks_shutdown),
            ref_count: AtomicI64::new(0),
            torn_down: AtomicBool::new(false),
            pending_replies: AtomicUsize::new(0),
            transport: Arc::new(Mutex::new(TransportSlot::new(transport))),
            engine: ExchangeEngine::new(sink, exchange),
            owner,
        });

        if let Some(registry) = self.owner {
            registry.insert(Arc::clone(&conn));
        }

        tracing::debug!(
            "Built {} to {} (local: {}, backend: {})",
            conn.id,
            conn.hostname,
            conn.is_local,
            conn.is_backend()
        );
        conn
    }
}
