//! Connection registry - owns every live handle.
//!
//! The registry holds one `Arc` per connection, keyed by [`ConnectionId`].
//! Connections hold only a `Weak` back-reference, so a torn-down handle
//! that no caller still holds is freed as soon as the registry lets go.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{ConnectionBuilder, ConnectionId, PeerConnection};
use crate::engine::ExchangeConfig;
use crate::sink::{EventSink, TracingSink};

/// Host name used when the system host name cannot be read.
pub const DEFAULT_LOCAL_HOSTNAME: &str = "localhost";

/// Read the system host name.
pub(crate) fn system_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCAL_HOSTNAME.to_string())
}

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Host name compared against peers to decide locality.
    pub local_hostname: String,
    /// Exchange bounds applied to connections that don't set their own.
    pub exchange: ExchangeConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            local_hostname: system_hostname(),
            exchange: ExchangeConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Override the local host name.
    pub fn with_local_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.local_hostname = hostname.into();
        self
    }

    /// Set the default exchange bounds.
    pub fn with_exchange(mut self, exchange: ExchangeConfig) -> Self {
        self.exchange = exchange;
        self
    }
}

/// Owning arena of peer connections.
pub struct ConnectionRegistry {
    config: RegistryConfig,
    sink: Arc<dyn EventSink>,
    connections: Mutex<HashMap<ConnectionId, Arc<PeerConnection>>>,
}

impl ConnectionRegistry {
    /// Create a registry whose connections deliver events to `sink`.
    pub fn new(config: RegistryConfig, sink: impl EventSink) -> Arc<Self> {
        Arc::new(Self {
            config,
            sink: Arc::new(sink),
            connections: Mutex::new(HashMap::new()),
        })
    }

    /// Create a registry with default config that logs and drops events.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(RegistryConfig::default(), TracingSink)
    }

    /// Start building a connection that this registry will own.
    pub fn connection(self: &Arc<Self>, hostname: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(hostname).owned_by(Arc::clone(self))
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the local host name.
    pub fn local_hostname(&self) -> &str {
        &self.config.local_hostname
    }

    pub(crate) fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Look up a live connection.
    pub fn get(&self, id: ConnectionId) -> Option<Arc<PeerConnection>> {
        self.lock().get(&id).cloned()
    }

    /// Find live connections to `hostname`, oldest first.
    pub fn find_by_hostname(&self, hostname: &str) -> Vec<Arc<PeerConnection>> {
        self.select(|conn| conn.hostname() == hostname)
    }

    /// All live connections flagged as backends, oldest first.
    pub fn backends(&self) -> Vec<Arc<PeerConnection>> {
        self.select(|conn| conn.is_backend())
    }

    /// Check if any live connection blocks shutdown.
    pub fn blocks_shutdown(&self) -> bool {
        self.lock().values().any(|conn| conn.blocks_shutdown())
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no connections are live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn insert(&self, conn: Arc<PeerConnection>) {
        self.lock().insert(conn.id(), conn);
    }

    pub(crate) fn remove(&self, id: ConnectionId) -> Option<Arc<PeerConnection>> {
        let removed = self.lock().remove(&id);
        if removed.is_none() {
            tracing::warn!("Teardown of unknown connection {}", id);
        }
        removed
    }

    fn select(&self, pred: impl Fn(&PeerConnection) -> bool) -> Vec<Arc<PeerConnection>> {
        let mut found: Vec<_> = self
            .lock()
            .values()
            .filter(|conn| pred(conn))
            .cloned()
            .collect();
        found.sort_by_key(|conn| conn.id());
        found
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<PeerConnection>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("config", &self.config)
            .field("connections", &self.len())
            .finish_non_exhaustive()
    }
}
