//! # peerwire
//!
//! Request/reply RPC over one shared peer connection that also carries
//! push notifications.
//!
//! A coordinating process talks to a remote peer through a single
//! long-lived connection. Each call writes a request frame and waits for
//! the reply; any notification frames the peer pushes in the meantime are
//! diverted to an event sink instead of being mistaken for the reply.
//!
//! ## Architecture
//!
//! - **Transport** ([`transport`]): whole-frame read/write over a byte stream
//! - **Engine** ([`engine`]): the locked request/reply exchange
//! - **Connection** ([`connection`]): shared, reference-counted handle plus
//!   the registry that owns it
//! - **Catalog** ([`catalog`]): typed verbs with fallbacks
//! - **Sink** ([`sink`]): where notifications go
//!
//! ## Example
//!
//! ```ignore
//! use peerwire::{ConnectionRegistry, RegistryConfig, StreamTransport};
//! use peerwire::sink::ChannelSink;
//!
//! #[tokio::main]
//! async fn main() -> peerwire::Result<()> {
//!     let (sink, mut events) = ChannelSink::new();
//!     let registry = ConnectionRegistry::new(RegistryConfig::default(), sink);
//!
//!     let stream = tokio::net::TcpStream::connect("10.0.0.2:6543").await?;
//!     let conn = registry
//!         .connection("slave-1")
//!         .backend(true)
//!         .build(StreamTransport::new(stream));
//!
//!     let status = conn.catalog().is_busy(3, 5).await;
//!     println!("tuner 3 busy: {}", status.busy);
//!
//!     while let Ok(event) = events.try_recv() {
//!         println!("event: {}", event.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod codec;
pub mod connection;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod record;
pub mod sink;
pub mod transport;

pub use catalog::{Catalog, Verb};
pub use connection::{ConnectionId, ConnectionRegistry, PeerConnection, RegistryConfig};
pub use engine::ExchangeConfig;
pub use error::{PeerwireError, Result};
pub use protocol::{Frame, Notification};
pub use sink::EventSink;
pub use transport::{StreamTransport, Transport};
