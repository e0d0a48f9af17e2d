//! Transport module - the frame channel under a connection.
//!
//! A [`Transport`] writes and reads whole frames. The connection owns it
//! exclusively; the exchange engine is its only caller.
//!
//! [`StreamTransport`] frames any `AsyncRead + AsyncWrite` stream (TCP,
//! Unix socket, in-memory duplex) with the length-prefixed wire format.

mod stream;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::protocol::Frame;

pub use stream::{StreamTransport, READ_CHUNK_SIZE};

/// Boxed future returned by transport operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Bidirectional frame channel.
pub trait Transport: Send + 'static {
    /// Write one frame.
    fn write_frame<'a>(&'a mut self, frame: &'a Frame) -> BoxFuture<'a, Result<()>>;

    /// Read the next frame, waiting until one arrives.
    ///
    /// Fails with [`ConnectionClosed`](crate::PeerwireError::ConnectionClosed)
    /// when the peer hangs up.
    fn read_frame(&mut self) -> BoxFuture<'_, Result<Frame>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame<'a>(&'a mut self, frame: &'a Frame) -> BoxFuture<'a, Result<()>> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self) -> BoxFuture<'_, Result<Frame>> {
        (**self).read_frame()
    }
}
