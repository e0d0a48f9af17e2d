//! Stream-backed transport.
//!
//! # Example
//!
//! ```ignore
//! use peerwire::transport::StreamTransport;
//! use tokio::net::TcpStream;
//!
//! let stream = TcpStream::connect("10.0.0.2:6543").await?;
//! let transport = StreamTransport::new(stream);
//! ```

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{BoxFuture, Transport};
use crate::error::{PeerwireError, Result};
use crate::protocol::{build_frame, Frame, FrameBuffer, MAX_PAYLOAD_SIZE};

/// Bytes requested from the stream per read.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Frames a byte stream with the length-prefixed wire format.
///
/// Frames that arrive in the same read as the one being returned are
/// queued and handed out by later calls, preserving wire order.
pub struct StreamTransport<S> {
    stream: S,
    frame_buffer: FrameBuffer,
    ready: VecDeque<Frame>,
    read_buf: Vec<u8>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self::with_max_payload(stream, MAX_PAYLOAD_SIZE)
    }

    /// Wrap a connected stream with a custom max payload size.
    pub fn with_max_payload(stream: S, max_payload_size: u32) -> Self {
        Self {
            stream,
            frame_buffer: FrameBuffer::with_max_payload(max_payload_size),
            ready: VecDeque::new(),
            read_buf: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &S {
        &self.stream
    }

    /// Unwrap the stream, discarding any buffered frames.
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn send(&mut self, frame: &Frame) -> Result<()> {
        let bytes = build_frame(frame)?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(frame);
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(PeerwireError::ConnectionClosed);
            }

            let frames = self.frame_buffer.push(&self.read_buf[..n])?;
            self.ready.extend(frames);
        }
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn write_frame<'a>(&'a mut self, frame: &'a Frame) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.send(frame))
    }

    fn read_frame(&mut self) -> BoxFuture<'_, Result<Frame>> {
        Box::pin(self.receive())
    }
}
