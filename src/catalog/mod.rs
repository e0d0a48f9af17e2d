//! Verb catalog - typed commands over a connection.
//!
//! Every verb is a small value implementing [`Verb`]: it owns its request
//! frame, names the minimum reply length, decodes the reply and supplies
//! a fallback. [`Catalog::call`] runs the exchange and collapses every
//! failure (transport, short reply, undecodable reply) into the fallback,
//! so verb methods never return errors. [`Catalog::try_call`] keeps the
//! error for callers that need to tell a failure from a fallback value.
//!
//! Backend-level verbs live in `backend`, encoder verbs (requests that
//! start with `QUERY_REMOTEENCODER <tuner>`) in `encoder`.
//!
//! # Example
//!
//! ```ignore
//! let catalog = conn.catalog();
//!
//! if catalog.go_to_sleep().await {
//!     tracing::info!("{} is going to sleep", conn.hostname());
//! }
//!
//! let status = catalog.is_busy(3, 5).await;
//! ```

mod backend;
mod encoder;

use crate::connection::PeerConnection;
use crate::error::{PeerwireError, Result};
use crate::protocol::Frame;

pub use backend::{
    CheckFile, CheckFileReply, FillProgramInfo, GoToSleep, PixmapLastModified, PreviewRequest,
    PREVIEW_SECONDS, PREVIEW_FRAMES,
};
pub use encoder::{
    encoder_request, BusyStatus, CurrentRecording, EncoderState, FreeInputs, IsBusy, MaxBitrate,
    StartRecording, DEFAULT_MAX_BITRATE, EMPTY_LIST,
};

/// One request/reply command.
pub trait Verb {
    /// Decoded result type.
    type Output;

    /// The request frame.
    fn request(&self) -> &Frame;

    /// Fewest fields an acceptable reply may have. `0` accepts anything.
    fn min_reply_length(&self) -> usize {
        0
    }

    /// Decode the reply.
    fn decode(&self, reply: Frame) -> Result<Self::Output>;

    /// Value reported when the exchange or decode fails.
    fn fallback(&self) -> Self::Output;
}

/// Verb returning the reply frame as-is.
#[derive(Debug, Clone)]
pub struct RawCommand {
    request: Frame,
}

impl RawCommand {
    /// Wrap a request whose reply is returned unparsed.
    pub fn new(request: Frame) -> Self {
        Self { request }
    }
}

impl Verb for RawCommand {
    type Output = Frame;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn decode(&self, reply: Frame) -> Result<Frame> {
        Ok(reply)
    }

    fn fallback(&self) -> Frame {
        Frame::new()
    }
}

/// Verb whose reply carries nothing the caller needs.
///
/// The exchange still waits for the reply so the stream stays aligned.
#[derive(Debug, Clone)]
pub struct AckCommand {
    request: Frame,
}

impl AckCommand {
    /// Wrap a request whose reply is only waited for.
    pub fn new(request: Frame) -> Self {
        Self { request }
    }
}

impl Verb for AckCommand {
    type Output = ();

    fn request(&self) -> &Frame {
        &self.request
    }

    fn decode(&self, _reply: Frame) -> Result<()> {
        Ok(())
    }

    fn fallback(&self) {}
}

/// Verb whose reply is a status integer in field 0.
#[derive(Debug, Clone)]
pub struct IntCommand {
    request: Frame,
    fallback: i32,
}

impl IntCommand {
    /// Wrap a request, reporting `fallback` if it fails.
    pub fn new(request: Frame, fallback: i32) -> Self {
        Self { request, fallback }
    }
}

impl Verb for IntCommand {
    type Output = i32;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<i32> {
        reply.cursor(0).next_int()
    }

    fn fallback(&self) -> i32 {
        self.fallback
    }
}

/// Verb whose reply is a boolean in field 0.
#[derive(Debug, Clone)]
pub struct FlagCommand {
    request: Frame,
}

impl FlagCommand {
    /// Wrap a request whose reply is `0` or `1`.
    pub fn new(request: Frame) -> Self {
        Self { request }
    }
}

impl Verb for FlagCommand {
    type Output = bool;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<bool> {
        reply.cursor(0).next_bool()
    }

    fn fallback(&self) -> bool {
        false
    }
}

/// Typed verbs bound to one connection.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    conn: &'a PeerConnection,
}

impl<'a> Catalog<'a> {
    /// Bind the catalog to a connection.
    pub fn new(conn: &'a PeerConnection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &'a PeerConnection {
        self.conn
    }

    /// Run a verb, substituting its fallback on any failure.
    pub async fn call<V: Verb>(&self, verb: V) -> V::Output {
        match self.try_call(&verb).await {
            Ok(output) => output,
            Err(e) => {
                log_failure(self.conn, verb.request(), &e);
                verb.fallback()
            }
        }
    }

    /// Run a verb and report failures.
    pub async fn try_call<V: Verb>(&self, verb: &V) -> Result<V::Output> {
        let reply = self
            .conn
            .exchange(verb.request(), verb.min_reply_length())
            .await?;
        verb.decode(reply)
    }
}

fn log_failure(conn: &PeerConnection, request: &Frame, error: &PeerwireError) {
    let verb = request.verb().unwrap_or_default();

    // Transport failures and short replies were already logged by the engine.
    if error.is_transport_failure() || matches!(error, PeerwireError::ShortReply { .. }) {
        tracing::debug!("{} to {} failed: {}", verb, conn.hostname(), error);
    } else {
        tracing::warn!("{} to {} gave a bad reply: {}", verb, conn.hostname(), error);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::{FieldCursor, FromFields, ProgramRecord, ToFields};
    use crate::engine::tests::ScriptedTransport;
    use std::sync::{Arc, Mutex};

    /// Minimal recording record: chan id, start time, path.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub(crate) struct TestProgram {
        pub chan_id: u32,
        pub start: i64,
        pub pathname: String,
    }

    impl TestProgram {
        pub(crate) fn new(chan_id: u32, start: i64) -> Self {
            Self {
                chan_id,
                start,
                pathname: String::new(),
            }
        }
    }

    impl ToFields for TestProgram {
        fn to_fields(&self, frame: &mut Frame) {
            frame.push_int(self.chan_id);
            frame.push_int(self.start);
            frame.push(crate::codec::encode_optional(Some(&self.pathname)));
        }
    }

    impl FromFields for TestProgram {
        const FIELD_COUNT: usize = 3;

        fn from_fields(cursor: &mut FieldCursor<'_>) -> Result<Self> {
            Ok(Self {
                chan_id: cursor.next_int()?,
                start: cursor.next_int()?,
                pathname: cursor.next_optional()?,
            })
        }
    }

    impl ProgramRecord for TestProgram {
        fn set_pathname(&mut self, pathname: String) {
            self.pathname = pathname;
        }
    }

    /// Connection replaying `reads`, plus the log of written requests.
    pub(crate) fn scripted(reads: Vec<Frame>) -> (Arc<PeerConnection>, Arc<Mutex<Vec<Frame>>>) {
        let transport = ScriptedTransport::new(reads);
        let written = transport.written.clone();
        let conn = PeerConnection::builder("slave-1")
            .local_hostname("master")
            .build(transport);
        (conn, written)
    }

    #[tokio::test]
    async fn test_raw_command_returns_reply() {
        let (conn, written) = scripted(vec![Frame::from(["a", "b"])]);
        let reply = conn
            .catalog()
            .call(RawCommand::new(Frame::from(["QUERY_SG_GETFILELIST"])))
            .await;

        assert_eq!(reply, Frame::from(["a", "b"]));
        assert_eq!(written.lock().unwrap()[0].verb(), Some("QUERY_SG_GETFILELIST"));
    }

    #[tokio::test]
    async fn test_int_command_fallback_on_bad_field() {
        let (conn, _) = scripted(vec![Frame::from(["nope"])]);
        let value = conn
            .catalog()
            .call(IntCommand::new(Frame::from(["CHECK_RECORDING"]), -7))
            .await;
        assert_eq!(value, -7);
    }

    #[tokio::test]
    async fn test_int_command_fallback_on_closed() {
        let (conn, _) = scripted(vec![]);
        let value = conn
            .catalog()
            .call(IntCommand::new(Frame::from(["CHECK_RECORDING"]), 0))
            .await;
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn test_flag_command() {
        let (conn, _) = scripted(vec![Frame::from(["1"]), Frame::from(["0"])]);
        let catalog = conn.catalog();

        assert!(catalog.call(FlagCommand::new(Frame::from(["X"]))).await);
        assert!(!catalog.call(FlagCommand::new(Frame::from(["X"]))).await);
    }

    #[tokio::test]
    async fn test_try_call_keeps_error() {
        let (conn, _) = scripted(vec![Frame::new()]);
        let err = conn
            .catalog()
            .try_call(&FlagCommand::new(Frame::from(["X"])))
            .await
            .unwrap_err();
        assert!(matches!(err, PeerwireError::ShortReply { .. }));
    }
}
