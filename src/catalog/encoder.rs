//! Encoder verbs.
//!
//! Every request here is addressed to one tuner: field 0 is
//! `QUERY_REMOTEENCODER <tuner>` and field 1 the command.

use std::marker::PhantomData;

use super::{Catalog, FlagCommand, IntCommand, Verb};
use crate::codec::{FromFields, ProgramRecord, ToFields};
use crate::error::Result;
use crate::protocol::Frame;
use crate::record::{InputInfo, RecStatus, TunerState};

/// Bit rate reported when the peer can't be asked (an HD-PVR's peak rate).
pub const DEFAULT_MAX_BITRATE: i64 = 20_200_000;

/// Field 0 of a free-inputs reply with no inputs.
pub const EMPTY_LIST: &str = "EMPTY_LIST";

/// Build `["QUERY_REMOTEENCODER <tuner>", command]`.
pub fn encoder_request(tuner: u32, command: &str) -> Frame {
    let mut request = Frame::with_verb(format!("QUERY_REMOTEENCODER {}", tuner));
    request.push(command);
    request
}

fn encoder_record_request(tuner: u32, command: &str, record: &impl ToFields) -> Frame {
    let mut request = encoder_request(tuner, command);
    record.to_fields(&mut request);
    request
}

/// Busy state of a tuner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyStatus {
    pub busy: bool,
    /// The input in use, when the peer reports one.
    pub input: Option<InputInfo>,
}

/// `IS_BUSY`: is the tuner busy now or within `time_buffer` seconds.
#[derive(Debug, Clone)]
pub struct IsBusy {
    request: Frame,
}

impl IsBusy {
    /// Ask whether `tuner` is busy within the next `time_buffer` seconds.
    pub fn new(tuner: u32, time_buffer: i32) -> Self {
        let mut request = encoder_request(tuner, "IS_BUSY");
        request.push_int(time_buffer);
        Self { request }
    }
}

impl Verb for IsBusy {
    type Output = BusyStatus;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<BusyStatus> {
        let mut cursor = reply.cursor(0);
        let busy = cursor.next_bool()?;
        if cursor.is_exhausted() {
            return Ok(BusyStatus { busy, input: None });
        }

        match InputInfo::from_fields(&mut cursor) {
            Ok(input) => Ok(BusyStatus {
                busy,
                input: Some(input),
            }),
            Err(e) => {
                // Unparseable input: report the tuner as free.
                tracing::warn!("Failed to parse busy input: {}", e);
                Ok(BusyStatus::default())
            }
        }
    }

    fn fallback(&self) -> BusyStatus {
        BusyStatus::default()
    }
}

/// `GET_STATE`: the tuner's current state.
#[derive(Debug, Clone)]
pub struct EncoderState {
    request: Frame,
}

impl EncoderState {
    /// Query the state of `tuner`.
    pub fn new(tuner: u32) -> Self {
        Self {
            request: encoder_request(tuner, "GET_STATE"),
        }
    }
}

impl Verb for EncoderState {
    type Output = TunerState;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<TunerState> {
        reply.cursor(0).next_int().map(TunerState::from_code)
    }

    fn fallback(&self) -> TunerState {
        TunerState::Error
    }
}

/// `GET_MAX_BITRATE`: the most bits per second the tuner can produce.
#[derive(Debug, Clone)]
pub struct MaxBitrate {
    request: Frame,
}

impl MaxBitrate {
    /// Query the highest bitrate `tuner` can produce.
    pub fn new(tuner: u32) -> Self {
        Self {
            request: encoder_request(tuner, "GET_MAX_BITRATE"),
        }
    }
}

impl Verb for MaxBitrate {
    type Output = i64;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        2
    }

    fn decode(&self, reply: Frame) -> Result<i64> {
        reply.cursor(0).next_wide_int()
    }

    fn fallback(&self) -> i64 {
        DEFAULT_MAX_BITRATE
    }
}

/// `GET_CURRENT_RECORDING`: the record the tuner is recording.
pub struct CurrentRecording<P> {
    request: Frame,
    _record: PhantomData<fn() -> P>,
}

impl<P: ProgramRecord> CurrentRecording<P> {
    /// Query what `tuner` is recording.
    pub fn new(tuner: u32) -> Self {
        Self {
            request: encoder_request(tuner, "GET_CURRENT_RECORDING"),
            _record: PhantomData,
        }
    }
}

impl<P: ProgramRecord> Verb for CurrentRecording<P> {
    type Output = Option<P>;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn decode(&self, reply: Frame) -> Result<Option<P>> {
        P::from_fields(&mut reply.cursor(0)).map(Some)
    }

    fn fallback(&self) -> Option<P> {
        None
    }
}

/// `START_RECORDING`: start recording a program now.
#[derive(Debug, Clone)]
pub struct StartRecording {
    request: Frame,
}

impl StartRecording {
    /// Start recording `program` on `tuner`.
    pub fn new(tuner: u32, program: &impl ToFields) -> Self {
        Self {
            request: encoder_record_request(tuner, "START_RECORDING", program),
        }
    }
}

impl Verb for StartRecording {
    type Output = RecStatus;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<RecStatus> {
        reply.cursor(0).next_int().map(RecStatus::from_code)
    }

    fn fallback(&self) -> RecStatus {
        RecStatus::Unknown
    }
}

/// `GET_FREE_INPUTS`: inputs free on the tuner's card, skipping `excluded` cards.
#[derive(Debug, Clone)]
pub struct FreeInputs {
    request: Frame,
}

impl FreeInputs {
    /// List inputs of `tuner` that are free, skipping `excluded_cards`.
    pub fn new(tuner: u32, excluded_cards: &[u32]) -> Self {
        let mut request = encoder_request(tuner, "GET_FREE_INPUTS");
        for card in excluded_cards {
            request.push_int(*card);
        }
        Self { request }
    }
}

impl Verb for FreeInputs {
    type Output = Vec<InputInfo>;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn decode(&self, reply: Frame) -> Result<Vec<InputInfo>> {
        let mut cursor = reply.cursor(0);
        if matches!(cursor.peek(), None | Some(EMPTY_LIST)) {
            return Ok(Vec::new());
        }

        let mut inputs = Vec::new();
        while !cursor.is_exhausted() {
            match InputInfo::from_fields(&mut cursor) {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    tracing::debug!("Stopping at unparseable input {}: {}", inputs.len(), e);
                    break;
                }
            }
        }
        Ok(inputs)
    }

    fn fallback(&self) -> Vec<InputInfo> {
        Vec::new()
    }
}

impl Catalog<'_> {
    /// Check if a tuner is busy, or will be within `time_buffer` seconds.
    pub async fn is_busy(&self, tuner: u32, time_buffer: i32) -> BusyStatus {
        self.call(IsBusy::new(tuner, time_buffer)).await
    }

    /// Get a tuner's state. [`TunerState::Error`] on failure.
    pub async fn encoder_state(&self, tuner: u32) -> TunerState {
        self.call(EncoderState::new(tuner)).await
    }

    /// Get a tuner's peak bit rate in bits per second.
    pub async fn max_bitrate(&self, tuner: u32) -> i64 {
        self.call(MaxBitrate::new(tuner)).await
    }

    /// Get the record a tuner is recording, if any.
    pub async fn current_recording<P: ProgramRecord>(&self, tuner: u32) -> Option<P> {
        self.call(CurrentRecording::new(tuner)).await
    }

    /// Check if a tuner is recording `program`.
    pub async fn encoder_is_recording(&self, tuner: u32, program: &impl ToFields) -> bool {
        self.call(FlagCommand::new(encoder_record_request(
            tuner,
            "MATCHES_RECORDING",
            program,
        )))
        .await
    }

    /// Start recording `program` on a tuner.
    pub async fn start_recording(&self, tuner: u32, program: &impl ToFields) -> RecStatus {
        self.call(StartRecording::new(tuner, program)).await
    }

    /// Warn a tuner that `program` starts in `secs_left` seconds.
    pub async fn record_pending(
        &self,
        tuner: u32,
        program: &impl ToFields,
        secs_left: i32,
        has_later: bool,
    ) {
        let mut request = encoder_request(tuner, "RECORD_PENDING");
        request.push_int(secs_left);
        request.push_bool(has_later);
        program.to_fields(&mut request);
        self.ack(request).await
    }

    /// Set how often (in ms) a tuner reports signal quality.
    ///
    /// Returns the previous rate, or `-1` on failure.
    pub async fn set_signal_monitoring_rate(
        &self,
        tuner: u32,
        rate: i32,
        notify_frontend: bool,
    ) -> i32 {
        let mut request = encoder_request(tuner, "SET_SIGNAL_MONITORING_RATE");
        request.push_int(rate);
        request.push_bool(notify_frontend);
        self.call(IntCommand::new(request, -1)).await
    }

    /// Tell a tuner where to put its next live TV buffer.
    pub async fn set_next_live_tv_dir(&self, tuner: u32, dir: &str) {
        self.ack(Frame::with_verb(format!(
            "SET_NEXT_LIVETV_DIR {} {}",
            tuner, dir
        )))
        .await
    }

    /// Free inputs on a tuner's card, excluding the listed cards.
    ///
    /// Stops at the first input that fails to parse.
    pub async fn free_inputs(&self, tuner: u32, excluded_cards: &[u32]) -> Vec<InputInfo> {
        self.call(FreeInputs::new(tuner, excluded_cards)).await
    }

    /// Cancel (or un-cancel) a tuner's next scheduled recording.
    pub async fn cancel_next_recording(&self, tuner: u32, cancel: bool) {
        let mut request = encoder_request(tuner, "CANCEL_NEXT_RECORDING");
        request.push_bool(cancel);
        self.ack(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{scripted, TestProgram};

    fn input_fields(input: &InputInfo) -> Vec<String> {
        let mut frame = Frame::new();
        input.to_fields(&mut frame);
        frame.into_fields()
    }

    #[test]
    fn test_encoder_request() {
        assert_eq!(
            encoder_request(3, "GET_STATE"),
            Frame::from(["QUERY_REMOTEENCODER 3", "GET_STATE"])
        );
    }

    #[tokio::test]
    async fn test_is_busy_with_input() {
        let input = InputInfo::new("DVBInput", 1, 3, 3);
        let mut reply = Frame::from(["1"]);
        reply.extend(input_fields(&input));

        let (conn, written) = scripted(vec![reply]);
        let status = conn.catalog().is_busy(3, 5).await;

        assert!(status.busy);
        assert_eq!(status.input, Some(input));
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["QUERY_REMOTEENCODER 3", "IS_BUSY", "5"])
        );
    }

    #[tokio::test]
    async fn test_is_busy_without_input() {
        let (conn, _) = scripted(vec![Frame::from(["0"]), Frame::from(["1"])]);
        let catalog = conn.catalog();

        assert_eq!(catalog.is_busy(3, 5).await, BusyStatus::default());
        assert_eq!(
            catalog.is_busy(3, 5).await,
            BusyStatus {
                busy: true,
                input: None
            }
        );
    }

    #[tokio::test]
    async fn test_is_busy_bad_input_reports_free() {
        let (conn, _) = scripted(vec![Frame::from(["1", "DVBInput", "x"])]);
        assert_eq!(conn.catalog().is_busy(3, 5).await, BusyStatus::default());
    }

    #[tokio::test]
    async fn test_is_busy_no_reply() {
        let (conn, _) = scripted(vec![Frame::new()]);
        assert_eq!(conn.catalog().is_busy(3, 5).await, BusyStatus::default());
    }

    #[tokio::test]
    async fn test_encoder_state() {
        let (conn, _) = scripted(vec![Frame::from(["6"]), Frame::from(["?"])]);
        let catalog = conn.catalog();

        assert_eq!(catalog.encoder_state(1).await, TunerState::RecordingOnly);
        assert_eq!(catalog.encoder_state(1).await, TunerState::Error);
        // Connection closed.
        assert_eq!(catalog.encoder_state(1).await, TunerState::Error);
    }

    #[tokio::test]
    async fn test_max_bitrate() {
        let (conn, _) = scripted(vec![Frame::from(["4", "-1274836480"]), Frame::from(["4"])]);
        let catalog = conn.catalog();

        assert_eq!(catalog.max_bitrate(2).await, 20_200_000_000);
        assert_eq!(catalog.max_bitrate(2).await, DEFAULT_MAX_BITRATE);
    }

    #[tokio::test]
    async fn test_current_recording() {
        let (conn, written) = scripted(vec![
            Frame::from(["1001", "1700000000", "/video/1001.ts"]),
            Frame::from(["nothing"]),
        ]);
        let catalog = conn.catalog();

        let program: Option<TestProgram> = catalog.current_recording(4).await;
        assert_eq!(program.unwrap().pathname, "/video/1001.ts");

        let none: Option<TestProgram> = catalog.current_recording(4).await;
        assert!(none.is_none());
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["QUERY_REMOTEENCODER 4", "GET_CURRENT_RECORDING"])
        );
    }

    #[tokio::test]
    async fn test_start_recording() {
        let (conn, written) = scripted(vec![Frame::from(["-2"]), Frame::from(["99"])]);
        let catalog = conn.catalog();
        let program = TestProgram::new(1001, 0);

        assert_eq!(catalog.start_recording(2, &program).await, RecStatus::Recording);
        assert_eq!(catalog.start_recording(2, &program).await, RecStatus::Unknown);
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["QUERY_REMOTEENCODER 2", "START_RECORDING", "1001", "0", "<EMPTY>"])
        );
    }

    #[tokio::test]
    async fn test_free_inputs() {
        let first = InputInfo::new("DVBInput", 1, 3, 3);
        let second = InputInfo::new("", 2, 4, 3).with_multiplex(7);
        let mut reply = Frame::new();
        reply.extend(input_fields(&first));
        reply.extend(input_fields(&second));

        let (conn, written) = scripted(vec![reply, Frame::from([EMPTY_LIST])]);
        let catalog = conn.catalog();

        assert_eq!(catalog.free_inputs(3, &[1, 2]).await, vec![first, second]);
        assert!(catalog.free_inputs(3, &[]).await.is_empty());
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["QUERY_REMOTEENCODER 3", "GET_FREE_INPUTS", "1", "2"])
        );
    }

    #[tokio::test]
    async fn test_free_inputs_truncates_on_bad_record() {
        let first = InputInfo::new("DVBInput", 1, 3, 3);
        let mut reply = Frame::new();
        reply.extend(input_fields(&first));
        reply.extend(["Partial", "1"]);

        let (conn, _) = scripted(vec![reply, Frame::new()]);
        let catalog = conn.catalog();

        assert_eq!(catalog.free_inputs(3, &[]).await, vec![first]);
        assert!(catalog.free_inputs(3, &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_tuner_commands() {
        let (conn, written) = scripted(vec![
            Frame::from(["1"]),
            Frame::from(["ok"]),
            Frame::from(["500"]),
            Frame::from(["ok"]),
            Frame::from(["ok"]),
        ]);
        let catalog = conn.catalog();
        let program = TestProgram::new(1001, 0);

        assert!(catalog.encoder_is_recording(2, &program).await);
        catalog.record_pending(2, &program, 90, true).await;
        assert_eq!(catalog.set_signal_monitoring_rate(2, 250, false).await, 500);
        catalog.set_next_live_tv_dir(2, "/video/live").await;
        catalog.cancel_next_recording(2, true).await;
        // Connection closed.
        assert_eq!(catalog.set_signal_monitoring_rate(2, 250, false).await, -1);

        let written = written.lock().unwrap();
        assert_eq!(
            written[0],
            Frame::from(["QUERY_REMOTEENCODER 2", "MATCHES_RECORDING", "1001", "0", "<EMPTY>"])
        );
        assert_eq!(
            written[1],
            Frame::from([
                "QUERY_REMOTEENCODER 2",
                "RECORD_PENDING",
                "90",
                "1",
                "1001",
                "0",
                "<EMPTY>"
            ])
        );
        assert_eq!(
            written[2],
            Frame::from(["QUERY_REMOTEENCODER 2", "SET_SIGNAL_MONITORING_RATE", "250", "0"])
        );
        assert_eq!(written[3], Frame::from(["SET_NEXT_LIVETV_DIR 2 /video/live"]));
        assert_eq!(
            written[4],
            Frame::from(["QUERY_REMOTEENCODER 2", "CANCEL_NEXT_RECORDING", "1"])
        );
    }
}
