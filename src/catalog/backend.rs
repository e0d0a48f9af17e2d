//! Backend-level verbs.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use super::{AckCommand, Catalog, IntCommand, RawCommand, Verb};
use crate::codec::{encode_optional, push_wide_int, ProgramRecord, ToFields};
use crate::error::{PeerwireError, Result};
use crate::protocol::Frame;

/// Preview time unit marker: seconds.
pub const PREVIEW_SECONDS: &str = "s";
/// Preview time unit marker: frames.
pub const PREVIEW_FRAMES: &str = "f";

const REPLY_OK: &str = "OK";
const REPLY_BAD: &str = "BAD";

fn record_request(verb: &str, record: &impl ToFields) -> Frame {
    let mut request = Frame::with_verb(verb);
    record.to_fields(&mut request);
    request
}

/// `GO_TO_SLEEP`: ask the peer to power down.
#[derive(Debug, Clone)]
pub struct GoToSleep {
    request: Frame,
}

impl Default for GoToSleep {
    fn default() -> Self {
        Self {
            request: Frame::with_verb("GO_TO_SLEEP"),
        }
    }
}

impl Verb for GoToSleep {
    type Output = bool;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        1
    }

    fn decode(&self, reply: Frame) -> Result<bool> {
        Ok(reply.verb() == Some(REPLY_OK))
    }

    fn fallback(&self) -> bool {
        false
    }
}

/// `FILL_PROGRAM_INFO`: have the peer complete a record.
pub struct FillProgramInfo<P> {
    request: Frame,
    _record: PhantomData<fn() -> P>,
}

impl<P: ProgramRecord> FillProgramInfo<P> {
    /// Ask the peer to complete `program` for playback on `playback_host`.
    pub fn new(program: &P, playback_host: &str) -> Self {
        let mut request = Frame::with_verb("FILL_PROGRAM_INFO");
        request.push(playback_host);
        program.to_fields(&mut request);
        Self {
            request,
            _record: PhantomData,
        }
    }
}

impl<P: ProgramRecord> Verb for FillProgramInfo<P> {
    type Output = Option<P>;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        P::FIELD_COUNT
    }

    fn decode(&self, reply: Frame) -> Result<Option<P>> {
        P::from_fields(&mut reply.cursor(0)).map(Some)
    }

    fn fallback(&self) -> Option<P> {
        None
    }
}

/// `QUERY_PIXMAP_LASTMODIFIED`: when the preview image was last written.
#[derive(Debug, Clone)]
pub struct PixmapLastModified {
    request: Frame,
}

impl PixmapLastModified {
    /// Query the preview image time for `program`.
    pub fn new(program: &impl ToFields) -> Self {
        Self {
            request: record_request("QUERY_PIXMAP_LASTMODIFIED", program),
        }
    }
}

impl Verb for PixmapLastModified {
    type Output = DateTime<Utc>;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn decode(&self, reply: Frame) -> Result<DateTime<Utc>> {
        let mut cursor = reply.cursor(0);
        let field = cursor.next_str()?;
        if field == REPLY_BAD {
            return Ok(self.fallback());
        }

        let secs = crate::codec::parse_int::<u32>(field).ok_or_else(|| {
            PeerwireError::Hydration(format!("bad modification time: {:?}", field))
        })?;
        DateTime::<Utc>::from_timestamp(i64::from(secs), 0)
            .ok_or_else(|| PeerwireError::Hydration(format!("timestamp out of range: {}", secs)))
    }

    fn fallback(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }
}

/// Reply to a file check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFileReply {
    pub exists: bool,
    pub pathname: String,
}

/// `QUERY_CHECKFILE`: check that a recording's file exists on the peer.
///
/// Slaves are never asked to check on our behalf (field 1 is `0`).
#[derive(Debug, Clone)]
pub struct CheckFile {
    request: Frame,
}

impl CheckFile {
    /// Check the file behind `program`.
    pub fn new(program: &impl ToFields) -> Self {
        let mut request = Frame::with_verb("QUERY_CHECKFILE");
        request.push_bool(false);
        program.to_fields(&mut request);
        Self { request }
    }
}

impl Verb for CheckFile {
    type Output = Option<CheckFileReply>;

    fn request(&self) -> &Frame {
        &self.request
    }

    fn min_reply_length(&self) -> usize {
        2
    }

    fn decode(&self, reply: Frame) -> Result<Option<CheckFileReply>> {
        let mut cursor = reply.cursor(0);
        Ok(Some(CheckFileReply {
            exists: cursor.next_bool()?,
            pathname: cursor.next_str()?.to_string(),
        }))
    }

    fn fallback(&self) -> Option<CheckFileReply> {
        None
    }
}

/// Options for a preview image generated at a chosen position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewRequest {
    /// Position in the recording.
    pub position: i64,
    /// `true` if `position` counts seconds, `false` for frames.
    pub in_seconds: bool,
    /// Where the peer should write the image. `None` uses its default.
    pub output_file: Option<String>,
    pub width: i32,
    pub height: i32,
}

impl PreviewRequest {
    /// Preview `secs` seconds into the recording.
    pub fn at_seconds(secs: i64) -> Self {
        Self {
            position: secs,
            in_seconds: true,
            ..Self::default()
        }
    }

    /// Preview at frame `frame`.
    pub fn at_frame(frame: i64) -> Self {
        Self {
            position: frame,
            in_seconds: false,
            ..Self::default()
        }
    }

    /// Write the image to `path` instead of the default location.
    pub fn output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Set the image size in pixels.
    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn push_fields(&self, frame: &mut Frame) {
        frame.push(if self.in_seconds {
            PREVIEW_SECONDS
        } else {
            PREVIEW_FRAMES
        });
        push_wide_int(frame, self.position);
        frame.push(encode_optional(self.output_file.as_deref()));
        frame.push_int(self.width);
        frame.push_int(self.height);
    }
}

impl Catalog<'_> {
    /// Ask the peer to go to sleep. `true` only if it answered `OK`.
    pub async fn go_to_sleep(&self) -> bool {
        self.call(GoToSleep::default()).await
    }

    /// Append the peer's disk space report to `out`.
    ///
    /// Nothing is appended if the query fails.
    pub async fn query_free_space(&self, out: &mut Vec<String>) {
        let reply = self
            .call(RawCommand::new(Frame::with_verb("QUERY_FREE_SPACE")))
            .await;
        out.extend(reply);
    }

    /// Check whether a recording is in progress. `0` on failure.
    pub async fn check_recording_active(&self, program: &impl ToFields) -> i32 {
        self.call(IntCommand::new(record_request("CHECK_RECORDING", program), 0))
            .await
    }

    /// Stop a recording. `0` on failure.
    pub async fn stop_recording(&self, program: &impl ToFields) -> i32 {
        self.call(IntCommand::new(record_request("STOP_RECORDING", program), 0))
            .await
    }

    /// Delete a recording, optionally removing its metadata even if the file is gone.
    pub async fn delete_recording(&self, program: &impl ToFields, force: bool) -> i32 {
        let verb = if force {
            "FORCE_DELETE_RECORDING"
        } else {
            "DELETE_RECORDING"
        };
        self.call(IntCommand::new(record_request(verb, program), 0))
            .await
    }

    /// Have the peer fill in `program` for playback from `playback_host`.
    ///
    /// On success `program` is replaced with the peer's version; on failure
    /// it is left untouched.
    pub async fn fill_program_info<P: ProgramRecord>(
        &self,
        program: &mut P,
        playback_host: &str,
    ) -> bool {
        match self
            .call(FillProgramInfo::new(&*program, playback_host))
            .await
        {
            Some(filled) => {
                *program = filled;
                true
            }
            None => false,
        }
    }

    /// Modification time of the recording's preview image.
    ///
    /// The Unix epoch if the peer has none or the query fails.
    pub async fn pixmap_last_modified(&self, program: &impl ToFields) -> DateTime<Utc> {
        self.call(PixmapLastModified::new(program)).await
    }

    /// Check that the recording's file exists on the peer.
    ///
    /// Whenever the peer answers, the path it reports is written to
    /// `program`, even if the file does not exist.
    pub async fn check_file<P: ProgramRecord>(&self, program: &mut P) -> bool {
        match self.call(CheckFile::new(&*program)).await {
            Some(reply) => {
                program.set_pathname(reply.pathname);
                reply.exists
            }
            None => false,
        }
    }

    /// List a directory of a storage group on `host`.
    pub async fn storage_group_file_list(&self, host: &str, group: &str, dir: &str) -> Frame {
        self.call(RawCommand::new(Frame::from([
            "QUERY_SG_GETFILELIST",
            host,
            group,
            dir,
        ])))
        .await
    }

    /// Query one file of a storage group on `host`.
    pub async fn storage_group_file_query(&self, host: &str, group: &str, file: &str) -> Frame {
        self.call(RawCommand::new(Frame::from([
            "QUERY_SG_FILEQUERY",
            host,
            group,
            file,
        ])))
        .await
    }

    /// Generate the default preview image for a recording.
    pub async fn generate_preview(&self, program: &impl ToFields) -> Frame {
        self.call(RawCommand::new(record_request("QUERY_GENPIXMAP", program)))
            .await
    }

    /// Generate a preview image at a chosen position and size.
    pub async fn generate_preview_at(
        &self,
        program: &impl ToFields,
        preview: &PreviewRequest,
    ) -> Frame {
        let mut request = record_request("QUERY_GENPIXMAP", program);
        preview.push_fields(&mut request);
        self.call(RawCommand::new(request)).await
    }

    pub(crate) async fn ack(&self, request: Frame) {
        self.call(AckCommand::new(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{scripted, TestProgram};

    #[tokio::test]
    async fn test_go_to_sleep() {
        let (conn, written) = scripted(vec![Frame::from(["OK"]), Frame::from(["ERROR"])]);
        let catalog = conn.catalog();

        assert!(catalog.go_to_sleep().await);
        assert!(!catalog.go_to_sleep().await);
        assert_eq!(written.lock().unwrap()[0], Frame::from(["GO_TO_SLEEP"]));
    }

    #[tokio::test]
    async fn test_go_to_sleep_no_reply() {
        let (conn, _) = scripted(vec![]);
        assert!(!conn.catalog().go_to_sleep().await);
    }

    #[tokio::test]
    async fn test_query_free_space_appends() {
        let (conn, _) = scripted(vec![Frame::from(["slave-1", "/video", "100", "50"])]);
        let mut out = vec!["master".to_string()];

        conn.catalog().query_free_space(&mut out).await;
        assert_eq!(out, vec!["master", "slave-1", "/video", "100", "50"]);
    }

    #[tokio::test]
    async fn test_query_free_space_failure_appends_nothing() {
        let (conn, _) = scripted(vec![]);
        let mut out = vec!["master".to_string()];

        conn.catalog().query_free_space(&mut out).await;
        assert_eq!(out, vec!["master"]);
    }

    #[tokio::test]
    async fn test_recording_commands() {
        let (conn, written) = scripted(vec![
            Frame::from(["1"]),
            Frame::from(["-1"]),
            Frame::from(["0"]),
            Frame::from(["2"]),
        ]);
        let catalog = conn.catalog();
        let program = TestProgram::new(1001, 1_700_000_000);

        assert_eq!(catalog.check_recording_active(&program).await, 1);
        assert_eq!(catalog.stop_recording(&program).await, -1);
        assert_eq!(catalog.delete_recording(&program, false).await, 0);
        assert_eq!(catalog.delete_recording(&program, true).await, 2);

        let verbs: Vec<_> = written
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.verb().unwrap().to_string())
            .collect();
        assert_eq!(
            verbs,
            vec![
                "CHECK_RECORDING",
                "STOP_RECORDING",
                "DELETE_RECORDING",
                "FORCE_DELETE_RECORDING"
            ]
        );
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["CHECK_RECORDING", "1001", "1700000000", "<EMPTY>"])
        );
    }

    #[tokio::test]
    async fn test_fill_program_info() {
        let (conn, written) = scripted(vec![Frame::from(["1001", "1700000000", "/video/1001.ts"])]);
        let mut program = TestProgram::new(1001, 1_700_000_000);

        assert!(conn.catalog().fill_program_info(&mut program, "frontend").await);
        assert_eq!(program.pathname, "/video/1001.ts");
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["FILL_PROGRAM_INFO", "frontend", "1001", "1700000000", "<EMPTY>"])
        );
    }

    #[tokio::test]
    async fn test_fill_program_info_short_reply_leaves_record() {
        let (conn, _) = scripted(vec![Frame::from(["1001"])]);
        let mut program = TestProgram::new(1001, 5);

        assert!(!conn.catalog().fill_program_info(&mut program, "frontend").await);
        assert_eq!(program, TestProgram::new(1001, 5));
    }

    #[tokio::test]
    async fn test_fill_program_info_bad_reply_leaves_record() {
        let (conn, _) = scripted(vec![Frame::from(["x", "y", "z"])]);
        let mut program = TestProgram::new(1001, 5);

        assert!(!conn.catalog().fill_program_info(&mut program, "frontend").await);
        assert_eq!(program, TestProgram::new(1001, 5));
    }

    #[tokio::test]
    async fn test_pixmap_last_modified() {
        let (conn, _) = scripted(vec![
            Frame::from(["1700000000"]),
            Frame::from(["BAD"]),
            Frame::new(),
        ]);
        let catalog = conn.catalog();
        let program = TestProgram::new(1001, 0);

        let modified = catalog.pixmap_last_modified(&program).await;
        assert_eq!(modified.timestamp(), 1_700_000_000);
        assert_eq!(catalog.pixmap_last_modified(&program).await, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(catalog.pixmap_last_modified(&program).await, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_check_file_sets_pathname() {
        let (conn, written) = scripted(vec![
            Frame::from(["1", "/video/1001.ts"]),
            Frame::from(["0", "/video/missing.ts"]),
        ]);
        let catalog = conn.catalog();
        let mut program = TestProgram::new(1001, 0);

        assert!(catalog.check_file(&mut program).await);
        assert_eq!(program.pathname, "/video/1001.ts");
        assert_eq!(
            written.lock().unwrap()[0],
            Frame::from(["QUERY_CHECKFILE", "0", "1001", "0", "<EMPTY>"])
        );

        assert!(!catalog.check_file(&mut program).await);
        assert_eq!(program.pathname, "/video/missing.ts");
    }

    #[tokio::test]
    async fn test_check_file_short_reply() {
        let (conn, _) = scripted(vec![Frame::from(["1"])]);
        let mut program = TestProgram::new(1001, 0);

        assert!(!conn.catalog().check_file(&mut program).await);
        assert!(program.pathname.is_empty());
    }

    #[tokio::test]
    async fn test_storage_group_queries() {
        let (conn, written) = scripted(vec![
            Frame::from(["sub/", "a.mpg"]),
            Frame::from(["/video/a.mpg", "123", "456"]),
        ]);
        let catalog = conn.catalog();

        let list = catalog
            .storage_group_file_list("slave-1", "Videos", "/")
            .await;
        assert_eq!(list.len(), 2);

        let query = catalog
            .storage_group_file_query("slave-1", "Videos", "a.mpg")
            .await;
        assert_eq!(query.verb(), Some("/video/a.mpg"));

        let written = written.lock().unwrap();
        assert_eq!(
            written[0],
            Frame::from(["QUERY_SG_GETFILELIST", "slave-1", "Videos", "/"])
        );
        assert_eq!(
            written[1],
            Frame::from(["QUERY_SG_FILEQUERY", "slave-1", "Videos", "a.mpg"])
        );
    }

    #[tokio::test]
    async fn test_generate_preview_at() {
        let (conn, written) = scripted(vec![Frame::from(["OK"]), Frame::from(["OK"])]);
        let catalog = conn.catalog();
        let program = TestProgram::new(7, 0);

        catalog.generate_preview(&program).await;
        let reply = catalog
            .generate_preview_at(
                &program,
                &PreviewRequest::at_seconds(20_200_000_000).size(320, 240),
            )
            .await;
        assert_eq!(reply.verb(), Some("OK"));

        let written = written.lock().unwrap();
        assert_eq!(written[0], Frame::from(["QUERY_GENPIXMAP", "7", "0", "<EMPTY>"]));
        assert_eq!(
            written[1],
            Frame::from([
                "QUERY_GENPIXMAP",
                "7",
                "0",
                "<EMPTY>",
                "s",
                "4",
                "-1274836480",
                "<EMPTY>",
                "320",
                "240"
            ])
        );
    }

    #[test]
    fn test_preview_request_frames() {
        let mut frame = Frame::new();
        PreviewRequest::at_frame(300)
            .output_file("/tmp/p.png")
            .push_fields(&mut frame);
        assert_eq!(frame, Frame::from(["f", "0", "300", "/tmp/p.png", "0", "0"]));
    }
}
