//! Numeric status codes carried in field 0 of encoder replies.

use serde::{Deserialize, Serialize};

/// State of a remote tuner's encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunerState {
    /// The peer could not be asked or answered with an unknown code.
    Error,
    None,
    WatchingLiveTv,
    WatchingPreRecorded,
    WatchingVideo,
    WatchingDvd,
    WatchingRecording,
    RecordingOnly,
    ChangingState,
}

impl TunerState {
    /// Wire code for this state.
    pub fn code(self) -> i32 {
        match self {
            TunerState::Error => -1,
            TunerState::None => 0,
            TunerState::WatchingLiveTv => 1,
            TunerState::WatchingPreRecorded => 2,
            TunerState::WatchingVideo => 3,
            TunerState::WatchingDvd => 4,
            TunerState::WatchingRecording => 5,
            TunerState::RecordingOnly => 6,
            TunerState::ChangingState => 7,
        }
    }

    /// Map a wire code to a state. Unknown codes map to [`TunerState::Error`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TunerState::None,
            1 => TunerState::WatchingLiveTv,
            2 => TunerState::WatchingPreRecorded,
            3 => TunerState::WatchingVideo,
            4 => TunerState::WatchingDvd,
            5 => TunerState::WatchingRecording,
            6 => TunerState::RecordingOnly,
            7 => TunerState::ChangingState,
            _ => TunerState::Error,
        }
    }

    /// Whether the tuner is producing a recording.
    pub fn is_recording(self) -> bool {
        matches!(
            self,
            TunerState::WatchingLiveTv | TunerState::WatchingRecording | TunerState::RecordingOnly
        )
    }
}

/// Outcome of asking a tuner to start a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecStatus {
    Failed,
    TunerBusy,
    LowDiskSpace,
    Cancelled,
    Missed,
    Aborted,
    Recorded,
    Recording,
    WillRecord,
    Unknown,
    DontRecord,
    PreviousRecording,
    CurrentRecording,
    EarlierShowing,
    TooManyRecordings,
    NotListed,
    Conflict,
    LaterShowing,
    Repeat,
    Inactive,
    NeverRecord,
    Offline,
    OtherShowing,
}

impl RecStatus {
    const TABLE: [(RecStatus, i32); 23] = [
        (RecStatus::Failed, -9),
        (RecStatus::TunerBusy, -8),
        (RecStatus::LowDiskSpace, -7),
        (RecStatus::Cancelled, -6),
        (RecStatus::Missed, -5),
        (RecStatus::Aborted, -4),
        (RecStatus::Recorded, -3),
        (RecStatus::Recording, -2),
        (RecStatus::WillRecord, -1),
        (RecStatus::Unknown, 0),
        (RecStatus::DontRecord, 1),
        (RecStatus::PreviousRecording, 2),
        (RecStatus::CurrentRecording, 3),
        (RecStatus::EarlierShowing, 4),
        (RecStatus::TooManyRecordings, 5),
        (RecStatus::NotListed, 6),
        (RecStatus::Conflict, 7),
        (RecStatus::LaterShowing, 8),
        (RecStatus::Repeat, 9),
        (RecStatus::Inactive, 10),
        (RecStatus::NeverRecord, 11),
        (RecStatus::Offline, 12),
        (RecStatus::OtherShowing, 13),
    ];

    /// Wire code for this status.
    pub fn code(self) -> i32 {
        Self::TABLE
            .iter()
            .find(|(status, _)| *status == self)
            .map_or(0, |(_, code)| *code)
    }

    /// Map a wire code to a status. Unknown codes map to [`RecStatus::Unknown`].
    pub fn from_code(code: i32) -> Self {
        Self::TABLE
            .iter()
            .find(|(_, c)| *c == code)
            .map_or(RecStatus::Unknown, |(status, _)| *status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuner_state_codes() {
        for code in -1..=7 {
            assert_eq!(TunerState::from_code(code).code(), code);
        }
        assert_eq!(TunerState::from_code(42), TunerState::Error);
    }

    #[test]
    fn test_tuner_state_is_recording() {
        assert!(TunerState::RecordingOnly.is_recording());
        assert!(!TunerState::None.is_recording());
    }

    #[test]
    fn test_rec_status_codes() {
        for code in -9..=13 {
            assert_eq!(RecStatus::from_code(code).code(), code);
        }
        assert_eq!(RecStatus::from_code(-2), RecStatus::Recording);
        assert_eq!(RecStatus::from_code(99), RecStatus::Unknown);
    }
}
