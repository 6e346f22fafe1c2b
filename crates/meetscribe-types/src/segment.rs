use serde::{Deserialize, Serialize};

/// One labeled, time-bounded utterance. Segments of a meeting are kept
/// ordered non-decreasing by `start_time`; overlap between segments is
/// allowed (diarization turns and STT segments don't always align).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub meeting_id: i64,
    pub speaker: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}
