use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lenient::{de_start_time, de_text};

/// One utterance of a normalized transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment identifier, unique within its document
    #[serde(default, deserialize_with = "de_text")]
    pub seg_id: String,
    /// Speaker label (may be empty)
    #[serde(default, deserialize_with = "de_text")]
    pub speaker: String,
    /// Start time in whole seconds
    #[serde(default, deserialize_with = "de_start_time")]
    pub start_time_s: u64,
    /// Utterance text
    #[serde(default, deserialize_with = "de_text")]
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(
        seg_id: impl Into<String>,
        speaker: impl Into<String>,
        start_time_s: u64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            seg_id: seg_id.into(),
            speaker: speaker.into(),
            start_time_s,
            text: text.into(),
        }
    }
}

/// A normalized transcript document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptDocument {
    /// Primary key across the transcript corpus
    #[serde(default, deserialize_with = "de_text")]
    pub doc_id: String,
    /// Ordered segments
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptDocument {
    /// Index segments by id, keeping the first segment for repeated ids
    pub fn segment_index(&self) -> HashMap<&str, &TranscriptSegment> {
        let mut index = HashMap::new();
        for segment in &self.segments {
            if segment.seg_id.is_empty() {
                continue;
            }
            index.entry(segment.seg_id.as_str()).or_insert(segment);
        }
        index
    }
}

/// Map of seg_id -> start time, used to derive fallback claim time ranges.
///
/// Segments without an id are ignored; a repeated id keeps the last start.
pub fn start_time_by_seg_id(segments: &[TranscriptSegment]) -> HashMap<String, i64> {
    segments
        .iter()
        .filter(|s| !s.seg_id.is_empty())
        .map(|s| (s.seg_id.clone(), s.start_time_s as i64))
        .collect()
}
