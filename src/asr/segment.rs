//! Transcript data model.
//!
//! These records mirror the shape the downstream JSON artifact exposes: an
//! ordered list of utterance segments with optional speaker labels and
//! word-level alignment detail. Optional fields are omitted from the JSON when
//! absent so a run without diarization carries no `speaker` keys at all.

use serde::{Deserialize, Serialize};

/// One aligned word within a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Decoder confidence for this word, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// One utterance span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Word-level alignment detail; empty until the alignment pass has run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: &str) -> Self {
        Self {
            start,
            end,
            text: text.to_string(),
            speaker: None,
            words: Vec::new(),
        }
    }
}

/// The full result of one transcription run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Transcript {
    pub language: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            segments: Vec::new(),
        }
    }

    /// True if no segment carries any text.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_field_is_omitted_when_absent() {
        let segment = Segment::new(0.0, 5.0, "你好");
        let json = serde_json::to_string(&segment).unwrap();

        assert!(!json.contains("speaker"));
        assert!(!json.contains("words"));
    }

    #[test]
    fn speaker_field_is_present_when_set() {
        let mut segment = Segment::new(0.0, 5.0, "你好");
        segment.speaker = Some("SPEAKER_00".to_string());
        let json = serde_json::to_string(&segment).unwrap();

        assert!(json.contains("\"speaker\":\"SPEAKER_00\""));
    }

    #[test]
    fn json_preserves_non_ascii_text() {
        let transcript = Transcript {
            language: "zh".to_string(),
            segments: vec![Segment::new(0.0, 1.5, "谢谢大家")],
        };
        let json = serde_json::to_string_pretty(&transcript).unwrap();

        // serde_json writes UTF-8 directly; no \u escapes for CJK text.
        assert!(json.contains("谢谢大家"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn transcript_is_empty_with_whitespace_only_segments() {
        let transcript = Transcript {
            language: "zh".to_string(),
            segments: vec![Segment::new(0.0, 1.0, "  "), Segment::new(1.0, 2.0, "")],
        };
        assert!(transcript.is_empty());

        let mut with_text = transcript.clone();
        with_text.segments.push(Segment::new(2.0, 3.0, "好"));
        assert!(!with_text.is_empty());
    }
}
