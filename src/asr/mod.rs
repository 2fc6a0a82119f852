//! Speech recognition pipeline seams.
//!
//! The external ASR stack is reached through the [`Transcriber`] and
//! [`Aligner`] traits so the orchestrator can be exercised with mocks and the
//! whisper backend stays swappable.

pub mod diarize;
pub mod segment;
pub mod whisper;

use crate::error::{Result, ScribeError};
use segment::{Segment, Transcript, Word};

/// Batched speech-to-text over a 16kHz mono recording.
pub trait Transcriber {
    /// Transcribe the recording into timestamped segments.
    fn transcribe(&self, samples: &[i16]) -> Result<Transcript>;

    /// Name of the loaded model.
    fn model_name(&self) -> &str;
}

/// Word-level timestamp refinement.
pub trait Aligner {
    /// Re-align segment timestamps to word precision, in place.
    fn align(&self, samples: &[i16], transcript: &mut Transcript) -> Result<()>;
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    transcript: Transcript,
    should_fail: bool,
}

impl MockTranscriber {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            transcript: Transcript::new("zh"),
            should_fail: false,
        }
    }

    /// Configure the mock to return the given segments.
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.transcript.segments = segments;
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _samples: &[i16]) -> Result<Transcript> {
        if self.should_fail {
            Err(ScribeError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.transcript.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Mock aligner: gives every segment a single word spanning its full range.
#[derive(Debug, Clone, Default)]
pub struct MockAligner {
    should_fail: bool,
}

impl MockAligner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Aligner for MockAligner {
    fn align(&self, _samples: &[i16], transcript: &mut Transcript) -> Result<()> {
        if self.should_fail {
            return Err(ScribeError::Alignment {
                message: "mock alignment failure".to_string(),
            });
        }
        for segment in &mut transcript.segments {
            segment.words = vec![Word {
                word: segment.text.clone(),
                start: segment.start,
                end: segment.end,
                score: Some(1.0),
                speaker: None,
            }];
        }
        Ok(())
    }
}
