//! Speaker diarization.
//!
//! Splits the recording into speaker turns (pyannote segmentation + speaker
//! embedding clustering) and merges the resulting labels into the transcript
//! by temporal overlap. Every failure in this stage is reported as
//! [`ScribeError::Diarization`] so the orchestrator can degrade to an
//! unlabeled transcript instead of aborting the run.
//!
//! # Feature Gate
//!
//! The real diarizer requires the `diarize` feature (enabled by default).
//! Without it, construction fails with a build hint, which flows through the
//! same degradation path.

use crate::asr::segment::Transcript;
use crate::config::DiarizationConfig;
use crate::error::{Result, ScribeError};
#[cfg(feature = "diarize")]
use std::path::PathBuf;

/// Segmentation model, ONNX export of pyannote segmentation-3.0.
#[cfg(feature = "diarize")]
const SEGMENTATION_REPO: &str = "onnx-community/pyannote-segmentation-3.0";
#[cfg(feature = "diarize")]
const SEGMENTATION_FILE: &str = "onnx/model.onnx";

/// Speaker embedding model used to cluster segments into speakers.
#[cfg(feature = "diarize")]
const EMBEDDING_REPO: &str = "onnx-community/wespeaker-voxceleb-resnet34-LM";
#[cfg(feature = "diarize")]
const EMBEDDING_FILE: &str = "onnx/model.onnx";

/// One span of audio attributed to a single speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTurn {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    pub speaker: String,
}

/// Trait for speaker diarization, allowing mocks in tests.
pub trait Diarizer {
    /// Attribute speaker turns across a mono recording.
    fn diarize(&mut self, samples: &[i16], sample_rate: u32) -> Result<Vec<SpeakerTurn>>;
}

/// Render a cluster id as the conventional diarization label (`SPEAKER_00`).
pub fn speaker_label(id: usize) -> String {
    format!("SPEAKER_{:02}", id)
}

/// Merge speaker turns into the transcript by maximal temporal overlap.
///
/// Each segment takes the label of the turn it overlaps most; words are
/// assigned the same way, falling back to their segment's label when no turn
/// overlaps them. Segments overlapping no turn stay unlabeled.
///
/// Returns the number of segments that received a label.
pub fn assign_speakers(transcript: &mut Transcript, turns: &[SpeakerTurn]) -> usize {
    let mut labeled = 0;

    for segment in &mut transcript.segments {
        segment.speaker = dominant_speaker(segment.start, segment.end, turns);
        if segment.speaker.is_some() {
            labeled += 1;
        }
        for word in &mut segment.words {
            word.speaker =
                dominant_speaker(word.start, word.end, turns).or_else(|| segment.speaker.clone());
        }
    }

    labeled
}

/// The speaker whose turns overlap `[start, end)` the most, if any.
fn dominant_speaker(start: f64, end: f64, turns: &[SpeakerTurn]) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for turn in turns {
        let overlap = turn.end.min(end) - turn.start.max(start);
        if overlap <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_overlap)) if best_overlap >= overlap => {}
            _ => best = Some((&turn.speaker, overlap)),
        }
    }
    best.map(|(speaker, _)| speaker.to_string())
}

/// Diarizer backed by the pyannote ONNX stack.
///
/// Models are fetched from the HuggingFace hub with the supplied access token
/// unless local paths are configured.
#[cfg(feature = "diarize")]
#[derive(Debug)]
pub struct PyannoteDiarizer {
    segmentation_model: PathBuf,
    embedding_model: PathBuf,
    threshold: f32,
    max_speakers: usize,
}

/// Diarizer placeholder (without the `diarize` feature). Never constructed:
/// [`PyannoteDiarizer::from_token`] fails first.
#[cfg(not(feature = "diarize"))]
#[derive(Debug)]
pub struct PyannoteDiarizer;

#[cfg(feature = "diarize")]
impl PyannoteDiarizer {
    /// Build a diarizer from already-downloaded model files.
    pub fn with_models(
        segmentation_model: PathBuf,
        embedding_model: PathBuf,
        config: &DiarizationConfig,
    ) -> Self {
        Self {
            segmentation_model,
            embedding_model,
            threshold: config.threshold,
            max_speakers: config.max_speakers,
        }
    }

    /// Build a diarizer, fetching any model not configured locally from the
    /// HuggingFace hub with `token`.
    pub fn from_token(token: &str, config: &DiarizationConfig) -> Result<Self> {
        let segmentation_model = match &config.segmentation_model {
            Some(path) => path.clone(),
            None => fetch_model(token, SEGMENTATION_REPO, SEGMENTATION_FILE)?,
        };
        let embedding_model = match &config.embedding_model {
            Some(path) => path.clone(),
            None => fetch_model(token, EMBEDDING_REPO, EMBEDDING_FILE)?,
        };

        Ok(Self::with_models(
            segmentation_model,
            embedding_model,
            config,
        ))
    }
}

#[cfg(not(feature = "diarize"))]
impl PyannoteDiarizer {
    /// Stub constructor (without the `diarize` feature): always fails, which
    /// the orchestrator treats as any other diarization failure.
    pub fn from_token(_token: &str, _config: &DiarizationConfig) -> Result<Self> {
        Err(ScribeError::Diarization {
            message: concat!(
                "Diarization feature not enabled. This binary was built without ",
                "speaker diarization; rebuild with --features diarize."
            )
            .to_string(),
        })
    }
}

/// Download one model file from the hub, authenticated with `token`.
#[cfg(feature = "diarize")]
fn fetch_model(token: &str, repo: &str, file: &str) -> Result<PathBuf> {
    use hf_hub::api::sync::ApiBuilder;

    let api = ApiBuilder::new()
        .with_token(Some(token.to_string()))
        .build()
        .map_err(|e| ScribeError::Diarization {
            message: format!("HuggingFace API init failed: {e}"),
        })?;

    api.model(repo.to_string())
        .get(file)
        .map_err(|e| ScribeError::Diarization {
            message: format!("failed to fetch {repo}/{file}: {e}"),
        })
}

#[cfg(feature = "diarize")]
impl Diarizer for PyannoteDiarizer {
    fn diarize(&mut self, samples: &[i16], sample_rate: u32) -> Result<Vec<SpeakerTurn>> {
        let segmentation_model = self.segmentation_model.to_string_lossy();
        let segments = pyannote_rs::segment(samples, sample_rate, segmentation_model.as_ref())
            .map_err(|e| ScribeError::Diarization {
                message: format!("segmentation failed: {e}"),
            })?;

        let embedding_model = self.embedding_model.to_string_lossy();
        let mut extractor = pyannote_rs::EmbeddingExtractor::new(embedding_model.as_ref())
            .map_err(|e| ScribeError::Diarization {
                message: format!("embedding model load failed: {e}"),
            })?;
        let mut manager = pyannote_rs::EmbeddingManager::new(self.max_speakers);

        let mut turns = Vec::with_capacity(segments.len());
        for segment in segments {
            // A segment whose embedding can't be computed (too short, all
            // silence) is left out rather than failing the whole pass.
            let Ok(embedding) = extractor.compute(&segment.samples) else {
                continue;
            };
            let embedding: Vec<f32> = embedding.collect();

            // Match against known speakers; once the speaker cap is reached,
            // force-assign to the nearest existing one.
            let speaker_id = manager
                .search_speaker(embedding.clone(), self.threshold)
                .or_else(|| manager.search_speaker(embedding, 0.0));
            let Some(id) = speaker_id else {
                continue;
            };

            turns.push(SpeakerTurn {
                start: segment.start,
                end: segment.end,
                speaker: speaker_label(id),
            });
        }

        Ok(turns)
    }
}

#[cfg(not(feature = "diarize"))]
impl Diarizer for PyannoteDiarizer {
    fn diarize(&mut self, _samples: &[i16], _sample_rate: u32) -> Result<Vec<SpeakerTurn>> {
        Err(ScribeError::Diarization {
            message: "diarization support not compiled in".to_string(),
        })
    }
}

/// Mock diarizer for testing
#[derive(Debug, Clone, Default)]
pub struct MockDiarizer {
    turns: Vec<SpeakerTurn>,
    should_fail: bool,
}

impl MockDiarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to return the given turns.
    pub fn with_turns(mut self, turns: Vec<SpeakerTurn>) -> Self {
        self.turns = turns;
        self
    }

    /// Configure the mock to fail on diarize.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Diarizer for MockDiarizer {
    fn diarize(&mut self, _samples: &[i16], _sample_rate: u32) -> Result<Vec<SpeakerTurn>> {
        if self.should_fail {
            Err(ScribeError::Diarization {
                message: "mock diarization failure".to_string(),
            })
        } else {
            Ok(self.turns.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::segment::{Segment, Word};

    fn turn(start: f64, end: f64, speaker: &str) -> SpeakerTurn {
        SpeakerTurn {
            start,
            end,
            speaker: speaker.to_string(),
        }
    }

    #[test]
    fn speaker_label_is_zero_padded() {
        assert_eq!(speaker_label(0), "SPEAKER_00");
        assert_eq!(speaker_label(7), "SPEAKER_07");
        assert_eq!(speaker_label(12), "SPEAKER_12");
    }

    #[test]
    fn assigns_speaker_with_largest_overlap() {
        let mut transcript = Transcript::new("zh");
        transcript.segments.push(Segment::new(0.0, 10.0, "你好"));

        // SPEAKER_01 covers 7 of the 10 seconds.
        let turns = vec![turn(0.0, 3.0, "SPEAKER_00"), turn(3.0, 10.0, "SPEAKER_01")];
        let labeled = assign_speakers(&mut transcript, &turns);

        assert_eq!(labeled, 1);
        assert_eq!(
            transcript.segments[0].speaker,
            Some("SPEAKER_01".to_string())
        );
    }

    #[test]
    fn segment_without_overlap_stays_unlabeled() {
        let mut transcript = Transcript::new("zh");
        transcript.segments.push(Segment::new(0.0, 2.0, "你好"));
        transcript.segments.push(Segment::new(20.0, 25.0, "谢谢"));

        let turns = vec![turn(0.0, 5.0, "SPEAKER_00")];
        let labeled = assign_speakers(&mut transcript, &turns);

        assert_eq!(labeled, 1);
        assert_eq!(
            transcript.segments[0].speaker,
            Some("SPEAKER_00".to_string())
        );
        assert_eq!(transcript.segments[1].speaker, None);
    }

    #[test]
    fn no_turns_leaves_transcript_unlabeled() {
        let mut transcript = Transcript::new("zh");
        transcript.segments.push(Segment::new(0.0, 2.0, "你好"));

        let labeled = assign_speakers(&mut transcript, &[]);

        assert_eq!(labeled, 0);
        assert_eq!(transcript.segments[0].speaker, None);
    }

    #[test]
    fn words_inherit_segment_speaker_when_uncovered() {
        let mut segment = Segment::new(0.0, 4.0, "你好 谢谢");
        segment.words = vec![
            Word {
                word: "你好".to_string(),
                start: 0.0,
                end: 1.0,
                score: None,
                speaker: None,
            },
            Word {
                word: "谢谢".to_string(),
                start: 3.5,
                end: 4.0,
                score: None,
                speaker: None,
            },
        ];
        let mut transcript = Transcript::new("zh");
        transcript.segments.push(segment);

        // The turn covers the first word and most of the segment, but not the
        // second word.
        let turns = vec![turn(0.0, 3.0, "SPEAKER_00")];
        assign_speakers(&mut transcript, &turns);

        let words = &transcript.segments[0].words;
        assert_eq!(words[0].speaker, Some("SPEAKER_00".to_string()));
        assert_eq!(words[1].speaker, Some("SPEAKER_00".to_string()));
    }

    #[test]
    fn mock_diarizer_returns_turns_or_fails() {
        let mut ok = MockDiarizer::new().with_turns(vec![turn(0.0, 1.0, "SPEAKER_00")]);
        assert_eq!(ok.diarize(&[], 16_000).unwrap().len(), 1);

        let mut failing = MockDiarizer::new().with_failure();
        match failing.diarize(&[], 16_000) {
            Err(ScribeError::Diarization { message }) => {
                assert_eq!(message, "mock diarization failure");
            }
            other => panic!("expected Diarization error, got {other:?}"),
        }
    }
}
