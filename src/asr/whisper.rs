//! Whisper-based transcription and alignment.
//!
//! Implements the [`Transcriber`] and [`Aligner`] traits on top of whisper-rs.
//!
//! # Feature Gate
//!
//! The real engine requires the `whisper` feature (enabled by default) and
//! cmake to build. Without it a stub is compiled that fails on use with a
//! build hint.

use crate::asr::segment::Transcript;
#[cfg(feature = "whisper")]
use crate::asr::segment::{Segment, Word};
use crate::asr::{Aligner, Transcriber};
#[cfg(feature = "whisper")]
use crate::audio::detect_speech_windows;
use crate::config::{AsrConfig, VadConfig};
#[cfg(feature = "whisper")]
use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, ScribeError};
use std::path::Path;

#[cfg(feature = "whisper")]
use std::sync::Once;
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
    install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Whisper engine holding the loaded model.
///
/// One engine serves both pipeline passes: segment transcription over VAD
/// windows and the word-level alignment pass. Inference state is created per
/// batch and dropped as soon as the batch completes.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: WhisperContext,
    asr: AsrConfig,
    vad: VadConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("model_name", &self.model_name)
            .field("asr", &self.asr)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper engine placeholder (without the `whisper` feature).
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    model_name: String,
}

/// Derive the display name from a ggml model file path.
fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.strip_prefix("ggml-").unwrap_or(s))
        .unwrap_or("unknown")
        .to_string()
}

/// Convert i16 audio samples to f32 normalized to [-1.0, 1.0].
///
/// Whisper expects f32 input; decoded PCM is 16-bit.
pub fn convert_audio(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Load the ggml model at `model_path`.
    ///
    /// # Errors
    /// Returns `ScribeError::ModelNotFound` if the file doesn't exist and
    /// `ScribeError::Transcription` if whisper.cpp rejects it.
    pub fn load(model_path: &Path, asr: &AsrConfig, vad: &VadConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(install_logging_hooks);

        if !model_path.exists() {
            return Err(ScribeError::ModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        let mut context_params = WhisperContextParameters::default();
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or_else(|| ScribeError::Transcription {
                message: "Invalid UTF-8 in model path".to_string(),
            })?,
            context_params,
        )
        .map_err(|e| ScribeError::Transcription {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context,
            asr: asr.clone(),
            vad: vad.clone(),
            model_name: model_name_from_path(model_path),
        })
    }

    /// Base decoding parameters shared by both passes.
    fn base_params(&self) -> FullParams<'_, '_> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&self.asr.language));
        params.set_initial_prompt(&self.asr.initial_prompt);
        if let Some(threads) = self.asr.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params
    }

    /// Run one speech window through `state`, appending segments with
    /// timestamps shifted by the window's position in the recording.
    fn run_window(
        &self,
        state: &mut WhisperState,
        samples: &[i16],
        offset_secs: f64,
        out: &mut Vec<Segment>,
    ) -> Result<()> {
        let mut audio = convert_audio(samples);
        // whisper.cpp rejects inputs shorter than one second; pad with silence.
        if audio.len() < SAMPLE_RATE as usize {
            audio.resize(SAMPLE_RATE as usize, 0.0);
        }

        state
            .full(self.base_params(), &audio)
            .map_err(|e| ScribeError::Transcription {
                message: format!("Whisper inference failed: {}", e),
            })?;

        for segment in state.as_iter() {
            let text = segment.to_string();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            out.push(Segment {
                start: offset_secs + segment.start_timestamp() as f64 / 100.0,
                end: offset_secs + segment.end_timestamp() as f64 / 100.0,
                text: text.to_string(),
                speaker: None,
                words: Vec::new(),
            });
        }

        Ok(())
    }
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperEngine {
    fn transcribe(&self, samples: &[i16]) -> Result<Transcript> {
        let windows = detect_speech_windows(samples, SAMPLE_RATE, &self.vad);
        let mut transcript = Transcript::new(&self.asr.language);

        // One inference state per batch of windows; the state is dropped at
        // the end of the batch to bound peak memory.
        for batch in windows.chunks(self.asr.batch_size.max(1)) {
            let mut state =
                self.context
                    .create_state()
                    .map_err(|e| ScribeError::Transcription {
                        message: format!("Failed to create Whisper state: {}", e),
                    })?;

            for window in batch {
                self.run_window(
                    &mut state,
                    &samples[window.start..window.end],
                    window.start_secs(SAMPLE_RATE),
                    &mut transcript.segments,
                )?;
            }
        }

        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(feature = "whisper")]
impl Aligner for WhisperEngine {
    /// Second inference pass with token timestamps constrained to one word per
    /// emitted segment. Each coarse segment's audio is re-decoded and its
    /// bounds snapped to the first/last aligned word. Character-level detail
    /// is deliberately not produced.
    fn align(&self, samples: &[i16], transcript: &mut Transcript) -> Result<()> {
        let mut state = self
            .context
            .create_state()
            .map_err(|e| ScribeError::Alignment {
                message: format!("Failed to create alignment state: {}", e),
            })?;

        for segment in &mut transcript.segments {
            let start_idx = ((segment.start * SAMPLE_RATE as f64) as usize).min(samples.len());
            let end_idx = ((segment.end * SAMPLE_RATE as f64) as usize).min(samples.len());
            if end_idx <= start_idx {
                continue;
            }

            let mut audio = convert_audio(&samples[start_idx..end_idx]);
            if audio.len() < SAMPLE_RATE as usize {
                audio.resize(SAMPLE_RATE as usize, 0.0);
            }

            let mut params = self.base_params();
            params.set_token_timestamps(true);
            params.set_max_len(1);
            params.set_split_on_word(true);

            state.full(params, &audio).map_err(|e| ScribeError::Alignment {
                message: format!("Alignment inference failed: {}", e),
            })?;

            let offset = segment.start;
            let mut words = Vec::new();
            for piece in state.as_iter() {
                let text = piece.to_string();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                words.push(Word {
                    word: text.to_string(),
                    start: offset + piece.start_timestamp() as f64 / 100.0,
                    end: offset + piece.end_timestamp() as f64 / 100.0,
                    score: Some((1.0 - piece.no_speech_probability()).clamp(0.0, 1.0)),
                    speaker: None,
                });
            }

            if let (Some(first), Some(last)) = (words.first(), words.last()) {
                segment.start = first.start;
                segment.end = last.end.max(first.start);
                segment.words = words;
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Create the stub engine. Fails on use, not on construction, so the
    /// missing-model error still surfaces first.
    pub fn load(model_path: &Path, _asr: &AsrConfig, _vad: &VadConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(ScribeError::ModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        Ok(Self {
            model_name: model_name_from_path(model_path),
        })
    }

    fn unavailable() -> ScribeError {
        ScribeError::Transcription {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        }
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperEngine {
    fn transcribe(&self, _samples: &[i16]) -> Result<Transcript> {
        Err(Self::unavailable())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
impl Aligner for WhisperEngine {
    fn align(&self, _samples: &[i16], _transcript: &mut Transcript) -> Result<()> {
        Err(Self::unavailable())
    }
}
