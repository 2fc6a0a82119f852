//! Default configuration constants for zhscribe.
//!
//! Shared across config types and pipeline stages to keep the knobs in one place.

/// Pipeline sample rate in Hz.
///
/// 16kHz mono is what the Whisper family of models expects; all decoded audio is
/// resampled to this rate before inference. Reported durations are computed from
/// the source container's own metadata, never from this constant.
pub const SAMPLE_RATE: u32 = 16_000;

/// Default Whisper model name.
///
/// `large-v3` gives the best Mandarin accuracy of the ggml releases. Smaller
/// models (`small`, `medium`) trade accuracy for speed on weaker hardware.
pub const DEFAULT_MODEL: &str = "large-v3";

/// Transcription language. This tool is purpose-built for Chinese recordings;
/// forcing the language avoids mis-detection on short or noisy openings.
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Decoding prompt that steers the model toward Simplified Chinese with
/// punctuation.
pub const INITIAL_PROMPT: &str = "以下是一段中文会议录音的转写。请使用简体中文。";

/// Default number of speech windows transcribed per inference state.
///
/// The state is dropped after each batch to bound peak memory. 4-8 works well
/// on CPU.
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// VAD onset threshold: a frame at or above this fraction of the recording's
/// peak energy starts a speech window.
pub const VAD_ONSET: f32 = 0.5;

/// VAD offset threshold: once speaking, frames must drop below this fraction
/// before the window can close. Lower than the onset so brief dips inside a
/// sentence don't split it.
pub const VAD_OFFSET: f32 = 0.363;

/// Frame length used for VAD energy measurement, in milliseconds.
pub const VAD_FRAME_MS: u32 = 20;

/// Minimum duration of speech for a window to be kept, in milliseconds.
pub const MIN_SPEECH_MS: u32 = 300;

/// Windows separated by less than this gap are merged, in milliseconds.
pub const MIN_GAP_MS: u32 = 300;

/// Padding added before and after each speech window, in milliseconds.
/// Captures soft onsets and word endings the energy gate clips.
pub const SPEECH_PAD_MS: u32 = 150;

/// Hard ceiling on a single speech window, in seconds. Whisper's context covers
/// 30 seconds; longer windows are split.
pub const MAX_WINDOW_SECS: f32 = 30.0;

/// A repeated phrase is collapsed once it occurs more than this many times in a
/// row.
pub const MAX_PHRASE_REPEATS: usize = 3;

/// Audio file transcribed when no path is given on the command line.
pub const DEFAULT_AUDIO_FILE: &str = "New Recording 46.m4a";

/// Suffix appended to the input stem to form the output file names.
pub const TRANSCRIPT_SUFFIX: &str = "_transcript";

/// Cosine-distance threshold for matching a speaker embedding to a known
/// speaker during diarization.
pub const DIARIZATION_THRESHOLD: f32 = 0.5;

/// Upper bound on distinct speakers the diarizer will create.
pub const MAX_SPEAKERS: usize = 8;

/// Report the inference backend compiled into this build.
///
/// Only one GPU backend can be active at a time; if none is enabled, returns "cpu".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "cuda"
    } else if cfg!(feature = "vulkan") {
        "vulkan"
    } else if cfg!(feature = "hipblas") {
        "hipblas"
    } else if cfg!(feature = "openblas") {
        "openblas"
    } else {
        "cpu"
    }
}

/// Precision label for the report header, derived from the model name.
///
/// Quantized ggml releases carry their quantization in the file name
/// (`large-v3-q5_0`); everything else ships as f16 weights.
pub fn precision_label(model: &str) -> &str {
    match model.rfind("-q") {
        Some(idx) => &model[idx + 1..],
        None => "f16",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_backend_matches_compiled_feature() {
        let expected = if cfg!(feature = "cuda") {
            "cuda"
        } else if cfg!(feature = "vulkan") {
            "vulkan"
        } else if cfg!(feature = "hipblas") {
            "hipblas"
        } else if cfg!(feature = "openblas") {
            "openblas"
        } else {
            "cpu"
        };
        assert_eq!(gpu_backend(), expected);
    }

    #[test]
    fn precision_label_reads_quantization_suffix() {
        assert_eq!(precision_label("large-v3-q5_0"), "q5_0");
        assert_eq!(precision_label("medium-q8_0"), "q8_0");
    }

    #[test]
    fn precision_label_defaults_to_f16() {
        assert_eq!(precision_label("large-v3"), "f16");
        assert_eq!(precision_label("tiny"), "f16");
    }
}
