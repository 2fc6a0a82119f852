use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub asr: AsrConfig,
    pub vad: VadConfig,
    pub diarization: DiarizationConfig,
}

/// Speech-recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AsrConfig {
    /// Model name from the catalog (e.g. "large-v3") or a path to a ggml file.
    pub model: String,
    /// Transcription language code.
    pub language: String,
    /// Speech windows transcribed per inference state.
    pub batch_size: usize,
    /// Inference threads (None = whisper.cpp auto-detect).
    pub threads: Option<usize>,
    /// Decoding prompt fed to the model before the audio.
    pub initial_prompt: String,
}

/// Voice activity detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    /// Fraction of peak energy at which a speech window opens.
    pub onset: f32,
    /// Fraction of peak energy below which an open window may close.
    pub offset: f32,
    /// Minimum speech duration for a window to be kept (milliseconds).
    pub min_speech_ms: u32,
    /// Windows closer than this are merged (milliseconds).
    pub min_gap_ms: u32,
}

/// Speaker diarization configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiarizationConfig {
    /// HuggingFace access token. Usually supplied via HF_TOKEN instead.
    pub hf_token: Option<String>,
    /// Cosine-distance threshold for matching an embedding to a known speaker.
    pub threshold: f32,
    /// Upper bound on distinct speakers.
    pub max_speakers: usize,
    /// Local segmentation model override (skips the hub fetch).
    pub segmentation_model: Option<PathBuf>,
    /// Local speaker-embedding model override (skips the hub fetch).
    pub embedding_model: Option<PathBuf>,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            threads: None,
            initial_prompt: defaults::INITIAL_PROMPT.to_string(),
        }
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            onset: defaults::VAD_ONSET,
            offset: defaults::VAD_OFFSET,
            min_speech_ms: defaults::MIN_SPEECH_MS,
            min_gap_ms: defaults::MIN_GAP_MS,
        }
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            hf_token: None,
            threshold: defaults::DIARIZATION_THRESHOLD,
            max_speakers: defaults::MAX_SPEAKERS,
            segmentation_model: None,
            embedding_model: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Invalid TOML is a hard error — a half-applied config is worse than none.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e.context(format!("failed to load config from {}", path.display())))
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// These names match the environment contract of the original tool:
    /// - WHISPER_MODEL → asr.model
    /// - BATCH_SIZE → asr.batch_size
    /// - HF_TOKEN → diarization.hf_token
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("WHISPER_MODEL")
            && !model.is_empty()
        {
            self.asr.model = model;
        }

        if let Ok(batch) = std::env::var("BATCH_SIZE")
            && let Ok(parsed) = batch.trim().parse::<usize>()
            && parsed > 0
        {
            self.asr.batch_size = parsed;
        }

        if let Ok(token) = std::env::var("HF_TOKEN")
            && !token.is_empty()
        {
            self.diarization.hf_token = Some(token);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/zhscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("zhscribe")
            .join("config.toml")
    }
}
