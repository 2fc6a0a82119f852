//! Error types for zhscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    // Input errors
    #[error("Audio file not found: {path}")]
    AudioFileNotFound { path: String },

    #[error("Failed to decode audio: {message}")]
    AudioDecode { message: String },

    // Model errors
    #[error("Whisper model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Model download failed: {message}")]
    ModelDownload { message: String },

    // Pipeline errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Timestamp alignment failed: {message}")]
    Alignment { message: String },

    #[error("Speaker diarization failed: {message}")]
    Diarization { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Serialization / I/O
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn audio_file_not_found_display() {
        let error = ScribeError::AudioFileNotFound {
            path: "meeting.m4a".to_string(),
        };
        assert_eq!(error.to_string(), "Audio file not found: meeting.m4a");
    }

    #[test]
    fn audio_decode_display() {
        let error = ScribeError::AudioDecode {
            message: "unsupported codec".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to decode audio: unsupported codec"
        );
    }

    #[test]
    fn model_not_found_display() {
        let error = ScribeError::ModelNotFound {
            path: "/models/ggml-large-v3.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Whisper model not found at /models/ggml-large-v3.bin"
        );
    }

    #[test]
    fn transcription_display() {
        let error = ScribeError::Transcription {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription failed: inference failed");
    }

    #[test]
    fn diarization_display() {
        let error = ScribeError::Diarization {
            message: "embedding model unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Speaker diarization failed: embedding model unavailable"
        );
    }

    #[test]
    fn from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: ScribeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: ScribeError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribeError>();
        assert_sync::<ScribeError>();
    }

    #[test]
    fn result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
