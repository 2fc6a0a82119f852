//! zhscribe - speaker-labelled transcripts for Chinese meeting recordings
//!
//! Offline transcription pipeline: Whisper ASR over VAD speech windows,
//! word-level timestamp alignment, optional pyannote speaker diarization,
//! repeat-phrase hallucination cleanup, Markdown + JSON reports.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod asr;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod models;
pub mod transcript;

// Pipeline seams (external ASR capability)
pub use asr::diarize::{Diarizer, SpeakerTurn};
pub use asr::{Aligner, Transcriber};

// Data model
pub use asr::segment::{Segment, Transcript, Word};

// Error handling
pub use error::{Result, ScribeError};

// Config
pub use config::Config;
