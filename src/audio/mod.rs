//! Audio decoding and speech windowing.

pub mod decode;
pub mod vad;

pub use decode::{AudioBuffer, load_audio};
pub use vad::{SpeechWindow, detect_speech_windows};
