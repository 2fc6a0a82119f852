//! Whisper model catalog and installation.

pub mod catalog;
pub mod download;

pub use catalog::{ModelInfo, get_model, list_models, resolve_name};
pub use download::{ensure_model, is_model_installed, model_path, models_dir};
