//! Command-line interface for zhscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Speaker-labelled transcripts for Chinese meeting recordings
#[derive(Parser, Debug)]
#[command(
    name = "zhscribe",
    version,
    about = "Speaker-labelled transcripts for Chinese meeting recordings"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Audio file to transcribe
    #[arg(value_name = "AUDIO")]
    pub audio: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Whisper model: a catalog name (e.g. large-v3, turbo) or a ggml file path
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Speech windows transcribed per inference state
    #[arg(long, short = 'b', value_name = "N")]
    pub batch_size: Option<usize>,

    /// Markdown output path (default: <input-stem>_transcript.md)
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Prevent automatic model download if the configured model is missing
    #[arg(long)]
    pub no_download: bool,

    /// Skip speaker diarization even when a credential is configured
    #[arg(long)]
    pub no_diarize: bool,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-run statistics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage Whisper models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models
    List,

    /// Download and install a model
    Install {
        /// Model name (e.g. large-v3, turbo)
        name: String,
    },
}
