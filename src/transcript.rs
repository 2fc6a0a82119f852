//! Transcript report generation.
//!
//! Renders the final transcript as a Chinese meeting-notes Markdown document
//! and dumps the full result structure to a sibling JSON file.

use crate::asr::segment::Transcript;
use crate::defaults::TRANSCRIPT_SUFFIX;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Run metadata shown in the report header.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Source file name as given on the command line.
    pub source: String,
    /// Model name (e.g. "large-v3").
    pub model: String,
    /// Weight precision label (e.g. "f16", "q5_0").
    pub precision: String,
    /// Inference backend (e.g. "cpu").
    pub device: String,
    /// Audio duration in seconds, from source metadata.
    pub audio_duration_secs: f64,
    /// Total wall time of the run in seconds.
    pub elapsed_secs: f64,
}

/// Convert seconds to `HH:MM:SS`, truncating to whole seconds.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Default Markdown output path: `<input-stem>_transcript.md` in the current
/// working directory.
pub fn default_output_path(audio_file: &Path) -> PathBuf {
    let stem = audio_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording");
    PathBuf::from(format!("{stem}{TRANSCRIPT_SUFFIX}.md"))
}

/// The JSON artifact lives next to the Markdown report.
pub fn json_path(markdown_path: &Path) -> PathBuf {
    markdown_path.with_extension("json")
}

/// Render the Markdown report.
///
/// Empty segments are skipped. A speaker subheading is inserted whenever the
/// label changes between emitted segments; an unlabeled transcript is one
/// undivided block of timestamped lines.
pub fn render_markdown(transcript: &Transcript, ctx: &ReportContext) -> String {
    let mut out = String::new();

    out.push_str("# 会议录音转写\n\n");
    out.push_str(&format!("**源文件**: {}  \n", ctx.source));
    out.push_str(&format!(
        "**音频时长**: {:.1} 分钟  \n",
        ctx.audio_duration_secs / 60.0
    ));
    out.push_str(&format!(
        "**模型**: {} | **精度**: {} | **设备**: {}  \n",
        ctx.model, ctx.precision, ctx.device
    ));
    out.push_str(&format!("**转写总耗时**: {:.0}s\n\n", ctx.elapsed_secs));
    out.push_str("---\n\n");

    let mut current_speaker: Option<&str> = None;

    for segment in &transcript.segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(speaker) = segment.speaker.as_deref()
            && current_speaker != Some(speaker)
        {
            out.push_str(&format!("\n### {speaker}\n\n"));
            current_speaker = Some(speaker);
        }

        out.push_str(&format!(
            "[{} - {}] {}\n\n",
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            text
        ));
    }

    out
}

/// Write the Markdown report and the JSON dump.
///
/// Existing files are overwritten. Returns the JSON path.
pub fn write_artifacts(
    transcript: &Transcript,
    ctx: &ReportContext,
    markdown_path: &Path,
) -> Result<PathBuf> {
    fs::write(markdown_path, render_markdown(transcript, ctx))?;

    let json_file = json_path(markdown_path);
    fs::write(&json_file, serde_json::to_string_pretty(transcript)?)?;

    Ok(json_file)
}
