//! Transcription run entry point.
//!
//! Sequences the pipeline: load model → decode audio → transcribe → align →
//! diarize (optional, degrades on failure) → hallucination filter → report.
//! Every stage call goes through the `asr` traits so the sequencing itself is
//! testable with mocks.

use crate::asr::diarize::{self, Diarizer, PyannoteDiarizer};
use crate::asr::segment::Transcript;
use crate::asr::whisper::WhisperEngine;
use crate::asr::{Aligner, Transcriber};
use crate::audio::{self, AudioBuffer};
use crate::config::Config;
use crate::defaults::{self, SAMPLE_RATE};
use crate::error::Result;
use crate::filter;
use crate::models;
use crate::transcript::{self, ReportContext};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What one pipeline run produced, before formatting.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub transcript: Transcript,
    /// Segments rewritten by the hallucination filter.
    pub hallucinations_fixed: usize,
    /// Segments that received a speaker label.
    pub speakers_labeled: usize,
    /// Whether diarization ran to completion.
    pub diarized: bool,
}

/// Run the core pipeline over decoded audio.
///
/// Transcription and alignment failures are fatal and propagate. Diarization
/// is the single recoverable stage: any error there is reported as a warning
/// and the run continues unlabeled.
pub fn run_pipeline(
    transcriber: &dyn Transcriber,
    aligner: &dyn Aligner,
    diarizer: Option<&mut dyn Diarizer>,
    audio: &AudioBuffer,
    quiet: bool,
) -> Result<PipelineOutcome> {
    let step_start = Instant::now();
    if !quiet {
        eprintln!("Transcribing (this can take a few minutes)...");
    }
    let mut transcript = transcriber.transcribe(&audio.samples)?;
    if !quiet {
        let elapsed = step_start.elapsed().as_secs_f64();
        let ratio = elapsed / audio.duration_secs.max(0.001);
        eprintln!(
            "  {} segments in {:.1}s (realtime factor {:.1}x)",
            transcript.segments.len(),
            elapsed,
            ratio
        );
    }

    let step_start = Instant::now();
    if !quiet {
        eprintln!("Aligning word timestamps...");
    }
    aligner.align(&audio.samples, &mut transcript)?;
    if !quiet {
        eprintln!("  aligned in {:.1}s", step_start.elapsed().as_secs_f64());
    }

    let (diarized, speakers_labeled) = match diarizer {
        Some(diarizer) => {
            let step_start = Instant::now();
            if !quiet {
                eprintln!("Identifying speakers...");
            }
            match diarizer.diarize(&audio.samples, SAMPLE_RATE) {
                Ok(turns) => {
                    let labeled = diarize::assign_speakers(&mut transcript, &turns);
                    if !quiet {
                        eprintln!(
                            "  {} speaker turns in {:.1}s",
                            turns.len(),
                            step_start.elapsed().as_secs_f64()
                        );
                    }
                    (true, labeled)
                }
                Err(e) => {
                    eprintln!("{}", format!("Warning: speaker diarization failed: {e}").yellow());
                    eprintln!("Continuing without speaker labels.");
                    (false, 0)
                }
            }
        }
        None => (false, 0),
    };

    let hallucinations_fixed = filter::scrub_transcript(&mut transcript);
    if hallucinations_fixed > 0 && !quiet {
        eprintln!("Collapsed repeated phrases in {hallucinations_fixed} segments");
    }

    Ok(PipelineOutcome {
        transcript,
        hallucinations_fixed,
        speakers_labeled,
        diarized,
    })
}

/// Run the full transcribe command: model → audio → pipeline → report files.
#[allow(clippy::too_many_arguments)]
pub fn run_transcribe_command(
    config: Config,
    audio_file: &Path,
    output: Option<PathBuf>,
    quiet: bool,
    verbose: u8,
    no_download: bool,
    no_diarize: bool,
) -> Result<()> {
    let total_start = Instant::now();

    if !quiet {
        eprintln!("Transcribing: {}", audio_file.display());
        eprintln!(
            "Config: model={} | device={} | precision={} | batch={}",
            config.asr.model,
            defaults::gpu_backend(),
            defaults::precision_label(&config.asr.model),
            config.asr.batch_size
        );
    }

    let model_path = models::ensure_model(&config.asr.model, no_download, !quiet)?;

    let step_start = Instant::now();
    if !quiet {
        eprintln!("Loading Whisper model...");
    }
    let engine = WhisperEngine::load(&model_path, &config.asr, &config.vad)?;
    let model_name = engine.model_name().to_string();
    if !quiet {
        eprintln!("  loaded in {:.1}s", step_start.elapsed().as_secs_f64());
    }

    let audio = audio::load_audio(audio_file)?;
    if !quiet {
        eprintln!(
            "Audio: {:.0}s ({:.1}min) at {}Hz",
            audio.duration_secs,
            audio.duration_secs / 60.0,
            audio.source_rate
        );
    }

    // Diarization setup failures degrade exactly like diarization runtime
    // failures: warn and continue unlabeled.
    let token = (!no_diarize)
        .then(|| config.diarization.hf_token.clone())
        .flatten();
    let mut pyannote = match token {
        Some(token) => match PyannoteDiarizer::from_token(&token, &config.diarization) {
            Ok(diarizer) => Some(diarizer),
            Err(e) => {
                eprintln!("{}", format!("Warning: speaker diarization unavailable: {e}").yellow());
                eprintln!("Continuing without speaker labels.");
                None
            }
        },
        None => {
            if !quiet && !no_diarize {
                eprintln!("HF_TOKEN not set; skipping speaker diarization.");
            }
            None
        }
    };

    let outcome = run_pipeline(
        &engine,
        &engine,
        pyannote.as_mut().map(|d| d as &mut dyn Diarizer),
        &audio,
        quiet,
    )?;

    // The model is no longer needed; free it before report generation.
    drop(engine);
    drop(pyannote);

    let elapsed = total_start.elapsed().as_secs_f64();
    let markdown_path = output.unwrap_or_else(|| transcript::default_output_path(audio_file));
    let ctx = ReportContext {
        source: audio_file.to_string_lossy().to_string(),
        model: model_name,
        precision: defaults::precision_label(&config.asr.model).to_string(),
        device: defaults::gpu_backend().to_string(),
        audio_duration_secs: audio.duration_secs,
        elapsed_secs: elapsed,
    };
    let json_path = transcript::write_artifacts(&outcome.transcript, &ctx, &markdown_path)?;

    if !quiet {
        eprintln!("{} {}", "Transcript:".green(), markdown_path.display());
        eprintln!("{} {}", "JSON:".green(), json_path.display());
        if verbose >= 1 {
            eprintln!(
                "Segments: {} | labeled: {} | hallucinations fixed: {} | diarized: {}",
                outcome.transcript.segments.len(),
                outcome.speakers_labeled,
                outcome.hallucinations_fixed,
                outcome.diarized
            );
        }
        eprintln!(
            "Done in {:.1}s ({:.0}s audio, {:.1}x realtime)",
            elapsed,
            audio.duration_secs,
            elapsed / audio.duration_secs.max(0.001)
        );
    }

    Ok(())
}
