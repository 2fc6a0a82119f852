//! Model resolution and installation.
//!
//! Whisper models live in the user's cache directory and are downloaded from
//! HuggingFace on demand. A model value that looks like a file path bypasses
//! the catalog entirely.

use crate::error::{Result, ScribeError};
use crate::models::catalog::{get_model, resolve_name};
use std::path::PathBuf;

/// Get the directory where models are stored.
///
/// Uses `~/.cache/zhscribe/models/` on Linux/Unix.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("zhscribe")
        .join("models")
}

/// Get the full path for a catalog model.
///
/// Always returns a path regardless of whether the model is in the catalog.
/// The file may or may not exist on disk.
pub fn model_path(name: &str) -> PathBuf {
    let resolved = resolve_name(name);
    models_dir().join(format!("ggml-{resolved}.bin"))
}

/// Check if a model is installed.
pub fn is_model_installed(name: &str) -> bool {
    model_path(name).exists()
}

/// True when the configured model value is a file path rather than a catalog
/// name.
pub fn is_model_file(model: &str) -> bool {
    model.contains(std::path::MAIN_SEPARATOR) || model.ends_with(".bin")
}

/// Resolve the configured model to a file on disk, downloading it when
/// allowed.
///
/// # Errors
/// - `ScribeError::ModelNotFound` for a missing model file or when download
///   is disabled.
/// - `ScribeError::Other` for a name that is neither a path nor in the
///   catalog.
/// - `ScribeError::ModelDownload` when the download itself fails.
pub fn ensure_model(model: &str, no_download: bool, progress: bool) -> Result<PathBuf> {
    if is_model_file(model) {
        let path = PathBuf::from(model);
        if path.exists() {
            return Ok(path);
        }
        return Err(ScribeError::ModelNotFound {
            path: model.to_string(),
        });
    }

    let resolved = resolve_name(model);
    let path = model_path(resolved);
    if path.exists() {
        return Ok(path);
    }

    if get_model(resolved).is_none() {
        return Err(ScribeError::Other(format!(
            "Unknown model '{model}'. Run `zhscribe models list` to see available models."
        )));
    }

    #[cfg(feature = "model-download")]
    if !no_download {
        return download_model(resolved, progress);
    }
    #[cfg(not(feature = "model-download"))]
    let _ = (no_download, progress);

    Err(ScribeError::ModelNotFound {
        path: format!(
            "{} (install it with `zhscribe models install {resolved}`)",
            path.display()
        ),
    })
}

/// Download a catalog model into the cache directory.
#[cfg(feature = "model-download")]
pub fn download_model(name: &str, progress: bool) -> Result<PathBuf> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::io::{Read, Write};

    let resolved = resolve_name(name);
    let info = get_model(resolved).ok_or_else(|| {
        ScribeError::Other(format!(
            "Unknown model '{name}'. Run `zhscribe models list` to see available models."
        ))
    })?;

    let output_path = model_path(resolved);
    if output_path.exists() {
        return Ok(output_path);
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if progress {
        eprintln!("Downloading {resolved} ({} MB)...", info.size_mb);
    }

    let mut response = reqwest::blocking::Client::new()
        .get(info.url)
        .send()
        .map_err(|e| ScribeError::ModelDownload {
            message: format!("failed to start download: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(ScribeError::ModelDownload {
            message: format!("download failed with status {}", response.status()),
        });
    }

    let total_size = response
        .content_length()
        .unwrap_or(info.size_mb as u64 * 1024 * 1024);

    let pb = progress.then(|| {
        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    });

    let mut file = std::fs::File::create(&output_path)?;
    let mut buf = [0u8; 64 * 1024];
    let copy_result: Result<()> = loop {
        let n = match response.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => n,
            Err(e) => {
                break Err(ScribeError::ModelDownload {
                    message: format!("download interrupted: {e}"),
                });
            }
        };
        if let Err(e) = file.write_all(&buf[..n]) {
            break Err(e.into());
        }
        if let Some(ref pb) = pb {
            pb.inc(n as u64);
        }
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if let Err(e) = copy_result {
        // Don't leave a truncated model behind.
        let _ = std::fs::remove_file(&output_path);
        return Err(e);
    }

    if progress {
        eprintln!("Model installed to: {}", output_path.display());
    }

    Ok(output_path)
}
