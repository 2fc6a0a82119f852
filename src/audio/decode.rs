//! Audio file decoding.
//!
//! Decodes a recording (WAV/FLAC/MP3/M4A) into the 16kHz mono PCM buffer the
//! ASR pipeline expects. The reported duration always comes from the source
//! container's own frame count and sample rate, never from the resampled
//! buffer, so it stays correct whatever the pipeline rate is.

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, ScribeError};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio, resampled for the pipeline.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// 16kHz mono PCM samples.
    pub samples: Vec<i16>,
    /// Duration in seconds, from source metadata.
    pub duration_secs: f64,
    /// The container's native sample rate in Hz.
    pub source_rate: u32,
}

/// Decode `path` into a 16kHz mono buffer.
///
/// # Errors
/// Returns `ScribeError::AudioDecode` when the container cannot be probed or a
/// packet fails to decode (corrupt packets inside an otherwise readable stream
/// are skipped), and `ScribeError::Io` when the file cannot be opened.
pub fn load_audio(path: &Path) -> Result<AudioBuffer> {
    let src = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ScribeError::AudioDecode {
            message: format!("failed to probe {}: {e}", path.display()),
        })?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| ScribeError::AudioDecode {
            message: format!("{} has no default audio track", path.display()),
        })?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ScribeError::AudioDecode {
            message: format!("decoder init failed: {e}"),
        })?;

    let track_id = track.id;
    let container_frames = track.codec_params.n_frames;
    let mut source_rate = track.codec_params.sample_rate;

    let mut mono: Vec<f32> = container_frames
        .and_then(|n| usize::try_from(n).ok())
        .map(Vec::with_capacity)
        .unwrap_or_default();

    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = decoded.spec();
                source_rate = source_rate.or(Some(spec.rate));
                let channels = spec.channels.count();

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                buf.copy_interleaved_ref(decoded);

                if channels == 1 {
                    mono.extend_from_slice(buf.samples());
                } else {
                    for frame in buf.samples().chunks_exact(channels) {
                        let sum: f32 = frame.iter().copied().sum();
                        mono.push(sum / channels as f32);
                    }
                }
            }
            // A corrupt packet is skippable; anything else is not.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => {
                return Err(ScribeError::AudioDecode {
                    message: format!("decode error in {}: {e}", path.display()),
                });
            }
        }
    }

    let source_rate = source_rate.ok_or_else(|| ScribeError::AudioDecode {
        message: format!("{} reports no sample rate", path.display()),
    })?;

    // Authoritative duration: the container's frame count at its native rate,
    // falling back to the decoded frame count at that same rate.
    let duration_secs = match container_frames {
        Some(frames) => frames as f64 / source_rate as f64,
        None => mono.len() as f64 / source_rate as f64,
    };

    let resampled = if source_rate == SAMPLE_RATE {
        mono
    } else {
        resample(&mono, source_rate, SAMPLE_RATE)
    };

    let samples = resampled
        .iter()
        .map(|&s| (s * 32768.0).clamp(-32768.0, 32767.0) as i16)
        .collect();

    Ok(AudioBuffer {
        samples,
        duration_secs,
        source_rate,
    })
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            let current = samples.get(source_idx).copied().unwrap_or_default();
            let next = samples.get(source_idx + 1).copied().unwrap_or(current);
            current + (next - current) * fraction
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn decodes_16khz_mono_wav() {
        let dir = TempDir::new().unwrap();
        let input = vec![0i16, 8192, -8192, 16384, -16384];
        let path = write_wav(&dir, "mono.wav", 16000, 1, &input);

        let audio = load_audio(&path).unwrap();

        assert_eq!(audio.source_rate, 16000);
        assert_eq!(audio.samples.len(), input.len());
        // i16 -> f32 -> i16 round trip may differ by one LSB.
        for (got, want) in audio.samples.iter().zip(&input) {
            assert!((got - want).abs() <= 1, "got {got}, want {want}");
        }
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        let dir = TempDir::new().unwrap();
        // Stereo pairs: (1000, 3000), (2000, 4000)
        let path = write_wav(&dir, "stereo.wav", 16000, 2, &[1000, 3000, 2000, 4000]);

        let audio = load_audio(&path).unwrap();

        assert_eq!(audio.samples.len(), 2);
        assert!((audio.samples[0] - 2000).abs() <= 1);
        assert!((audio.samples[1] - 3000).abs() <= 1);
    }

    #[test]
    fn resamples_48khz_to_16khz() {
        let dir = TempDir::new().unwrap();
        let input = vec![1000i16; 48000]; // 1 second at 48kHz
        let path = write_wav(&dir, "hi.wav", 48000, 1, &input);

        let audio = load_audio(&path).unwrap();

        assert!(audio.samples.len() >= 15_900 && audio.samples.len() <= 16_100);
    }

    #[test]
    fn duration_comes_from_source_metadata() {
        let dir = TempDir::new().unwrap();
        // 1.5 seconds at 48kHz: resampled length changes, duration must not.
        let input = vec![500i16; 72000];
        let path = write_wav(&dir, "dur.wav", 48000, 1, &input);

        let audio = load_audio(&path).unwrap();

        assert_eq!(audio.source_rate, 48000);
        assert!((audio.duration_secs - 1.5).abs() < 0.01);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_audio(Path::new("/nonexistent/recording.m4a"));
        assert!(result.is_err());
    }

    #[test]
    fn resample_identity_and_empty() {
        assert_eq!(resample(&[], 48000, 16000), Vec::<f32>::new());
        let passthrough = resample(&[0.5, -0.5], 16000, 16000);
        assert_eq!(passthrough, vec![0.5, -0.5]);
    }
}
