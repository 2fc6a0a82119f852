//! Speech windowing for batched transcription.
//!
//! Offline voice activity detection over the whole decoded recording: per-frame
//! RMS energy, normalized against a robust peak, gated by onset/offset
//! hysteresis. The resulting windows are what the transcriber feeds to the
//! model, so silence never reaches inference and long recordings are cut at
//! natural pauses.

use crate::config::VadConfig;
use crate::defaults::{MAX_WINDOW_SECS, SPEECH_PAD_MS, VAD_FRAME_MS};

/// A half-open sample range `[start, end)` containing speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechWindow {
    pub start: usize,
    pub end: usize,
}

impl SpeechWindow {
    pub fn start_secs(&self, sample_rate: u32) -> f64 {
        self.start as f64 / sample_rate as f64
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Detect speech windows in a 16kHz mono recording.
///
/// Frames at or above `onset × peak` energy open a window; it stays open until
/// energy drops below `offset × peak`. Windows shorter than `min_speech_ms`
/// are dropped, windows closer than `min_gap_ms` are merged, each window is
/// padded by [`SPEECH_PAD_MS`] on both sides, and anything longer than
/// [`MAX_WINDOW_SECS`] is split.
///
/// A digitally silent recording yields no windows.
pub fn detect_speech_windows(
    samples: &[i16],
    sample_rate: u32,
    config: &VadConfig,
) -> Vec<SpeechWindow> {
    let frame_len = (sample_rate as usize * VAD_FRAME_MS as usize) / 1000;
    if samples.len() < frame_len {
        return Vec::new();
    }

    let energies: Vec<f32> = samples
        .chunks(frame_len)
        .map(|frame| rms(frame))
        .collect();

    let Some(peak) = robust_peak(&energies) else {
        return Vec::new();
    };

    // Hysteresis gate over normalized frame energy.
    let mut regions: Vec<(usize, usize)> = Vec::new();
    let mut open_at: Option<usize> = None;
    for (idx, &energy) in energies.iter().enumerate() {
        let activity = energy / peak;
        match open_at {
            None if activity >= config.onset => open_at = Some(idx),
            Some(start) if activity < config.offset => {
                regions.push((start, idx));
                open_at = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open_at {
        regions.push((start, energies.len()));
    }

    let min_speech_frames = (config.min_speech_ms / VAD_FRAME_MS).max(1) as usize;
    regions.retain(|(start, end)| end - start >= min_speech_frames);

    // Frame indices → padded sample ranges.
    let pad = (sample_rate as usize * SPEECH_PAD_MS as usize) / 1000;
    let mut windows: Vec<SpeechWindow> = regions
        .into_iter()
        .map(|(start, end)| SpeechWindow {
            start: (start * frame_len).saturating_sub(pad),
            end: (end * frame_len + pad).min(samples.len()),
        })
        .collect();

    // Merge windows separated by less than the minimum gap.
    let min_gap = (sample_rate as usize * config.min_gap_ms as usize) / 1000;
    let mut merged: Vec<SpeechWindow> = Vec::with_capacity(windows.len());
    for window in windows.drain(..) {
        match merged.last_mut() {
            Some(last) if window.start.saturating_sub(last.end) < min_gap => {
                last.end = last.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }

    // Whisper's context is 30s; hard-split anything longer.
    let max_len = (MAX_WINDOW_SECS * sample_rate as f32) as usize;
    let mut result = Vec::with_capacity(merged.len());
    for window in merged {
        let mut start = window.start;
        while window.end - start > max_len {
            result.push(SpeechWindow {
                start,
                end: start + max_len,
            });
            start += max_len;
        }
        result.push(SpeechWindow {
            start,
            end: window.end,
        });
    }

    result
}

/// Root-mean-square energy of a frame, normalized to 0.0..1.0.
fn rms(frame: &[i16]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame
        .iter()
        .map(|&s| {
            let norm = s as f64 / 32768.0;
            norm * norm
        })
        .sum();
    (sum_sq / frame.len() as f64).sqrt() as f32
}

/// 95th-percentile frame energy. Resists one-off clicks that a plain max would
/// latch onto. Falls back to the true maximum for recordings that are mostly
/// silence, and returns None when the recording is digitally silent.
fn robust_peak(energies: &[f32]) -> Option<f32> {
    let mut sorted: Vec<f32> = energies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = (sorted.len() as f32 * 0.95) as usize;
    let mut peak = *sorted.get(idx.min(sorted.len() - 1))?;
    if peak <= 0.0 {
        peak = *sorted.last()?;
    }
    (peak > 0.0).then_some(peak)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn config() -> VadConfig {
        VadConfig::default()
    }

    /// Build a signal from (amplitude, duration_ms) runs.
    fn signal(runs: &[(i16, u32)]) -> Vec<i16> {
        let mut samples = Vec::new();
        for &(amplitude, ms) in runs {
            let n = (RATE as usize * ms as usize) / 1000;
            // Square wave so RMS ≈ amplitude.
            samples.extend((0..n).map(|i| if i % 2 == 0 { amplitude } else { -amplitude }));
        }
        samples
    }

    #[test]
    fn silence_yields_no_windows() {
        let samples = vec![0i16; RATE as usize];
        assert!(detect_speech_windows(&samples, RATE, &config()).is_empty());
    }

    #[test]
    fn too_short_input_yields_no_windows() {
        let samples = vec![5000i16; 10];
        assert!(detect_speech_windows(&samples, RATE, &config()).is_empty());
    }

    #[test]
    fn constant_speech_yields_one_window() {
        let samples = signal(&[(8000, 2000)]);
        let windows = detect_speech_windows(&samples, RATE, &config());

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 0);
        assert_eq!(windows[0].end, samples.len());
    }

    #[test]
    fn long_silence_splits_windows() {
        let samples = signal(&[(8000, 1000), (0, 2000), (8000, 1000)]);
        let windows = detect_speech_windows(&samples, RATE, &config());

        assert_eq!(windows.len(), 2);
        assert!(windows[0].end < windows[1].start);
        // Padding extends each window slightly into the silence.
        assert!(windows[0].end >= RATE as usize);
        assert!(windows[1].start <= 3 * RATE as usize);
    }

    #[test]
    fn short_gap_is_merged() {
        let samples = signal(&[(8000, 1000), (0, 100), (8000, 1000)]);
        let windows = detect_speech_windows(&samples, RATE, &config());

        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn short_burst_is_dropped() {
        // 100ms of speech inside silence is below the 300ms minimum.
        let samples = signal(&[(0, 1000), (8000, 100), (0, 1000)]);
        let windows = detect_speech_windows(&samples, RATE, &config());

        assert!(windows.is_empty());
    }

    #[test]
    fn overlong_window_is_split_at_thirty_seconds() {
        let samples = signal(&[(8000, 65_000)]);
        let windows = detect_speech_windows(&samples, RATE, &config());

        assert_eq!(windows.len(), 3);
        let max_len = (MAX_WINDOW_SECS * RATE as f32) as usize;
        assert_eq!(windows[0].len(), max_len);
        assert_eq!(windows[1].len(), max_len);
        assert!(windows[2].len() <= max_len);
        assert_eq!(windows[1].start, windows[0].end);
    }

    #[test]
    fn window_times_convert_to_seconds() {
        let window = SpeechWindow {
            start: 16_000,
            end: 48_000,
        };
        assert_eq!(window.start_secs(RATE), 1.0);
        assert_eq!(window.len(), 32_000);
        assert!(!window.is_empty());
    }
}
