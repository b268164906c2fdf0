//! Frame-wise RMS energy and frame/time conversions
//!
//! Frames are centered: frame `i` covers samples `[i*hop - frame/2, i*hop + frame/2)`, with
//! out-of-range samples treated as zeros. A signal of `n` samples therefore yields
//! `1 + n / hop` frames and frame `i` sits at time `i * hop / sample_rate`.

use crate::error::AnalysisError;

/// Number of centered frames for a signal of `n_samples`
pub fn frame_count(n_samples: usize, hop_size: usize) -> usize {
    if n_samples == 0 || hop_size == 0 {
        0
    } else {
        1 + n_samples / hop_size
    }
}

/// Time in seconds of the center of frame `frame`
pub fn frame_to_time(frame: usize, sample_rate: u32, hop_size: usize) -> f32 {
    (frame * hop_size) as f32 / sample_rate as f32
}

/// Nearest frame index for a time in seconds (clamped at 0)
pub fn time_to_frame(time: f32, sample_rate: u32, hop_size: usize) -> usize {
    (time.max(0.0) * sample_rate as f32 / hop_size as f32).round() as usize
}

/// Borrow the samples between `start` and `end` seconds (clamped to the signal)
pub fn window(samples: &[f32], sample_rate: u32, start: f32, end: f32) -> &[f32] {
    let sr = sample_rate as f32;
    let a = ((start.max(0.0) * sr) as usize).min(samples.len());
    let b = ((end.max(0.0) * sr).ceil() as usize).min(samples.len());
    if b <= a {
        &samples[a..a]
    } else {
        &samples[a..b]
    }
}

/// Compute frame-wise RMS energy
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `frame_size` - Frame length in samples (typically 2048)
/// * `hop_size` - Hop between frame centers (typically 512)
///
/// # Returns
///
/// One RMS value per centered frame; empty for empty input
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero frame or hop size
pub fn frame_rms(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size must be > 0".to_string(),
        ));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    // Prefix sums of squares make each frame O(1)
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }

    let n_frames = frame_count(samples.len(), hop_size);
    let half = frame_size / 2;
    let mut rms = Vec::with_capacity(n_frames);

    for i in 0..n_frames {
        let center = i * hop_size;
        let start = center.saturating_sub(half);
        let end = (center + frame_size - half).min(samples.len());
        let sum_sq = if end > start { prefix[end] - prefix[start] } else { 0.0 };
        rms.push((sum_sq / frame_size as f64).sqrt() as f32);
    }

    log::debug!(
        "Computed {} RMS frames from {} samples (frame={}, hop={})",
        rms.len(),
        samples.len(),
        frame_size,
        hop_size
    );

    Ok(rms)
}

/// Min-max normalize values into [0, 1]
///
/// Returns `None` when the input is empty or has no spread (max == min).
pub fn min_max_normalize(values: &[f32]) -> Option<Vec<f32>> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if values.is_empty() || !(max - min).is_finite() || max - min <= f32::EPSILON {
        return None;
    }
    let range = max - min;
    Some(values.iter().map(|&v| (v - min) / range).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_centered() {
        assert_eq!(frame_count(0, 512), 0);
        assert_eq!(frame_count(511, 512), 1);
        assert_eq!(frame_count(22050, 512), 44);
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let samples = vec![0.5f32; 44100];
        let rms = frame_rms(&samples, 2048, 512).unwrap();
        // Interior frames are fully inside the signal
        assert!((rms[10] - 0.5).abs() < 1e-4);
        // Edge frames are half zero-padded
        assert!(rms[0] < rms[10]);
    }

    #[test]
    fn test_rms_silence_is_zero() {
        let rms = frame_rms(&vec![0.0f32; 8000], 2048, 512).unwrap();
        assert!(rms.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rms_invalid_parameters() {
        assert!(frame_rms(&[0.1; 100], 0, 512).is_err());
        assert!(frame_rms(&[0.1; 100], 2048, 0).is_err());
    }

    #[test]
    fn test_window_clamps() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        assert_eq!(window(&samples, 100, 2.0, 3.0).len(), 100);
        assert_eq!(window(&samples, 100, 9.5, 20.0).len(), 50);
        assert!(window(&samples, 100, 30.0, 40.0).is_empty());
    }

    #[test]
    fn test_min_max_normalize_degenerate() {
        assert!(min_max_normalize(&[0.3, 0.3, 0.3]).is_none());
        assert!(min_max_normalize(&[]).is_none());
        let n = min_max_normalize(&[1.0, 3.0, 2.0]).unwrap();
        assert_eq!(n, vec![0.0, 1.0, 0.5]);
    }
}
