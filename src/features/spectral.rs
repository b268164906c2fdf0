//! Short-time spectral features
//!
//! One Hann-windowed STFT pass (same centered framing as [`super::frames`]) produces both
//! a 12-bin chroma vector and the spectral centroid for every frame, so callers that need
//! both never transform the signal twice.

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

/// Lowest frequency mapped into chroma (~C2)
const MIN_CHROMA_FREQ: f32 = 65.0;

/// Highest frequency mapped into chroma; above this harmonics dominate
const MAX_CHROMA_FREQ: f32 = 2000.0;

/// Reference tuning (A4)
const TUNING_HZ: f32 = 440.0;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Per-frame spectral features
#[derive(Debug, Clone, Default)]
pub struct SpectralFeatures {
    /// 12-element chroma vectors (C = 0 ... B = 11), max-normalized per frame
    pub chroma: Vec<Vec<f32>>,

    /// Spectral centroid per frame in Hz (0 for silent frames)
    pub centroid: Vec<f32>,
}

impl SpectralFeatures {
    /// Number of analysed frames
    pub fn len(&self) -> usize {
        self.chroma.len()
    }

    /// True when no frame was analysed
    pub fn is_empty(&self) -> bool {
        self.chroma.is_empty()
    }
}

/// Compute chroma and spectral centroid for every frame
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT size (typically 2048)
/// * `hop_size` - Hop between frame centers (typically 512)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero sizes or sample rate
pub fn compute_spectral_features(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<SpectralFeatures, AnalysisError> {
    if frame_size == 0 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size and hop size must be > 0".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate".to_string(),
        ));
    }
    if samples.is_empty() {
        return Ok(SpectralFeatures::default());
    }

    let n_frames = super::frames::frame_count(samples.len(), hop_size);
    log::debug!(
        "Computing spectral features: {} samples at {} Hz, {} frames",
        samples.len(),
        sample_rate,
        n_frames
    );

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);

    let hann: Vec<f32> = (0..frame_size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / frame_size as f32).cos()))
        .collect();

    let n_bins = frame_size / 2 + 1;
    let bin_freqs: Vec<f32> = (0..n_bins)
        .map(|bin| bin as f32 * sample_rate as f32 / frame_size as f32)
        .collect();

    // Pitch class of each bin: round(12 * log2(f / 440)) shifted so C = 0
    let bin_pitch_class: Vec<Option<usize>> = bin_freqs
        .iter()
        .map(|&freq| {
            if !(MIN_CHROMA_FREQ..=MAX_CHROMA_FREQ).contains(&freq) {
                None
            } else {
                let semitones_from_a = 12.0 * (freq / TUNING_HZ).log2();
                let pc = ((semitones_from_a.round() as i32 + 9) % 12 + 12) % 12;
                Some(pc as usize)
            }
        })
        .collect();

    let half = frame_size / 2;
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut features = SpectralFeatures {
        chroma: Vec::with_capacity(n_frames),
        centroid: Vec::with_capacity(n_frames),
    };

    for frame in 0..n_frames {
        let center = frame * hop_size;
        for (k, slot) in buffer.iter_mut().enumerate() {
            let idx = (center + k).checked_sub(half);
            let sample = idx.and_then(|i| samples.get(i)).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * hann[k], 0.0);
        }

        fft.process(&mut buffer);

        let mut chroma = vec![0.0f32; 12];
        let mut weighted = 0.0f32;
        let mut total = 0.0f32;
        for bin in 0..n_bins {
            let mag = buffer[bin].norm();
            weighted += bin_freqs[bin] * mag;
            total += mag;
            if let Some(pc) = bin_pitch_class[bin] {
                chroma[pc] += mag * mag;
            }
        }

        let peak = chroma.iter().copied().fold(0.0f32, f32::max);
        if peak > EPSILON {
            for v in chroma.iter_mut() {
                *v /= peak;
            }
        }

        features.chroma.push(chroma);
        features
            .centroid
            .push(if total > EPSILON { weighted / total } else { 0.0 });
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        let samples = tone(440.0, 1.0, 22050);
        let features = compute_spectral_features(&samples, 22050, 2048, 512).unwrap();
        let mid = &features.chroma[features.len() / 2];
        let argmax = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmax, 9, "A440 should land in pitch class A (9), chroma {:?}", mid);
    }

    #[test]
    fn test_centroid_tracks_frequency() {
        let low = compute_spectral_features(&tone(200.0, 0.5, 22050), 22050, 2048, 512).unwrap();
        let high = compute_spectral_features(&tone(3000.0, 0.5, 22050), 22050, 2048, 512).unwrap();
        let mid = low.len() / 2;
        assert!(high.centroid[mid] > low.centroid[mid] * 5.0);
    }

    #[test]
    fn test_silence_yields_zero_vectors() {
        let features = compute_spectral_features(&vec![0.0; 4096], 22050, 2048, 512).unwrap();
        assert!(!features.is_empty());
        assert!(features.chroma.iter().all(|c| c.iter().all(|&v| v == 0.0)));
        assert!(features.centroid.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert!(compute_spectral_features(&[], 22050, 2048, 512).unwrap().is_empty());
        assert!(compute_spectral_features(&[0.1; 10], 0, 2048, 512).is_err());
        assert!(compute_spectral_features(&[0.1; 10], 22050, 0, 512).is_err());
    }
}
