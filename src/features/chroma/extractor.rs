//! Chroma vector extraction
//!
//! Converts the STFT magnitude spectrum to 12-element chroma vectors.

use crate::error::AnalysisError;
use crate::features::spectral::compute_spectral_features;

/// Extract chroma vectors from audio samples
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - FFT frame size (default: 2048)
/// * `hop_size` - Hop size (default: 512)
///
/// # Returns
///
/// Vector of 12-element chroma vectors (one per frame)
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    log::debug!("Extracting chroma: {} samples at {} Hz", samples.len(), sample_rate);
    Ok(compute_spectral_features(samples, sample_rate, frame_size, hop_size)?.chroma)
}

/// Mean-pool consecutive chroma frames so that at most `max_frames` remain
///
/// # Returns
///
/// `(pooled_frames, pool_factor)`; a factor of 1 means the input was returned unchanged.
pub fn pool_frames(chroma: &[Vec<f32>], max_frames: usize) -> (Vec<Vec<f32>>, usize) {
    if max_frames == 0 || chroma.len() <= max_frames {
        return (chroma.to_vec(), 1);
    }

    let factor = chroma.len().div_ceil(max_frames);
    let pooled = chroma
        .chunks(factor)
        .map(|chunk| {
            let mut mean = vec![0.0f32; 12];
            for frame in chunk {
                for (m, &v) in mean.iter_mut().zip(frame.iter()) {
                    *m += v;
                }
            }
            let n = chunk.len() as f32;
            mean.iter_mut().for_each(|m| *m /= n);
            mean
        })
        .collect();

    (pooled, factor)
}
