//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMixMode {
    /// Simple average of all channels
    Average,
    /// Keep the channel with the highest overall RMS
    Dominant,
}

/// Mix interleaved multi-channel samples down to mono
///
/// # Arguments
///
/// * `samples` - Interleaved samples (`frame0_ch0, frame0_ch1, ...`)
/// * `channels` - Channel count (>= 1)
/// * `mode` - Mixing mode
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero channels or a sample count that is not a
/// multiple of the channel count
pub fn downmix_interleaved(
    samples: &[f32],
    channels: usize,
    mode: ChannelMixMode,
) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }
    if samples.len() % channels != 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "{} samples is not a whole number of {}-channel frames",
            samples.len(),
            channels
        )));
    }
    if channels == 1 {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Mixing {} frames of {} channels to mono using {:?}",
        samples.len() / channels,
        channels,
        mode
    );

    match mode {
        ChannelMixMode::Average => Ok(samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()),
        ChannelMixMode::Dominant => {
            let mut energy = vec![0.0f64; channels];
            for frame in samples.chunks_exact(channels) {
                for (e, &s) in energy.iter_mut().zip(frame) {
                    *e += (s as f64) * (s as f64);
                }
            }
            let loudest = energy
                .iter()
                .enumerate()
                .fold((0, f64::MIN), |best, (ch, &e)| if e > best.1 { (ch, e) } else { best })
                .0;
            Ok(samples
                .chunks_exact(channels)
                .map(|frame| frame[loudest])
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_mix() {
        let mono = downmix_interleaved(&[1.0, 0.0, 0.0, -1.0], 2, ChannelMixMode::Average).unwrap();
        assert_eq!(mono, vec![0.5, -0.5]);
    }

    #[test]
    fn test_dominant_keeps_louder_channel() {
        let interleaved = [0.1, 0.8, -0.1, -0.7, 0.1, 0.9];
        let mono = downmix_interleaved(&interleaved, 2, ChannelMixMode::Dominant).unwrap();
        assert_eq!(mono, vec![0.8, -0.7, 0.9]);
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(downmix_interleaved(&[0.0; 5], 2, ChannelMixMode::Average).is_err());
        assert!(downmix_interleaved(&[0.0; 4], 0, ChannelMixMode::Average).is_err());
        assert_eq!(
            downmix_interleaved(&[0.25, 0.5], 1, ChannelMixMode::Dominant).unwrap(),
            vec![0.25, 0.5]
        );
    }
}
