//! Configuration parameters for segmentation

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::ChannelMixMode;
use serde::{Deserialize, Serialize};

/// Segmentation configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    // Framing
    /// Frame size for RMS/STFT analysis (default: 2048)
    pub frame_size: usize,

    /// Hop size between frames (default: 512)
    pub hop_size: usize,

    // Breakpoints
    /// Breakpoints closer than this to a cluster's first member are merged (default: 0.5s)
    pub merge_distance: f32,

    // Structure
    /// Minimum spacing between kept label transitions (default: 7.0s)
    pub min_segment_duration: f32,

    /// Weight of the |i-j|/n temporal-contiguity penalty (default: 0.35)
    pub temporal_penalty_weight: f32,

    /// Seconds of audio per requested structure cluster (default: 45.0)
    pub seconds_per_cluster: f32,

    /// Seconds of audio per segment in the uniform fallback (default: 18.0)
    pub seconds_per_uniform_segment: f32,

    /// Chroma frames are mean-pooled down to at most this many before clustering (default: 1024)
    pub max_clustering_frames: usize,

    /// Clustering needs at least this many frames per requested cluster (default: 16)
    pub min_frames_per_cluster: usize,

    // Segment preprocessing
    /// Structure segments shorter than this are always merged (default: 4.0s)
    pub segment_merge_threshold: f32,

    // Clip band
    /// Lower edge of the target clip band (default: 4.0s)
    pub min_clip_duration: f32,

    /// Preferred clip length (default: 6.0s)
    pub target_clip_duration: f32,

    /// Upper edge of the target clip band (default: 8.0s)
    pub max_clip_duration: f32,

    /// Ceiling tolerated when extending a clip to close a gap (default: 8.5s)
    pub soft_max_clip_duration: f32,

    /// No clip may be shorter than this (default: 3.0s)
    pub hard_min_clip_duration: f32,

    /// Seam tolerance for coverage checks (default: 0.1s)
    pub coverage_tolerance: f32,

    // Forced subdivision
    /// Structure segments longer than this are sent to the appropriateness analyzer (default: 20.0s)
    pub appropriateness_check_duration: f32,

    /// Clip length used to size a forced subdivision (default: 8.0s)
    pub forced_clip_duration: f32,

    /// Minimum clip count for a forced subdivision (default: 10)
    pub forced_min_clips: usize,

    // Decoding
    /// How multi-channel files are mixed down to mono (default: average)
    pub channel_mix: ChannelMixMode,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            merge_distance: 0.5,
            min_segment_duration: 7.0,
            temporal_penalty_weight: 0.35,
            seconds_per_cluster: 45.0,
            seconds_per_uniform_segment: 18.0,
            max_clustering_frames: 1024,
            min_frames_per_cluster: 16,
            segment_merge_threshold: 4.0,
            min_clip_duration: 4.0,
            target_clip_duration: 6.0,
            max_clip_duration: 8.0,
            soft_max_clip_duration: 8.5,
            hard_min_clip_duration: 3.0,
            coverage_tolerance: 0.1,
            appropriateness_check_duration: 20.0,
            forced_clip_duration: 8.0,
            forced_min_clips: 10,
            channel_mix: ChannelMixMode::Average,
        }
    }
}

impl SegmentationConfig {
    /// Check that the parameters are mutually consistent
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_size == 0 || self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Frame size and hop size must be > 0".to_string(),
            ));
        }
        if self.hard_min_clip_duration <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "Hard minimum clip duration must be > 0".to_string(),
            ));
        }
        if !(self.hard_min_clip_duration <= self.min_clip_duration
            && self.min_clip_duration <= self.target_clip_duration
            && self.target_clip_duration <= self.max_clip_duration
            && self.max_clip_duration <= self.soft_max_clip_duration)
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Clip band must satisfy floor <= min <= target <= max <= soft max, got {} / {} / {} / {} / {}",
                self.hard_min_clip_duration,
                self.min_clip_duration,
                self.target_clip_duration,
                self.max_clip_duration,
                self.soft_max_clip_duration
            )));
        }
        if self.merge_distance < 0.0 || self.coverage_tolerance < 0.0 {
            return Err(AnalysisError::InvalidInput(
                "Merge distance and coverage tolerance must be non-negative".to_string(),
            ));
        }
        if self.seconds_per_cluster <= 0.0 || self.seconds_per_uniform_segment <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "Segment sizing divisors must be > 0".to_string(),
            ));
        }
        if self.max_clustering_frames < 2 || self.forced_clip_duration <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "max_clustering_frames must be >= 2 and forced_clip_duration > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SegmentationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let config = SegmentationConfig {
            min_clip_duration: 9.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_hop_rejected() {
        let config = SegmentationConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SegmentationConfig =
            serde_json::from_str(r#"{ "merge_distance": 0.25 }"#).unwrap();
        assert_eq!(config.merge_distance, 0.25);
        assert_eq!(config.hop_size, 512);
        assert_eq!(config.channel_mix, ChannelMixMode::Average);
    }
}
