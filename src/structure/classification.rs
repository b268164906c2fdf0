//! Segment typing from energy
//!
//! Per-segment energy score: `0.6 * mean_rms / max_rms + 0.4 * mean_centroid / max_centroid`,
//! both normalized against the full-track frame maxima.

use super::{EnergyLevel, SegmentType, SongStructureSegment};
use crate::features::frames::time_to_frame;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Intro/outro candidates must be shorter than this
const EDGE_SEGMENT_MAX: f32 = 15.0;

/// Frame-level loudness and brightness of the whole track
#[derive(Debug, Clone)]
pub struct TrackEnergy {
    rms: Vec<f32>,
    centroid: Vec<f32>,
    max_rms: f32,
    max_centroid: f32,
    sample_rate: u32,
    hop_size: usize,
}

impl TrackEnergy {
    /// Wrap per-frame RMS and spectral centroid (same framing)
    pub fn new(rms: Vec<f32>, centroid: Vec<f32>, sample_rate: u32, hop_size: usize) -> Self {
        let max_rms = rms.iter().copied().fold(0.0f32, f32::max);
        let max_centroid = centroid.iter().copied().fold(0.0f32, f32::max);
        Self {
            rms,
            centroid,
            max_rms,
            max_centroid,
            sample_rate,
            hop_size,
        }
    }

    /// Energy score (0.0-1.0) of the frames between `start` and `end` seconds
    pub fn score(&self, start: f32, end: f32) -> f32 {
        let n = self.rms.len().min(self.centroid.len());
        if n == 0 {
            return 0.0;
        }
        let a = time_to_frame(start, self.sample_rate, self.hop_size).min(n - 1);
        let b = time_to_frame(end, self.sample_rate, self.hop_size).clamp(a + 1, n);

        let count = (b - a) as f32;
        let mean_rms = self.rms[a..b].iter().sum::<f32>() / count;
        let mean_centroid = self.centroid[a..b].iter().sum::<f32>() / count;

        let score = 0.6 * mean_rms / (self.max_rms + EPSILON)
            + 0.4 * mean_centroid / (self.max_centroid + EPSILON);
        score.clamp(0.0, 1.0)
    }
}

/// Assign a musical role from position, duration and energy
///
/// With two or fewer segments (likely degenerate clustering) the type is position-based:
/// a quiet first segment is an intro, a quiet last one an outro, anything else a verse.
/// Otherwise quiet short edges become intro/outro, loud segments choruses, quiet ones
/// verses, and medium segments alternate verse/chorus by index.
pub fn classify_segment_type(
    index: usize,
    n_segments: usize,
    duration: f32,
    energy: f32,
) -> SegmentType {
    let is_first = index == 0;
    let is_last = index + 1 == n_segments;

    if n_segments <= 2 {
        return match (n_segments > 1, is_first, is_last) {
            (true, true, _) if energy < 0.4 => SegmentType::Intro,
            (true, _, true) if energy < 0.4 => SegmentType::Outro,
            _ => SegmentType::Verse,
        };
    }

    if is_first && duration < EDGE_SEGMENT_MAX && energy < 0.4 {
        SegmentType::Intro
    } else if is_last && duration < EDGE_SEGMENT_MAX && energy < 0.4 {
        SegmentType::Outro
    } else if energy > 0.7 {
        SegmentType::Chorus
    } else if energy < 0.4 {
        SegmentType::Verse
    } else if index % 2 == 0 {
        SegmentType::Verse
    } else {
        SegmentType::Chorus
    }
}

/// Combine beat density and energy into an intensity level
///
/// Beat density is expressed as an equivalent BPM (`beats / duration * 60`). Both signals
/// agreeing on an extreme wins first; otherwise either signal alone tips to its extreme.
///
/// # Returns
///
/// `None` when no beats are available or the window is empty
pub fn beat_intensity(beats: &[f32], start: f32, end: f32, energy: f32) -> Option<EnergyLevel> {
    let duration = end - start;
    if beats.is_empty() || duration <= 0.0 {
        return None;
    }

    let count = beats.iter().filter(|&&b| b >= start && b < end).count();
    let bpm_equivalent = count as f32 / duration * 60.0;

    let fast = bpm_equivalent > 120.0;
    let slow = bpm_equivalent < 90.0;
    let loud = energy > 0.7;
    let quiet = energy < 0.4;

    Some(if fast && loud {
        EnergyLevel::High
    } else if slow && quiet {
        EnergyLevel::Low
    } else if fast || loud {
        EnergyLevel::High
    } else if slow || quiet {
        EnergyLevel::Low
    } else {
        EnergyLevel::Medium
    })
}

/// Build typed segments from `(start, end, label)` windows
pub(crate) fn classify_windows(
    windows: &[(f32, f32, Option<usize>)],
    energy: &TrackEnergy,
    beats: &[f32],
) -> Vec<SongStructureSegment> {
    let n = windows.len();
    windows
        .iter()
        .enumerate()
        .map(|(i, &(start, end, label))| {
            let score = energy.score(start, end);
            let segment_type = classify_segment_type(i, n, end - start, score);
            SongStructureSegment {
                segment_type,
                start,
                end,
                energy: EnergyLevel::from_score(score),
                beat_intensity: beat_intensity(beats, start, end, score),
                label,
                energy_score: score,
            }
        })
        .collect()
}
