//! Structure segmentation
//!
//! Algorithm:
//! 1. One STFT pass for chroma and spectral centroid, plus frame RMS
//! 2. Mean-pool chroma to at most `max_clustering_frames`; mostly silent tracks skip
//!    clustering
//! 3. Cosine distance matrix, validated and symmetrized, plus temporal penalty
//! 4. Complete-linkage clustering into `clamp(round(duration / 45), 2, 4)` clusters
//! 5. Label transitions at least `min_segment_duration` apart become boundaries
//!
//! Fallback tiers, in order:
//! - ≤2 boundaries (the start plus at most one kept transition) despite several labels:
//!   largest contiguous label runs
//! - ≤1 usable run, or any clustering error: `clamp(round(duration / 18), 2, 6)` equal
//!   segments

use super::classification::{classify_windows, TrackEnergy};
use super::clustering::cluster_complete_linkage;
use super::similarity::{
    add_temporal_penalty, cosine_distance_matrix, distance_stats, validate_distances,
};
use super::{StructureMethod, StructureResult};
use crate::config::SegmentationConfig;
use crate::error::AnalysisError;
use crate::features::chroma::extractor::pool_frames;
use crate::features::frames::frame_rms;
use crate::features::spectral::compute_spectral_features;

/// Time window with its majority cluster label
type Window = (f32, f32, Option<usize>);

/// Segment a track into typed macro-segments
///
/// Structure analysis always returns something: clustering failures and degenerate
/// clusterings fall back to coarser segmentations instead of erroring.
///
/// # Arguments
///
/// * `samples` - Full-track mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `beat_timestamps` - Beat times in seconds (may be empty)
/// * `duration` - Track duration in seconds
/// * `config` - Segmentation configuration
///
/// # Returns
///
/// Contiguous segments covering `[0, duration]`; empty when `duration <= 0`
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for invalid framing parameters or sample rate
pub fn segment_structure(
    samples: &[f32],
    sample_rate: u32,
    beat_timestamps: &[f32],
    duration: f32,
    config: &SegmentationConfig,
) -> Result<StructureResult, AnalysisError> {
    log::debug!(
        "Segmenting structure: {} samples at {} Hz, duration {:.2}s",
        samples.len(),
        sample_rate,
        duration
    );

    if duration <= 0.0 {
        return Ok(StructureResult {
            segments: Vec::new(),
            fallback_used: false,
            method: StructureMethod::Uniform,
            n_frames: 0,
            n_clusters: 0,
        });
    }

    let spectral =
        compute_spectral_features(samples, sample_rate, config.frame_size, config.hop_size)?;
    let rms = frame_rms(samples, config.frame_size, config.hop_size)?;
    let energy = TrackEnergy::new(rms, spectral.centroid, sample_rate, config.hop_size);

    let (chroma, pool_factor) = pool_frames(&spectral.chroma, config.max_clustering_frames);
    let n_frames = chroma.len();
    let frame_duration = (pool_factor * config.hop_size) as f32 / sample_rate as f32;

    let mut n_clusters = ((duration / config.seconds_per_cluster).round() as usize).clamp(2, 4);
    if n_frames < n_clusters {
        n_clusters = n_frames.max(1);
    }

    let (windows, method) =
        match cluster_windows(&chroma, n_clusters, frame_duration, duration, config) {
            Ok(Some((windows, method))) => (windows, method),
            Ok(None) => {
                log::warn!(
                    "Degenerate clustering ({} frames, {} clusters), using uniform segmentation",
                    n_frames,
                    n_clusters
                );
                (uniform_windows(duration, config), StructureMethod::Uniform)
            }
            Err(e) => {
                log::warn!(
                    "Structure clustering failed ({} frames, {} clusters requested): {}; \
                     using uniform segmentation",
                    n_frames,
                    n_clusters,
                    e
                );
                (uniform_windows(duration, config), StructureMethod::Uniform)
            }
        };

    let segments = classify_windows(&windows, &energy, beat_timestamps);

    log::debug!(
        "Structure: {} segments via {} ({} frames, pool factor {})",
        segments.len(),
        method.as_str(),
        n_frames,
        pool_factor
    );

    Ok(StructureResult {
        segments,
        fallback_used: method != StructureMethod::Clustering,
        method,
        n_frames,
        n_clusters,
    })
}

/// Run clustering and turn labels into windows
///
/// `Ok(None)` means clustering ran but produced no usable segmentation.
fn cluster_windows(
    chroma: &[Vec<f32>],
    n_clusters: usize,
    frame_duration: f32,
    duration: f32,
    config: &SegmentationConfig,
) -> Result<Option<(Vec<Window>, StructureMethod)>, AnalysisError> {
    let n_frames = chroma.len();
    let required = n_clusters * config.min_frames_per_cluster;
    if n_frames < required.max(2) {
        return Err(AnalysisError::ClusteringError(format!(
            "Insufficient frames: {} frames for {} clusters (need {})",
            n_frames, n_clusters, required
        )));
    }

    let silent = chroma
        .iter()
        .filter(|frame| frame.iter().all(|&v| v <= f32::EPSILON))
        .count();
    if silent * 2 > n_frames {
        return Err(AnalysisError::ClusteringError(format!(
            "{} of {} chroma frames are silent",
            silent, n_frames
        )));
    }

    let mut distances = cosine_distance_matrix(chroma);
    validate_distances(&mut distances)?;
    add_temporal_penalty(&mut distances, config.temporal_penalty_weight);

    let (min, mean, max) = distance_stats(&distances);
    log::debug!(
        "Distance matrix {}x{}: min {:.3}, mean {:.3}, max {:.3}",
        n_frames,
        n_frames,
        min,
        mean,
        max
    );

    let labels = cluster_complete_linkage(&distances, n_clusters)?;
    let min_gap = ((config.min_segment_duration / frame_duration).ceil() as usize).max(1);
    let to_time = |frame: usize| {
        if frame >= n_frames {
            duration
        } else {
            (frame as f32 * frame_duration).min(duration)
        }
    };

    let mut boundaries = transition_boundaries(&labels, min_gap);
    let unique = count_unique(&labels);

    if boundaries.len() > 2 || unique <= 1 {
        boundaries.push(n_frames);
        let windows = boundaries
            .windows(2)
            .map(|w| (to_time(w[0]), to_time(w[1]), Some(majority_label(&labels[w[0]..w[1]]))))
            .collect();
        return Ok(Some((drop_empty_windows(windows), StructureMethod::Clustering)));
    }

    log::debug!(
        "Only {} boundaries for {} labels, extracting contiguous regions",
        boundaries.len(),
        unique
    );

    let regions = contiguous_regions(&labels, min_gap);
    if regions.len() <= 1 {
        return Ok(None);
    }

    let windows = regions
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let from = if i == 0 { 0 } else { start };
            let to = regions.get(i + 1).copied().unwrap_or(n_frames);
            (to_time(from), to_time(to), Some(majority_label(&labels[from..to])))
        })
        .collect();

    Ok(Some((drop_empty_windows(windows), StructureMethod::ContiguousRegions)))
}

/// `[0]` plus transitions at least `min_gap` frames after the previous kept one
fn transition_boundaries(labels: &[usize], min_gap: usize) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut last = 0;
    for i in 1..labels.len() {
        if labels[i] != labels[i - 1] && i - last >= min_gap {
            boundaries.push(i);
            last = i;
        }
    }
    boundaries
}

/// Fold windows that collapsed to zero length (frame times clamped at the track end)
/// into their predecessor
fn drop_empty_windows(windows: Vec<Window>) -> Vec<Window> {
    let mut kept: Vec<Window> = Vec::with_capacity(windows.len());
    for window in windows {
        if window.1 - window.0 > f32::EPSILON {
            kept.push(window);
        } else if let Some(last) = kept.last_mut() {
            last.1 = last.1.max(window.1);
        }
    }
    kept
}

/// Start frames of maximal same-label runs of at least `min_gap` frames
fn contiguous_regions(labels: &[usize], min_gap: usize) -> Vec<usize> {
    let mut regions = Vec::new();
    let mut run_start = 0;
    for i in 1..=labels.len() {
        if i == labels.len() || labels[i] != labels[run_start] {
            if i - run_start >= min_gap {
                regions.push(run_start);
            }
            run_start = i;
        }
    }
    regions
}

fn count_unique(labels: &[usize]) -> usize {
    let mut seen: Vec<usize> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Most frequent label (bincount; lowest label wins ties)
fn majority_label(labels: &[usize]) -> usize {
    let max_label = labels.iter().copied().max().unwrap_or(0);
    let mut counts = vec![0usize; max_label + 1];
    for &l in labels {
        counts[l] += 1;
    }
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (label, &count)| {
            if count > best.1 {
                (label, count)
            } else {
                best
            }
        })
        .0
}

/// Equal-length windows, `clamp(round(duration / 18), 2, 6)` of them
fn uniform_windows(duration: f32, config: &SegmentationConfig) -> Vec<Window> {
    let n = ((duration / config.seconds_per_uniform_segment).round() as usize).clamp(2, 6);
    let length = duration / n as f32;
    (0..n)
        .map(|i| {
            let start = i as f32 * length;
            let end = if i + 1 == n {
                duration
            } else {
                (i + 1) as f32 * length
            };
            (start, end, None)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::SegmentType;
    use std::f32::consts::PI;

    fn chords(sample_rate: u32, sections: &[(&[f32], f32)]) -> Vec<f32> {
        let mut samples = Vec::new();
        for (freqs, seconds) in sections {
            let n = (seconds * sample_rate as f32) as usize;
            let offset = samples.len();
            for i in 0..n {
                let t = (offset + i) as f32 / sample_rate as f32;
                let v: f32 = freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum();
                samples.push(v * 0.2);
            }
        }
        samples
    }

    fn assert_contiguous(result: &StructureResult, duration: f32) {
        let segs = &result.segments;
        assert!(!segs.is_empty());
        assert_eq!(segs[0].start, 0.0);
        assert!((segs[segs.len() - 1].end - duration).abs() < 1e-3);
        for w in segs.windows(2) {
            assert!((w[0].end - w[1].start).abs() < 1e-4);
        }
        assert!(segs.iter().all(|s| s.end > s.start));
    }

    #[test]
    fn test_transition_boundaries() {
        let labels = [0, 0, 0, 1, 0, 0, 0, 2, 2, 2, 2];
        // Transition at 4 is too close to 3
        assert_eq!(transition_boundaries(&labels, 3), vec![0, 3, 7]);
        assert_eq!(transition_boundaries(&[1, 1, 1], 2), vec![0]);
    }

    #[test]
    fn test_contiguous_regions() {
        let labels = [0, 0, 0, 0, 1, 0, 1, 1, 1, 1, 1];
        assert_eq!(contiguous_regions(&labels, 3), vec![0, 6]);
        assert!(contiguous_regions(&[0, 1, 0, 1], 2).is_empty());
    }

    #[test]
    fn test_single_transition_uses_contiguous_regions() {
        let pc = |class: usize| {
            let mut v = vec![0.0f32; 12];
            v[class] = 1.0;
            v
        };
        // 20s in C, a 1s flicker of F#, 20s in D#, at 0.5s per frame
        let mut chroma = vec![pc(0); 40];
        chroma.extend(vec![pc(6); 2]);
        chroma.extend(vec![pc(3); 40]);

        let config = SegmentationConfig::default();
        let (windows, method) = cluster_windows(&chroma, 3, 0.5, 41.0, &config)
            .unwrap()
            .unwrap();

        assert_eq!(method, StructureMethod::ContiguousRegions);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].0, 0.0);
        assert!((windows[0].1 - 21.0).abs() < 1e-4);
        assert!((windows[1].0 - 21.0).abs() < 1e-4);
        assert!((windows[1].1 - 41.0).abs() < 1e-4);
        assert_ne!(windows[0].2, windows[1].2);
    }

    #[test]
    fn test_empty_windows_are_folded() {
        let windows = vec![(0.0, 10.0, Some(0)), (10.0, 20.0, Some(1)), (20.0, 20.0, Some(2))];
        assert_eq!(
            drop_empty_windows(windows),
            vec![(0.0, 10.0, Some(0)), (10.0, 20.0, Some(1))]
        );
        let leading = vec![(0.0, 0.0, Some(0)), (0.0, 5.0, Some(1))];
        assert_eq!(drop_empty_windows(leading), vec![(0.0, 5.0, Some(1))]);
    }

    #[test]
    fn test_non_finite_features_fall_back() {
        let sr = 22050;
        let c_major: &[f32] = &[261.63, 329.63, 392.0];
        let mut samples = chords(sr, &[(c_major, 60.0)]);
        samples[sr as usize * 30] = f32::NAN;

        let result =
            segment_structure(&samples, sr, &[], 60.0, &SegmentationConfig::default()).unwrap();

        assert!(result.fallback_used);
        assert_eq!(result.method, StructureMethod::Uniform);
        assert_eq!(result.segments.len(), 3);
        assert_contiguous(&result, 60.0);
    }

    #[test]
    fn test_majority_label() {
        assert_eq!(majority_label(&[2, 1, 2, 0, 2]), 2);
        assert_eq!(majority_label(&[1, 0]), 0);
    }

    #[test]
    fn test_uniform_windows() {
        let config = SegmentationConfig::default();
        let w = uniform_windows(200.0, &config);
        assert_eq!(w.len(), 6);
        assert_eq!(w[5].1, 200.0);
        assert_eq!(uniform_windows(5.0, &config).len(), 2);
        assert_eq!(uniform_windows(54.0, &config).len(), 3);
    }

    #[test]
    fn test_clustering_finds_harmonic_sections() {
        let sr = 22050;
        let c_major: &[f32] = &[261.63, 329.63, 392.0];
        let f_sharp: &[f32] = &[369.99, 466.16, 554.37];
        let samples = chords(sr, &[(c_major, 30.0), (f_sharp, 30.0), (c_major, 30.0)]);

        let config = SegmentationConfig::default();
        let result = segment_structure(&samples, sr, &[], 90.0, &config).unwrap();

        assert_eq!(result.method, StructureMethod::Clustering);
        assert!(!result.fallback_used);
        assert!(result.n_frames <= config.max_clustering_frames);
        assert_contiguous(&result, 90.0);
        assert_eq!(result.segments.len(), 3);
        assert!((result.segments[1].start - 30.0).abs() < 1.0);
        assert!((result.segments[2].start - 60.0).abs() < 1.0);
        // Same harmony, same label
        assert_eq!(result.segments[0].label, result.segments[2].label);
        assert_ne!(result.segments[0].label, result.segments[1].label);
    }

    #[test]
    fn test_silent_clip_falls_back() {
        let sr = 22050;
        let samples = vec![0.0f32; sr as usize * 5];
        let result =
            segment_structure(&samples, sr, &[], 5.0, &SegmentationConfig::default()).unwrap();

        assert!(result.fallback_used);
        assert_eq!(result.method, StructureMethod::Uniform);
        assert_contiguous(&result, 5.0);
    }

    #[test]
    fn test_too_few_frames_uses_uniform() {
        // 200s at 1 kHz with a 5000-sample hop: 41 chroma frames, 4 clusters wanted
        let sr = 1000;
        let samples: Vec<f32> = (0..200_000)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let amp = if t < 100.0 { 0.2 } else { 0.8 };
                (2.0 * PI * 110.0 * t).sin() * amp
            })
            .collect();
        let config = SegmentationConfig {
            hop_size: 5000,
            ..SegmentationConfig::default()
        };

        let result = segment_structure(&samples, sr, &[], 200.0, &config).unwrap();
        assert!(result.fallback_used);
        assert_eq!(result.method, StructureMethod::Uniform);
        assert_eq!(result.n_frames, 41);
        assert!((2..=6).contains(&result.segments.len()));
        assert_contiguous(&result, 200.0);

        let lengths: Vec<f32> = result.segments.iter().map(|s| s.duration()).collect();
        assert!(lengths.iter().all(|l| (l - lengths[0]).abs() < 1e-3));

        // Loud second half reads as higher energy than the quiet first half
        let first = &result.segments[0];
        let last = &result.segments[result.segments.len() - 1];
        assert!(last.energy_score > first.energy_score);
        assert_ne!(first.segment_type, SegmentType::Bridge);
    }

    #[test]
    fn test_beat_intensity_attached() {
        let sr = 22050;
        let samples = vec![0.0f32; sr as usize * 5];
        let beats: Vec<f32> = (0..10).map(|i| i as f32 * 0.5).collect();
        let result =
            segment_structure(&samples, sr, &beats, 5.0, &SegmentationConfig::default()).unwrap();
        assert!(result.segments.iter().all(|s| s.beat_intensity.is_some()));
    }

    #[test]
    fn test_zero_duration_is_empty() {
        let result =
            segment_structure(&[], 22050, &[], 0.0, &SegmentationConfig::default()).unwrap();
        assert!(result.segments.is_empty());
    }
}
