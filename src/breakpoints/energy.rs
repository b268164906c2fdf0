//! Energy breakpoints
//!
//! Finds peaks, valleys and sharp transitions in the normalized RMS energy curve of a
//! segment.
//!
//! Algorithm:
//! 1. Compute frame-wise RMS over the segment (frame_size, hop_size)
//! 2. Min-max normalize to [0, 1]
//! 3. Pick local maxima >= 0.3 and local minima <= 0.7, keeping extrema at least
//!    `max(1, n_frames / 10)` frames apart (stronger extrema win)
//! 4. Slide a one-second window over the curve and flag changes larger than 0.3

use super::{Breakpoint, BreakpointSource};
use crate::error::AnalysisError;
use crate::features::frames::{frame_rms, frame_to_time, min_max_normalize, window};

/// Peaks below this normalized height are ignored
const PEAK_MIN_HEIGHT: f32 = 0.3;

/// Valleys above this normalized height are ignored
const VALLEY_MAX_HEIGHT: f32 = 0.7;

/// Minimum normalized change across the window to flag a transition
const TRANSITION_THRESHOLD: f32 = 0.3;

/// Detect energy breakpoints within a segment
///
/// # Arguments
///
/// * `samples` - Full-track mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `segment_start` - Window start in seconds
/// * `segment_end` - Window end in seconds
/// * `frame_size` - RMS frame size (typically 2048)
/// * `hop_size` - RMS hop size (typically 512)
///
/// # Returns
///
/// `energy_peak` (0.5), `energy_valley` (0.6) and `energy_transition` (0.5-0.8) breakpoints
/// with absolute timestamps. Empty for fewer than 3 frames or a flat energy curve.
///
/// # Errors
///
/// Returns `AnalysisError` for invalid framing parameters
pub fn detect_energy_breakpoints(
    samples: &[f32],
    sample_rate: u32,
    segment_start: f32,
    segment_end: f32,
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Breakpoint>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate".to_string(),
        ));
    }

    let segment = window(samples, sample_rate, segment_start, segment_end);
    let rms = frame_rms(segment, frame_size, hop_size)?;

    if rms.len() < 3 {
        return Ok(Vec::new());
    }

    let energy = match min_max_normalize(&rms) {
        Some(energy) => energy,
        None => {
            log::debug!("Flat energy curve in [{:.2}, {:.2}]", segment_start, segment_end);
            return Ok(Vec::new());
        }
    };

    let n_frames = energy.len();
    let distance = (n_frames / 10).max(1);
    let time_of = |frame: usize| segment_start + frame_to_time(frame, sample_rate, hop_size);

    let mut breakpoints = Vec::new();

    for frame in pick_extrema(&energy, distance, true) {
        if energy[frame] >= PEAK_MIN_HEIGHT {
            breakpoints.push(
                Breakpoint::new(time_of(frame), 0.5, BreakpointSource::Energy, "energy_peak")
                    .with_meta("energy", energy[frame] as f64),
            );
        }
    }

    for frame in pick_extrema(&energy, distance, false) {
        if energy[frame] <= VALLEY_MAX_HEIGHT {
            breakpoints.push(
                Breakpoint::new(time_of(frame), 0.6, BreakpointSource::Energy, "energy_valley")
                    .with_meta("energy", energy[frame] as f64),
            );
        }
    }

    // One-second window, advanced by half a window
    let span = ((sample_rate as f32 / hop_size as f32).round() as usize).max(1);
    let step = (span / 2).max(1);
    let mut i = 0;
    while i + span < n_frames {
        let change = energy[i + span] - energy[i];
        if change.abs() > TRANSITION_THRESHOLD {
            let confidence = (0.5 + change.abs() * 0.3).min(0.8);
            breakpoints.push(
                Breakpoint::new(
                    time_of(i + span / 2),
                    confidence,
                    BreakpointSource::Energy,
                    "energy_transition",
                )
                .with_meta("change", change as f64)
                .with_meta("direction", if change > 0.0 { "rise" } else { "fall" }),
            );
        }
        i += step;
    }

    breakpoints.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Energy: {} frames in [{:.2}, {:.2}] -> {} breakpoints",
        n_frames,
        segment_start,
        segment_end,
        breakpoints.len()
    );

    Ok(breakpoints)
}

/// Find strict 3-point local extrema, enforcing a minimum index distance between them
///
/// Extrema are considered strongest first (highest maxima / lowest minima); an extremum is
/// dropped if a stronger one was already kept within `distance` frames.
fn pick_extrema(values: &[f32], distance: usize, maxima: bool) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..values.len() - 1)
        .filter(|&i| {
            let (prev, cur, next) = (values[i - 1], values[i], values[i + 1]);
            if maxima {
                cur > prev && cur > next
            } else {
                cur < prev && cur < next
            }
        })
        .collect();

    candidates.sort_by(|&a, &b| {
        let ord = values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal);
        if maxima {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut kept: Vec<usize> = Vec::with_capacity(candidates.len());
    for idx in candidates {
        if kept.iter().all(|&k| idx.abs_diff(k) >= distance) {
            kept.push(idx);
        }
    }

    kept.sort_unstable();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Noise-like signal whose amplitude follows `envelope(t)`
    fn shaped(seconds: f32, sample_rate: u32, envelope: impl Fn(f32) -> f32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let carrier = (i as f32 * 0.37).sin() * 0.5 + (i as f32 * 1.13).sin() * 0.5;
                carrier * envelope(t)
            })
            .collect()
    }

    #[test]
    fn test_pick_extrema_distance() {
        let values = [0.0, 1.0, 0.0, 0.9, 0.0, 0.2, 0.0];
        assert_eq!(pick_extrema(&values, 1, true), vec![1, 3, 5]);
        // Within 3 frames of the stronger peak at 1, the peak at 3 is suppressed
        assert_eq!(pick_extrema(&values, 3, true), vec![1, 5]);
        assert_eq!(pick_extrema(&values, 1, false), vec![2, 4]);
    }

    #[test]
    fn test_quiet_gap_yields_valley_and_transitions() {
        let sr = 22050;
        let samples = shaped(10.0, sr, |t| if (4.0..6.0).contains(&t) { 0.05 } else { 0.8 });
        let bps = detect_energy_breakpoints(&samples, sr, 0.0, 10.0, 2048, 512).unwrap();

        assert!(bps.iter().any(|b| b.kind == "energy_valley"
            && b.timestamp > 3.5
            && b.timestamp < 6.5));
        let transitions: Vec<_> = bps.iter().filter(|b| b.kind == "energy_transition").collect();
        assert!(transitions.iter().any(|b| (b.timestamp - 4.0).abs() < 1.0));
        assert!(transitions.iter().any(|b| (b.timestamp - 6.0).abs() < 1.0));
        assert!(transitions.iter().all(|b| b.confidence >= 0.5 && b.confidence <= 0.8));
        assert!(bps.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_timestamps_are_absolute() {
        let sr = 22050;
        let samples = shaped(20.0, sr, |t| if (14.0..16.0).contains(&t) { 0.05 } else { 0.8 });
        let bps = detect_energy_breakpoints(&samples, sr, 10.0, 20.0, 2048, 512).unwrap();
        assert!(!bps.is_empty());
        assert!(bps.iter().all(|b| b.timestamp >= 10.0 && b.timestamp <= 20.0));
    }

    #[test]
    fn test_flat_or_short_input_is_empty() {
        let sr = 22050;
        assert!(detect_energy_breakpoints(&vec![0.0; 44100], sr, 0.0, 2.0, 2048, 512)
            .unwrap()
            .is_empty());
        assert!(detect_energy_breakpoints(&vec![0.3; 100], sr, 0.0, 0.01, 2048, 512)
            .unwrap()
            .is_empty());
        assert!(detect_energy_breakpoints(&[], sr, 0.0, 5.0, 2048, 512)
            .unwrap()
            .is_empty());
    }
}
