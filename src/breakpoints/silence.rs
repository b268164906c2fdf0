//! Silence breakpoints
//!
//! A frame is silent when its RMS falls below 10% of the segment's mean RMS. Maximal runs
//! of silent frames lasting at least 0.3s produce one breakpoint at the start of the run.

use super::{Breakpoint, BreakpointSource};
use crate::error::AnalysisError;
use crate::features::frames::{frame_rms, frame_to_time, window};

/// Silence threshold as a fraction of the segment's mean RMS
const RELATIVE_THRESHOLD: f32 = 0.1;

/// Shorter silent runs are ignored
const MIN_SILENCE: f32 = 0.3;

/// Runs shorter than this are pauses, longer ones silence gaps
const GAP_SILENCE: f32 = 1.0;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Detect silence breakpoints within a segment
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
/// `pause` (0.7) breakpoints for runs under one second and `silence_gap` (0.8) for longer
/// runs, at the absolute start time of each run. A fully silent segment has no reference
/// level and yields nothing.
///
/// # Errors
///
/// Returns `AnalysisError` for invalid framing parameters
pub fn detect_silence_breakpoints(
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
    if rms.is_empty() {
        return Ok(Vec::new());
    }

    let mean = rms.iter().sum::<f32>() / rms.len() as f32;
    if mean <= EPSILON {
        return Ok(Vec::new());
    }
    let threshold = mean * RELATIVE_THRESHOLD;

    let mut breakpoints = Vec::new();
    let mut run_start: Option<usize> = None;

    for (frame, &value) in rms.iter().enumerate() {
        match (value < threshold, run_start) {
            (true, None) => run_start = Some(frame),
            (false, Some(start)) => {
                let duration = frame_to_time(frame - start, sample_rate, hop_size);
                if let Some(bp) = silence_breakpoint(
                    segment_start + frame_to_time(start, sample_rate, hop_size),
                    duration,
                    false,
                ) {
                    breakpoints.push(bp);
                }
                run_start = None;
            }
            _ => {}
        }
    }

    // Silence running into the end of the segment
    if let Some(start) = run_start {
        let start_time = segment_start + frame_to_time(start, sample_rate, hop_size);
        let duration = (segment_end - start_time).max(0.0);
        if let Some(bp) = silence_breakpoint(start_time, duration, true) {
            breakpoints.push(bp);
        }
    }

    log::debug!(
        "Silence: threshold {:.5} in [{:.2}, {:.2}] -> {} breakpoints",
        threshold,
        segment_start,
        segment_end,
        breakpoints.len()
    );

    Ok(breakpoints)
}

fn silence_breakpoint(start: f32, duration: f32, trailing: bool) -> Option<Breakpoint> {
    if duration < MIN_SILENCE {
        return None;
    }
    let (kind, confidence) = if duration < GAP_SILENCE {
        ("pause", 0.7)
    } else {
        ("silence_gap", 0.8)
    };
    Some(
        Breakpoint::new(start, confidence, BreakpointSource::Silence, kind)
            .with_meta("duration", duration as f64)
            .with_meta("trailing", trailing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_with_gaps(seconds: f32, sample_rate: u32, gaps: &[(f32, f32)]) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                if gaps.iter().any(|&(a, b)| t >= a && t < b) {
                    0.0
                } else {
                    (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 0.6
                }
            })
            .collect()
    }

    #[test]
    fn test_silence_gap_detected() {
        let sr = 22050;
        let samples = tone_with_gaps(15.0, sr, &[(7.0, 8.2)]);
        let bps = detect_silence_breakpoints(&samples, sr, 0.0, 15.0, 2048, 512).unwrap();
        assert_eq!(bps.len(), 1);
        assert_eq!(bps[0].kind, "silence_gap");
        assert!((bps[0].timestamp - 7.0).abs() < 0.15, "got {}", bps[0].timestamp);
        assert!(bps[0].confidence >= 0.7);
    }

    #[test]
    fn test_short_pause_and_tiny_gap() {
        let sr = 22050;
        // 0.6s pause is reported, 0.1s dropout is not
        let samples = tone_with_gaps(10.0, sr, &[(3.0, 3.6), (6.0, 6.1)]);
        let bps = detect_silence_breakpoints(&samples, sr, 0.0, 10.0, 2048, 512).unwrap();
        assert_eq!(bps.len(), 1);
        assert_eq!(bps[0].kind, "pause");
        assert!((bps[0].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_trailing_silence() {
        let sr = 22050;
        let samples = tone_with_gaps(10.0, sr, &[(8.0, 10.0)]);
        let bps = detect_silence_breakpoints(&samples, sr, 0.0, 10.0, 2048, 512).unwrap();
        assert_eq!(bps.len(), 1);
        assert_eq!(bps[0].kind, "silence_gap");
        assert_eq!(bps[0].metadata["trailing"], true);
    }

    #[test]
    fn test_all_silent_segment_has_no_reference() {
        let bps =
            detect_silence_breakpoints(&vec![0.0; 22050 * 5], 22050, 0.0, 5.0, 2048, 512).unwrap();
        assert!(bps.is_empty());
    }
}
