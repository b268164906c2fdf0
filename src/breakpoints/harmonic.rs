//! Harmonic breakpoints
//!
//! Two kinds of harmonic evidence:
//! - Macro-structure boundaries falling strictly inside the window (confidence 0.9)
//! - Chord changes, where consecutive L2-normalized chroma frames have cosine similarity
//!   below 0.7

use super::{Breakpoint, BreakpointSource};
use crate::error::AnalysisError;
use crate::features::chroma::{cosine_similarity, extract_chroma, l2_normalize};
use crate::features::frames::{frame_to_time, window};
use crate::structure::SongStructureSegment;

/// Frame pairs less similar than this count as a chord change
const CHORD_CHANGE_SIMILARITY: f32 = 0.7;

/// Confidence of a structure-boundary breakpoint
const STRUCTURE_CONFIDENCE: f32 = 0.9;

/// Detect harmonic breakpoints within a segment
///
/// # Arguments
///
/// * `samples` - Full-track mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `segment_start` - Window start in seconds
/// * `segment_end` - Window end in seconds
/// * `structure` - Macro structure segments of the whole track
/// * `frame_size` - STFT frame size (typically 2048)
/// * `hop_size` - STFT hop size (typically 512)
///
/// # Errors
///
/// Returns `AnalysisError` for invalid framing parameters or sample rate
pub fn detect_harmonic_breakpoints(
    samples: &[f32],
    sample_rate: u32,
    segment_start: f32,
    segment_end: f32,
    structure: &[SongStructureSegment],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Breakpoint>, AnalysisError> {
    let mut breakpoints = structure_boundaries(structure, segment_start, segment_end);

    let segment = window(samples, sample_rate, segment_start, segment_end);
    let chroma = extract_chroma(segment, sample_rate, frame_size, hop_size)?;

    if chroma.len() >= 3 {
        let normalized: Vec<Vec<f32>> = chroma.iter().map(|c| l2_normalize(c)).collect();
        for frame in 1..normalized.len() {
            // Silent frames have no pitch content to compare
            let Some(similarity) = cosine_similarity(&normalized[frame - 1], &normalized[frame])
            else {
                continue;
            };
            if similarity < CHORD_CHANGE_SIMILARITY {
                let confidence = (0.7 - (similarity - 0.5) * 0.4).max(0.5);
                breakpoints.push(
                    Breakpoint::new(
                        segment_start + frame_to_time(frame, sample_rate, hop_size),
                        confidence,
                        BreakpointSource::Harmonic,
                        "chord_change",
                    )
                    .with_meta("similarity", similarity as f64),
                );
            }
        }
    }

    breakpoints.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Harmonic: {} chroma frames in [{:.2}, {:.2}] -> {} breakpoints",
        chroma.len(),
        segment_start,
        segment_end,
        breakpoints.len()
    );

    Ok(breakpoints)
}

/// Structure segment edges strictly inside `(segment_start, segment_end)`, deduplicated
fn structure_boundaries(
    structure: &[SongStructureSegment],
    segment_start: f32,
    segment_end: f32,
) -> Vec<Breakpoint> {
    let mut times: Vec<f32> = structure
        .iter()
        .flat_map(|s| [s.start, s.end])
        .filter(|&t| t > segment_start && t < segment_end)
        .collect();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    times.dedup_by(|a, b| (*a - *b).abs() < 1e-3);

    times
        .into_iter()
        .map(|t| {
            Breakpoint::new(
                t,
                STRUCTURE_CONFIDENCE,
                BreakpointSource::Harmonic,
                "structure_boundary",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{EnergyLevel, SegmentType};
    use std::f32::consts::PI;

    fn chord_sequence(sample_rate: u32, chords: &[(&[f32], f32)]) -> Vec<f32> {
        let mut samples = Vec::new();
        for (freqs, seconds) in chords {
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

    #[test]
    fn test_structure_boundaries_inside_window_only() {
        let structure = vec![
            SongStructureSegment::new(SegmentType::Intro, 0.0, 10.0, EnergyLevel::Low),
            SongStructureSegment::new(SegmentType::Verse, 10.0, 30.0, EnergyLevel::Medium),
            SongStructureSegment::new(SegmentType::Chorus, 30.0, 50.0, EnergyLevel::High),
        ];
        let bps = structure_boundaries(&structure, 5.0, 30.0);
        assert_eq!(bps.len(), 1);
        assert!((bps[0].timestamp - 10.0).abs() < 1e-6);
        assert_eq!(bps[0].kind, "structure_boundary");
        assert!((bps[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_chord_change_detected() {
        let sr = 22050;
        let c_major: &[f32] = &[261.63, 329.63, 392.0];
        let f_sharp: &[f32] = &[369.99, 466.16, 277.18];
        let samples = chord_sequence(sr, &[(c_major, 2.0), (f_sharp, 2.0)]);

        let bps = detect_harmonic_breakpoints(&samples, sr, 0.0, 4.0, &[], 2048, 512).unwrap();
        let changes: Vec<_> = bps.iter().filter(|b| b.kind == "chord_change").collect();
        assert!(!changes.is_empty());
        assert!(changes.iter().any(|b| (b.timestamp - 2.0).abs() < 0.2));
        assert!(changes.iter().all(|b| b.confidence >= 0.5));
    }

    #[test]
    fn test_silence_has_no_chord_changes() {
        let bps =
            detect_harmonic_breakpoints(&vec![0.0; 22050 * 3], 22050, 0.0, 3.0, &[], 2048, 512)
                .unwrap();
        assert!(bps.is_empty());
    }
}
