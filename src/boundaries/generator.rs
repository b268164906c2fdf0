//! Per-segment clip boundary generation
//!
//! Greedy cut planning over one macro-segment, in segment-relative time:
//! 1. If the remaining length fits in one clip (≤ max), or any cut would leave a side under
//!    min, finish
//! 2. Otherwise split the remainder into `n = round(R / target)` clips (clamped so every
//!    clip can stay within the band) and aim the next cut at `cursor + R / n`
//! 3. Pick the best breakpoint inside `[cursor + min, min(cursor + max, end - min)]`,
//!    scoring `confidence * (1 - 0.5 * |t - ideal| / half_window)`
//! 4. Without a breakpoint, snap to the beat nearest the ideal cut; without beats, cut at
//!    the ideal point
//!
//! Forced subdivision narrows the band around `duration / n_override`.

use super::ClipBoundary;
use crate::breakpoints::Breakpoint;
use crate::config::SegmentationConfig;
use crate::structure::SongStructureSegment;

/// Slack for float comparisons against band edges
const TOLERANCE: f32 = 1e-4;

/// What determined the end of a clip
#[derive(Debug, Clone, Copy, PartialEq)]
enum CutSource {
    Breakpoint,
    Beat,
    Even,
    SegmentEnd,
}

impl CutSource {
    fn as_str(&self) -> &'static str {
        match self {
            CutSource::Breakpoint => "breakpoint",
            CutSource::Beat => "beat",
            CutSource::Even => "even",
            CutSource::SegmentEnd => "segment_end",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cut {
    time: f32,
    source: CutSource,
    confidence: f32,
}

/// Clip duration band
#[derive(Debug, Clone, Copy)]
struct Band {
    min: f32,
    target: f32,
    max: f32,
}

impl Band {
    fn from_config(config: &SegmentationConfig) -> Self {
        Self {
            min: config.min_clip_duration,
            target: config.target_clip_duration,
            max: config.max_clip_duration,
        }
    }

    /// Band centred on `duration / n_clips`, never below the hard floor
    fn forced(duration: f32, n_clips: usize, config: &SegmentationConfig) -> Self {
        let ideal = duration / n_clips.max(1) as f32;
        let min = (0.75 * ideal).max(config.hard_min_clip_duration);
        let max = (1.25 * ideal).min(config.max_clip_duration).max(ideal);
        Self {
            min: min.min(ideal),
            target: ideal,
            max,
        }
    }
}

/// Clip count forced onto a segment judged inappropriate as a whole
///
/// `max(ceil(duration / forced_clip_duration), forced_min_clips)`, capped so that no clip
/// falls below the hard floor.
pub fn forced_clip_count(segment_duration: f32, config: &SegmentationConfig) -> usize {
    let wanted = ((segment_duration / config.forced_clip_duration).ceil() as usize)
        .max(config.forced_min_clips);
    let cap = ((segment_duration / config.hard_min_clip_duration).floor() as usize).max(1);
    wanted.min(cap)
}

/// Generate clip boundaries anchored to a segment's breakpoints
///
/// # Arguments
///
/// * `segment_duration` - Segment length in seconds
/// * `breakpoints` - Aggregated breakpoints, segment-relative
/// * `beats` - Beat times, segment-relative (used where no breakpoint fits)
/// * `segment` - The macro-segment (for type/intensity tags)
/// * `max_clips_override` - Forced clip count, if subdivision was forced
/// * `config` - Segmentation configuration
///
/// # Returns
///
/// Segment-relative, contiguous boundaries covering `[0, segment_duration]`
pub fn generate_boundaries_from_breakpoints(
    segment_duration: f32,
    breakpoints: &[Breakpoint],
    beats: &[f32],
    segment: &SongStructureSegment,
    max_clips_override: Option<usize>,
    config: &SegmentationConfig,
) -> Vec<ClipBoundary> {
    generate(
        segment_duration,
        breakpoints,
        beats,
        segment,
        max_clips_override,
        config,
    )
}

/// Generate clip boundaries from the beat grid alone
///
/// Same contract as [`generate_boundaries_from_breakpoints`] for segments without any
/// breakpoint.
pub fn generate_boundaries_from_beats(
    segment_duration: f32,
    beats: &[f32],
    segment: &SongStructureSegment,
    max_clips_override: Option<usize>,
    config: &SegmentationConfig,
) -> Vec<ClipBoundary> {
    generate(segment_duration, &[], beats, segment, max_clips_override, config)
}

fn generate(
    segment_duration: f32,
    breakpoints: &[Breakpoint],
    beats: &[f32],
    segment: &SongStructureSegment,
    max_clips_override: Option<usize>,
    config: &SegmentationConfig,
) -> Vec<ClipBoundary> {
    if segment_duration <= 0.0 {
        return Vec::new();
    }

    let band = match max_clips_override {
        Some(n) => Band::forced(segment_duration, n, config),
        None => Band::from_config(config),
    };

    let cuts = plan_cuts(segment_duration, breakpoints, beats, band);

    let mut boundaries = Vec::with_capacity(cuts.len());
    let mut start = 0.0f32;
    for cut in &cuts {
        let mut boundary = ClipBoundary::new(start, cut.time)
            .with_meta("segment_type", segment.segment_type.as_str())
            .with_meta("cut_source", cut.source.as_str())
            .with_meta("cut_confidence", cut.confidence as f64)
            .with_meta("forced_subdivision", max_clips_override.is_some());
        if let Some(intensity) = segment.beat_intensity {
            boundary = boundary.with_meta("beat_intensity", intensity.as_str());
        }
        boundaries.push(boundary);
        start = cut.time;
    }

    log::debug!(
        "Generated {} clips for {:.2}s {} segment ({} breakpoints, {} beats, band {:.2}-{:.2}s)",
        boundaries.len(),
        segment_duration,
        segment.segment_type.as_str(),
        breakpoints.len(),
        beats.len(),
        band.min,
        band.max
    );

    boundaries
}

/// Plan clip end times; the last cut is always the segment end
fn plan_cuts(duration: f32, breakpoints: &[Breakpoint], beats: &[f32], band: Band) -> Vec<Cut> {
    let mut cuts = Vec::new();
    let mut cursor = 0.0f32;

    while duration - cursor > band.max + TOLERANCE {
        let remaining = duration - cursor;
        if remaining < 2.0 * band.min - TOLERANCE {
            // No cut leaves both sides at the floor: one slightly long final clip
            break;
        }
        let fewest = (remaining / band.max).ceil() as usize;
        let most = ((remaining / band.min).floor() as usize).max(fewest);
        let n = ((remaining / band.target).round() as usize)
            .clamp(fewest, most)
            .max(2);
        let ideal = cursor + remaining / n as f32;

        let lo = cursor + band.min;
        let hi = (cursor + band.max).min(duration - band.min).max(lo);

        let cut = best_breakpoint(breakpoints, lo, hi, ideal)
            .or_else(|| nearest_beat(beats, lo, hi, ideal))
            .unwrap_or(Cut {
                time: ideal.clamp(lo, hi),
                source: CutSource::Even,
                confidence: 0.0,
            });

        cuts.push(cut);
        cursor = cut.time;
    }

    cuts.push(Cut {
        time: duration,
        source: CutSource::SegmentEnd,
        confidence: 1.0,
    });
    cuts
}

fn best_breakpoint(breakpoints: &[Breakpoint], lo: f32, hi: f32, ideal: f32) -> Option<Cut> {
    let half_window = ((hi - lo) / 2.0).max(TOLERANCE);
    breakpoints
        .iter()
        .filter(|b| b.timestamp >= lo && b.timestamp <= hi)
        .map(|b| {
            let score = b.confidence * (1.0 - 0.5 * (b.timestamp - ideal).abs() / half_window);
            (b, score)
        })
        .fold(None, |best: Option<(&Breakpoint, f32)>, (b, score)| match best {
            Some((_, s)) if s >= score => best,
            _ => Some((b, score)),
        })
        .map(|(b, _)| Cut {
            time: b.timestamp,
            source: CutSource::Breakpoint,
            confidence: b.confidence,
        })
}

fn nearest_beat(beats: &[f32], lo: f32, hi: f32, ideal: f32) -> Option<Cut> {
    beats
        .iter()
        .copied()
        .filter(|&t| t >= lo && t <= hi)
        .fold(None, |best: Option<f32>, t| match best {
            Some(b) if (b - ideal).abs() <= (t - ideal).abs() => best,
            _ => Some(t),
        })
        .map(|t| Cut {
            time: t,
            source: CutSource::Beat,
            confidence: 0.5,
        })
}
