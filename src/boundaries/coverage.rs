//! Coverage repair
//!
//! Turns the concatenated per-segment boundaries into a gap-free, overlap-free partition of
//! `[0, total_duration]`:
//! 1. Start fix: pull the first boundary back to 0
//! 2. Gap fix: extend the previous boundary for sub-floor gaps, create a filler for long ones
//! 3. Overlap fix: clip the later boundary, dropping it if it falls below the clip minimum
//! 4. End fix: extend or append to reach the track end, clip any overshoot
//! 5. Floor fix: fold boundaries still under the hard floor into a neighbour
//!
//! Seams within `tolerance` are snapped exactly. Every fix is recorded as a readable string;
//! residual violations are reported, never raised.

use super::ClipBoundary;
use crate::config::SegmentationConfig;

/// Result of a repair pass
#[derive(Debug, Clone)]
pub struct CoverageReport {
    /// Repaired boundaries, sorted and contiguous
    pub boundaries: Vec<ClipBoundary>,

    /// Human-readable description of every fix applied
    pub fixes_applied: Vec<String>,

    /// Residual violations found by [`validate_boundaries`]
    pub violations: Vec<String>,
}

/// Repair gaps and overlaps so the boundaries cover the whole track
///
/// # Arguments
///
/// * `boundaries` - Track-absolute boundaries from all segments (any order)
/// * `total_duration` - Track duration in seconds
/// * `config` - Segmentation configuration (tolerance, clip band, hard floor)
///
/// # Returns
///
/// `CoverageReport` with the repaired list, the applied fixes and residual violations
pub fn repair_coverage(
    boundaries: &[ClipBoundary],
    total_duration: f32,
    config: &SegmentationConfig,
) -> CoverageReport {
    let tolerance = config.coverage_tolerance;
    let hard_min = config.hard_min_clip_duration;
    let min_clip = config.min_clip_duration;
    let soft_max = config.soft_max_clip_duration;

    let mut fixes = Vec::new();

    if total_duration <= 0.0 {
        return CoverageReport {
            boundaries: Vec::new(),
            fixes_applied: fixes,
            violations: Vec::new(),
        };
    }

    let mut sorted: Vec<ClipBoundary> = boundaries
        .iter()
        .filter(|b| b.end > b.start)
        .cloned()
        .collect();
    sorted.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if sorted.is_empty() {
        fixes.push(format!(
            "created full-track boundary [0.00, {:.2}]",
            total_duration
        ));
        let out = vec![ClipBoundary::new(0.0, total_duration).with_meta("coverage_fill", true)];
        let violations = validate_boundaries(&out, total_duration, config);
        return CoverageReport {
            boundaries: out,
            fixes_applied: fixes,
            violations,
        };
    }

    // 1. Start
    let first = &sorted[0];
    let first = if first.start > tolerance {
        fixes.push(format!(
            "extended first boundary start {:.2} -> 0.00",
            first.start
        ));
        first.with_start(0.0)
    } else if first.start != 0.0 {
        first.with_start(0.0)
    } else {
        first.clone()
    };

    let mut out: Vec<ClipBoundary> = vec![first];

    // 2 + 3. Seams
    for next in &sorted[1..] {
        let Some(prev) = out.last().cloned() else {
            break;
        };
        let index = out.len() - 1;
        let gap = next.start - prev.end;

        if gap > tolerance {
            let extended = prev.duration + gap;
            if gap < hard_min || (gap < min_clip && extended <= soft_max) {
                fixes.push(format!(
                    "extended boundary {} end {:.2} -> {:.2} to close {:.2}s gap",
                    index, prev.end, next.start, gap
                ));
                out[index] = prev.with_end(next.start);
            } else {
                fixes.push(format!(
                    "created boundary [{:.2}, {:.2}] to fill {:.2}s gap",
                    prev.end, next.start, gap
                ));
                out.push(ClipBoundary::new(prev.end, next.start).with_meta("coverage_fill", true));
            }
            out.push(next.clone());
        } else if gap < -tolerance {
            let clipped = next.with_start(prev.end);
            if clipped.duration >= min_clip {
                fixes.push(format!(
                    "clipped overlapping boundary start {:.2} -> {:.2}",
                    next.start, prev.end
                ));
                out.push(clipped);
            } else {
                fixes.push(format!(
                    "dropped overlapping boundary [{:.2}, {:.2}]",
                    next.start, next.end
                ));
            }
        } else if gap != 0.0 {
            out.push(next.with_start(prev.end));
        } else {
            out.push(next.clone());
        }
    }

    // 4. End
    while out.len() > 1 && out[out.len() - 1].start >= total_duration - tolerance {
        if let Some(dropped) = out.pop() {
            fixes.push(format!(
                "dropped boundary [{:.2}, {:.2}] past track end",
                dropped.start, dropped.end
            ));
        }
    }

    let last_index = out.len() - 1;
    let last = out[last_index].clone();
    let shortfall = total_duration - last.end;
    if shortfall > tolerance {
        if shortfall < min_clip {
            fixes.push(format!(
                "extended last boundary end {:.2} -> {:.2}",
                last.end, total_duration
            ));
            out[last_index] = last.with_end(total_duration);
        } else {
            fixes.push(format!(
                "appended boundary [{:.2}, {:.2}] to reach track end",
                last.end, total_duration
            ));
            out.push(ClipBoundary::new(last.end, total_duration).with_meta("coverage_fill", true));
        }
    } else if shortfall < -tolerance {
        fixes.push(format!(
            "clipped last boundary end {:.2} -> {:.2}",
            last.end, total_duration
        ));
        out[last_index] = last.with_end(total_duration);
    } else if shortfall != 0.0 {
        out[last_index] = last.with_end(total_duration);
    }

    // 5. Floor
    let mut i = 0;
    while i < out.len() && out.len() > 1 {
        if out[i].duration >= hard_min {
            i += 1;
            continue;
        }
        let short = out.remove(i);
        if i > 0 {
            fixes.push(format!(
                "merged {:.2}s boundary [{:.2}, {:.2}] into previous",
                short.duration, short.start, short.end
            ));
            out[i - 1] = out[i - 1].with_end(short.end);
        } else {
            fixes.push(format!(
                "merged {:.2}s boundary [{:.2}, {:.2}] into next",
                short.duration, short.start, short.end
            ));
            out[0] = out[0].with_start(short.start);
        }
    }

    for fix in &fixes {
        log::debug!("Coverage fix: {}", fix);
    }

    let violations = validate_boundaries(&out, total_duration, config);

    CoverageReport {
        boundaries: out,
        fixes_applied: fixes,
        violations,
    }
}

/// Check a boundary list against the duration band and full-coverage invariants
///
/// # Returns
///
/// One message per violation; empty when the list is a valid partition with every clip in
/// `[min_clip_duration, soft_max_clip_duration]`
pub fn validate_boundaries(
    boundaries: &[ClipBoundary],
    total_duration: f32,
    config: &SegmentationConfig,
) -> Vec<String> {
    let tolerance = config.coverage_tolerance;
    let mut violations = Vec::new();

    let Some(first) = boundaries.first() else {
        if total_duration > 0.0 {
            violations.push("no boundaries".to_string());
        }
        return violations;
    };

    if first.start.abs() > tolerance {
        violations.push(format!("first boundary starts at {:.2}", first.start));
    }

    for (i, b) in boundaries.iter().enumerate() {
        if b.duration < config.min_clip_duration - 1e-3
            || b.duration > config.soft_max_clip_duration + 1e-3
        {
            violations.push(format!(
                "boundary {} duration {:.2}s outside [{:.1}, {:.1}]",
                i, b.duration, config.min_clip_duration, config.soft_max_clip_duration
            ));
        }
    }

    for (i, w) in boundaries.windows(2).enumerate() {
        let gap = w[1].start - w[0].end;
        if gap > tolerance {
            violations.push(format!("gap of {:.2}s after boundary {}", gap, i));
        } else if gap < -tolerance {
            violations.push(format!("overlap of {:.2}s after boundary {}", -gap, i));
        }
    }

    if let Some(last) = boundaries.last() {
        if (last.end - total_duration).abs() > tolerance {
            violations.push(format!(
                "last boundary ends at {:.2}, track ends at {:.2}",
                last.end, total_duration
            ));
        }
    }

    violations
}
