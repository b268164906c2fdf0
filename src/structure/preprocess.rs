//! Short-segment merging
//!
//! Single left-to-right pass so that no macro-segment is too short to be cut into clips:
//! - A segment shorter than `merge_threshold` merges forward into its successor, or
//!   backward into the previous output segment when it is last
//! - A non-final segment shorter than `min_segment_duration` also merges forward
//! - A lone segment is kept as-is
//!
//! A forward merge spans `[current.start, next.end]` with the current segment's type, and
//! consumes both positions.

use super::SongStructureSegment;

/// Merge structure segments that are too short to subdivide
///
/// # Arguments
///
/// * `segments` - Ordered, contiguous macro-segments
/// * `merge_threshold` - Segments below this always merge (default: 4.0)
/// * `min_segment_duration` - Non-final segments below this merge forward (default: 7.0)
///
/// # Returns
///
/// New segment list covering the same span
pub fn preprocess_segments(
    segments: &[SongStructureSegment],
    merge_threshold: f32,
    min_segment_duration: f32,
) -> Vec<SongStructureSegment> {
    if segments.len() <= 1 {
        return segments.to_vec();
    }

    let mut output: Vec<SongStructureSegment> = Vec::with_capacity(segments.len());
    let mut i = 0;

    while i < segments.len() {
        let current = &segments[i];
        let is_last = i + 1 == segments.len();
        let duration = current.duration();

        if !is_last && (duration < merge_threshold || duration < min_segment_duration) {
            let next = &segments[i + 1];
            log::debug!(
                "Merging short {} segment [{:.2}, {:.2}] forward into [{:.2}, {:.2}]",
                current.segment_type.as_str(),
                current.start,
                current.end,
                next.start,
                next.end
            );
            output.push(current.merged_with(next));
            i += 2;
            continue;
        }

        if is_last && duration < merge_threshold {
            if let Some(previous) = output.last_mut() {
                log::debug!(
                    "Merging short final segment [{:.2}, {:.2}] backward",
                    current.start,
                    current.end
                );
                *previous = previous.with_end(current.end);
                i += 1;
                continue;
            }
        }

        output.push(current.clone());
        i += 1;
    }

    log::debug!(
        "Preprocessed {} structure segments into {}",
        segments.len(),
        output.len()
    );

    output
}
