//! Clip boundary generation and coverage repair
//!
//! - Per-segment generation from breakpoints or the beat grid
//! - Whole-track gap/overlap repair and validation

pub mod coverage;
pub mod generator;

pub use coverage::{repair_coverage, validate_boundaries, CoverageReport};
pub use generator::{
    forced_clip_count, generate_boundaries_from_beats, generate_boundaries_from_breakpoints,
};

use crate::analysis::Metadata;
use serde::{Deserialize, Serialize};

/// One renderable clip of the track
///
/// Value object: repair steps build modified copies instead of editing in place, so
/// `duration` always equals `end - start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipBoundary {
    /// Start time in seconds
    pub start: f32,

    /// End time in seconds
    pub end: f32,

    /// `end - start`
    pub duration: f32,

    /// Generation details (segment type, cut source, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl ClipBoundary {
    /// Create a boundary with empty metadata
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            metadata: Metadata::new(),
        }
    }

    /// Copy with a new start time
    pub fn with_start(&self, start: f32) -> Self {
        Self {
            start,
            duration: self.end - start,
            ..self.clone()
        }
    }

    /// Copy with a new end time
    pub fn with_end(&self, end: f32) -> Self {
        Self {
            end,
            duration: end - self.start,
            ..self.clone()
        }
    }

    /// Copy with one more metadata entry
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Copy shifted by `offset` seconds (segment-relative to track-absolute)
    pub fn offset(&self, offset: f32) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..self.clone()
        }
    }

    /// True if `time` falls in `[start, end)`
    pub fn contains(&self, time: f32) -> bool {
        time >= self.start && time < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_with_changes_keeps_duration_consistent() {
        let b = ClipBoundary::new(2.0, 8.0).with_meta("segment_type", "verse");
        assert_eq!(b.duration, 6.0);

        let extended = b.with_end(9.5);
        assert_eq!(extended.duration, 7.5);
        assert_eq!(extended.metadata["segment_type"], "verse");
        assert_eq!(b.end, 8.0);

        let moved = b.with_start(0.0);
        assert_eq!(moved.duration, 8.0);

        let shifted = b.offset(10.0);
        assert_eq!((shifted.start, shifted.end, shifted.duration), (12.0, 18.0, 6.0));
        assert!(shifted.contains(12.0));
        assert!(!shifted.contains(18.0));
    }
}
