//! Song structure analysis
//!
//! Splits a track into contiguous macro-segments (intro, verse, chorus, ...):
//! - Chroma self-similarity with a temporal-contiguity penalty
//! - Complete-linkage agglomerative clustering
//! - Fallback tiers: contiguous-region extraction, then uniform segmentation
//! - Energy-based segment typing
//! - Short-segment merging before boundary generation

pub mod classification;
pub mod clustering;
pub mod preprocess;
pub mod segmenter;
pub mod similarity;

pub use classification::{beat_intensity, classify_segment_type, TrackEnergy};
pub use preprocess::preprocess_segments;
pub use segmenter::segment_structure;

use serde::{Deserialize, Serialize};

/// Musical role of a macro-segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    /// Opening section
    Intro,
    /// Verse
    Verse,
    /// Chorus
    Chorus,
    /// Bridge
    Bridge,
    /// Closing section
    Outro,
}

impl SegmentType {
    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Intro => "intro",
            SegmentType::Verse => "verse",
            SegmentType::Chorus => "chorus",
            SegmentType::Bridge => "bridge",
            SegmentType::Outro => "outro",
        }
    }
}

/// Three-level energy scale shared by segments, beat intensity and mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    /// Score below 0.4
    Low,
    /// Score in [0.4, 0.7]
    Medium,
    /// Score above 0.7
    High,
}

impl EnergyLevel {
    /// Map a normalized energy score (0.0-1.0) to a level
    pub fn from_score(score: f32) -> Self {
        if score < 0.4 {
            EnergyLevel::Low
        } else if score > 0.7 {
            EnergyLevel::High
        } else {
            EnergyLevel::Medium
        }
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        }
    }
}

/// One contiguous macro-segment of the track
///
/// Value object: the preprocessor replaces segments rather than editing them in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongStructureSegment {
    /// Musical role
    #[serde(rename = "type")]
    pub segment_type: SegmentType,

    /// Start time in seconds
    pub start: f32,

    /// End time in seconds (> start)
    pub end: f32,

    /// Energy level
    pub energy: EnergyLevel,

    /// Beat-density-and-energy intensity, when beats were available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_intensity: Option<EnergyLevel>,

    /// Majority cluster label (absent for uniform segments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<usize>,

    /// Combined RMS/centroid energy score (0.0-1.0)
    #[serde(default)]
    pub energy_score: f32,
}

impl SongStructureSegment {
    /// Create a segment without beat intensity, label or score
    pub fn new(segment_type: SegmentType, start: f32, end: f32, energy: EnergyLevel) -> Self {
        Self {
            segment_type,
            start,
            end,
            energy,
            beat_intensity: None,
            label: None,
            energy_score: 0.0,
        }
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// Copy with a new end time
    pub fn with_end(&self, end: f32) -> Self {
        Self {
            end,
            ..self.clone()
        }
    }

    /// Copy spanning through `next`, keeping this segment's type and falling back to
    /// `next`'s beat intensity
    pub fn merged_with(&self, next: &SongStructureSegment) -> Self {
        Self {
            end: next.end,
            beat_intensity: self.beat_intensity.or(next.beat_intensity),
            ..self.clone()
        }
    }
}

/// Which tier produced the structure segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureMethod {
    /// Cluster labels filtered by minimum transition distance
    Clustering,
    /// Largest runs of identical labels
    ContiguousRegions,
    /// Equal-length segments
    Uniform,
}

impl StructureMethod {
    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureMethod::Clustering => "clustering",
            StructureMethod::ContiguousRegions => "contiguous_regions",
            StructureMethod::Uniform => "uniform",
        }
    }
}

/// Output of the structure segmenter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureResult {
    /// Contiguous segments in time order
    pub segments: Vec<SongStructureSegment>,

    /// True when any fallback tier produced the segments
    pub fallback_used: bool,

    /// Tier that produced the segments
    pub method: StructureMethod,

    /// Chroma frames that entered clustering (after pooling)
    pub n_frames: usize,

    /// Requested cluster count (0 when clustering never ran)
    pub n_clusters: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_level_thresholds() {
        assert_eq!(EnergyLevel::from_score(0.39), EnergyLevel::Low);
        assert_eq!(EnergyLevel::from_score(0.4), EnergyLevel::Medium);
        assert_eq!(EnergyLevel::from_score(0.7), EnergyLevel::Medium);
        assert_eq!(EnergyLevel::from_score(0.71), EnergyLevel::High);
    }

    #[test]
    fn test_merged_with_keeps_current_type() {
        let mut a = SongStructureSegment::new(SegmentType::Intro, 0.0, 6.0, EnergyLevel::Low);
        let mut b = SongStructureSegment::new(SegmentType::Chorus, 6.0, 40.0, EnergyLevel::High);
        b.beat_intensity = Some(EnergyLevel::High);

        let merged = a.merged_with(&b);
        assert_eq!(merged.segment_type, SegmentType::Intro);
        assert_eq!(merged.start, 0.0);
        assert_eq!(merged.end, 40.0);
        assert_eq!(merged.beat_intensity, Some(EnergyLevel::High));

        a.beat_intensity = Some(EnergyLevel::Low);
        assert_eq!(a.merged_with(&b).beat_intensity, Some(EnergyLevel::Low));
    }

    #[test]
    fn test_segment_serialization() {
        let seg = SongStructureSegment::new(SegmentType::Outro, 100.0, 110.0, EnergyLevel::Low);
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["type"], "outro");
        assert_eq!(json["energy"], "low");
        assert!(json.get("beat_intensity").is_none());
        assert!(json.get("label").is_none());
        assert!((seg.duration() - 10.0).abs() < 1e-6);
    }
}
