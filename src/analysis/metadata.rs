//! Analysis metadata structures

use crate::breakpoints::BreakpointSource;
use crate::collaborators::{AppropriatenessVerdict, Recommendation};
use crate::structure::{SongStructureSegment, StructureMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Appropriateness verdict recorded for one long structure segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppropriatenessRecord {
    /// Index of the preprocessed structure segment
    pub segment_index: usize,

    /// Segment start in seconds
    pub start: f32,

    /// Segment end in seconds
    pub end: f32,

    /// Whether the segment was judged appropriate as-is
    pub is_appropriate: bool,

    /// Analyzer confidence (0.0-1.0)
    pub confidence: f32,

    /// Analyzer recommendation
    pub recommendation: Recommendation,

    /// Clip count forced onto the segment, if subdivision was forced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clips_override: Option<usize>,
}

impl AppropriatenessRecord {
    /// Build a record from an analyzer verdict
    pub fn from_verdict(
        segment_index: usize,
        segment: &SongStructureSegment,
        verdict: &AppropriatenessVerdict,
        max_clips_override: Option<usize>,
    ) -> Self {
        Self {
            segment_index,
            start: segment.start,
            end: segment.end,
            is_appropriate: verdict.is_appropriate,
            confidence: verdict.confidence,
            recommendation: verdict.recommendation,
            max_clips_override,
        }
    }
}

/// Diagnostic counters carried with every analysis for operators to audit quality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Algorithm version
    pub algorithm_version: String,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// How the structure segments were produced
    pub structure_method: StructureMethod,

    /// Number of chroma frames that entered clustering (after pooling)
    pub structure_frames: usize,

    /// Fallback paths taken, by stage (e.g. "structure:uniform", "lyrics:unavailable")
    pub fallbacks_used: Vec<String>,

    /// Structure segments before preprocessing
    pub raw_segment_count: usize,

    /// Candidate breakpoints emitted per source, before aggregation
    pub raw_breakpoint_counts: BTreeMap<BreakpointSource, usize>,

    /// Breakpoints per (dominant) source after aggregation
    pub aggregated_breakpoint_counts: BTreeMap<BreakpointSource, usize>,

    /// Detector failures that were contained (detector name and message)
    pub detector_failures: Vec<String>,

    /// Number of coverage fixes applied by the repair pass
    pub coverage_fixes_applied: usize,

    /// Human-readable description of each coverage fix
    pub coverage_fixes: Vec<String>,

    /// Residual boundary violations after repair (logged, not fatal)
    pub boundary_violations: Vec<String>,

    /// Appropriateness verdicts for long segments
    pub appropriateness: Vec<AppropriatenessRecord>,

    /// True when the lyric extractor returned at least one word
    pub lyrics_available: bool,

    /// Beat subdivision reported by the beat detector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_subdivision: Option<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            sample_rate: 0,
            processing_time_ms: 0.0,
            structure_method: StructureMethod::Uniform,
            structure_frames: 0,
            fallbacks_used: vec![],
            raw_segment_count: 0,
            raw_breakpoint_counts: BTreeMap::new(),
            aggregated_breakpoint_counts: BTreeMap::new(),
            detector_failures: vec![],
            coverage_fixes_applied: 0,
            coverage_fixes: vec![],
            boundary_violations: vec![],
            appropriateness: vec![],
            lyrics_available: false,
            beat_subdivision: None,
        }
    }
}

impl AnalysisMetadata {
    /// Record a fallback path, once
    pub fn note_fallback(&mut self, fallback: impl Into<String>) {
        let fallback = fallback.into();
        if !self.fallbacks_used.contains(&fallback) {
            self.fallbacks_used.push(fallback);
        }
    }
}
