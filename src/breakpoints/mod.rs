//! Breakpoint detection modules
//!
//! Candidate clip cut points from four independent sources, plus aggregation:
//! - Lyric phrase ends
//! - Energy peaks, valleys and transitions
//! - Silences and pauses
//! - Harmonic changes (structure boundaries and chord changes)
//! - Aggregation/deduplication across sources
//!
//! Every detector takes the full track plus a `[segment_start, segment_end]` window and
//! returns breakpoints with track-absolute timestamps.

pub mod aggregator;
pub mod energy;
pub mod harmonic;
pub mod lyrics;
pub mod silence;

pub use aggregator::aggregate_breakpoints;
pub use energy::detect_energy_breakpoints;
pub use harmonic::detect_harmonic_breakpoints;
pub use lyrics::detect_lyric_breakpoints;
pub use silence::detect_silence_breakpoints;

use crate::analysis::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a breakpoint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointSource {
    /// Gap between transcribed words
    Lyrics,
    /// RMS energy extremum or transition
    Energy,
    /// Silence run
    Silence,
    /// Structure boundary or chord change
    Harmonic,
    /// Beat grid
    Beat,
}

impl BreakpointSource {
    /// Weight of this source when merging near-coincident breakpoints
    pub fn priority(&self) -> f32 {
        match self {
            BreakpointSource::Lyrics => 0.8,
            BreakpointSource::Silence => 0.7,
            BreakpointSource::Harmonic => 0.7,
            BreakpointSource::Energy => 0.6,
            BreakpointSource::Beat => 0.5,
        }
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakpointSource::Lyrics => "lyrics",
            BreakpointSource::Energy => "energy",
            BreakpointSource::Silence => "silence",
            BreakpointSource::Harmonic => "harmonic",
            BreakpointSource::Beat => "beat",
        }
    }

    /// Parse a serialized source name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lyrics" => Some(BreakpointSource::Lyrics),
            "energy" => Some(BreakpointSource::Energy),
            "silence" => Some(BreakpointSource::Silence),
            "harmonic" => Some(BreakpointSource::Harmonic),
            "beat" => Some(BreakpointSource::Beat),
            _ => None,
        }
    }
}

/// A candidate cut point
///
/// Value object: stages never mutate a breakpoint, they build a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Time in seconds (track-absolute from detectors, segment-relative inside the generator)
    pub timestamp: f32,

    /// Confidence (0.0-1.0)
    pub confidence: f32,

    /// Provenance
    pub source: BreakpointSource,

    /// Free-form sub-classification ("phrase_end", "energy_valley", "silence_gap", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Source-specific details
    #[serde(default)]
    pub metadata: Metadata,
}

impl Breakpoint {
    /// Create a breakpoint with empty metadata
    pub fn new(
        timestamp: f32,
        confidence: f32,
        source: BreakpointSource,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            confidence: confidence.clamp(0.0, 1.0),
            source,
            kind: kind.into(),
            metadata: Metadata::new(),
        }
    }

    /// Copy with one more metadata entry
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Copy moved by `-offset` seconds (absolute to segment-relative when `offset` is the
    /// segment start)
    pub fn relative_to(&self, offset: f32) -> Self {
        Self {
            timestamp: self.timestamp - offset,
            ..self.clone()
        }
    }
}

/// Count breakpoints per source
pub fn count_by_source(breakpoints: &[Breakpoint]) -> BTreeMap<BreakpointSource, usize> {
    let mut counts = BTreeMap::new();
    for bp in breakpoints {
        *counts.entry(bp.source).or_insert(0) += 1;
    }
    counts
}
