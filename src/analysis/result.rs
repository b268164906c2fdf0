//! Analysis result types

use super::metadata::AnalysisMetadata;
use crate::boundaries::ClipBoundary;
use crate::structure::{EnergyLevel, SongStructureSegment};
use serde::{Deserialize, Serialize};

/// Free-form, JSON-serializable metadata attached to breakpoints and clip boundaries
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One transcribed word (or short phrase) with its onset time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyric {
    /// Transcribed text
    pub text: String,

    /// Onset time in seconds (track-absolute)
    pub timestamp: f32,

    /// Transcription confidence (0.0-1.0), when the transcriber reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Lyric {
    /// Create a lyric without a confidence score
    pub fn new(text: impl Into<String>, timestamp: f32) -> Self {
        Self {
            text: text.into(),
            timestamp,
            confidence: None,
        }
    }
}

/// Mood classification consumed as creative context downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    /// Primary mood label (e.g. "energetic", "melancholic")
    pub primary: String,

    /// Optional secondary label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,

    /// Overall energy of the track
    pub energy_level: EnergyLevel,

    /// Classifier confidence (0.0-1.0)
    pub confidence: f32,
}

/// Complete analysis of one track
///
/// Created once per job by [`crate::parse_audio`]; read-only downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Tempo estimate from the beat detector
    pub bpm: f32,

    /// Track duration in seconds
    pub duration: f32,

    /// Beat times in seconds
    pub beat_timestamps: Vec<f32>,

    /// Macro structure (after preprocessing)
    pub song_structure: Vec<SongStructureSegment>,

    /// Transcribed lyrics (empty for instrumentals)
    pub lyrics: Vec<Lyric>,

    /// Mood classification
    pub mood: Mood,

    /// Gap-free partition of the track into renderable clips
    pub clip_boundaries: Vec<ClipBoundary>,

    /// Diagnostics
    pub metadata: AnalysisMetadata,
}

impl AudioAnalysis {
    /// Serialize to a JSON value for persistence as pipeline-stage metadata
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::ProcessingError` if a non-finite float prevents serialization.
    pub fn to_json(&self) -> Result<serde_json::Value, crate::error::AnalysisError> {
        serde_json::to_value(self)
            .map_err(|e| crate::error::AnalysisError::ProcessingError(e.to_string()))
    }

    /// Number of clips
    pub fn clip_count(&self) -> usize {
        self.clip_boundaries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::SegmentType;

    #[test]
    fn test_lyric_serialization_skips_missing_confidence() {
        let json = serde_json::to_value(Lyric::new("hello", 1.5)).unwrap();
        assert_eq!(json["text"], "hello");
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn test_analysis_to_json() {
        let analysis = AudioAnalysis {
            bpm: 120.0,
            duration: 10.0,
            beat_timestamps: vec![0.5, 1.0],
            song_structure: vec![SongStructureSegment::new(
                SegmentType::Verse,
                0.0,
                10.0,
                EnergyLevel::Medium,
            )],
            lyrics: vec![],
            mood: Mood {
                primary: "calm".to_string(),
                secondary: None,
                energy_level: EnergyLevel::Low,
                confidence: 0.5,
            },
            clip_boundaries: vec![ClipBoundary::new(0.0, 5.0), ClipBoundary::new(5.0, 10.0)],
            metadata: AnalysisMetadata::default(),
        };

        let json = analysis.to_json().unwrap();
        assert_eq!(json["clip_boundaries"].as_array().unwrap().len(), 2);
        assert_eq!(json["song_structure"][0]["type"], "verse");
        assert_eq!(json["metadata"]["structure_method"], "uniform");
        assert_eq!(analysis.clip_count(), 2);
    }
}
