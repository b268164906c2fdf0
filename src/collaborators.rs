//! External collaborators
//!
//! Beat detection, lyric transcription, mood classification and segment appropriateness
//! are supplied by the caller through these traits. Stock implementations cover callers
//! that already hold the data.

use crate::analysis::{Lyric, Mood};
use crate::error::AnalysisError;
use crate::structure::{EnergyLevel, SongStructureSegment};
use serde::{Deserialize, Serialize};

/// Beat grid from an external beat tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatInfo {
    /// Tempo in beats per minute
    pub bpm: f32,

    /// Beat times in seconds
    pub beat_timestamps: Vec<f32>,

    /// Subdivision classification (e.g. "straight", "swing"), if the tracker provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,

    /// Per-beat strength (0.0-1.0); empty when unknown
    #[serde(default)]
    pub beat_strengths: Vec<f32>,
}

/// Detects tempo and beat positions
pub trait BeatDetector {
    /// Analyse a mono waveform
    ///
    /// # Errors
    ///
    /// Any error is propagated and fails the analysis
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<BeatInfo, AnalysisError>;
}

/// Transcribes lyrics with word timestamps
pub trait LyricsExtractor {
    /// Transcribe a mono waveform; instrumentals yield an empty list
    ///
    /// # Errors
    ///
    /// Errors are contained by the orchestrator (analysis continues without lyrics)
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<Lyric>, AnalysisError>;
}

/// Classifies the overall mood of a track
pub trait MoodClassifier {
    /// Classify from the waveform plus already-computed tempo and structure
    ///
    /// # Errors
    ///
    /// Any error is propagated and fails the analysis
    fn classify(
        &self,
        samples: &[f32],
        sample_rate: u32,
        bpm: f32,
        structure: &[SongStructureSegment],
    ) -> Result<Mood, AnalysisError>;
}

/// What to do with a long structure segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Keep as-is
    None,
    /// Cut into many short clips
    ForceSubdivision,
    /// Segment should have been merged with a neighbour
    MergeWithNeighbor,
}

/// Appropriateness verdict for one long segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppropriatenessVerdict {
    /// Whether the segment is usable as detected
    pub is_appropriate: bool,

    /// Verdict confidence (0.0-1.0)
    pub confidence: f32,

    /// Suggested action
    pub recommendation: Recommendation,
}

/// Judges whether a long structure segment is musically plausible
pub trait SegmentAppropriatenessAnalyzer {
    /// Judge one segment given the track's beat times
    ///
    /// # Errors
    ///
    /// Any error is propagated and fails the analysis
    fn analyze(
        &self,
        segment: &SongStructureSegment,
        beat_timestamps: &[f32],
    ) -> Result<AppropriatenessVerdict, AnalysisError>;
}

/// Beat grid computed ahead of time
#[derive(Debug, Clone, Default)]
pub struct PrecomputedBeats(pub BeatInfo);

impl PrecomputedBeats {
    /// Regular grid at `bpm` from time 0 to `duration`
    pub fn regular(bpm: f32, duration: f32) -> Self {
        let mut beats = Vec::new();
        if bpm > 0.0 {
            let period = 60.0 / bpm;
            let mut t = 0.0f32;
            let mut i = 0u32;
            while t < duration {
                beats.push(t);
                i += 1;
                t = i as f32 * period;
            }
        }
        Self(BeatInfo {
            bpm,
            beat_timestamps: beats,
            subdivision: None,
            beat_strengths: Vec::new(),
        })
    }
}

impl BeatDetector for PrecomputedBeats {
    fn detect(&self, _samples: &[f32], _sample_rate: u32) -> Result<BeatInfo, AnalysisError> {
        Ok(self.0.clone())
    }
}

/// Lyrics transcribed ahead of time
#[derive(Debug, Clone, Default)]
pub struct PrecomputedLyrics(pub Vec<Lyric>);

impl LyricsExtractor for PrecomputedLyrics {
    fn extract(&self, _samples: &[f32], _sample_rate: u32) -> Result<Vec<Lyric>, AnalysisError> {
        Ok(self.0.clone())
    }
}

/// Mood fixed ahead of time
#[derive(Debug, Clone)]
pub struct StaticMood(pub Mood);

impl Default for StaticMood {
    fn default() -> Self {
        Self(Mood {
            primary: "neutral".to_string(),
            secondary: None,
            energy_level: EnergyLevel::Medium,
            confidence: 0.0,
        })
    }
}

impl MoodClassifier for StaticMood {
    fn classify(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        _bpm: f32,
        _structure: &[SongStructureSegment],
    ) -> Result<Mood, AnalysisError> {
        Ok(self.0.clone())
    }
}

/// Flags every segment longer than `max_duration` for forced subdivision
#[derive(Debug, Clone, Copy)]
pub struct DurationHeuristic {
    /// Longest segment accepted as-is, in seconds
    pub max_duration: f32,
}

impl Default for DurationHeuristic {
    fn default() -> Self {
        Self { max_duration: 60.0 }
    }
}

impl SegmentAppropriatenessAnalyzer for DurationHeuristic {
    fn analyze(
        &self,
        segment: &SongStructureSegment,
        _beat_timestamps: &[f32],
    ) -> Result<AppropriatenessVerdict, AnalysisError> {
        let duration = segment.duration();
        if duration > self.max_duration {
            let excess = (duration - self.max_duration) / self.max_duration;
            Ok(AppropriatenessVerdict {
                is_appropriate: false,
                confidence: (0.5 + excess * 0.5).min(1.0),
                recommendation: Recommendation::ForceSubdivision,
            })
        } else {
            Ok(AppropriatenessVerdict {
                is_appropriate: true,
                confidence: 1.0 - 0.5 * duration / self.max_duration.max(f32::EPSILON),
                recommendation: Recommendation::None,
            })
        }
    }
}

/// The collaborators one analysis run needs
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Beat tracker
    pub beats: &'a dyn BeatDetector,
    /// Lyric transcriber
    pub lyrics: &'a dyn LyricsExtractor,
    /// Mood classifier
    pub mood: &'a dyn MoodClassifier,
    /// Long-segment judge
    pub appropriateness: &'a dyn SegmentAppropriatenessAnalyzer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::SegmentType;

    #[test]
    fn test_regular_beat_grid() {
        let beats = PrecomputedBeats::regular(120.0, 4.0);
        let info = beats.detect(&[], 22050).unwrap();
        assert_eq!(info.beat_timestamps.len(), 8);
        assert!((info.beat_timestamps[1] - 0.5).abs() < 1e-6);
        assert!(PrecomputedBeats::regular(0.0, 4.0).0.beat_timestamps.is_empty());
    }

    #[test]
    fn test_duration_heuristic() {
        let heuristic = DurationHeuristic { max_duration: 30.0 };
        let long = SongStructureSegment::new(SegmentType::Verse, 0.0, 45.0, EnergyLevel::Medium);
        let verdict = heuristic.analyze(&long, &[]).unwrap();
        assert!(!verdict.is_appropriate);
        assert_eq!(verdict.recommendation, Recommendation::ForceSubdivision);
        assert!((verdict.confidence - 0.75).abs() < 1e-6);

        let short = SongStructureSegment::new(SegmentType::Verse, 0.0, 25.0, EnergyLevel::Medium);
        let verdict = heuristic.analyze(&short, &[]).unwrap();
        assert!(verdict.is_appropriate);
        assert_eq!(verdict.recommendation, Recommendation::None);
    }

    #[test]
    fn test_recommendation_serialization() {
        let json = serde_json::to_value(Recommendation::ForceSubdivision).unwrap();
        assert_eq!(json, "force_subdivision");
    }
}
