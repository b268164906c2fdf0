//! # Clip Segmenter
//!
//! An audio segmentation and structure-analysis engine that turns a music track into a
//! gap-free sequence of short, musically aligned clips for downstream video generation.
//!
//! ## Features
//!
//! - **Breakpoint Detection**: Lyric phrase ends, energy peaks/valleys/transitions, silences
//!   and harmonic changes, merged across sources
//! - **Structure Analysis**: Chroma self-similarity with temporally constrained
//!   complete-linkage clustering and deterministic fallbacks
//! - **Clip Boundaries**: Breakpoint- or beat-aligned cuts inside a 4-8s band, with forced
//!   subdivision of implausibly long segments
//! - **Coverage Repair**: Guarantees full-track coverage with no gaps, no overlaps and no
//!   clip under 3s
//!
//! ## Quick Start
//!
//! ```no_run
//! use clip_segmenter::collaborators::{
//!     Collaborators, DurationHeuristic, PrecomputedBeats, PrecomputedLyrics, StaticMood,
//! };
//! use clip_segmenter::{parse_audio, SegmentationConfig};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let beats = PrecomputedBeats::regular(120.0, samples.len() as f32 / sample_rate as f32);
//! let lyrics = PrecomputedLyrics::default();
//! let mood = StaticMood::default();
//! let judge = DurationHeuristic::default();
//! let collaborators = Collaborators {
//!     beats: &beats,
//!     lyrics: &lyrics,
//!     mood: &mood,
//!     appropriateness: &judge,
//! };
//!
//! let analysis = parse_audio(&samples, sample_rate, &collaborators, SegmentationConfig::default())?;
//!
//! for clip in &analysis.clip_boundaries {
//!     println!("{:.2}s - {:.2}s", clip.start, clip.end);
//! }
//! # Ok::<(), clip_segmenter::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The analysis pipeline follows this flow:
//!
//! ```text
//! Waveform → Beats → Structure → Preprocess → Lyrics → Breakpoints → Aggregate
//!          → Clip Boundaries → Coverage Repair → Mood → AudioAnalysis
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod boundaries;
pub mod breakpoints;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod structure;

// Re-export main types
pub use analysis::{AnalysisMetadata, AudioAnalysis, Lyric, Mood};
pub use boundaries::ClipBoundary;
pub use breakpoints::{Breakpoint, BreakpointSource};
pub use collaborators::Collaborators;
pub use config::SegmentationConfig;
pub use error::AnalysisError;
pub use structure::{EnergyLevel, SegmentType, SongStructureSegment, StructureMethod};

use analysis::AppropriatenessRecord;
use boundaries::{
    forced_clip_count, generate_boundaries_from_beats, generate_boundaries_from_breakpoints,
    repair_coverage,
};
use breakpoints::{
    aggregate_breakpoints, count_by_source, detect_energy_breakpoints,
    detect_harmonic_breakpoints, detect_lyric_breakpoints, detect_silence_breakpoints,
};
use collaborators::Recommendation;
use std::path::Path;
use structure::{preprocess_segments, segment_structure};

/// Main analysis function
///
/// Runs beat detection, structure segmentation, lyric extraction, per-segment breakpoint
/// detection and clip generation, then repairs coverage and classifies mood.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `collaborators` - Beat detector, lyric extractor, mood classifier and appropriateness
///   analyzer
/// * `config` - Segmentation configuration parameters
///
/// # Returns
///
/// `AudioAnalysis` whose `clip_boundaries` partition `[0, duration]`
///
/// # Errors
///
/// Returns `AnalysisError` if:
/// - Samples are empty or contain NaN/Inf, or the sample rate is 0
/// - The configuration is inconsistent
/// - The beat detector, mood classifier or appropriateness analyzer fails
///
/// Lyric extraction and individual breakpoint detector failures are contained and
/// recorded in the result metadata.
pub fn parse_audio(
    samples: &[f32],
    sample_rate: u32,
    collaborators: &Collaborators<'_>,
    config: SegmentationConfig,
) -> Result<AudioAnalysis, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting audio segmentation: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "Non-finite sample at index {}",
            pos
        )));
    }

    config.validate()?;

    let duration = samples.len() as f32 / sample_rate as f32;
    let mut metadata = AnalysisMetadata {
        sample_rate,
        ..AnalysisMetadata::default()
    };

    // Beats
    let mut beat_info = collaborators.beats.detect(samples, sample_rate)?;
    beat_info.beat_timestamps.retain(|t| t.is_finite() && *t >= 0.0);
    beat_info
        .beat_timestamps
        .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let beats = &beat_info.beat_timestamps;
    metadata.beat_subdivision = beat_info.subdivision.clone();
    log::debug!("{} beats at {:.1} BPM", beats.len(), beat_info.bpm);

    // Structure
    let structure = segment_structure(samples, sample_rate, beats, duration, &config)?;
    metadata.structure_method = structure.method;
    metadata.structure_frames = structure.n_frames;
    metadata.raw_segment_count = structure.segments.len();
    if structure.fallback_used {
        metadata.note_fallback(format!("structure:{}", structure.method.as_str()));
    }

    let segments = preprocess_segments(
        &structure.segments,
        config.segment_merge_threshold,
        config.min_segment_duration,
    );

    // Lyrics
    let lyrics = match collaborators.lyrics.extract(samples, sample_rate) {
        Ok(lyrics) => lyrics,
        Err(e) => {
            log::warn!("Lyric extraction failed, continuing without lyrics: {}", e);
            metadata.note_fallback("lyrics:unavailable");
            Vec::new()
        }
    };
    metadata.lyrics_available = !lyrics.is_empty();

    // Appropriateness of long segments
    let mut overrides: Vec<Option<usize>> = vec![None; segments.len()];
    for (i, segment) in segments.iter().enumerate() {
        if segment.duration() <= config.appropriateness_check_duration {
            continue;
        }
        let verdict = collaborators.appropriateness.analyze(segment, beats)?;
        if verdict.recommendation == Recommendation::ForceSubdivision {
            let n = forced_clip_count(segment.duration(), &config);
            log::debug!(
                "Forcing {} clips on {:.2}s segment {} (confidence {:.2})",
                n,
                segment.duration(),
                i,
                verdict.confidence
            );
            overrides[i] = Some(n);
        }
        metadata
            .appropriateness
            .push(AppropriatenessRecord::from_verdict(i, segment, &verdict, overrides[i]));
    }
    if overrides.iter().any(Option::is_some) {
        metadata.note_fallback("boundaries:forced_subdivision");
    }

    // Per-segment breakpoints and clips
    let mut raw_boundaries = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        let raw = detect_segment_breakpoints(
            samples,
            sample_rate,
            segment,
            i,
            &structure.segments,
            &lyrics,
            &config,
            &mut metadata.detector_failures,
        );
        for (source, count) in count_by_source(&raw) {
            *metadata.raw_breakpoint_counts.entry(source).or_insert(0) += count;
        }

        let aggregated =
            aggregate_breakpoints(&raw, segment.start, segment.end, config.merge_distance);
        for (source, count) in count_by_source(&aggregated) {
            *metadata
                .aggregated_breakpoint_counts
                .entry(source)
                .or_insert(0) += count;
        }

        let relative: Vec<Breakpoint> =
            aggregated.iter().map(|b| b.relative_to(segment.start)).collect();
        let local_beats: Vec<f32> = beats
            .iter()
            .filter(|&&t| t >= segment.start && t <= segment.end)
            .map(|t| t - segment.start)
            .collect();

        let clips = if relative.is_empty() {
            generate_boundaries_from_beats(
                segment.duration(),
                &local_beats,
                segment,
                overrides[i],
                &config,
            )
        } else {
            generate_boundaries_from_breakpoints(
                segment.duration(),
                &relative,
                &local_beats,
                segment,
                overrides[i],
                &config,
            )
        };

        raw_boundaries.extend(clips.iter().map(|clip| {
            let clip = clip.offset(segment.start);
            let inside = aggregated.iter().filter(|b| clip.contains(b.timestamp)).count();
            clip.with_meta("segment_index", i)
                .with_meta("breakpoint_count", inside)
        }));
    }

    // Coverage
    let report = repair_coverage(&raw_boundaries, duration, &config);
    if !report.violations.is_empty() {
        log::warn!(
            "{} boundary violations after coverage repair: {}",
            report.violations.len(),
            report.violations.join("; ")
        );
    }
    metadata.coverage_fixes_applied = report.fixes_applied.len();
    metadata.coverage_fixes = report.fixes_applied;
    metadata.boundary_violations = report.violations;

    // Mood
    let mood = collaborators
        .mood
        .classify(samples, sample_rate, beat_info.bpm, &segments)?;

    metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    log::info!(
        "Segmented {:.1}s track: {} structure segments ({}), {} clips, {} coverage fixes, {:.0} ms",
        duration,
        segments.len(),
        structure.method.as_str(),
        report.boundaries.len(),
        metadata.coverage_fixes_applied,
        metadata.processing_time_ms
    );

    Ok(AudioAnalysis {
        bpm: beat_info.bpm,
        duration,
        beat_timestamps: beat_info.beat_timestamps.clone(),
        song_structure: segments,
        lyrics,
        mood,
        clip_boundaries: report.boundaries,
        metadata,
    })
}

/// Decode an audio file, mix it to mono and run [`parse_audio`]
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be decoded, otherwise any
/// error from [`parse_audio`]
pub fn parse_audio_file(
    path: impl AsRef<Path>,
    collaborators: &Collaborators<'_>,
    config: SegmentationConfig,
) -> Result<AudioAnalysis, AnalysisError> {
    let decoded = io::decode_audio(path)?;
    let mono = decoded.to_mono(config.channel_mix)?;
    parse_audio(&mono, decoded.sample_rate, collaborators, config)
}

/// Run all four detectors over one segment, containing individual failures
#[allow(clippy::too_many_arguments)]
fn detect_segment_breakpoints(
    samples: &[f32],
    sample_rate: u32,
    segment: &SongStructureSegment,
    index: usize,
    structure: &[SongStructureSegment],
    lyrics: &[Lyric],
    config: &SegmentationConfig,
    failures: &mut Vec<String>,
) -> Vec<Breakpoint> {
    let (start, end) = (segment.start, segment.end);
    let mut found = detect_lyric_breakpoints(lyrics, start, end);

    let detected = [
        (
            "energy",
            detect_energy_breakpoints(
                samples,
                sample_rate,
                start,
                end,
                config.frame_size,
                config.hop_size,
            ),
        ),
        (
            "silence",
            detect_silence_breakpoints(
                samples,
                sample_rate,
                start,
                end,
                config.frame_size,
                config.hop_size,
            ),
        ),
        (
            "harmonic",
            detect_harmonic_breakpoints(
                samples,
                sample_rate,
                start,
                end,
                structure,
                config.frame_size,
                config.hop_size,
            ),
        ),
    ];

    for (name, result) in detected {
        match result {
            Ok(breakpoints) => found.extend(breakpoints),
            Err(e) => {
                log::warn!("{} detector failed on segment {}: {}", name, index, e);
                failures.push(format!("{}[{}]: {}", name, index, e));
            }
        }
    }

    log::debug!(
        "Segment {} [{:.2}, {:.2}]: {} raw breakpoints",
        index,
        start,
        end,
        found.len()
    );

    found
}
