//! Performance benchmarks for audio segmentation

use clip_segmenter::breakpoints::aggregate_breakpoints;
use clip_segmenter::collaborators::{
    Collaborators, DurationHeuristic, PrecomputedBeats, PrecomputedLyrics, StaticMood,
};
use clip_segmenter::structure::segment_structure;
use clip_segmenter::{parse_audio, Breakpoint, BreakpointSource, SegmentationConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_track(seconds: usize, sample_rate: u32) -> Vec<f32> {
    let n = seconds * sample_rate as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            // Alternate between two chords every 20s
            let root = if (t / 20.0) as usize % 2 == 0 { 261.63 } else { 369.99 };
            ((2.0 * std::f32::consts::PI * root * t).sin()
                + (2.0 * std::f32::consts::PI * root * 1.5 * t).sin())
                * 0.25
        })
        .collect()
}

fn bench_parse_audio(c: &mut Criterion) {
    let sample_rate = 22050;
    let samples = synthetic_track(60, sample_rate);

    let beats = PrecomputedBeats::regular(120.0, 60.0);
    let lyrics = PrecomputedLyrics::default();
    let mood = StaticMood::default();
    let judge = DurationHeuristic::default();
    let collaborators = Collaborators {
        beats: &beats,
        lyrics: &lyrics,
        mood: &mood,
        appropriateness: &judge,
    };
    let config = SegmentationConfig::default();

    c.bench_function("parse_audio_60s", |b| {
        b.iter(|| {
            let _ = parse_audio(
                black_box(&samples),
                black_box(sample_rate),
                &collaborators,
                black_box(config.clone()),
            );
        });
    });
}

fn bench_segment_structure(c: &mut Criterion) {
    let sample_rate = 22050;
    let samples = synthetic_track(120, sample_rate);
    let config = SegmentationConfig::default();

    c.bench_function("segment_structure_120s", |b| {
        b.iter(|| {
            let _ = segment_structure(
                black_box(&samples),
                black_box(sample_rate),
                &[],
                120.0,
                &config,
            );
        });
    });
}

fn bench_aggregate_breakpoints(c: &mut Criterion) {
    let sources = [
        BreakpointSource::Lyrics,
        BreakpointSource::Energy,
        BreakpointSource::Silence,
        BreakpointSource::Harmonic,
    ];
    let breakpoints: Vec<Breakpoint> = (0..2000)
        .map(|i| {
            Breakpoint::new(
                i as f32 * 0.15,
                0.5 + (i % 5) as f32 * 0.1,
                sources[i % sources.len()],
                "bench",
            )
        })
        .collect();

    c.bench_function("aggregate_breakpoints_2000", |b| {
        b.iter(|| {
            let _ = aggregate_breakpoints(black_box(&breakpoints), 0.0, 300.0, 0.5);
        });
    });
}

criterion_group!(
    benches,
    bench_parse_audio,
    bench_segment_structure,
    bench_aggregate_breakpoints
);
criterion_main!(benches);
