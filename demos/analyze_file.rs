//! Example: Segment a single audio file into clips
//!
//! Usage: `cargo run --example analyze_file -- <audio file> [bpm]`
//!
//! Beats come from a regular grid at the given BPM (120 by default); lyrics are absent.

use clip_segmenter::collaborators::{
    Collaborators, DurationHeuristic, PrecomputedBeats, PrecomputedLyrics, StaticMood,
};
use clip_segmenter::io::decode_audio;
use clip_segmenter::{parse_audio, SegmentationConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: analyze_file <audio file> [bpm]")?;
    let bpm: f32 = match args.next() {
        Some(s) => s.parse()?,
        None => 120.0,
    };

    let config = SegmentationConfig::default();
    let decoded = decode_audio(&path)?;
    let samples = decoded.to_mono(config.channel_mix)?;

    let beats = PrecomputedBeats::regular(bpm, decoded.duration());
    let lyrics = PrecomputedLyrics::default();
    let mood = StaticMood::default();
    let judge = DurationHeuristic::default();
    let collaborators = Collaborators {
        beats: &beats,
        lyrics: &lyrics,
        mood: &mood,
        appropriateness: &judge,
    };

    let result = parse_audio(&samples, decoded.sample_rate, &collaborators, config)?;

    println!("Segmentation Results:");
    println!("  Duration: {:.2}s", result.duration);
    println!(
        "  Structure: {} segments ({})",
        result.song_structure.len(),
        result.metadata.structure_method.as_str()
    );
    for segment in &result.song_structure {
        println!(
            "    {:>7.2} - {:>7.2}  {:<8} {}",
            segment.start,
            segment.end,
            segment.segment_type.as_str(),
            segment.energy.as_str()
        );
    }
    println!("  Clips: {}", result.clip_count());
    println!("  Coverage fixes: {}", result.metadata.coverage_fixes_applied);
    println!("  Processing time: {:.2} ms", result.metadata.processing_time_ms);
    println!();
    println!("{}", serde_json::to_string_pretty(&result.clip_boundaries)?);

    Ok(())
}
