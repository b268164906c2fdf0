//! Lyric phrase-end breakpoints
//!
//! A pause of more than half a second between two transcribed words marks the end of a
//! phrase; longer pauses mark sentence ends and earn higher confidence.

use super::{Breakpoint, BreakpointSource};
use crate::analysis::Lyric;

/// Word gaps at or below this are part of the same phrase
const MIN_GAP: f32 = 0.5;

/// Gaps below this are phrase ends, longer ones sentence ends
const SENTENCE_GAP: f32 = 1.0;

/// Detect phrase ends from word timestamps
///
/// # Arguments
///
/// * `lyrics` - All transcribed words of the track (any order)
/// * `segment_start` - Window start in seconds
/// * `segment_end` - Window end in seconds
///
/// # Returns
///
/// One breakpoint per word gap longer than 0.5s, placed 0.3s after the earlier word (but
/// never later than 0.1s before the next one). Empty if fewer than two words fall inside
/// the window.
pub fn detect_lyric_breakpoints(
    lyrics: &[Lyric],
    segment_start: f32,
    segment_end: f32,
) -> Vec<Breakpoint> {
    let mut words: Vec<&Lyric> = lyrics
        .iter()
        .filter(|l| l.timestamp >= segment_start && l.timestamp <= segment_end)
        .collect();

    if words.len() < 2 {
        return Vec::new();
    }

    words.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let breakpoints: Vec<Breakpoint> = words
        .windows(2)
        .filter_map(|pair| {
            let (word, next) = (pair[0], pair[1]);
            let gap = next.timestamp - word.timestamp;
            if gap <= MIN_GAP {
                return None;
            }

            let timestamp = (word.timestamp + 0.3).min(next.timestamp - 0.1);
            let confidence = (0.5 + (gap - MIN_GAP) * 0.4).min(0.9);
            let kind = if gap < SENTENCE_GAP { "phrase_end" } else { "sentence_end" };

            Some(
                Breakpoint::new(timestamp, confidence, BreakpointSource::Lyrics, kind)
                    .with_meta("gap", gap as f64)
                    .with_meta("word", word.text.clone())
                    .with_meta("next_word", next.text.clone()),
            )
        })
        .collect();

    log::debug!(
        "Lyrics: {} words in [{:.2}, {:.2}] -> {} breakpoints",
        words.len(),
        segment_start,
        segment_end,
        breakpoints.len()
    );

    breakpoints
}
