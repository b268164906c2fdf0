//! Breakpoint aggregation
//!
//! Merges near-coincident breakpoints from all detectors into one ranked list.
//!
//! Algorithm:
//! 1. Keep breakpoints inside `[segment_start, segment_end]`, sorted by time
//! 2. Greedily cluster: every breakpoint within `merge_distance` of the cluster's *first*
//!    member joins the cluster
//! 3. Collapse each cluster: priority-and-confidence weighted mean time, max confidence
//!    boosted by 0.1 per extra member, source/type from the highest-priority member
//! 4. Repeat until no two outputs lie within `merge_distance`, so that aggregating an
//!    aggregated list is a no-op

use super::{Breakpoint, BreakpointSource};
use crate::analysis::Metadata;
use serde_json::Value;

/// Aggregate breakpoints from all sources for one segment
///
/// # Arguments
///
/// * `breakpoints` - Concatenated detector output (any order)
/// * `segment_start` - Segment start in seconds
/// * `segment_end` - Segment end in seconds
/// * `merge_distance` - Clustering radius in seconds (default: 0.5)
///
/// # Returns
///
/// Breakpoints sorted by timestamp, pairwise more than `merge_distance` apart
pub fn aggregate_breakpoints(
    breakpoints: &[Breakpoint],
    segment_start: f32,
    segment_end: f32,
    merge_distance: f32,
) -> Vec<Breakpoint> {
    let mut current: Vec<Breakpoint> = breakpoints
        .iter()
        .filter(|b| b.timestamp >= segment_start && b.timestamp <= segment_end)
        .cloned()
        .collect();

    current.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let input_len = current.len();
    let mut passes = 0;
    loop {
        let merged = merge_pass(&current, merge_distance);
        passes += 1;
        let changed = merged.len() != current.len();
        current = merged;
        if !changed {
            break;
        }
    }

    log::debug!(
        "Aggregated {} breakpoints in [{:.2}, {:.2}] to {} ({} passes)",
        input_len,
        segment_start,
        segment_end,
        current.len(),
        passes
    );

    current
}

/// One greedy clustering pass over a time-sorted list
fn merge_pass(sorted: &[Breakpoint], merge_distance: f32) -> Vec<Breakpoint> {
    let mut output = Vec::with_capacity(sorted.len());
    let mut i = 0;

    while i < sorted.len() {
        let anchor = sorted[i].timestamp;
        let mut j = i + 1;
        while j < sorted.len() && sorted[j].timestamp - anchor <= merge_distance {
            j += 1;
        }

        if j - i == 1 {
            output.push(sorted[i].clone());
        } else {
            output.push(merge_cluster(&sorted[i..j]));
        }
        i = j;
    }

    output
}

/// Collapse a multi-member cluster into one breakpoint
fn merge_cluster(cluster: &[Breakpoint]) -> Breakpoint {
    let weights: Vec<f32> = cluster
        .iter()
        .map(|b| b.source.priority() * b.confidence)
        .collect();
    let total_weight: f32 = weights.iter().sum();

    let timestamp = if total_weight > 0.0 {
        cluster
            .iter()
            .zip(&weights)
            .map(|(b, w)| b.timestamp * w)
            .sum::<f32>()
            / total_weight
    } else {
        cluster.iter().map(|b| b.timestamp).sum::<f32>() / cluster.len() as f32
    };

    let max_confidence = cluster.iter().map(|b| b.confidence).fold(0.0f32, f32::max);
    let confidence = (max_confidence + 0.1 * (cluster.len() - 1) as f32).min(1.0);

    // First member wins ties, so the earliest breakpoint of the top source is kept
    let dominant = cluster
        .iter()
        .reduce(|best, b| {
            if b.source.priority() > best.source.priority() {
                b
            } else {
                best
            }
        })
        .unwrap_or(&cluster[0]);

    let mut metadata = Metadata::new();
    let mut sources: Vec<BreakpointSource> = Vec::new();
    let mut merged_count = 0u64;
    for b in cluster {
        for (k, v) in &b.metadata {
            metadata.insert(k.clone(), v.clone());
        }
        sources.extend(member_sources(b));
        merged_count += b
            .metadata
            .get("merged_count")
            .and_then(Value::as_u64)
            .unwrap_or(1);
    }
    sources.sort();
    sources.dedup();

    metadata.insert("merged_count".to_string(), Value::from(merged_count));
    metadata.insert(
        "sources".to_string(),
        Value::from(sources.iter().map(|s| s.as_str()).collect::<Vec<_>>()),
    );

    Breakpoint {
        timestamp,
        confidence,
        source: dominant.source,
        kind: dominant.kind.clone(),
        metadata,
    }
}

/// Sources a breakpoint stands for: its own, plus any recorded by an earlier merge
fn member_sources(b: &Breakpoint) -> Vec<BreakpointSource> {
    let mut sources = vec![b.source];
    if let Some(Value::Array(names)) = b.metadata.get("sources") {
        sources.extend(
            names
                .iter()
                .filter_map(Value::as_str)
                .filter_map(BreakpointSource::from_name),
        );
    }
    sources
}
