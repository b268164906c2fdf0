//! Chroma self-similarity distance matrix
//!
//! Distances are `1 - cosine_similarity` between chroma frames, plus a temporal-contiguity
//! penalty `|i - j| / n * weight` that keeps temporally distant but harmonically similar
//! frames out of the same cluster.

use crate::error::AnalysisError;
use crate::features::chroma::cosine_similarity;

/// Dense square distance matrix (row-major)
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f32>,
}

impl DistanceMatrix {
    /// Number of rows/columns
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a 0x0 matrix
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between frames `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.n + j] = value;
    }

    /// Consume into the row-major buffer
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

/// Build the cosine distance matrix between chroma frames
///
/// A zero-energy frame has no pitch direction and is treated as orthogonal to every other
/// frame (distance 1.0).
pub fn cosine_distance_matrix(chroma: &[Vec<f32>]) -> DistanceMatrix {
    let n = chroma.len();
    let mut matrix = DistanceMatrix {
        n,
        data: vec![0.0; n * n],
    };

    for i in 0..n {
        for j in (i + 1)..n {
            let d = match cosine_similarity(&chroma[i], &chroma[j]) {
                Some(sim) => 1.0 - sim,
                None => 1.0,
            };
            matrix.set(i, j, d);
            matrix.set(j, i, d);
        }
    }

    matrix
}

/// Reject non-finite distances and repair floating-point drift
///
/// Forces exact symmetry (mean of both triangles), a zero diagonal and non-negative
/// entries.
///
/// # Errors
///
/// Returns `AnalysisError::ClusteringError` if any entry is NaN or infinite
pub fn validate_distances(matrix: &mut DistanceMatrix) -> Result<(), AnalysisError> {
    let invalid = matrix.data.iter().filter(|d| !d.is_finite()).count();
    if invalid > 0 {
        return Err(AnalysisError::ClusteringError(format!(
            "Distance matrix has {} non-finite entries out of {} ({} frames)",
            invalid,
            matrix.data.len(),
            matrix.n
        )));
    }

    let n = matrix.n;
    let mut asymmetric = 0usize;
    for i in 0..n {
        matrix.set(i, i, 0.0);
        for j in (i + 1)..n {
            let (a, b) = (matrix.get(i, j), matrix.get(j, i));
            if a != b {
                asymmetric += 1;
            }
            let d = ((a + b) * 0.5).max(0.0);
            matrix.set(i, j, d);
            matrix.set(j, i, d);
        }
    }

    if asymmetric > 0 {
        log::debug!("Symmetrized {} distance pairs", asymmetric);
    }

    Ok(())
}

/// Add `|i - j| / n * weight` to every entry
pub fn add_temporal_penalty(matrix: &mut DistanceMatrix, weight: f32) {
    let n = matrix.n;
    if n == 0 || weight == 0.0 {
        return;
    }
    let scale = weight / n as f32;
    for i in 0..n {
        for j in 0..n {
            let penalty = i.abs_diff(j) as f32 * scale;
            let d = matrix.get(i, j);
            matrix.set(i, j, d + penalty);
        }
    }
}

/// Min/mean/max of the off-diagonal entries, for diagnostics
pub fn distance_stats(matrix: &DistanceMatrix) -> (f32, f32, f32) {
    let n = matrix.n;
    if n < 2 {
        return (0.0, 0.0, 0.0);
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = matrix.get(i, j);
            min = min.min(d);
            max = max.max(d);
            sum += d as f64;
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    (min, (sum / pairs) as f32, max)
}
