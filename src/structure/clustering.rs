//! Complete-linkage agglomerative clustering
//!
//! Nearest-neighbour-chain algorithm over a precomputed distance matrix (O(n²) time,
//! O(n²) memory for the working copy of the matrix). The merge list is sorted by height and
//! replayed through a union-find to cut the dendrogram at the requested cluster count.
//!
//! # Reference
//!
//! Murtagh, F. (1983). A Survey of Recent Advances in Hierarchical Clustering Algorithms.
//! *The Computer Journal*, 26(4), 354-359.

use super::similarity::DistanceMatrix;
use crate::error::AnalysisError;

/// One dendrogram merge: two cluster representatives and the linkage height
#[derive(Debug, Clone, Copy)]
struct Merge {
    a: usize,
    b: usize,
    height: f32,
}

/// Cluster frames into `n_clusters` groups with complete linkage
///
/// # Arguments
///
/// * `distances` - Validated symmetric distance matrix
/// * `n_clusters` - Target number of clusters (1..=n)
///
/// # Returns
///
/// One label per frame, renumbered `0..n_clusters` in order of first appearance
///
/// # Errors
///
/// Returns `AnalysisError::ClusteringError` if `n_clusters` is 0 or exceeds the frame count,
/// or if no finite nearest neighbour exists
pub fn cluster_complete_linkage(
    distances: &DistanceMatrix,
    n_clusters: usize,
) -> Result<Vec<usize>, AnalysisError> {
    let n = distances.len();
    if n_clusters == 0 || n_clusters > n {
        return Err(AnalysisError::ClusteringError(format!(
            "Cannot form {} clusters from {} frames",
            n_clusters, n
        )));
    }

    let mut merges = nn_chain(distances)?;
    merges.sort_by(|x, y| {
        x.height
            .partial_cmp(&y.height)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut sets = UnionFind::new(n);
    for merge in merges.iter().take(n - n_clusters) {
        sets.union(merge.a, merge.b);
    }

    let mut labels = vec![0usize; n];
    let mut renumbered: Vec<(usize, usize)> = Vec::with_capacity(n_clusters);
    for (frame, label) in labels.iter_mut().enumerate() {
        let root = sets.find(frame);
        *label = match renumbered.iter().find(|(r, _)| *r == root) {
            Some(&(_, l)) => l,
            None => {
                let l = renumbered.len();
                renumbered.push((root, l));
                l
            }
        };
    }

    log::debug!(
        "Complete linkage: {} frames -> {} clusters (cut height {:.3})",
        n,
        renumbered.len(),
        merges
            .get((n - n_clusters).saturating_sub(1))
            .map(|m| m.height)
            .unwrap_or(0.0)
    );

    Ok(labels)
}

/// Build the full merge list with the nearest-neighbour chain
///
/// Cluster slots keep the index of one original frame, so every merge names two frames
/// that lie in the clusters being joined.
fn nn_chain(distances: &DistanceMatrix) -> Result<Vec<Merge>, AnalysisError> {
    let n = distances.len();
    let mut d = distances.clone().into_inner();
    let mut active = vec![true; n];
    let mut chain: Vec<usize> = Vec::with_capacity(n);
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    while merges.len() + 1 < n {
        if chain.is_empty() {
            // Lowest active slot starts a new chain
            match active.iter().position(|&a| a) {
                Some(start) => chain.push(start),
                None => break,
            }
        }

        let (a, b, height) = loop {
            let a = chain[chain.len() - 1];
            let prev = if chain.len() >= 2 {
                Some(chain[chain.len() - 2])
            } else {
                None
            };

            // Previous chain element wins ties, which guarantees termination
            let (mut best, mut best_d) = match prev {
                Some(p) => (Some(p), d[a * n + p]),
                None => (None, f32::INFINITY),
            };
            for k in 0..n {
                if active[k] && k != a && d[a * n + k] < best_d {
                    best = Some(k);
                    best_d = d[a * n + k];
                }
            }

            let Some(b) = best else {
                return Err(AnalysisError::ClusteringError(format!(
                    "No finite nearest neighbour for frame {} of {}",
                    a, n
                )));
            };

            if Some(b) == prev {
                break (a, b, best_d);
            }
            chain.push(b);
        };

        chain.pop();
        chain.pop();

        // Lance-Williams update for complete linkage, merged cluster kept in slot `a`
        for k in 0..n {
            if active[k] && k != a && k != b {
                let merged = d[a * n + k].max(d[b * n + k]);
                d[a * n + k] = merged;
                d[k * n + a] = merged;
            }
        }
        active[b] = false;

        merges.push(Merge { a, b, height });
    }

    Ok(merges)
}

/// Disjoint-set forest with path halving
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx != ry {
            self.parent[ry] = rx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::similarity::{cosine_distance_matrix, validate_distances};

    fn matrix_from_points(points: &[f32]) -> DistanceMatrix {
        // 1-D points embedded as 2-D unit vectors at angle `p`
        let chroma: Vec<Vec<f32>> = points
            .iter()
            .map(|&p| {
                let mut v = vec![0.0; 12];
                v[0] = p.cos();
                v[1] = p.sin();
                v
            })
            .collect();
        let mut m = cosine_distance_matrix(&chroma);
        validate_distances(&mut m).unwrap();
        m
    }

    #[test]
    fn test_two_obvious_groups() {
        let m = matrix_from_points(&[0.0, 0.05, 0.1, 1.4, 1.45, 1.5]);
        let labels = cluster_complete_linkage(&m, 2).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_labels_renumbered_by_first_appearance() {
        let m = matrix_from_points(&[1.5, 1.45, 0.0, 0.05, 0.8]);
        let labels = cluster_complete_linkage(&m, 3).unwrap();
        assert_eq!(labels[0], 0);
        assert_eq!(labels[1], 0);
        assert_eq!(labels[2], 1);
        assert_eq!(labels[3], 1);
        assert_eq!(labels[4], 2);
    }

    #[test]
    fn test_interleaved_labels_possible() {
        // Harmonic content A B A: without a temporal penalty the two A blocks share a label
        let m = matrix_from_points(&[0.0, 0.0, 1.5, 1.5, 0.0, 0.0]);
        let labels = cluster_complete_linkage(&m, 2).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_cluster_count_bounds() {
        let m = matrix_from_points(&[0.0, 0.5, 1.0]);
        assert_eq!(cluster_complete_linkage(&m, 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(cluster_complete_linkage(&m, 1).unwrap(), vec![0, 0, 0]);
        assert!(cluster_complete_linkage(&m, 0).is_err());
        assert!(cluster_complete_linkage(&m, 4).is_err());
    }
}
