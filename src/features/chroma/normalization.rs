//! Chroma normalization and similarity

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// L2-normalize a chroma vector
///
/// Zero vectors (silent frames) are returned unchanged.
pub fn l2_normalize(chroma: &[f32]) -> Vec<f32> {
    let norm = chroma.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= EPSILON {
        return chroma.to_vec();
    }
    chroma.iter().map(|v| v / norm).collect()
}

/// Cosine similarity between two chroma vectors
///
/// Returns `None` when either vector has (near) zero energy, since the angle between them
/// is undefined.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    let na = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let nb = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if na <= EPSILON || nb <= EPSILON {
        return None;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    Some((dot / (na * nb)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_length() {
        let v = l2_normalize(&[3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_cases() {
        let mut a = vec![0.0; 12];
        let mut b = vec![0.0; 12];
        a[0] = 1.0;
        b[7] = 1.0;
        assert_eq!(cosine_similarity(&a, &a), Some(1.0));
        assert_eq!(cosine_similarity(&a, &b), Some(0.0));
        assert_eq!(cosine_similarity(&a, &[0.0; 12]), None);
    }
}
