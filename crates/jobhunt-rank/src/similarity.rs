/// Cosine similarity clamped to [0, 1].
///
/// A zero-norm operand scores exactly 0. Negative cosines clamp to 0.
/// Mismatched dimensions score 0; the ranker rejects them before scoring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(a_len = a.len(), b_len = b.len(), "embedding dimension mismatch; returning zero similarity");
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    if cos > 0.0 { cos.min(1.0) as f32 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let a = [0.1f32, 0.2, 0.3, 0.4, 0.5];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_exactly_zero() {
        let z = [0.0f32, 0.0];
        assert_eq!(cosine_similarity(&z, &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &z), 0.0);
        assert_eq!(cosine_similarity(&z, &z), 0.0);
    }

    #[test]
    fn opposite_vectors_clamp_to_zero() {
        let s = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert_eq!(s, 0.0);
        assert!(s.is_sign_positive());
    }

    #[test]
    fn symmetric_and_scale_invariant() {
        let a = [0.1f32, 0.2, 0.3, 0.4, 0.5];
        let b = [0.5f32, 0.4, 0.3, 0.2, 0.1];
        let ab = cosine_similarity(&a, &b);
        assert!((ab - cosine_similarity(&b, &a)).abs() < 1e-7);
        assert!(ab < 1.0);
        let scaled: Vec<f32> = b.iter().map(|x| x * 10.0).collect();
        assert!((ab - cosine_similarity(&a, &scaled)).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
