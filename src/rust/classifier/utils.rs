/// Index and value of the largest finite score.
pub(crate) fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Softmax probability of `scores[index]`, stable against large logits.
pub(crate) fn softmax_at(scores: &[f32], index: usize) -> f32 {
    let max = scores.iter().copied().filter(|v| v.is_finite()).fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() || index >= scores.len() {
        return 0.0;
    }
    let sum: f32 = scores.iter().filter(|v| v.is_finite()).map(|&v| (v - max).exp()).sum();
    if sum > 0.0 {
        (scores[index] - max).exp() / sum
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 3.0, -2.0]), Some((1, 3.0)));
        assert_eq!(argmax(&[f32::NAN, 1.0]), Some((1, 1.0)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_softmax_at() {
        let p = softmax_at(&[1.0, 1.0], 0);
        assert!((p - 0.5).abs() < 1e-6);
        let p = softmax_at(&[1000.0, 0.0], 0);
        assert!((p - 1.0).abs() < 1e-6);
        assert_eq!(softmax_at(&[1.0], 3), 0.0);
    }
}
