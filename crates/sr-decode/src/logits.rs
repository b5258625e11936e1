//! Logit-space helpers for beam scoring.

/// Compute log-softmax of logits: log(softmax(x)).
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max_val = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let log_sum_exp = logits
        .iter()
        .map(|&v| (v - max_val).exp())
        .sum::<f32>()
        .ln()
        + max_val;
    logits.iter().map(|&v| v - log_sum_exp).collect()
}

/// Return indices of the top-n values in descending order.
pub fn top_indices(values: &[f32], n: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f32)> = values.iter().copied().enumerate().collect();
    indexed.sort_unstable_by(|a, b| b.1.total_cmp(&a.1));
    indexed.iter().take(n).map(|&(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_softmax_sums_to_one() {
        let lp = log_softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = lp.iter().map(|&v| v.exp()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_log_softmax_preserves_order() {
        let lp = log_softmax(&[0.5, -1.0, 2.0]);
        assert!(lp[2] > lp[0]);
        assert!(lp[0] > lp[1]);
    }

    #[test]
    fn test_log_softmax_uniform() {
        let lp = log_softmax(&[1.0, 1.0]);
        assert_relative_eq!(lp[0], (0.5f32).ln(), epsilon = 1e-6);
        assert_relative_eq!(lp[1], (0.5f32).ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_top_indices() {
        let idx = top_indices(&[0.1, 3.0, 2.0, -1.0], 2);
        assert_eq!(idx, vec![1, 2]);
    }

    #[test]
    fn test_top_indices_n_exceeds_len() {
        let idx = top_indices(&[1.0, 2.0], 5);
        assert_eq!(idx, vec![1, 0]);
    }
}
