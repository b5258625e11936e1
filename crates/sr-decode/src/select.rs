use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chain::{LogitTransform, TokenScore};

/// Selector that keeps only the single highest-scoring candidate.
pub struct Argmax;

impl LogitTransform for Argmax {
    fn name(&self) -> &str {
        "argmax"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, _recent: &[u32]) {
        if candidates.is_empty() {
            return;
        }

        let best = candidates
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let selected = candidates[best].clone();
        candidates.clear();
        candidates.push(selected);
    }
}

/// Selector that samples from the softmax distribution over the remaining
/// candidates, using a seeded RNG for reproducible runs.
///
/// The step index (length of the generated history) perturbs the seed so
/// consecutive steps do not all redraw the same quantile.
pub struct Stochastic {
    seed: u64,
}

impl Stochastic {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LogitTransform for Stochastic {
    fn name(&self) -> &str {
        "stochastic"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, recent: &[u32]) {
        if candidates.is_empty() {
            return;
        }

        // Softmax probabilities over the remaining candidates.
        let max_score = candidates
            .iter()
            .map(|t| t.score)
            .fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = candidates
            .iter()
            .map(|t| (t.score - max_score).exp())
            .collect();
        let sum: f32 = exps.iter().sum();
        let probs: Vec<f32> = exps.iter().map(|e| e / sum).collect();

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(recent.len() as u64));
        let dist = match WeightedIndex::new(&probs) {
            Ok(d) => d,
            Err(_) => {
                // Degenerate weights: fall back to the first candidate.
                candidates.truncate(1);
                return;
            }
        };

        let selected = candidates[dist.sample(&mut rng)].clone();
        candidates.clear();
        candidates.push(selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(scores: &[f32]) -> Vec<TokenScore> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| TokenScore {
                token_id: i as u32,
                score,
            })
            .collect()
    }

    #[test]
    fn test_argmax_picks_highest() {
        let mut c = candidates(&[0.2, 5.0, 3.0]);
        Argmax.apply(&mut c, &[]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].token_id, 1);
    }

    #[test]
    fn test_argmax_empty_is_noop() {
        let mut c = Vec::new();
        Argmax.apply(&mut c, &[]);
        assert!(c.is_empty());
    }

    #[test]
    fn test_stochastic_reproducible() {
        let selector = Stochastic::new(123);
        let mut a = candidates(&[1.0, 2.0, 3.0]);
        let mut b = candidates(&[1.0, 2.0, 3.0]);
        selector.apply(&mut a, &[]);
        selector.apply(&mut b, &[]);
        assert_eq!(a[0].token_id, b[0].token_id);
    }

    #[test]
    fn test_stochastic_follows_dominant_mass() {
        let selector = Stochastic::new(7);
        // Token 2 holds essentially all probability mass.
        let mut c = candidates(&[-100.0, -100.0, 100.0]);
        selector.apply(&mut c, &[]);
        assert_eq!(c[0].token_id, 2);
    }
}
