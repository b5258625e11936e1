use crate::chain::{LogitTransform, TokenScore};

fn sort_descending(candidates: &mut [TokenScore]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Scales all scores by dividing by a temperature value.
///
/// Higher temperatures produce more uniform distributions (more random),
/// while lower temperatures sharpen the distribution (more deterministic).
pub struct Temperature {
    temperature: f32,
}

impl Temperature {
    pub fn new(temperature: f32) -> Self {
        Self { temperature }
    }
}

impl LogitTransform for Temperature {
    fn name(&self) -> &str {
        "temperature"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, _recent: &[u32]) {
        // Clamp temperature to a very small positive value if it is <= 0.
        let temp = if self.temperature <= 0.0 {
            1e-7
        } else {
            self.temperature
        };

        for candidate in candidates.iter_mut() {
            candidate.score /= temp;
        }
    }
}

/// Keeps only the top K candidates by score, discarding the rest.
pub struct TopK {
    k: usize,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl LogitTransform for TopK {
    fn name(&self) -> &str {
        "top_k"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, _recent: &[u32]) {
        if self.k == 0 || self.k >= candidates.len() {
            return;
        }

        sort_descending(candidates);
        candidates.truncate(self.k);
    }
}

/// Nucleus filtering: keeps the smallest set of candidates whose cumulative
/// probability exceeds the threshold `p`.
pub struct TopP {
    p: f32,
}

impl TopP {
    pub fn new(p: f32) -> Self {
        Self { p }
    }
}

impl LogitTransform for TopP {
    fn name(&self) -> &str {
        "top_p"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, _recent: &[u32]) {
        if candidates.is_empty() {
            return;
        }

        sort_descending(candidates);

        // Softmax over the remaining scores.
        let max_score = candidates[0].score;
        let exps: Vec<f32> = candidates
            .iter()
            .map(|t| (t.score - max_score).exp())
            .collect();
        let sum: f32 = exps.iter().sum();

        // Find the cutoff index: keep candidates until the cumulative
        // probability exceeds p. Always keep at least one.
        let mut cumulative = 0.0f32;
        let mut cutoff = candidates.len();
        for (i, &e) in exps.iter().enumerate() {
            cumulative += e / sum;
            if cumulative > self.p {
                cutoff = i + 1;
                break;
            }
        }

        candidates.truncate(cutoff.max(1));
    }
}

/// Penalizes tokens that appear in the recently generated history.
///
/// For penalized tokens, positive scores are divided by `penalty` and
/// negative scores multiplied by it, discouraging repetition.
pub struct RepetitionPenalty {
    penalty: f32,
}

impl RepetitionPenalty {
    pub fn new(penalty: f32) -> Self {
        Self { penalty }
    }
}

impl LogitTransform for RepetitionPenalty {
    fn name(&self) -> &str {
        "repetition_penalty"
    }

    fn apply(&self, candidates: &mut Vec<TokenScore>, recent: &[u32]) {
        for candidate in candidates.iter_mut() {
            if recent.contains(&candidate.token_id) {
                if candidate.score > 0.0 {
                    candidate.score /= self.penalty;
                } else {
                    candidate.score *= self.penalty;
                }
            }
        }
    }
}
