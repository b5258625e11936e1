use crate::config::{DecodeConfig, DecodeStrategy};
use crate::filters::{RepetitionPenalty, Temperature, TopK, TopP};
use crate::select::{Argmax, Stochastic};

/// A token ID paired with its current score.
///
/// Scores start as raw logits and are reshaped by each step of the chain.
#[derive(Debug, Clone)]
pub struct TokenScore {
    pub token_id: u32,
    pub score: f32,
}

/// One step of the decoding chain: reshapes or narrows the candidate set.
///
/// Filters (temperature, top-k, ...) leave several candidates; a selector
/// (argmax, stochastic) narrows the set to exactly one. `recent` carries the
/// tokens generated so far, for steps that condition on history.
pub trait LogitTransform: Send + Sync {
    /// Returns the name of this step (for diagnostics).
    fn name(&self) -> &str;

    /// Reshape scores and/or drop candidates in place.
    fn apply(&self, candidates: &mut Vec<TokenScore>, recent: &[u32]);
}

/// Composes logit transforms into a pipeline ending in a selector.
pub struct DecodeChain {
    steps: Vec<Box<dyn LogitTransform>>,
}

impl DecodeChain {
    /// Create a new empty chain.
    pub fn new() -> Self {
        DecodeChain { steps: Vec::new() }
    }

    /// Add a step to the end of the chain. Returns self for builder-style usage.
    pub fn with(mut self, step: Box<dyn LogitTransform>) -> Self {
        self.steps.push(step);
        self
    }

    /// Build the chain implied by a decoding configuration.
    ///
    /// Greedy maps to an argmax selector; sampling maps to repetition ->
    /// temperature -> top-k -> top-p -> stochastic selection. Beam search
    /// does its own scoring over raw logits, so it also maps to argmax here
    /// (used only when a caller treats a beam config as single-path).
    pub fn from_config(config: &DecodeConfig) -> Self {
        let mut chain = DecodeChain::new();
        if config.repetition_penalty != 1.0 {
            chain = chain.with(Box::new(RepetitionPenalty::new(config.repetition_penalty)));
        }

        match config.strategy {
            DecodeStrategy::Greedy | DecodeStrategy::Beam { .. } => {
                chain.with(Box::new(Argmax))
            }
            DecodeStrategy::Sampling {
                temperature,
                top_k,
                top_p,
                seed,
            } => chain
                .with(Box::new(Temperature::new(temperature)))
                .with(Box::new(TopK::new(top_k)))
                .with(Box::new(TopP::new(top_p)))
                .with(Box::new(Stochastic::new(seed))),
        }
    }

    /// Run all steps in order on raw logits, return the selected token ID.
    ///
    /// 1. Converts the `&[f32]` logits into `Vec<TokenScore>` (token_id = index).
    /// 2. Applies each step in sequence.
    /// 3. Returns the first remaining candidate's id (the selected one).
    pub fn select(&self, logits: &[f32], recent: &[u32]) -> u32 {
        let mut candidates: Vec<TokenScore> = logits
            .iter()
            .enumerate()
            .map(|(i, &score)| TokenScore {
                token_id: i as u32,
                score,
            })
            .collect();

        for step in &self.steps {
            step.apply(&mut candidates, recent);
        }

        candidates.first().map(|t| t.token_id).unwrap_or(0)
    }
}

impl Default for DecodeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_chain_selects_argmax() {
        let chain = DecodeChain::from_config(&DecodeConfig::greedy());
        let selected = chain.select(&[0.1, 2.0, -1.0, 0.5], &[]);
        assert_eq!(selected, 1);
    }

    #[test]
    fn test_empty_logits_select_zero() {
        let chain = DecodeChain::from_config(&DecodeConfig::greedy());
        assert_eq!(chain.select(&[], &[]), 0);
    }

    #[test]
    fn test_sampling_chain_is_seeded() {
        let chain = DecodeChain::from_config(&DecodeConfig::sampling(42));
        let logits = vec![0.0, 1.0, 2.0, 3.0];
        let a = chain.select(&logits, &[]);
        let b = chain.select(&logits, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_repetition_penalty_in_chain() {
        let mut cfg = DecodeConfig::greedy();
        cfg.repetition_penalty = 100.0;
        let chain = DecodeChain::from_config(&cfg);

        // Token 1 barely wins on raw logits but has already been generated;
        // the heavy penalty hands the pick to token 0.
        let selected = chain.select(&[1.0, 1.1], &[1]);
        assert_eq!(selected, 0);
    }
}
