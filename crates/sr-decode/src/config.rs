/// How the next token is chosen from the model's logits.
///
/// The strategy is always spelled out explicitly; there is no
/// library-internal default hiding behind the generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeStrategy {
    /// Pick the highest-logit token at every step.
    Greedy,
    /// Track `num_beams` candidate sequences and return the best-scoring one.
    Beam { num_beams: usize },
    /// Filter logits then sample from the remaining distribution.
    Sampling {
        temperature: f32,
        top_k: usize,
        top_p: f32,
        seed: u64,
    },
}

/// Full decoding configuration for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Token selection strategy.
    pub strategy: DecodeStrategy,
    /// Maximum number of tokens to generate (EOS may stop earlier).
    pub max_length: usize,
    /// Penalty applied to recently generated tokens (1.0 = no penalty).
    pub repetition_penalty: f32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            strategy: DecodeStrategy::Greedy,
            max_length: 128,
            repetition_penalty: 1.0,
        }
    }
}

impl DecodeConfig {
    /// Greedy decoding with the default length limit.
    pub fn greedy() -> Self {
        Self::default()
    }

    /// Beam search with the given beam count.
    pub fn beam(num_beams: usize) -> Self {
        DecodeConfig {
            strategy: DecodeStrategy::Beam { num_beams },
            ..Self::default()
        }
    }

    /// Seeded sampling with commonly used filter settings.
    pub fn sampling(seed: u64) -> Self {
        DecodeConfig {
            strategy: DecodeStrategy::Sampling {
                temperature: 0.8,
                top_k: 40,
                top_p: 0.95,
                seed,
            },
            ..Self::default()
        }
    }
}
