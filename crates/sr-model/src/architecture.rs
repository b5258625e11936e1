use sr_tensor::ComputeBackend;

use crate::encdec::cache::{CrossCache, DecoderCache};

/// Trait for encoder-decoder architectures that map a source token sequence
/// to generated target tokens.
///
/// Implementations hold model weights only; decoding state lives in caches
/// the caller owns, so a single loaded model can drive several hypotheses
/// (e.g. beam search) at once.
pub trait Seq2SeqArchitecture: Send + Sync {
    /// Run the encoder over the source tokens, returning the final hidden
    /// states as a flat [src_len, d_model] vector.
    fn encode(&self, src: &[u32], backend: &dyn ComputeBackend) -> crate::Result<Vec<f32>>;

    /// Project encoder states into per-layer cross-attention keys/values.
    /// Called once per source sequence, after [`Self::encode`].
    fn project_cross(
        &self,
        enc_states: &[f32],
        backend: &dyn ComputeBackend,
    ) -> crate::Result<CrossCache>;

    /// Create an empty decoder self-attention cache sized for this model.
    fn decoder_cache(&self) -> DecoderCache;

    /// Process one target token at `pos`, updating `cache`, and return
    /// next-token logits over the vocabulary.
    fn decode_step(
        &self,
        token: u32,
        pos: usize,
        cross: &CrossCache,
        cache: &mut DecoderCache,
        backend: &dyn ComputeBackend,
    ) -> crate::Result<Vec<f32>>;

    /// Returns the vocabulary size (number of output logits).
    fn vocab_size(&self) -> usize;
}
