use crate::error::{ModelError, Result};
use crate::gguf::metadata::GgufMetadata;

/// Architecture name this crate knows how to load.
pub const ARCH_NAME: &str = "encdec";

/// Configuration for an encoder-decoder model, parsed from GGUF metadata.
#[derive(Debug)]
pub struct Seq2SeqConfig {
    /// Vocabulary size (number of token embeddings).
    pub n_vocab: usize,
    /// Embedding dimension / hidden size.
    pub d_model: usize,
    /// Number of attention heads (shared by encoder and decoder).
    pub n_heads: usize,
    /// Number of encoder layers.
    pub n_enc_layers: usize,
    /// Number of decoder layers.
    pub n_dec_layers: usize,
    /// Feed-forward intermediate dimension.
    pub n_ff: usize,
    /// Layer normalization epsilon.
    pub norm_eps: f32,
    /// Maximum source sequence length (learned encoder positions).
    pub max_source_positions: usize,
    /// Maximum target sequence length (learned decoder positions).
    pub max_target_positions: usize,
    /// Token the decoder is primed with, when the converter recorded one.
    pub decoder_start_id: Option<u32>,
    /// Dimension of each attention head (d_model / n_heads).
    pub head_dim: usize,
}

impl Seq2SeqConfig {
    /// Parse an encoder-decoder configuration from GGUF metadata.
    ///
    /// Reads the following keys:
    /// - `general.architecture` (must be "encdec")
    /// - `encdec.embedding_length` -> d_model
    /// - `encdec.attention.head_count` -> n_heads
    /// - `encdec.encoder.block_count` -> n_enc_layers
    /// - `encdec.decoder.block_count` -> n_dec_layers
    /// - `encdec.feed_forward_length` -> n_ff
    /// - `encdec.attention.layer_norm_epsilon` -> norm_eps
    /// - `encdec.encoder.context_length` -> max_source_positions
    /// - `encdec.decoder.context_length` -> max_target_positions
    /// - `encdec.decoder_start_token_id` (optional)
    /// - vocab size inferred from `tokenizer.ggml.tokens` array length
    pub fn from_gguf(metadata: &GgufMetadata) -> Result<Seq2SeqConfig> {
        let arch = metadata.get_string("general.architecture")?;
        if arch != ARCH_NAME {
            return Err(ModelError::UnsupportedArchitecture(arch.to_string()));
        }

        let d_model = metadata.get_u32("encdec.embedding_length")? as usize;
        let n_heads = metadata.get_u32("encdec.attention.head_count")? as usize;
        let n_enc_layers = metadata.get_u32("encdec.encoder.block_count")? as usize;
        let n_dec_layers = metadata.get_u32("encdec.decoder.block_count")? as usize;
        let n_ff = metadata.get_u32("encdec.feed_forward_length")? as usize;
        let norm_eps = metadata.get_f32("encdec.attention.layer_norm_epsilon")?;
        let max_source_positions = metadata.get_u32("encdec.encoder.context_length")? as usize;
        let max_target_positions = metadata.get_u32("encdec.decoder.context_length")? as usize;

        let decoder_start_id = metadata.get_u32("encdec.decoder_start_token_id").ok();

        // Infer vocab size from tokenizer token array.
        let tokens = metadata.get_string_array("tokenizer.ggml.tokens")?;
        let n_vocab = tokens.len();

        if n_heads == 0 || d_model % n_heads != 0 {
            return Err(ModelError::Other(format!(
                "embedding length {} is not divisible by head count {}",
                d_model, n_heads
            )));
        }
        let head_dim = d_model / n_heads;

        Ok(Seq2SeqConfig {
            n_vocab,
            d_model,
            n_heads,
            n_enc_layers,
            n_dec_layers,
            n_ff,
            norm_eps,
            max_source_positions,
            max_target_positions,
            decoder_start_id,
            head_dim,
        })
    }
}
