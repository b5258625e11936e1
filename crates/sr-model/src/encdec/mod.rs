pub mod cache;
pub mod config;
pub mod weights;

pub use cache::{CrossCache, DecoderCache};
pub use config::Seq2SeqConfig;
pub use weights::{
    AttentionWeights, DecoderLayerWeights, EncoderLayerWeights, NormWeights, Seq2SeqWeights,
};

use sr_tensor::ComputeBackend;

use crate::architecture::Seq2SeqArchitecture;
use crate::error::{ModelError, Result};
use crate::gguf::reader::GgufFile;

/// An encoder-decoder transformer loaded from a GGUF file.
///
/// Holds the configuration and dequantized f32 weights. Decoding state (the
/// self-attention cache and the projected cross-attention keys/values) is
/// owned by the caller and passed in explicitly, so one loaded model can
/// serve several decoding hypotheses at once.
pub struct Seq2SeqModel {
    /// Model hyperparameters.
    pub config: Seq2SeqConfig,
    /// All weight tensors (dequantized to f32).
    pub weights: Seq2SeqWeights,
}

impl Seq2SeqModel {
    /// Load an encoder-decoder model from a parsed GGUF file.
    ///
    /// Parses the configuration from metadata and loads and dequantizes all
    /// weight tensors.
    pub fn from_gguf(gguf: &GgufFile) -> Result<Seq2SeqModel> {
        let config = Seq2SeqConfig::from_gguf(&gguf.metadata)?;
        let weights = Seq2SeqWeights::from_gguf(gguf, &config)?;

        Ok(Seq2SeqModel { config, weights })
    }

    /// Returns a reference to the model configuration.
    pub fn config(&self) -> &Seq2SeqConfig {
        &self.config
    }
}

/// Affine projection of a single position: y = W @ x + b.
///
/// `w` is [out_dim, in_dim] row-major, `x` has length in_dim, `b` length out_dim.
fn linear(
    backend: &dyn ComputeBackend,
    w: &[f32],
    b: &[f32],
    x: &[f32],
    out_dim: usize,
    in_dim: usize,
) -> Result<Vec<f32>> {
    let y = backend.matmul(w, x, out_dim, in_dim, 1)?;
    Ok(backend.add(&y, b)?)
}

/// Apply [`linear`] at every position of a flat [seq, in_dim] sequence,
/// producing a flat [seq, out_dim] result.
fn linear_seq(
    backend: &dyn ComputeBackend,
    w: &[f32],
    b: &[f32],
    xs: &[f32],
    in_dim: usize,
    out_dim: usize,
) -> Result<Vec<f32>> {
    let seq = xs.len() / in_dim;
    let mut out = Vec::with_capacity(seq * out_dim);
    for t in 0..seq {
        let x = &xs[t * in_dim..(t + 1) * in_dim];
        out.extend(linear(backend, w, b, x, out_dim, in_dim)?);
    }
    Ok(out)
}

/// Scaled dot-product attention for one query vector.
///
/// - `q`: query of length n_heads * head_dim
/// - `ks` / `vs`: flat [ctx, n_heads * head_dim] keys and values
///
/// Each head attends over all `ctx` positions; causal masking, where needed,
/// is implicit in the caller only handing over positions <= the current one.
fn attend_one(
    q: &[f32],
    ks: &[f32],
    vs: &[f32],
    ctx: usize,
    n_heads: usize,
    head_dim: usize,
) -> Vec<f32> {
    let kv_dim = n_heads * head_dim;
    let scale = 1.0 / (head_dim as f32).sqrt();
    let mut out = vec![0.0f32; kv_dim];

    for h in 0..n_heads {
        let q_head = &q[h * head_dim..(h + 1) * head_dim];

        // Attention scores against every context position.
        let mut scores = Vec::with_capacity(ctx);
        for s in 0..ctx {
            let k_offset = s * kv_dim + h * head_dim;
            let mut dot = 0.0f32;
            for d in 0..head_dim {
                dot += q_head[d] * ks[k_offset + d];
            }
            scores.push(dot * scale);
        }

        // Softmax over scores (inline for efficiency with single head).
        let max_score = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut exp_sum = 0.0f32;
        let mut probs = Vec::with_capacity(ctx);
        for &s in &scores {
            let e = (s - max_score).exp();
            probs.push(e);
            exp_sum += e;
        }
        for p in &mut probs {
            *p /= exp_sum;
        }

        // Weighted sum of values.
        let out_offset = h * head_dim;
        for (s, &prob) in probs.iter().enumerate() {
            let v_offset = s * kv_dim + h * head_dim;
            for d in 0..head_dim {
                out[out_offset + d] += prob * vs[v_offset + d];
            }
        }
    }

    out
}

impl Seq2SeqArchitecture for Seq2SeqModel {
    /// Run the full encoder forward pass over a source token sequence.
    ///
    /// Each position goes through token + learned position embedding, an
    /// embedding LayerNorm, then every encoder layer (bidirectional
    /// self-attention and GELU feed-forward, each followed by a residual
    /// LayerNorm). Returns the final hidden states as a flat
    /// [src_len, d_model] vector.
    fn encode(&self, src: &[u32], backend: &dyn ComputeBackend) -> Result<Vec<f32>> {
        let cfg = &self.config;
        let w = &self.weights;
        let d = cfg.d_model;

        if src.is_empty() {
            return Err(ModelError::Other("no tokens to encode".to_string()));
        }
        if src.len() > cfg.max_source_positions {
            return Err(ModelError::Other(format!(
                "source length {} exceeds maximum {}",
                src.len(),
                cfg.max_source_positions
            )));
        }

        // Step 1: Token + position embeddings.
        let mut x = Vec::with_capacity(src.len() * d);
        for (t, &token_id) in src.iter().enumerate() {
            if (token_id as usize) >= cfg.n_vocab {
                return Err(ModelError::Other(format!(
                    "token id {} exceeds vocab size {}",
                    token_id, cfg.n_vocab
                )));
            }
            let tok = &w.token_embd[token_id as usize * d..(token_id as usize + 1) * d];
            let pos = &w.enc_pos_embd[t * d..(t + 1) * d];
            for i in 0..d {
                x.push(tok[i] + pos[i]);
            }
        }
        let mut x = backend.layer_norm(
            &x,
            &w.enc_embd_norm.weight,
            &w.enc_embd_norm.bias,
            cfg.norm_eps,
            d,
        )?;

        let seq = src.len();
        let kv_dim = cfg.n_heads * cfg.head_dim;

        // Step 2: Encoder layers.
        for layer in &w.encoder {
            // 2a. Bidirectional self-attention.
            let q = linear_seq(backend, &layer.attn.wq, &layer.attn.bq, &x, d, kv_dim)?;
            let k = linear_seq(backend, &layer.attn.wk, &layer.attn.bk, &x, d, kv_dim)?;
            let v = linear_seq(backend, &layer.attn.wv, &layer.attn.bv, &x, d, kv_dim)?;

            let mut attn = Vec::with_capacity(seq * kv_dim);
            for t in 0..seq {
                let q_t = &q[t * kv_dim..(t + 1) * kv_dim];
                attn.extend(attend_one(q_t, &k, &v, seq, cfg.n_heads, cfg.head_dim));
            }

            let proj = linear_seq(backend, &layer.attn.wo, &layer.attn.bo, &attn, kv_dim, d)?;
            let res = backend.add(&x, &proj)?;
            x = backend.layer_norm(
                &res,
                &layer.attn_norm.weight,
                &layer.attn_norm.bias,
                cfg.norm_eps,
                d,
            )?;

            // 2b. Feed-forward with GELU.
            let up = linear_seq(backend, &layer.ffn_up, &layer.ffn_up_bias, &x, d, cfg.n_ff)?;
            let act = backend.gelu(&up)?;
            let down = linear_seq(
                backend,
                &layer.ffn_down,
                &layer.ffn_down_bias,
                &act,
                cfg.n_ff,
                d,
            )?;
            let res = backend.add(&x, &down)?;
            x = backend.layer_norm(
                &res,
                &layer.ffn_norm.weight,
                &layer.ffn_norm.bias,
                cfg.norm_eps,
                d,
            )?;
        }

        Ok(x)
    }

    /// Project the encoder states into per-layer cross-attention keys and
    /// values. Done once per source sequence; decoding only reads the result.
    fn project_cross(
        &self,
        enc_states: &[f32],
        backend: &dyn ComputeBackend,
    ) -> Result<CrossCache> {
        let cfg = &self.config;
        let d = cfg.d_model;
        let kv_dim = cfg.n_heads * cfg.head_dim;

        if enc_states.is_empty() || enc_states.len() % d != 0 {
            return Err(ModelError::Other(format!(
                "encoder states length {} is not a multiple of d_model {}",
                enc_states.len(),
                d
            )));
        }
        let enc_len = enc_states.len() / d;

        let mut k = Vec::with_capacity(self.weights.decoder.len());
        let mut v = Vec::with_capacity(self.weights.decoder.len());
        for layer in &self.weights.decoder {
            k.push(linear_seq(
                backend,
                &layer.cross_attn.wk,
                &layer.cross_attn.bk,
                enc_states,
                d,
                kv_dim,
            )?);
            v.push(linear_seq(
                backend,
                &layer.cross_attn.wv,
                &layer.cross_attn.bv,
                enc_states,
                d,
                kv_dim,
            )?);
        }

        Ok(CrossCache { k, v, enc_len })
    }

    /// Create an empty self-attention cache sized for this model.
    fn decoder_cache(&self) -> DecoderCache {
        let cfg = &self.config;
        DecoderCache::new(
            cfg.n_dec_layers,
            cfg.n_heads,
            cfg.head_dim,
            cfg.max_target_positions,
        )
    }

    /// Run one decoder step for a single token at a given position.
    ///
    /// The token passes through embedding lookup, then every decoder layer
    /// (causal self-attention using `cache`, cross-attention over `cross`,
    /// GELU feed-forward, each with a residual LayerNorm), and finally the
    /// LM head. Returns logits over the vocabulary.
    fn decode_step(
        &self,
        token: u32,
        pos: usize,
        cross: &CrossCache,
        cache: &mut DecoderCache,
        backend: &dyn ComputeBackend,
    ) -> Result<Vec<f32>> {
        let cfg = &self.config;
        let w = &self.weights;
        let d = cfg.d_model;
        let kv_dim = cfg.n_heads * cfg.head_dim;

        if (token as usize) >= cfg.n_vocab {
            return Err(ModelError::Other(format!(
                "token id {} exceeds vocab size {}",
                token, cfg.n_vocab
            )));
        }
        if pos >= cfg.max_target_positions {
            return Err(ModelError::Other(format!(
                "decode position {} exceeds maximum {}",
                pos, cfg.max_target_positions
            )));
        }

        // Step 1: Token + position embedding.
        let tok = &w.token_embd[token as usize * d..(token as usize + 1) * d];
        let pos_embd = &w.dec_pos_embd[pos * d..(pos + 1) * d];
        let summed: Vec<f32> = tok.iter().zip(pos_embd.iter()).map(|(a, b)| a + b).collect();
        let mut x = backend.layer_norm(
            &summed,
            &w.dec_embd_norm.weight,
            &w.dec_embd_norm.bias,
            cfg.norm_eps,
            d,
        )?;

        // Step 2: Decoder layers.
        for (layer_idx, layer) in w.decoder.iter().enumerate() {
            // 2a. Causal self-attention over the cached positions.
            let q = linear(backend, &layer.self_attn.wq, &layer.self_attn.bq, &x, kv_dim, d)?;
            let k = linear(backend, &layer.self_attn.wk, &layer.self_attn.bk, &x, kv_dim, d)?;
            let v = linear(backend, &layer.self_attn.wv, &layer.self_attn.bv, &x, kv_dim, d)?;

            cache.update(layer_idx, &k, &v, pos);

            // Causal masking is implicit: the cache only contains
            // positions 0..=pos.
            let seq_len = pos + 1;
            let attn = attend_one(
                &q,
                cache.get_k(layer_idx, seq_len),
                cache.get_v(layer_idx, seq_len),
                seq_len,
                cfg.n_heads,
                cfg.head_dim,
            );
            let proj = linear(backend, &layer.self_attn.wo, &layer.self_attn.bo, &attn, d, kv_dim)?;
            let res = backend.add(&x, &proj)?;
            x = backend.layer_norm(
                &res,
                &layer.self_attn_norm.weight,
                &layer.self_attn_norm.bias,
                cfg.norm_eps,
                d,
            )?;

            // 2b. Cross-attention over the encoder states.
            let q = linear(backend, &layer.cross_attn.wq, &layer.cross_attn.bq, &x, kv_dim, d)?;
            let attn = attend_one(
                &q,
                &cross.k[layer_idx],
                &cross.v[layer_idx],
                cross.enc_len,
                cfg.n_heads,
                cfg.head_dim,
            );
            let proj = linear(backend, &layer.cross_attn.wo, &layer.cross_attn.bo, &attn, d, kv_dim)?;
            let res = backend.add(&x, &proj)?;
            x = backend.layer_norm(
                &res,
                &layer.cross_norm.weight,
                &layer.cross_norm.bias,
                cfg.norm_eps,
                d,
            )?;

            // 2c. Feed-forward with GELU.
            let up = linear(backend, &layer.ffn_up, &layer.ffn_up_bias, &x, cfg.n_ff, d)?;
            let act = backend.gelu(&up)?;
            let down = linear(backend, &layer.ffn_down, &layer.ffn_down_bias, &act, d, cfg.n_ff)?;
            let res = backend.add(&x, &down)?;
            x = backend.layer_norm(
                &res,
                &layer.ffn_norm.weight,
                &layer.ffn_norm.bias,
                cfg.norm_eps,
                d,
            )?;
        }

        // Step 3: LM head -> logits [n_vocab].
        let logits = backend.matmul(&w.lm_head, &x, cfg.n_vocab, d, 1)?;
        Ok(logits)
    }

    fn vocab_size(&self) -> usize {
        self.config.n_vocab
    }
}
