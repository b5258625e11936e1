use crate::error::Result;
use crate::gguf::reader::GgufFile;
use super::config::Seq2SeqConfig;

/// Scale and shift for one layer normalization, each of length d_model.
pub struct NormWeights {
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Projection weights for one attention block.
///
/// All matrices are stored as flat f32 vectors in [out_dim, in_dim]
/// row-major order; biases have length out_dim.
pub struct AttentionWeights {
    pub wq: Vec<f32>,
    pub bq: Vec<f32>,
    pub wk: Vec<f32>,
    pub bk: Vec<f32>,
    pub wv: Vec<f32>,
    pub bv: Vec<f32>,
    pub wo: Vec<f32>,
    pub bo: Vec<f32>,
}

/// Weight tensors for a single encoder layer.
pub struct EncoderLayerWeights {
    /// Bidirectional self-attention projections.
    pub attn: AttentionWeights,
    /// LayerNorm applied after the attention residual.
    pub attn_norm: NormWeights,
    /// Up projection (d_model -> n_ff) and bias.
    pub ffn_up: Vec<f32>,
    pub ffn_up_bias: Vec<f32>,
    /// Down projection (n_ff -> d_model) and bias.
    pub ffn_down: Vec<f32>,
    pub ffn_down_bias: Vec<f32>,
    /// LayerNorm applied after the feed-forward residual.
    pub ffn_norm: NormWeights,
}

/// Weight tensors for a single decoder layer.
pub struct DecoderLayerWeights {
    /// Causal self-attention projections.
    pub self_attn: AttentionWeights,
    pub self_attn_norm: NormWeights,
    /// Cross-attention projections (queries from the decoder, keys/values
    /// from the encoder states).
    pub cross_attn: AttentionWeights,
    pub cross_norm: NormWeights,
    pub ffn_up: Vec<f32>,
    pub ffn_up_bias: Vec<f32>,
    pub ffn_down: Vec<f32>,
    pub ffn_down_bias: Vec<f32>,
    pub ffn_norm: NormWeights,
}

/// All weight tensors for an encoder-decoder model.
pub struct Seq2SeqWeights {
    /// Token embedding matrix, shape [n_vocab, d_model]. Shared between the
    /// encoder input, decoder input, and (unless overridden) the LM head.
    pub token_embd: Vec<f32>,
    /// Learned encoder position embeddings, shape [max_source_positions, d_model].
    pub enc_pos_embd: Vec<f32>,
    /// Learned decoder position embeddings, shape [max_target_positions, d_model].
    pub dec_pos_embd: Vec<f32>,
    /// LayerNorm over the summed encoder input embeddings.
    pub enc_embd_norm: NormWeights,
    /// LayerNorm over the summed decoder input embeddings.
    pub dec_embd_norm: NormWeights,
    /// LM head projection, shape [n_vocab, d_model]. Falls back to
    /// `token_embd` when the file carries no separate output tensor.
    pub lm_head: Vec<f32>,
    /// Per-layer encoder weights.
    pub encoder: Vec<EncoderLayerWeights>,
    /// Per-layer decoder weights.
    pub decoder: Vec<DecoderLayerWeights>,
}

fn tensor_vec(gguf: &GgufFile, name: &str) -> Result<Vec<f32>> {
    Ok(gguf.get_tensor_f32(name)?.into_f32_vec())
}

fn norm(gguf: &GgufFile, prefix: &str) -> Result<NormWeights> {
    Ok(NormWeights {
        weight: tensor_vec(gguf, &format!("{}.weight", prefix))?,
        bias: tensor_vec(gguf, &format!("{}.bias", prefix))?,
    })
}

// Reads {base}_q/_k/_v/_out with .weight and .bias suffixes, e.g.
// "enc.blk.0.attn" or "dec.blk.0.cross".
fn attention(gguf: &GgufFile, base: &str) -> Result<AttentionWeights> {
    Ok(AttentionWeights {
        wq: tensor_vec(gguf, &format!("{}_q.weight", base))?,
        bq: tensor_vec(gguf, &format!("{}_q.bias", base))?,
        wk: tensor_vec(gguf, &format!("{}_k.weight", base))?,
        bk: tensor_vec(gguf, &format!("{}_k.bias", base))?,
        wv: tensor_vec(gguf, &format!("{}_v.weight", base))?,
        bv: tensor_vec(gguf, &format!("{}_v.bias", base))?,
        wo: tensor_vec(gguf, &format!("{}_out.weight", base))?,
        bo: tensor_vec(gguf, &format!("{}_out.bias", base))?,
    })
}

impl Seq2SeqWeights {
    /// Load all encoder-decoder weights from a parsed GGUF file.
    ///
    /// Tensor names follow this pattern:
    /// - `token_embd.weight`
    /// - `enc.pos_embd.weight`, `dec.pos_embd.weight`
    /// - `enc.embd_norm.{weight,bias}`, `dec.embd_norm.{weight,bias}`
    /// - `output.weight` (falls back to token_embd if not present, for tied embeddings)
    /// - `enc.blk.{i}.attn_{q,k,v,out}.{weight,bias}`
    /// - `enc.blk.{i}.attn_norm.{weight,bias}`
    /// - `enc.blk.{i}.ffn_{up,down}.{weight,bias}`, `enc.blk.{i}.ffn_norm.{weight,bias}`
    /// - `dec.blk.{i}.attn_*` (causal self-attention, same shape as encoder)
    /// - `dec.blk.{i}.cross_{q,k,v,out}.{weight,bias}`, `dec.blk.{i}.cross_norm.{weight,bias}`
    /// - `dec.blk.{i}.ffn_*`
    pub fn from_gguf(gguf: &GgufFile, config: &Seq2SeqConfig) -> Result<Seq2SeqWeights> {
        let token_embd = tensor_vec(gguf, "token_embd.weight")?;
        let enc_pos_embd = tensor_vec(gguf, "enc.pos_embd.weight")?;
        let dec_pos_embd = tensor_vec(gguf, "dec.pos_embd.weight")?;
        let enc_embd_norm = norm(gguf, "enc.embd_norm")?;
        let dec_embd_norm = norm(gguf, "dec.embd_norm")?;

        // Output weights may not exist if embeddings are tied.
        let lm_head = match gguf.get_tensor_f32("output.weight") {
            Ok(t) => t.into_f32_vec(),
            Err(_) => token_embd.clone(),
        };

        let mut encoder = Vec::with_capacity(config.n_enc_layers);
        for i in 0..config.n_enc_layers {
            let prefix = format!("enc.blk.{}", i);
            encoder.push(EncoderLayerWeights {
                attn: attention(gguf, &format!("{}.attn", prefix))?,
                attn_norm: norm(gguf, &format!("{}.attn_norm", prefix))?,
                ffn_up: tensor_vec(gguf, &format!("{}.ffn_up.weight", prefix))?,
                ffn_up_bias: tensor_vec(gguf, &format!("{}.ffn_up.bias", prefix))?,
                ffn_down: tensor_vec(gguf, &format!("{}.ffn_down.weight", prefix))?,
                ffn_down_bias: tensor_vec(gguf, &format!("{}.ffn_down.bias", prefix))?,
                ffn_norm: norm(gguf, &format!("{}.ffn_norm", prefix))?,
            });
        }

        let mut decoder = Vec::with_capacity(config.n_dec_layers);
        for i in 0..config.n_dec_layers {
            let prefix = format!("dec.blk.{}", i);
            decoder.push(DecoderLayerWeights {
                self_attn: attention(gguf, &format!("{}.attn", prefix))?,
                self_attn_norm: norm(gguf, &format!("{}.attn_norm", prefix))?,
                cross_attn: attention(gguf, &format!("{}.cross", prefix))?,
                cross_norm: norm(gguf, &format!("{}.cross_norm", prefix))?,
                ffn_up: tensor_vec(gguf, &format!("{}.ffn_up.weight", prefix))?,
                ffn_up_bias: tensor_vec(gguf, &format!("{}.ffn_up.bias", prefix))?,
                ffn_down: tensor_vec(gguf, &format!("{}.ffn_down.weight", prefix))?,
                ffn_down_bias: tensor_vec(gguf, &format!("{}.ffn_down.bias", prefix))?,
                ffn_norm: norm(gguf, &format!("{}.ffn_norm", prefix))?,
            });
        }

        Ok(Seq2SeqWeights {
            token_embd,
            enc_pos_embd,
            dec_pos_embd,
            enc_embd_norm,
            dec_embd_norm,
            lm_head,
            encoder,
            decoder,
        })
    }
}
