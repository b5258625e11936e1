use sr_decode::{log_softmax, top_indices};
use sr_model::encdec::{CrossCache, DecoderCache, Seq2SeqModel};
use sr_model::Seq2SeqArchitecture;
use sr_tensor::ComputeBackend;

use crate::error::Result;

struct Hypothesis {
    /// Generated tokens, excluding the start token.
    tokens: Vec<u32>,
    /// Sum of per-token log-probabilities.
    log_prob: f32,
    /// This hypothesis's fork of the decoder self-attention cache.
    cache: DecoderCache,
    finished: bool,
}

/// Beam search generation.
///
/// Maintains `num_beams` candidate sequences, forking the decoder cache per
/// hypothesis, and returns the highest-scoring sequence once every beam has
/// emitted EOS or `max_length` is reached. The returned tokens may end in
/// EOS; callers strip control tokens when mapping back to text.
pub fn beam_search(
    model: &Seq2SeqModel,
    cross: &CrossCache,
    start: u32,
    eos: u32,
    num_beams: usize,
    max_length: usize,
    backend: &dyn ComputeBackend,
) -> Result<Vec<u32>> {
    let num_beams = num_beams.max(1);
    let max_length = max_length.min(model.config.max_target_positions);
    if max_length == 0 {
        return Ok(Vec::new());
    }

    // Prime the decoder with the start token and fan out into the initial beams.
    let mut cache = model.decoder_cache();
    let logits = model.decode_step(start, 0, cross, &mut cache, backend)?;
    let lp = log_softmax(&logits);

    let mut beams: Vec<Hypothesis> = Vec::with_capacity(num_beams);
    for &idx in &top_indices(&lp, num_beams) {
        let token = idx as u32;
        beams.push(Hypothesis {
            tokens: vec![token],
            log_prob: lp[idx],
            cache: cache.clone(),
            finished: token == eos,
        });
    }

    // Expand step by step. All live beams sit at the same position, so one
    // loop counter serves every hypothesis.
    for pos in 1..max_length {
        if beams.iter().all(|b| b.finished) {
            break;
        }

        let mut candidates: Vec<Hypothesis> = Vec::new();

        for beam in beams {
            // Finished beams carry over unchanged and keep competing on score.
            if beam.finished {
                candidates.push(beam);
                continue;
            }

            let last = *beam.tokens.last().expect("beam holds at least one token");
            let mut beam_cache = beam.cache;
            let logits = model.decode_step(last, pos, cross, &mut beam_cache, backend)?;
            let lp = log_softmax(&logits);

            for &idx in &top_indices(&lp, num_beams) {
                let token = idx as u32;
                let mut tokens = beam.tokens.clone();
                tokens.push(token);

                candidates.push(Hypothesis {
                    tokens,
                    log_prob: beam.log_prob + lp[idx],
                    cache: beam_cache.clone(),
                    finished: token == eos,
                });
            }
        }

        // Keep the best num_beams candidates.
        candidates.sort_by(|a, b| b.log_prob.total_cmp(&a.log_prob));
        candidates.truncate(num_beams);
        beams = candidates;
    }

    let best = beams
        .into_iter()
        .max_by(|a, b| a.log_prob.total_cmp(&b.log_prob))
        .map(|h| h.tokens)
        .unwrap_or_default();
    Ok(best)
}
