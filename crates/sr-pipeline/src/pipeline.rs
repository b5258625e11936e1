use log::{debug, info, warn};

use sr_decode::{DecodeChain, DecodeConfig, DecodeStrategy};
use sr_model::encdec::{CrossCache, Seq2SeqModel};
use sr_model::gguf::GgufFile;
use sr_model::tokenizer::BpeTokenizer;
use sr_model::{ModelRepo, Seq2SeqArchitecture};
use sr_tensor::{ComputeBackend, CpuBackend};

use crate::beam;
use crate::error::{PipelineError, Result};

/// The summarization pipeline: a loaded encoder-decoder model, its
/// tokenizer, and a compute backend.
///
/// One call to [`SummaryPipeline::summarize`] tokenizes exactly one source
/// text and produces exactly one generated sequence; decoding state is local
/// to the call, so successive calls do not see each other.
pub struct SummaryPipeline {
    model: Seq2SeqModel,
    tokenizer: BpeTokenizer,
    backend: Box<dyn ComputeBackend>,
}

impl std::fmt::Debug for SummaryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryPipeline")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl SummaryPipeline {
    /// Resolve `model_id` in `repo` and load both the model weights and the
    /// tokenizer from the resolved GGUF artifact.
    ///
    /// Weights stored in F16/Q4_0/Q8_0 are converted to f32 here; nothing is
    /// deferred to generation time.
    pub fn load(repo: &ModelRepo, model_id: &str) -> Result<SummaryPipeline> {
        let path = repo.resolve(model_id)?;
        info!("loading model {} from {}", model_id, path.display());

        let gguf = GgufFile::open(&path)?;
        let tokenizer = BpeTokenizer::from_gguf(&gguf.metadata)?;
        let model = Seq2SeqModel::from_gguf(&gguf)?;

        info!(
            "loaded {} encoder / {} decoder layers, vocab size {}",
            model.config.n_enc_layers, model.config.n_dec_layers, model.config.n_vocab
        );

        Ok(SummaryPipeline {
            model,
            tokenizer,
            backend: Box::new(CpuBackend::new()),
        })
    }

    /// Returns the loaded model.
    pub fn model(&self) -> &Seq2SeqModel {
        &self.model
    }

    /// Returns the loaded tokenizer.
    pub fn tokenizer(&self) -> &BpeTokenizer {
        &self.tokenizer
    }

    /// Summarize one source text under an explicit decoding configuration.
    ///
    /// Steps: encode the text to token IDs (truncated to the encoder's
    /// context length), run the encoder, project cross-attention keys and
    /// values, decode autoregressively per `config`, then map the generated
    /// IDs back to text with control tokens stripped.
    pub fn summarize(&self, text: &str, config: &DecodeConfig) -> Result<String> {
        let mut src = self.tokenizer.encode(text);
        if src.is_empty() {
            return Err(PipelineError::EmptySource);
        }

        let max_src = self.model.config.max_source_positions;
        if src.len() > max_src {
            warn!("source truncated from {} to {} tokens", src.len(), max_src);
            src.truncate(max_src);
        }
        debug!("source tokens: {}", src.len());

        let backend = self.backend.as_ref();
        let states = self.model.encode(&src, backend)?;
        let cross = self.model.project_cross(&states, backend)?;

        let start = self
            .model
            .config
            .decoder_start_id
            .unwrap_or_else(|| self.tokenizer.bos_id());
        let eos = self.tokenizer.eos_id();
        let max_length = config.max_length.min(self.model.config.max_target_positions);

        let generated = match config.strategy {
            DecodeStrategy::Beam { num_beams } => beam::beam_search(
                &self.model,
                &cross,
                start,
                eos,
                num_beams,
                max_length,
                backend,
            )?,
            _ => self.decode_single(&cross, start, eos, max_length, config)?,
        };
        debug!("generated tokens: {}", generated.len());

        Ok(self.tokenizer.decode_stripped(&generated))
    }

    /// Single-path decoding (greedy or sampling) through a `DecodeChain`.
    fn decode_single(
        &self,
        cross: &CrossCache,
        start: u32,
        eos: u32,
        max_length: usize,
        config: &DecodeConfig,
    ) -> Result<Vec<u32>> {
        let chain = DecodeChain::from_config(config);
        let mut cache = self.model.decoder_cache();
        let mut generated = Vec::new();
        let backend = self.backend.as_ref();

        let mut token = start;
        for pos in 0..max_length {
            let logits = self.model.decode_step(token, pos, cross, &mut cache, backend)?;
            let next = chain.select(&logits, &generated);
            if next == eos {
                break;
            }
            generated.push(next);
            token = next;
        }

        Ok(generated)
    }
}
