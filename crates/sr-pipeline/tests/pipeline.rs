//! End-to-end pipeline tests over a synthetic GGUF artifact.
//!
//! A tiny encoder-decoder model (d_model 4, one layer each side) is written
//! to a temporary cache directory, then loaded and driven through each
//! decoding strategy.

use sr_decode::DecodeConfig;
use sr_model::{ModelError, ModelRepo};
use sr_pipeline::{PipelineError, SummaryPipeline};

const MODEL_ID: &str = "acme/tiny-sum";

const D_MODEL: usize = 4;
const N_HEADS: u32 = 2;
const N_FF: usize = 8;
const ENC_CTX: usize = 16;
const DEC_CTX: usize = 8;

// Every non-control token decodes to plain text that re-encodes to at most
// as many tokens, so token-count assertions on decoded summaries are sound.
const TOKENS: &[&str] = &[
    "<s>", "</s>", "<pad>", "e", "a", "b", "c", "d", " ", "ab",
];

// --- GGUF writing helpers -------------------------------------------------

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn kv_u32(buf: &mut Vec<u8>, key: &str, value: u32) {
    put_str(buf, key);
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf.extend_from_slice(&value.to_le_bytes());
}

fn kv_f32(buf: &mut Vec<u8>, key: &str, value: f32) {
    put_str(buf, key);
    buf.extend_from_slice(&6u32.to_le_bytes());
    buf.extend_from_slice(&value.to_le_bytes());
}

fn kv_str(buf: &mut Vec<u8>, key: &str, value: &str) {
    put_str(buf, key);
    buf.extend_from_slice(&8u32.to_le_bytes());
    put_str(buf, value);
}

fn kv_str_array(buf: &mut Vec<u8>, key: &str, items: &[&str]) {
    put_str(buf, key);
    buf.extend_from_slice(&9u32.to_le_bytes());
    buf.extend_from_slice(&8u32.to_le_bytes()); // element type: string
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for item in items {
        put_str(buf, item);
    }
}

fn kv_f32_array(buf: &mut Vec<u8>, key: &str, items: &[f32]) {
    put_str(buf, key);
    buf.extend_from_slice(&9u32.to_le_bytes());
    buf.extend_from_slice(&6u32.to_le_bytes()); // element type: f32
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for item in items {
        buf.extend_from_slice(&item.to_le_bytes());
    }
}

struct TensorSpec {
    name: String,
    dims: Vec<u64>,
    data: Vec<f32>,
}

fn tensor(name: &str, dims: &[u64], data: Vec<f32>) -> TensorSpec {
    assert_eq!(
        dims.iter().product::<u64>() as usize,
        data.len(),
        "bad fixture tensor {}",
        name
    );
    TensorSpec {
        name: name.to_string(),
        dims: dims.to_vec(),
        data,
    }
}

// Small deterministic pseudo-random values.
fn pattern(n: usize, seed: f32) -> Vec<f32> {
    (0..n).map(|i| ((i as f32 + seed) * 0.7).sin() * 0.1).collect()
}

fn ones(n: usize) -> Vec<f32> {
    vec![1.0; n]
}

fn zeros(n: usize) -> Vec<f32> {
    vec![0.0; n]
}

// Attention projections + bias for one block, with per-tensor seeds.
fn push_attention(tensors: &mut Vec<TensorSpec>, base: &str, seed: f32) {
    let d = D_MODEL as u64;
    for (i, proj) in ["q", "k", "v", "out"].iter().enumerate() {
        tensors.push(tensor(
            &format!("{}_{}.weight", base, proj),
            &[d, d],
            pattern(D_MODEL * D_MODEL, seed + i as f32),
        ));
        tensors.push(tensor(
            &format!("{}_{}.bias", base, proj),
            &[d],
            vec![0.01; D_MODEL],
        ));
    }
}

fn push_norm(tensors: &mut Vec<TensorSpec>, name: &str) {
    tensors.push(tensor(&format!("{}.weight", name), &[D_MODEL as u64], ones(D_MODEL)));
    tensors.push(tensor(&format!("{}.bias", name), &[D_MODEL as u64], zeros(D_MODEL)));
}

fn push_ffn(tensors: &mut Vec<TensorSpec>, prefix: &str, seed: f32) {
    tensors.push(tensor(
        &format!("{}.ffn_up.weight", prefix),
        &[N_FF as u64, D_MODEL as u64],
        pattern(N_FF * D_MODEL, seed),
    ));
    tensors.push(tensor(&format!("{}.ffn_up.bias", prefix), &[N_FF as u64], zeros(N_FF)));
    tensors.push(tensor(
        &format!("{}.ffn_down.weight", prefix),
        &[D_MODEL as u64, N_FF as u64],
        pattern(D_MODEL * N_FF, seed + 1.0),
    ));
    tensors.push(tensor(
        &format!("{}.ffn_down.bias", prefix),
        &[D_MODEL as u64],
        zeros(D_MODEL),
    ));
    push_norm(tensors, &format!("{}.ffn_norm", prefix));
}

fn fixture_tensors() -> Vec<TensorSpec> {
    let mut tensors = Vec::new();
    let d = D_MODEL as u64;

    tensors.push(tensor(
        "token_embd.weight",
        &[TOKENS.len() as u64, d],
        pattern(TOKENS.len() * D_MODEL, 10.0),
    ));
    tensors.push(tensor(
        "enc.pos_embd.weight",
        &[ENC_CTX as u64, d],
        pattern(ENC_CTX * D_MODEL, 20.0),
    ));
    tensors.push(tensor(
        "dec.pos_embd.weight",
        &[DEC_CTX as u64, d],
        pattern(DEC_CTX * D_MODEL, 30.0),
    ));
    push_norm(&mut tensors, "enc.embd_norm");
    push_norm(&mut tensors, "dec.embd_norm");

    push_attention(&mut tensors, "enc.blk.0.attn", 40.0);
    push_norm(&mut tensors, "enc.blk.0.attn_norm");
    push_ffn(&mut tensors, "enc.blk.0", 50.0);

    push_attention(&mut tensors, "dec.blk.0.attn", 60.0);
    push_norm(&mut tensors, "dec.blk.0.attn_norm");
    push_attention(&mut tensors, "dec.blk.0.cross", 70.0);
    push_norm(&mut tensors, "dec.blk.0.cross_norm");
    push_ffn(&mut tensors, "dec.blk.0", 80.0);

    // No output.weight: the LM head ties to the token embedding.
    tensors
}

fn fixture_bytes() -> Vec<u8> {
    const ALIGN: usize = 32;
    let tensors = fixture_tensors();

    let mut kv = Vec::new();
    let mut n_kv = 0u64;

    kv_str(&mut kv, "general.architecture", "encdec");
    kv_u32(&mut kv, "encdec.embedding_length", D_MODEL as u32);
    kv_u32(&mut kv, "encdec.attention.head_count", N_HEADS);
    kv_u32(&mut kv, "encdec.encoder.block_count", 1);
    kv_u32(&mut kv, "encdec.decoder.block_count", 1);
    kv_u32(&mut kv, "encdec.feed_forward_length", N_FF as u32);
    kv_f32(&mut kv, "encdec.attention.layer_norm_epsilon", 1e-5);
    kv_u32(&mut kv, "encdec.encoder.context_length", ENC_CTX as u32);
    kv_u32(&mut kv, "encdec.decoder.context_length", DEC_CTX as u32);
    n_kv += 9;

    kv_str_array(&mut kv, "tokenizer.ggml.tokens", TOKENS);
    kv_f32_array(&mut kv, "tokenizer.ggml.scores", &zeros(TOKENS.len()));
    kv_str_array(&mut kv, "tokenizer.ggml.merges", &["a b"]);
    kv_u32(&mut kv, "tokenizer.ggml.bos_token_id", 0);
    kv_u32(&mut kv, "tokenizer.ggml.eos_token_id", 1);
    kv_u32(&mut kv, "tokenizer.ggml.padding_token_id", 2);
    n_kv += 6;

    // Per-tensor offsets within the data section, each aligned.
    let mut offsets = Vec::with_capacity(tensors.len());
    let mut cursor = 0usize;
    for spec in &tensors {
        cursor = (cursor + ALIGN - 1) & !(ALIGN - 1);
        offsets.push(cursor);
        cursor += spec.data.len() * 4;
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(b"GGUF");
    buf.extend_from_slice(&3u32.to_le_bytes());
    buf.extend_from_slice(&(tensors.len() as u64).to_le_bytes());
    buf.extend_from_slice(&n_kv.to_le_bytes());
    buf.extend_from_slice(&kv);

    for (spec, &offset) in tensors.iter().zip(&offsets) {
        put_str(&mut buf, &spec.name);
        buf.extend_from_slice(&(spec.dims.len() as u32).to_le_bytes());
        for &dim in &spec.dims {
            buf.extend_from_slice(&dim.to_le_bytes());
        }
        buf.extend_from_slice(&0u32.to_le_bytes()); // F32
        buf.extend_from_slice(&(offset as u64).to_le_bytes());
    }

    // Align the start of the tensor data section.
    while buf.len() % ALIGN != 0 {
        buf.push(0);
    }

    let mut data_pos = 0usize;
    for (spec, &offset) in tensors.iter().zip(&offsets) {
        while data_pos < offset {
            buf.push(0);
            data_pos += 1;
        }
        for value in &spec.data {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        data_pos += spec.data.len() * 4;
    }

    buf
}

// Write the fixture into a fresh cache directory and return a repo over it.
fn fixture_repo() -> (tempfile::TempDir, ModelRepo) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme--tiny-sum.gguf");
    std::fs::write(&path, fixture_bytes()).unwrap();
    let repo = ModelRepo::with_root(dir.path());
    (dir, repo)
}

const SOURCE: &str = "ab c d ab c d ab";

// --- Tests ----------------------------------------------------------------

#[test]
fn unknown_model_id_fails_before_generation() {
    let dir = tempfile::tempdir().unwrap();
    let repo = ModelRepo::with_root(dir.path());

    let err = SummaryPipeline::load(&repo, "acme/missing").unwrap_err();
    match err {
        PipelineError::Model(ModelError::ModelNotFound(id)) => {
            assert_eq!(id, "acme/missing");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn corrupt_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("acme--tiny-sum.gguf"), b"not a gguf file").unwrap();
    let repo = ModelRepo::with_root(dir.path());

    let err = SummaryPipeline::load(&repo, MODEL_ID).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Model(ModelError::InvalidMagic(_))
    ));
}

#[test]
fn greedy_summary_is_bounded_and_deterministic() {
    let (_dir, repo) = fixture_repo();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID).unwrap();

    let mut config = DecodeConfig::greedy();
    config.max_length = 6;

    let summary = pipeline.summarize(SOURCE, &config).unwrap();

    // The generated sequence is capped well below the source length.
    let source_tokens = pipeline.tokenizer().encode(SOURCE).len();
    let summary_tokens = pipeline.tokenizer().encode(&summary).len();
    assert!(source_tokens > config.max_length);
    assert!(summary_tokens <= config.max_length);

    // Control tokens never leak into the output text.
    for special in ["<s>", "</s>", "<pad>"] {
        assert!(!summary.contains(special));
    }

    // Greedy decoding is deterministic across runs.
    let again = pipeline.summarize(SOURCE, &config).unwrap();
    assert_eq!(summary, again);
}

#[test]
fn beam_summary_completes() {
    let (_dir, repo) = fixture_repo();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID).unwrap();

    let mut config = DecodeConfig::beam(2);
    config.max_length = 4;

    let summary = pipeline.summarize(SOURCE, &config).unwrap();
    let summary_tokens = pipeline.tokenizer().encode(&summary).len();
    assert!(summary_tokens <= config.max_length);
}

#[test]
fn sampling_summary_is_reproducible_per_seed() {
    let (_dir, repo) = fixture_repo();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID).unwrap();

    let mut config = DecodeConfig::sampling(42);
    config.max_length = 5;

    let a = pipeline.summarize(SOURCE, &config).unwrap();
    let b = pipeline.summarize(SOURCE, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_source_is_rejected() {
    let (_dir, repo) = fixture_repo();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID).unwrap();

    let err = pipeline.summarize("", &DecodeConfig::greedy()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptySource));
}

#[test]
fn long_source_is_truncated_to_encoder_context() {
    let (_dir, repo) = fixture_repo();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID).unwrap();

    // 40 tokens of source against a 16-position encoder context.
    let long_source = "ab ".repeat(20);
    let mut config = DecodeConfig::greedy();
    config.max_length = 3;

    // Truncation happens inside the pipeline; the call must still succeed.
    pipeline.summarize(&long_source, &config).unwrap();
}
