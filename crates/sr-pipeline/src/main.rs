use std::process::ExitCode;

use sr_decode::DecodeConfig;
use sr_model::ModelRepo;
use sr_pipeline::SummaryPipeline;
use sr_tensor::{enumerate_accelerators, first_accelerator};

/// Identifier of the summarization artifact expected in the local cache.
const MODEL_ID: &str = "summary-runtime/encdec-base-sum";

/// Survey paragraph condensed by the demo run.
const SURVEY_TEXT: &str = "Transformer-based sequence-to-sequence models have become the \
dominant approach to abstractive text summarization. An encoder reads the source document \
into contextualized hidden states, and an autoregressive decoder attends over those states \
while emitting the summary one token at a time. Pretraining on large corpora with denoising \
objectives, followed by task-specific fine-tuning, consistently improves the faithfulness \
and fluency of generated summaries. Subsequent work has extended these models to longer \
documents through sparse attention patterns, reduced their memory footprint through weight \
quantization, and studied decoding strategies ranging from greedy search to beam search and \
nucleus sampling. Despite this progress, summarization systems still struggle with factual \
consistency, and evaluating generated summaries remains an open research problem.";

fn main() -> ExitCode {
    env_logger::init();

    // Stage 1: device probe. Enumerated once; a missing accelerator is a
    // reported condition, not a crash, and the pipeline proceeds on CPU.
    let devices = enumerate_accelerators();
    match first_accelerator(&devices) {
        Ok(device) => println!("Device name: {}", device.name),
        Err(e) => eprintln!("{}", e),
    }

    // Stage 2: summarization. Every fault propagates here and exits nonzero.
    match run() {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> sr_pipeline::Result<String> {
    let repo = ModelRepo::from_env();
    let pipeline = SummaryPipeline::load(&repo, MODEL_ID)?;
    pipeline.summarize(SURVEY_TEXT, &DecodeConfig::default())
}
