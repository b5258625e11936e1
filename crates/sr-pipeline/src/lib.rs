//! `sr-pipeline` - The summarization pipeline for summary-runtime.
//!
//! Ties together model loading (`sr-model`), tensor compute (`sr-tensor`),
//! and decoding strategies (`sr-decode`) into a single load-then-summarize
//! surface, used by the `summarize` binary.

pub mod beam;
pub mod error;
pub mod pipeline;

pub use error::{PipelineError, Result};
pub use pipeline::SummaryPipeline;
