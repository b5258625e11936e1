//! `sr-model` - Model loading for summary-runtime.
//!
//! This crate provides:
//! - GGUF container parsing with mmap-backed tensor access
//! - A BPE tokenizer loaded from GGUF metadata
//! - The encoder-decoder transformer used for summarization
//! - Resolution of model identifiers against the local artifact cache

pub mod architecture;
pub mod encdec;
pub mod error;
pub mod gguf;
pub mod repo;
pub mod tokenizer;

pub use architecture::Seq2SeqArchitecture;
pub use error::{ModelError, Result};
pub use repo::ModelRepo;
