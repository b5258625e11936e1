//! `sr-decode` - Decoding strategies for summary-runtime.
//!
//! This crate provides:
//! - An explicit `DecodeConfig` naming the strategy (greedy, beam, sampling)
//! - A chain of logit transforms ending in a token selector
//! - Log-probability helpers used by beam search

pub mod chain;
pub mod config;
pub mod filters;
pub mod logits;
pub mod select;

pub use chain::{DecodeChain, LogitTransform, TokenScore};
pub use config::{DecodeConfig, DecodeStrategy};
pub use filters::{RepetitionPenalty, Temperature, TopK, TopP};
pub use logits::{log_softmax, top_indices};
pub use select::{Argmax, Stochastic};
