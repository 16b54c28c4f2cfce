//! Chat-transcript Markov generation library.
//!
//! This crate trains a weighted transition graph from historical chat
//! transcripts and generates synthetic chat-like sentences from it:
//! - Word-level transition tables at two context resolutions
//!   (single token and adjacent token pair)
//! - Weighted random generation with a bigram-preferred lookup policy
//! - Stochastic sentence-length heuristics
//! - A per-run generation trace for observability
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Core transition model, training and generation logic.
///
/// This module exposes the high-level model interface while keeping
/// internal walk mechanics private.
pub mod model;
