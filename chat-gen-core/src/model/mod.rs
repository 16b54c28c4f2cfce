//! Top-level module for the chat generation system.
//!
//! This crate provides a two-resolution Markov text generator, including:
//! - Transition graph vertices (`TransitionNode`)
//! - Arena-backed transition tables (`TransitionTable`)
//! - Transcript ingestion with moderation filters (`Trainer`)
//! - Weighted sentence generation with length heuristics
//! - Per-run introspection (`GenerationTrace`)

/// High-level interface owning the trained tables.
///
/// Exposes training, generation, configuration updates, merging and
/// binary snapshots.
pub mod chat_model;

/// Flat configuration surface consumed by training and generation.
///
/// Supports later-wins shallow merging of partial updates.
pub mod config;

/// Typed generation failures.
pub mod error;

/// Internal sentence walk logic.
///
/// Handles the bigram-preferred context cursor, weighted sampling with
/// the end-sentinel gate, and the minimum-length rerun policy.
/// This module is not exposed publicly.
mod generator;

/// Character-level legality predicate for ingested tokens.
pub mod token_filter;

/// Read-only summary of one generation run.
pub mod trace;

/// Transcript row ingestion.
///
/// Applies the row-level moderation filters and turns accepted rows
/// into transition observations on both tables.
pub mod trainer;

/// A single vertex of the transition graph.
///
/// Tracks the lexeme, its occurrence weight, contributing authors and
/// insertion-ordered successor references.
pub mod transition_node;

/// Arena-backed mapping from canonical key to transition node.
///
/// Owns every node it contains; successor relationships are node ids
/// resolved back into the same table.
pub mod transition_table;
