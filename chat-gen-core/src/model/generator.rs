use std::collections::HashSet;

use log::debug;
use rand::Rng;

use super::config::ModelConfig;
use super::error::GenerateError;
use super::trace::GenerationTrace;
use super::transition_node::NodeId;
use super::transition_table::TransitionTable;

/// Relaxation added to the length accumulator each time an end pick is
/// rejected. The accumulator is fractional on purpose, matching the
/// source model's heuristic.
const LENGTH_RELAXATION: f64 = 0.1;

/// Trailing words at or below this many characters trigger the
/// keep-going override when an end pick was accepted.
const SHORT_WORD_LEN: usize = 3;

/// Chance to discard an accepted end pick after a short trailing word.
const KEEP_GOING_CHANCE: f64 = 0.8;

/// The context used for the next pick: the table that resolved it and
/// the node id inside that table.
enum Context {
	/// Resolved through the unigram table.
	Simple(NodeId),
	/// Resolved through the bigram table.
	Advanced(NodeId),
}

/// Walks the trained tables to produce one sentence.
///
/// Borrows both tables and the configuration read-only; all randomness
/// comes through the caller-supplied source. The source model expressed
/// its retries recursively; both retry policies here are loops with the
/// same observable distribution.
pub(crate) struct Generator<'a> {
	unigrams: &'a TransitionTable,
	bigrams: &'a TransitionTable,
	config: &'a ModelConfig,
}

impl<'a> Generator<'a> {
	pub(crate) fn new(
		unigrams: &'a TransitionTable,
		bigrams: &'a TransitionTable,
		config: &'a ModelConfig,
	) -> Self {
		Self {
			unigrams,
			bigrams,
			config,
		}
	}

	/// Generates one sentence from `seed`, rerunning complete walks
	/// that come out below the minimum length.
	///
	/// The rerun is unbounded by design: against well-trained tables it
	/// converges quickly, and a host wanting bounded latency must
	/// impose its own timeout around the call.
	///
	/// # Errors
	/// - `SeedNotFound` if `seed` has no entry in the unigram table
	/// - `PickFailed` if a node without usable successors is reached
	pub(crate) fn generate<R: Rng + ?Sized>(
		&self,
		seed: &str,
		rng: &mut R,
	) -> Result<(Vec<String>, GenerationTrace), GenerateError> {
		loop {
			let (words, trace) = self.walk(seed, rng)?;
			if words.len() >= self.config.min_length {
				return Ok((words, trace));
			}
			debug!(
				"walk produced {} tokens, below minimum {}; rerunning",
				words.len(),
				self.config.min_length
			);
		}
	}

	/// One complete walk from seed to termination.
	fn walk<R: Rng + ?Sized>(
		&self,
		seed: &str,
		rng: &mut R,
	) -> Result<(Vec<String>, GenerationTrace), GenerateError> {
		let seed_id = self
			.unigrams
			.lookup(seed)
			.ok_or_else(|| GenerateError::SeedNotFound(seed.to_owned()))?;
		let seed_node = self.unigrams.node(seed_id);
		let max_length = self.config.max_length.max(1);

		let mut words: Vec<String> = Vec::new();
		let mut visited: Vec<String> = vec![seed_node.canonical_key()];
		let mut authors: HashSet<String> = seed_node.authors().clone();
		let mut simple_count = 0usize;
		let mut advanced_count = 0usize;

		// The start sentinel is stripped from the output; any other
		// seed is the first word of the sentence.
		if !seed_node.is_start() {
			words.push(seed_node.first_word().to_owned());
		}

		// First real transition: unweighted uniform pick, so the walk
		// does not always open with the single most common word. The
		// end sentinel is not a first real word.
		let first = self
			.unigrams
			.pick_uniform(seed_id, rng)
			.ok_or(GenerateError::PickFailed)?;
		let first_node = self.unigrams.node(first);
		words.push(first_node.first_word().to_owned());
		visited.push(first_node.canonical_key());
		authors.extend(first_node.authors().iter().cloned());

		let mut context = self.resolve_context(
			seed_node.last_word(),
			first_node.first_word(),
			&mut simple_count,
			&mut advanced_count,
		)?;

		while words.len() < max_length {
			let (table, context_id) = self.context_parts(&context);
			let picked = self.pick_gated(table, context_id, words.len(), rng)?;
			let picked_node = table.node(picked);

			if picked_node.is_end() {
				// Degenerately short completions are mostly rerolled.
				let trailing = table.node(context_id).last_word();
				if trailing.chars().count() <= SHORT_WORD_LEN
					&& rng.random_range(0.0..1.0) < KEEP_GOING_CHANCE
				{
					continue;
				}
				break;
			}

			let previous = table.node(context_id).last_word().to_owned();
			words.push(picked_node.first_word().to_owned());
			visited.push(picked_node.canonical_key());
			authors.extend(picked_node.authors().iter().cloned());

			context = self.resolve_context(
				&previous,
				picked_node.first_word(),
				&mut simple_count,
				&mut advanced_count,
			)?;
		}

		let trace = GenerationTrace::new(
			seed_node.canonical_key(),
			simple_count,
			advanced_count,
			visited,
			authors,
		);
		Ok((words, trace))
	}

	/// Resolves the context for the next pick.
	///
	/// The bigram table is preferred, keyed by the previous word and the
	/// word just picked; the unigram entry for the picked word is the
	/// fallback. Neither resolving means the tables violate their
	/// construction invariants.
	fn resolve_context(
		&self,
		previous: &str,
		picked: &str,
		simple_count: &mut usize,
		advanced_count: &mut usize,
	) -> Result<Context, GenerateError> {
		let pair_key = format!("{previous} {picked}");
		if let Some(id) = self.bigrams.lookup(&pair_key) {
			*advanced_count += 1;
			return Ok(Context::Advanced(id));
		}
		if let Some(id) = self.unigrams.lookup(picked) {
			*simple_count += 1;
			return Ok(Context::Simple(id));
		}
		Err(GenerateError::PickFailed)
	}

	fn context_parts(&self, context: &Context) -> (&TransitionTable, NodeId) {
		match context {
			Context::Simple(id) => (self.unigrams, *id),
			Context::Advanced(id) => (self.bigrams, *id),
		}
	}

	/// Weighted pick with the end-sentinel gate.
	///
	/// A non-end candidate is returned as is. An end candidate must be
	/// accepted by the should-end heuristic; a rejected end pick redraws
	/// with the length accumulator relaxed, instead of excluding the
	/// candidate outright.
	fn pick_gated<R: Rng + ?Sized>(
		&self,
		table: &TransitionTable,
		id: NodeId,
		generated: usize,
		rng: &mut R,
	) -> Result<NodeId, GenerateError> {
		let mut length = generated as f64;
		loop {
			let picked = table
				.pick_weighted(id, rng)
				.ok_or(GenerateError::PickFailed)?;
			if !table.node(picked).is_end() {
				return Ok(picked);
			}
			if self.should_end(Some(length), rng) {
				return Ok(picked);
			}
			length += LENGTH_RELAXATION;
		}
	}

	/// Whether the sentence may end at the given generated length.
	///
	/// Draws a uniform integer in `[0, max_length)` and accepts iff the
	/// draw exceeds the remaining length requirement. `None` marks the
	/// first step and always accepts. The length is fractional because
	/// rejected end picks relax it in sub-integer steps.
	fn should_end<R: Rng + ?Sized>(&self, length: Option<f64>, rng: &mut R) -> bool {
		let Some(length) = length else {
			return true;
		};
		let max_length = self.config.max_length.max(1);
		let requirement = (max_length as f64 - length).max(0.0);
		rng.random_range(0..max_length) as f64 > requirement
	}
}
