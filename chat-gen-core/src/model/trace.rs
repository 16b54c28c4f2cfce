use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Read-only summary of one generation run.
///
/// Created fresh at the end of a successful walk and immutable
/// afterward; each generation call supersedes the previous trace.
///
/// # Fields
/// - the seed key the run started from
/// - how many transitions resolved through the bigram table (advanced)
///   versus the unigram fallback (simple)
/// - the canonical keys of the emitted nodes in traversal order, which
///   is the generated sentence
/// - the union of contributing authors across those nodes
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenerationTrace {
	seed: String,
	simple_count: usize,
	advanced_count: usize,
	visited: Vec<String>,
	authors: HashSet<String>,
}

impl GenerationTrace {
	pub(crate) fn new(
		seed: String,
		simple_count: usize,
		advanced_count: usize,
		visited: Vec<String>,
		authors: HashSet<String>,
	) -> Self {
		Self {
			seed,
			simple_count,
			advanced_count,
			visited,
			authors,
		}
	}

	/// The starting key used for the run.
	pub fn seed(&self) -> &str {
		&self.seed
	}

	/// Transitions resolved via the unigram fallback.
	pub fn simple_count(&self) -> usize {
		self.simple_count
	}

	/// Transitions resolved via the bigram table.
	pub fn advanced_count(&self) -> usize {
		self.advanced_count
	}

	/// Canonical keys of the visited nodes, in traversal order.
	pub fn visited(&self) -> &[String] {
		&self.visited
	}

	/// Union of contributing authors across the visited nodes.
	pub fn authors(&self) -> &HashSet<String> {
		&self.authors
	}

	/// Share of advanced resolutions, as a percentage.
	///
	/// `None` when the walk resolved zero transitions, which would
	/// otherwise divide by zero.
	pub fn advanced_ratio(&self) -> Option<f32> {
		let total = self.advanced_count + self.simple_count;
		if total == 0 {
			return None;
		}
		Some(self.advanced_count as f32 / total as f32 * 100.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ratio_is_guarded_against_empty_walks() {
		let trace = GenerationTrace::new("x".to_owned(), 0, 0, Vec::new(), HashSet::new());
		assert_eq!(trace.advanced_ratio(), None);
	}

	#[test]
	fn ratio_mixes_both_resolutions() {
		let trace = GenerationTrace::new("x".to_owned(), 1, 3, Vec::new(), HashSet::new());
		assert_eq!(trace.advanced_ratio(), Some(75.0));
	}
}
