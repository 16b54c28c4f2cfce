use std::collections::HashMap;

use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::transition_node::{NodeId, TransitionNode, canonical};

/// Arena-backed transition table.
///
/// The table is the sole long-lived owner of every node it contains.
/// Nodes live in an append-only arena; the index maps a canonical key
/// (lower-cased, space-joined lexeme) to the node whose lexeme
/// canonicalizes to that key. Two instances exist per model: one keyed
/// by single tokens and one keyed by adjacent token pairs.
///
/// # Responsibilities
/// - Find-or-create nodes during training
/// - Resolve successor references for sampling
/// - Provide uniform and weighted random picks over a node's successors
/// - Merge with another table (parallel learning support)
///
/// # Invariants
/// - `index.len() == nodes.len()`; every node is reachable by its key
/// - Nodes are never removed and weights never decrease
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TransitionTable {
	/// Node arena. Ids are indices into this vector.
	nodes: Vec<TransitionNode>,
	/// Canonical key to node id.
	index: HashMap<String, NodeId>,
}

impl TransitionTable {
	/// Returns an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of nodes in the table.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the table holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Looks a node up by text, canonicalizing the argument.
	pub fn lookup(&self, text: &str) -> Option<NodeId> {
		self.index.get(&text.to_lowercase()).copied()
	}

	/// Borrows a node by id.
	pub fn node(&self, id: NodeId) -> &TransitionNode {
		&self.nodes[id.0]
	}

	fn node_mut(&mut self, id: NodeId) -> &mut TransitionNode {
		&mut self.nodes[id.0]
	}

	/// Appends a fresh node and indexes it under its canonical key.
	fn insert(&mut self, lexeme: &[&str], author: &str) -> NodeId {
		let key = canonical(lexeme);
		let id = NodeId(self.nodes.len());
		let owned = lexeme.iter().map(|t| (*t).to_owned()).collect();
		self.nodes.push(TransitionNode::new(owned, author));
		self.index.insert(key, id);
		id
	}

	/// Find-or-create for a lexeme observed in source position.
	///
	/// Creation starts the node at weight 1; revisiting an existing node
	/// records the author but does not increment the weight, which only
	/// counts observations of the node as a transition target.
	pub fn observe_source(&mut self, lexeme: &[&str], author: &str) -> NodeId {
		match self.index.get(&canonical(lexeme)).copied() {
			Some(id) => {
				self.node_mut(id).record_author(author);
				id
			}
			None => self.insert(lexeme, author),
		}
	}

	/// Find-or-create for a lexeme observed as the target of `from`.
	///
	/// An existing node gets its weight incremented and the author
	/// recorded; a new node starts at weight 1. The successor link from
	/// `from` is inserted idempotently, preserving insertion order.
	pub fn observe_target(&mut self, from: NodeId, lexeme: &[&str], author: &str) -> NodeId {
		let key = canonical(lexeme);
		let id = match self.index.get(&key).copied() {
			Some(id) => {
				self.node_mut(id).observe(author);
				id
			}
			None => self.insert(lexeme, author),
		};
		self.node_mut(from).link(key, id);
		id
	}

	/// Unweighted uniform pick over a node's successors.
	///
	/// The end sentinel is never returned: this pick selects the first
	/// real word of a sentence. Returns `None` when no candidate remains.
	pub fn pick_uniform<R: Rng + ?Sized>(&self, id: NodeId, rng: &mut R) -> Option<NodeId> {
		self.node(id)
			.successors()
			.iter()
			.copied()
			.filter(|&s| !self.node(s).is_end())
			.choose(rng)
	}

	/// Weighted pick over a node's successors.
	///
	/// The probability of selecting a successor is proportional to its
	/// table-level occurrence weight. Draws a uniform integer in
	/// `[0, totalWeight)` and subtracts candidate weights in insertion
	/// order until the draw falls inside a bucket, so the outcome is
	/// reproducible for a given table state under a fixed random source.
	///
	/// Returns `None` if the node has no successors.
	pub fn pick_weighted<R: Rng + ?Sized>(&self, id: NodeId, rng: &mut R) -> Option<NodeId> {
		let successors = self.node(id).successors();
		if successors.is_empty() {
			return None;
		}

		let total: usize = successors.iter().map(|&s| self.node(s).weight()).sum();
		if total == 0 {
			// Should not happen due to invariants, but kept for safety
			return None;
		}

		let mut r = rng.random_range(0..total);

		let mut fallback = None;
		for &s in successors {
			let weight = self.node(s).weight();
			if r < weight {
				return Some(s);
			}
			r -= weight;
			fallback = Some(s);
		}

		// Fallback: should not happen, but kept for safety.
		fallback
	}

	/// Merges another table into this one.
	///
	/// Nodes present in both tables have their weights summed and their
	/// authors unioned; nodes only present in `other` are imported in
	/// `other`'s arena order. Successor links are re-resolved by
	/// canonical key, keeping the receiver's insertion order first and
	/// appending links new to it.
	pub fn merge(&mut self, other: &Self) {
		for node in &other.nodes {
			match self.index.get(&node.canonical_key()).copied() {
				Some(id) => self.node_mut(id).absorb(node),
				None => {
					let id = NodeId(self.nodes.len());
					self.index.insert(node.canonical_key(), id);
					self.nodes.push(node.detached());
				}
			}
		}

		for node in &other.nodes {
			// Both lookups resolved by the pass above; should not panic
			let from = self.index[&node.canonical_key()];
			for &succ in node.successors() {
				let key = other.node(succ).canonical_key();
				let to = self.index[&key];
				self.node_mut(from).link(key, to);
			}
		}
	}
}
