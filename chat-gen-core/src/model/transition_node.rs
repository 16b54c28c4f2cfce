use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::chat_model::{END_TOKEN, START_TOKEN};

/// Stable handle to a node inside its owning `TransitionTable`.
///
/// Nodes are owned exclusively by their table; every successor
/// relationship is stored as a `NodeId` resolved back into the same
/// table on access, never as a second owning pointer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Computes the canonical key of a lexeme: lower-cased, space-joined.
pub(crate) fn canonical<S: AsRef<str>>(lexeme: &[S]) -> String {
	lexeme
		.iter()
		.map(AsRef::as_ref)
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
}

/// A vertex of the transition graph.
///
/// A node corresponds to one lexical unit (a single token, or a token
/// pair for the bigram layer) and stores all observed transitions out of
/// it.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// lead to other nodes of the same table, and sampling is weighted by
/// the successor nodes' occurrence counts.
///
/// ## Responsibilities:
/// - Accumulate occurrence weight and contributing authors during training
/// - Keep successors in insertion order for reproducible weighted sampling
/// - Merge with another node having the same lexeme (parallel learning support)
///
/// ## Invariants
/// - `weight` is strictly positive (starts at 1 on creation)
/// - `successors` and `successor_keys` contain exactly the same ids
/// - The lexeme keeps the casing of its first observation; canonical
///   lookups are case-folded by the owning table
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransitionNode {
	/// Ordered sequence of 1..2 tokens forming the lexical unit.
	lexeme: Vec<String>,
	/// Occurrence count, used as the sampling probability numerator.
	weight: usize,
	/// Authors that ever produced this transition. Duplicates collapse.
	authors: HashSet<String>,
	/// Successor ids in insertion order. Drives weighted sampling.
	successors: Vec<NodeId>,
	/// Canonical successor text mapped to the entry in `successors`.
	successor_keys: HashMap<String, NodeId>,
}

impl TransitionNode {
	/// Creates a node at weight 1 with a single contributing author.
	pub(crate) fn new(lexeme: Vec<String>, author: &str) -> Self {
		let mut authors = HashSet::new();
		authors.insert(author.to_owned());
		Self {
			lexeme,
			weight: 1,
			authors,
			successors: Vec::new(),
			successor_keys: HashMap::new(),
		}
	}

	/// The tokens of this lexical unit.
	pub fn lexeme(&self) -> &[String] {
		&self.lexeme
	}

	/// Canonical key of this node (lower-cased, space-joined lexeme).
	pub fn canonical_key(&self) -> String {
		canonical(&self.lexeme)
	}

	/// First token of the lexeme.
	pub fn first_word(&self) -> &str {
		&self.lexeme[0]
	}

	/// Last token of the lexeme.
	///
	/// For single-token nodes this is the same as `first_word`.
	pub fn last_word(&self) -> &str {
		// Nodes are never built from an empty lexeme
		&self.lexeme[self.lexeme.len() - 1]
	}

	/// Occurrence count of this node.
	pub fn weight(&self) -> usize {
		self.weight
	}

	/// Authors that contributed observations of this node.
	pub fn authors(&self) -> &HashSet<String> {
		&self.authors
	}

	/// Successor ids in insertion order.
	pub fn successors(&self) -> &[NodeId] {
		&self.successors
	}

	/// Resolves a successor by its canonical text, if present.
	pub fn successor(&self, text: &str) -> Option<NodeId> {
		self.successor_keys.get(&text.to_lowercase()).copied()
	}

	/// Whether this node is the start sentinel.
	pub fn is_start(&self) -> bool {
		self.lexeme.len() == 1 && self.lexeme[0] == START_TOKEN
	}

	/// Whether this node is the end sentinel.
	pub fn is_end(&self) -> bool {
		self.lexeme.len() == 1 && self.lexeme[0] == END_TOKEN
	}

	/// Records one more observation of this node as a transition target.
	pub(crate) fn observe(&mut self, author: &str) {
		self.weight += 1;
		self.record_author(author);
	}

	/// Adds a contributing author without touching the weight.
	pub(crate) fn record_author(&mut self, author: &str) {
		if !self.authors.contains(author) {
			self.authors.insert(author.to_owned());
		}
	}

	/// Links a successor, preserving insertion order.
	///
	/// Linking an already-present key is a no-op: weight and author
	/// bookkeeping happen on the target node itself.
	pub(crate) fn link(&mut self, key: String, id: NodeId) {
		if self.successor_keys.contains_key(&key) {
			return;
		}
		self.successor_keys.insert(key, id);
		self.successors.push(id);
	}

	/// Sums weights and unions authors with a node of the same lexeme.
	///
	/// Successor links are re-resolved by the owning table, as ids from
	/// another arena are meaningless here.
	pub(crate) fn absorb(&mut self, other: &Self) {
		self.weight += other.weight;
		for author in &other.authors {
			self.record_author(author);
		}
	}

	/// Clone of this node without its successor links.
	///
	/// Used when importing a node from another table during a merge.
	pub(crate) fn detached(&self) -> Self {
		Self {
			lexeme: self.lexeme.clone(),
			weight: self.weight,
			authors: self.authors.clone(),
			successors: Vec::new(),
			successor_keys: HashMap::new(),
		}
	}
}
