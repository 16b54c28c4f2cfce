use log::trace;
use serde::{Deserialize, Serialize};

use super::chat_model::{END_TOKEN, START_TOKEN};
use super::config::ModelConfig;
use super::token_filter::TokenFilter;
use super::transition_table::TransitionTable;

/// Moderation-flags value meaning "no flags".
pub const NO_FLAGS: &str = "NULL";

/// Substring of the moderation flags denoting bannable content.
pub const BANNABLE_MARKER: &str = "bannable";

/// One already-parsed transcript row.
///
/// Deserialization from whatever format backs the transcript store
/// (CSV, JSON, a database cursor) is the supplier's responsibility;
/// additional fields in serialized sources are ignored.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TranscriptRow {
	/// Author of the message.
	pub username: String,
	/// Moderation flags, `"NULL"` when none were raised.
	pub flags: String,
	/// The message text.
	pub content: String,
}

impl TranscriptRow {
	pub fn new(
		username: impl Into<String>,
		flags: impl Into<String>,
		content: impl Into<String>,
	) -> Self {
		Self {
			username: username.into(),
			flags: flags.into(),
			content: content.into(),
		}
	}
}

/// Turns one transcript row into zero or more graph updates.
///
/// Borrows both tables for the duration of a single `learn` call; row
/// rejection is silent and local (a boolean result, never an error).
/// Mutation is monotone: nodes are never removed and weights never
/// decrease.
pub(crate) struct Trainer<'a> {
	config: &'a ModelConfig,
	filter: TokenFilter,
	unigrams: &'a mut TransitionTable,
	bigrams: &'a mut TransitionTable,
}

impl<'a> Trainer<'a> {
	pub(crate) fn new(
		config: &'a ModelConfig,
		unigrams: &'a mut TransitionTable,
		bigrams: &'a mut TransitionTable,
	) -> Self {
		Self {
			config,
			filter: TokenFilter::new(config.char_filter),
			unigrams,
			bigrams,
		}
	}

	/// Learns one row. Returns whether the row was accepted.
	///
	/// Row filters, in order:
	/// - safety: flags must equal the no-flags sentinel
	/// - bannable: flags must not contain the bannable marker
	/// - ignored users: case-insensitive username match
	/// - empty content after trimming
	///
	/// The trimmed content is split on single spaces, wrapped in the
	/// start/end sentinels, and turned into adjacent pairs for the
	/// unigram table and collapsed triples for the bigram table. A
	/// pair or triple is skipped when any of its tokens fails the
	/// token filter; tokens are checked individually so the sentinel
	/// bypass applies inside bigram lexemes.
	pub(crate) fn learn(&mut self, row: &TranscriptRow) -> bool {
		if self.config.safety_filter && row.flags != NO_FLAGS {
			trace!("row from '{}' skipped: moderation flags present", row.username);
			return false;
		}
		if self.config.bannable_filter && row.flags.contains(BANNABLE_MARKER) {
			trace!("row from '{}' skipped: bannable content flagged", row.username);
			return false;
		}
		if self.config.is_ignored(&row.username) {
			trace!("row from '{}' skipped: ignored user", row.username);
			return false;
		}

		let content = row.content.trim();
		if content.is_empty() {
			trace!("row from '{}' skipped: empty content", row.username);
			return false;
		}

		let mut tokens: Vec<&str> = Vec::with_capacity(content.len() / 4 + 2);
		tokens.push(START_TOKEN);
		tokens.extend(content.split(' '));
		tokens.push(END_TOKEN);

		let author = row.username.as_str();

		for pair in tokens.windows(2) {
			if !self.filter.is_legal(pair[0]) || !self.filter.is_legal(pair[1]) {
				continue;
			}
			let from = self.unigrams.observe_source(&pair[..1], author);
			self.unigrams.observe_target(from, &pair[1..], author);
		}

		for triple in tokens.windows(3) {
			if triple.iter().any(|token| !self.filter.is_legal(token)) {
				continue;
			}
			let from = self.bigrams.observe_source(&triple[..2], author);
			self.bigrams.observe_target(from, &triple[2..], author);
		}

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn learn_rows(config: &ModelConfig, rows: &[TranscriptRow]) -> (TransitionTable, TransitionTable, usize) {
		let mut unigrams = TransitionTable::new();
		let mut bigrams = TransitionTable::new();
		let mut accepted = 0;
		for row in rows {
			let mut trainer = Trainer::new(config, &mut unigrams, &mut bigrams);
			if trainer.learn(row) {
				accepted += 1;
			}
		}
		(unigrams, bigrams, accepted)
	}

	#[test]
	fn accepted_row_populates_both_tables() {
		let config = ModelConfig::default();
		let (unigrams, bigrams, accepted) =
			learn_rows(&config, &[TranscriptRow::new("a", NO_FLAGS, "hi there")]);

		assert_eq!(accepted, 1);
		// <start>, hi, there, <end>
		assert_eq!(unigrams.len(), 4);
		// "<start> hi", "hi there" plus the targets there and <end>
		assert_eq!(bigrams.len(), 4);
		assert!(bigrams.lookup("<start> hi").is_some());
		assert!(bigrams.lookup("hi there").is_some());
	}

	#[test]
	fn safety_filter_requires_the_no_flags_sentinel() {
		let mut config = ModelConfig::default();
		config.safety_filter = true;
		let (unigrams, bigrams, accepted) =
			learn_rows(&config, &[TranscriptRow::new("a", "spam", "hi there")]);
		assert_eq!(accepted, 0);
		assert!(unigrams.is_empty());
		assert!(bigrams.is_empty());
	}

	#[test]
	fn bannable_marker_rejects_the_row_entirely() {
		let config = ModelConfig::default();
		let (unigrams, bigrams, accepted) = learn_rows(
			&config,
			&[TranscriptRow::new("a", "flags: bannable", "hi there")],
		);
		assert_eq!(accepted, 0);
		assert!(unigrams.is_empty());
		assert!(bigrams.is_empty());
	}

	#[test]
	fn ignored_users_match_case_insensitively() {
		let mut config = ModelConfig::default();
		config.ignored_users.insert("spammer".to_owned());
		let (_, _, accepted) =
			learn_rows(&config, &[TranscriptRow::new("Spammer", NO_FLAGS, "hi there")]);
		assert_eq!(accepted, 0);
	}

	#[test]
	fn illegal_tokens_skip_their_pairs_but_not_the_row() {
		let config = ModelConfig::default();
		let (unigrams, _, accepted) =
			learn_rows(&config, &[TranscriptRow::new("a", NO_FLAGS, "hi ☃ there")]);
		assert_eq!(accepted, 1);
		// The snowman never enters the table, its neighbors survive
		assert!(unigrams.lookup("☃").is_none());
		assert!(unigrams.lookup("hi").is_some());
		assert!(unigrams.lookup("there").is_some());
	}

	#[test]
	fn whitespace_only_content_is_rejected() {
		let config = ModelConfig::default();
		let (unigrams, _, accepted) =
			learn_rows(&config, &[TranscriptRow::new("a", NO_FLAGS, "   ")]);
		assert_eq!(accepted, 0);
		assert!(unigrams.is_empty());
	}

	#[test]
	fn retraining_the_same_row_increments_target_weights_by_one() {
		let config = ModelConfig::default();
		let row = TranscriptRow::new("a", NO_FLAGS, "hi there");
		let (unigrams, _, _) = learn_rows(&config, &[row.clone(), row]);

		assert_eq!(unigrams.len(), 4);
		let there = unigrams.lookup("there").unwrap();
		assert_eq!(unigrams.node(there).weight(), 2);
		let end = unigrams.lookup(END_TOKEN).unwrap();
		assert_eq!(unigrams.node(end).weight(), 2);
	}
}
