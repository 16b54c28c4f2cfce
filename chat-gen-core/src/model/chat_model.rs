use std::sync::mpsc;
use std::thread;

use log::debug;
use serde::{Deserialize, Serialize};

use super::config::{ConfigPatch, ModelConfig};
use super::error::GenerateError;
use super::generator::Generator;
use super::trace::GenerationTrace;
use super::trainer::{Trainer, TranscriptRow};
use super::transition_table::TransitionTable;

/// Reserved token marking the synthetic beginning of a trained sentence.
pub const START_TOKEN: &str = "<start>";

/// Reserved token marking the synthetic end of a trained sentence.
pub const END_TOKEN: &str = "<end>";

/// The trained chat model: two transition tables and their configuration.
///
/// This struct manages:
/// - `unigrams`: the table keyed by single tokens.
/// - `bigrams`: the table keyed by adjacent token pairs, preferred
///   during generation for better local coherence.
/// - `config`: the flat configuration surface for training filters and
///   sentence-length bounds.
/// - `last_trace`: the trace of the most recent generation run.
///
/// Tables grow only during training and are read-only during
/// generation. The model performs no internal locking; a host running
/// training and generation concurrently must serialize access itself.
#[derive(Serialize, Deserialize, Debug)]
pub struct ChatModel {
	config: ModelConfig,
	unigrams: TransitionTable,
	bigrams: TransitionTable,
	last_trace: Option<GenerationTrace>,
}

impl Default for ChatModel {
	fn default() -> Self {
		Self::new(ModelConfig::default())
	}
}

impl ChatModel {
	/// Returns an empty model with the given configuration.
	pub fn new(mut config: ModelConfig) -> Self {
		config.normalize();
		Self {
			config,
			unigrams: TransitionTable::new(),
			bigrams: TransitionTable::new(),
			last_trace: None,
		}
	}

	/// Builds a model from a full transcript pass, in parallel.
	///
	/// Splits the rows into chunks (based on CPU cores * factor),
	/// trains a partial model per chunk on its own thread, and merges
	/// all partial models into the final one. Behaviorally equivalent
	/// to training every row sequentially; see `merge` for the one
	/// bookkeeping difference on source-only nodes.
	///
	/// # Notes
	/// - Uses MPSC channels to collect partial models from threads.
	/// - Row rejection counting is per-partial and logged, not returned.
	pub fn from_rows(rows: Vec<TranscriptRow>, config: ModelConfig) -> Self {
		if rows.is_empty() {
			return Self::new(config);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = (rows.len() + chunks - 1) / chunks;

		let (tx, rx) = mpsc::channel();
		for chunk in rows.chunks(chunk_size.max(1)) {
			let tx = tx.clone();
			let chunk: Vec<TranscriptRow> = chunk.to_vec();
			let config = config.clone();

			thread::spawn(move || {
				let mut partial = ChatModel::new(config);
				let mut accepted = 0usize;
				for row in &chunk {
					if partial.train(row) {
						accepted += 1;
					}
				}
				debug!("partial model learned {accepted}/{} rows", chunk.len());
				tx.send(partial).expect("Failed to send from thread");
			});
		}
		drop(tx);

		let mut model = Self::new(config);
		for partial in rx.iter() {
			model.merge(&partial);
		}
		model
	}

	/// Learns one transcript row.
	///
	/// Returns whether the row was accepted; a row rejected by any
	/// training filter is silently skipped, never an error.
	pub fn train(&mut self, row: &TranscriptRow) -> bool {
		let mut trainer = Trainer::new(&self.config, &mut self.unigrams, &mut self.bigrams);
		trainer.learn(row)
	}

	/// Generates one sentence seeded at the start sentinel.
	///
	/// # Errors
	/// - `SeedNotFound` when the model has never been trained
	/// - `PickFailed` on a structurally broken table
	pub fn generate(&mut self) -> Result<String, GenerateError> {
		self.generate_from(START_TOKEN)
	}

	/// Generates one sentence from a custom seed word.
	///
	/// The seed word stays in the sentence unless it is the start
	/// sentinel. No partial result is returned on failure.
	pub fn generate_from(&mut self, seed: &str) -> Result<String, GenerateError> {
		let generator = Generator::new(&self.unigrams, &self.bigrams, &self.config);
		let mut rng = rand::rng();
		let (words, trace) = generator.generate(seed, &mut rng)?;
		self.last_trace = Some(trace);
		Ok(words.join(" "))
	}

	/// Trace of the most recent successful generation, if any.
	pub fn last_trace(&self) -> Option<&GenerationTrace> {
		self.last_trace.as_ref()
	}

	/// Merges a partial configuration over the current one, later-wins.
	///
	/// # Errors
	/// Returns an error if the merged lengths are unusable; the current
	/// configuration is left untouched in that case.
	pub fn update_config(&mut self, patch: ConfigPatch) -> Result<(), String> {
		self.config.apply(patch)
	}

	/// Read-only view of the current configuration.
	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// The unigram transition table.
	pub fn unigrams(&self) -> &TransitionTable {
		&self.unigrams
	}

	/// The bigram transition table.
	pub fn bigrams(&self) -> &TransitionTable {
		&self.bigrams
	}

	/// Number of distinct single-token lexemes learned.
	pub fn vocabulary(&self) -> usize {
		self.unigrams.len()
	}

	/// Merges another model's tables into this one.
	///
	/// Weights are summed and authors unioned per canonical key. The
	/// receiver's configuration and last trace are kept. Source-only
	/// nodes (the start sentinel and bigram pair lexemes) count their
	/// creation once per merged model; such nodes never appear in a
	/// successor list, so sampling is unaffected.
	pub fn merge(&mut self, other: &Self) {
		self.unigrams.merge(&other.unigrams);
		self.bigrams.merge(&other.bigrams);
	}

	/// Serializes the model to compact bytes.
	///
	/// Durable storage of the bytes is the caller's concern; the core
	/// performs no disk I/O of its own.
	pub fn snapshot(&self) -> Result<Vec<u8>, postcard::Error> {
		postcard::to_stdvec(self)
	}

	/// Restores a model from bytes produced by `snapshot`.
	pub fn from_snapshot(bytes: &[u8]) -> Result<Self, postcard::Error> {
		postcard::from_bytes(bytes)
	}
}
