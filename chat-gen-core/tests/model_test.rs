use chat_gen_core::model::chat_model::ChatModel;
use chat_gen_core::model::config::{ConfigPatch, ModelConfig};
use chat_gen_core::model::trainer::{NO_FLAGS, TranscriptRow};

fn row(user: &str, content: &str) -> TranscriptRow {
	TranscriptRow::new(user, NO_FLAGS, content)
}

fn corpus() -> Vec<TranscriptRow> {
	vec![
		row("alice", "hi there"),
		row("bob", "hi friend"),
		row("alice", "hi there"),
		row("carol", "see you there"),
		row("bob", "the fence is over there"),
	]
}

fn target_weight(model: &ChatModel, word: &str) -> usize {
	let unigrams = model.unigrams();
	unigrams.node(unigrams.lookup(word).unwrap()).weight()
}

#[test]
fn parallel_build_matches_sequential_training() {
	let mut sequential = ChatModel::default();
	for line in corpus() {
		sequential.train(&line);
	}
	let parallel = ChatModel::from_rows(corpus(), ModelConfig::default());

	assert_eq!(parallel.vocabulary(), sequential.vocabulary());
	assert_eq!(parallel.bigrams().len(), sequential.bigrams().len());
	for word in ["hi", "there", "friend", "fence", "over"] {
		assert_eq!(
			target_weight(&parallel, word),
			target_weight(&sequential, word),
			"weight mismatch for '{word}'"
		);
	}

	// Successor sets agree as well, order aside
	let seq_hi = sequential.unigrams().lookup("hi").unwrap();
	let par_hi = parallel.unigrams().lookup("hi").unwrap();
	let mut seq_words: Vec<String> = sequential
		.unigrams()
		.node(seq_hi)
		.successors()
		.iter()
		.map(|&s| sequential.unigrams().node(s).canonical_key())
		.collect();
	let mut par_words: Vec<String> = parallel
		.unigrams()
		.node(par_hi)
		.successors()
		.iter()
		.map(|&s| parallel.unigrams().node(s).canonical_key())
		.collect();
	seq_words.sort();
	par_words.sort();
	assert_eq!(seq_words, par_words);
}

#[test]
fn merge_sums_weights_and_unions_authors() {
	let mut left = ChatModel::default();
	left.train(&row("alice", "hi there"));
	let mut right = ChatModel::default();
	right.train(&row("bob", "hi there"));

	left.merge(&right);

	assert_eq!(target_weight(&left, "there"), 2);
	let unigrams = left.unigrams();
	let hi = unigrams.lookup("hi").unwrap();
	assert!(unigrams.node(hi).authors().contains("alice"));
	assert!(unigrams.node(hi).authors().contains("bob"));
}

#[test]
fn snapshot_round_trips_the_whole_model() {
	let mut model = ChatModel::default();
	model
		.update_config(ConfigPatch {
			min_length: Some(1),
			..ConfigPatch::default()
		})
		.unwrap();
	for line in corpus() {
		model.train(&line);
	}
	model.generate().unwrap();

	let bytes = model.snapshot().unwrap();
	let mut restored = ChatModel::from_snapshot(&bytes).unwrap();

	assert_eq!(restored.vocabulary(), model.vocabulary());
	assert_eq!(restored.config(), model.config());
	assert_eq!(
		restored.last_trace().unwrap().visited(),
		model.last_trace().unwrap().visited()
	);
	assert_eq!(target_weight(&restored, "there"), target_weight(&model, "there"));
	// The restored model keeps generating
	restored.generate().unwrap();
}

#[test]
fn config_updates_merge_later_wins() {
	let mut model = ChatModel::default();
	model
		.update_config(ConfigPatch {
			min_length: Some(2),
			safety_filter: Some(true),
			..ConfigPatch::default()
		})
		.unwrap();
	model
		.update_config(ConfigPatch {
			min_length: Some(3),
			..ConfigPatch::default()
		})
		.unwrap();

	assert_eq!(model.config().min_length, 3);
	assert!(model.config().safety_filter);
	// Untouched fields keep their defaults
	assert_eq!(model.config().max_length, 25);
}

#[test]
fn invalid_config_updates_are_rejected_whole() {
	let mut model = ChatModel::default();
	assert!(model
		.update_config(ConfigPatch {
			min_length: Some(30),
			safety_filter: Some(true),
			..ConfigPatch::default()
		})
		.is_err());
	// The rejected patch applied nothing
	assert!(!model.config().safety_filter);
	assert_eq!(model.config().min_length, 5);
}

#[test]
fn empty_row_set_builds_an_empty_model() {
	let model = ChatModel::from_rows(Vec::new(), ModelConfig::default());
	assert_eq!(model.vocabulary(), 0);
}
