use thiserror::Error;

/// Failures surfaced by sentence generation.
///
/// Both variants propagate directly to the caller; neither is retried
/// internally. The only deliberate retry in generation is the rerun of
/// a complete successful walk that came out below the minimum length.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
	/// The requested seed has no node in the unigram table.
	#[error("seed '{0}' has no entry in the unigram table")]
	SeedNotFound(String),

	/// A node with no usable successors was reached during selection.
	///
	/// Unreachable against a correctly trained table: every non-end
	/// node has at least one successor by construction.
	#[error("no successor candidates available for selection")]
	PickFailed,
}
