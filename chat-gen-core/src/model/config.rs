use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Flat configuration surface for training and generation.
///
/// Supplied at model construction and mutable afterward through
/// [`ModelConfig::apply`], a later-wins shallow merge of a
/// [`ConfigPatch`] over the current values.
///
/// # Invariants
/// - `max_length >= 1` and `min_length <= max_length` (enforced by
///   `apply`; direct field construction is the caller's responsibility)
/// - `ignored_users` entries are stored lower-cased
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
	/// Minimum generated sentence length in tokens, sentinels excluded.
	pub min_length: usize,

	/// Maximum generated sentence length in tokens, sentinels excluded.
	pub max_length: usize,

	/// Accept a row only when its moderation flags are the no-flags sentinel.
	pub safety_filter: bool,

	/// Reject a row whose moderation flags carry the bannable marker.
	pub bannable_filter: bool,

	/// Gate the character-level token filter during ingestion.
	pub char_filter: bool,

	/// Usernames whose rows are never learned. Matched case-insensitively.
	pub ignored_users: HashSet<String>,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			min_length: 5,
			max_length: 25,
			safety_filter: false,
			bannable_filter: true,
			char_filter: true,
			ignored_users: HashSet::new(),
		}
	}
}

impl ModelConfig {
	/// Whether rows from `username` are ignored.
	pub fn is_ignored(&self, username: &str) -> bool {
		self.ignored_users.contains(&username.to_lowercase())
	}

	/// Lower-cases the ignored-user entries in place.
	pub(crate) fn normalize(&mut self) {
		if self.ignored_users.iter().any(|u| u.chars().any(char::is_uppercase)) {
			self.ignored_users = self
				.ignored_users
				.iter()
				.map(|u| u.to_lowercase())
				.collect();
		}
	}

	/// Merges a patch over the current configuration, later-wins.
	///
	/// Unset patch fields keep their current values. The merged result
	/// is validated before being committed, so a rejected patch leaves
	/// the configuration untouched.
	///
	/// # Errors
	/// Returns an error if the merged lengths are unusable
	/// (`max_length` of 0, or `min_length` above `max_length`).
	pub fn apply(&mut self, patch: ConfigPatch) -> Result<(), String> {
		let mut next = self.clone();
		if let Some(min_length) = patch.min_length {
			next.min_length = min_length;
		}
		if let Some(max_length) = patch.max_length {
			next.max_length = max_length;
		}
		if let Some(safety_filter) = patch.safety_filter {
			next.safety_filter = safety_filter;
		}
		if let Some(bannable_filter) = patch.bannable_filter {
			next.bannable_filter = bannable_filter;
		}
		if let Some(char_filter) = patch.char_filter {
			next.char_filter = char_filter;
		}
		if let Some(ignored_users) = patch.ignored_users {
			next.ignored_users = ignored_users
				.iter()
				.map(|u| u.to_lowercase())
				.collect();
		}

		if next.max_length == 0 {
			return Err("max_length must be at least 1".to_owned());
		}
		if next.min_length > next.max_length {
			return Err(format!(
				"min_length ({}) must not exceed max_length ({})",
				next.min_length, next.max_length
			));
		}

		*self = next;
		Ok(())
	}
}

/// Partial configuration for the later-wins merge.
///
/// Every field is optional; `None` means "keep the current value".
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ConfigPatch {
	pub min_length: Option<usize>,
	pub max_length: Option<usize>,
	pub safety_filter: Option<bool>,
	pub bannable_filter: Option<bool>,
	pub char_filter: Option<bool>,
	pub ignored_users: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_documented_values() {
		let config = ModelConfig::default();
		assert_eq!(config.min_length, 5);
		assert_eq!(config.max_length, 25);
		assert!(!config.safety_filter);
		assert!(config.bannable_filter);
		assert!(config.char_filter);
		assert!(config.ignored_users.is_empty());
	}

	#[test]
	fn patch_only_touches_set_fields() {
		let mut config = ModelConfig::default();
		config
			.apply(ConfigPatch {
				min_length: Some(2),
				ignored_users: Some(vec!["Spammer".to_owned()]),
				..ConfigPatch::default()
			})
			.unwrap();
		assert_eq!(config.min_length, 2);
		assert_eq!(config.max_length, 25);
		assert!(config.is_ignored("sPaMmEr"));
	}

	#[test]
	fn invalid_patch_leaves_config_untouched() {
		let mut config = ModelConfig::default();
		assert!(config.apply(ConfigPatch {
			max_length: Some(0),
			..ConfigPatch::default()
		}).is_err());
		assert!(config.apply(ConfigPatch {
			min_length: Some(30),
			..ConfigPatch::default()
		}).is_err());
		assert_eq!(config, ModelConfig::default());
	}
}
