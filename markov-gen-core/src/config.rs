use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default number of tokens in a state.
pub const DEFAULT_STATE_SIZE: usize = 2;
/// Default number of sampling attempts per generated sentence.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
/// Default hard ceiling on the steps of a single walk.
pub const DEFAULT_MAX_WALK_STEPS: usize = 1000;
/// Default sentence count from which construction is spread across threads.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// Engine configuration.
///
/// Passed explicitly to the engine instead of being looked up globally.
/// Every field has a default, so a partial TOML document is enough:
///
/// ```toml
/// corpus_char_limit = 5000
/// state_size = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovConfig {
	/// Maximum number of characters in a corpus (0 = unlimited).
	pub corpus_char_limit: usize,
	/// State size used for new builds.
	pub state_size: usize,
	/// Whether builds persist a compiled chain by default.
	pub store_compiled: bool,
	/// Sampling attempts per generated sentence.
	pub max_attempts: usize,
	/// Hard ceiling on the number of tokens drawn in one walk.
	pub max_walk_steps: usize,
	/// Sentence count from which construction runs on several threads.
	pub parallel_threshold: usize,
}

impl Default for MarkovConfig {
	fn default() -> Self {
		Self {
			corpus_char_limit: 0,
			state_size: DEFAULT_STATE_SIZE,
			store_compiled: false,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			max_walk_steps: DEFAULT_MAX_WALK_STEPS,
			parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
		}
	}
}

impl MarkovConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, ValidationError> {
		let config: Self = toml::from_str(source).map_err(|e| ValidationError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the engine cannot work with.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.state_size == 0 {
			return Err(ValidationError::InvalidStateSize(self.state_size));
		}
		if self.max_attempts == 0 || self.max_walk_steps == 0 {
			return Err(ValidationError::InvalidAttempts);
		}
		Ok(())
	}

	/// Resolves the character limit for one build.
	///
	/// `None` and `Some(0)` fall back to `corpus_char_limit`.
	/// The resolved value 0 means unlimited.
	pub fn resolve_char_limit(&self, char_limit: Option<usize>) -> usize {
		match char_limit {
			Some(limit) if limit > 0 => limit,
			_ => self.corpus_char_limit,
		}
	}
}
