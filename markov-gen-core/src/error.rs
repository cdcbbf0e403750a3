use std::fmt;

use thiserror::Error;

use crate::model::ModelId;

/// Result alias used across the crate.
pub type MarkovResult<T> = Result<T, MarkovError>;

/// Top-level error for every fallible operation of the crate.
///
/// Every variant is raised before anything is persisted: a failed
/// build, augment or combination leaves the stored model untouched.
#[derive(Error, Debug)]
pub enum MarkovError {
	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("model {0} has no chain data")]
	EmptyModel(ModelId),

	#[error("corpus is empty after tokenization")]
	EmptyCorpus,

	#[error(transparent)]
	Combine(#[from] CombineError),

	#[error(transparent)]
	Storage(#[from] StorageError),
}

impl MarkovError {
	/// Returns the combination error if this is one.
	pub fn as_combine(&self) -> Option<&CombineError> {
		match self {
			MarkovError::Combine(e) => Some(e),
			_ => None,
		}
	}
}

/// Bad parameters supplied by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
	#[error("supplied corpus is over the maximum character limit: {limit} (got {length})")]
	CorpusTooLong { limit: usize, length: usize },

	#[error("expected {expected} weights, got {found}")]
	WeightsLength { expected: usize, found: usize },

	#[error("weights must be finite and non-negative, got {0}")]
	InvalidWeight(f64),

	#[error("unknown combination mode: {0:?}")]
	UnknownMode(String),

	#[error("unknown return type: {0:?}")]
	UnknownReturnType(String),

	#[error("weights are only accepted in strict mode")]
	WeightsInPermissiveMode,

	#[error("state size must be >= 1, got {0}")]
	InvalidStateSize(usize),

	#[error("attempt and step limits must be >= 1")]
	InvalidAttempts,

	#[error("invalid configuration: {0}")]
	Config(String),
}

/// Why a set of chains could not be merged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CombineError {
	#[error("compiled chains cannot be augmented or combined")]
	CompiledChain,

	#[error("state size mismatch: expected {expected}, found {found}")]
	StateSizeMismatch { expected: usize, found: usize },

	#[error("strict screening rejected the batch: {0}")]
	Rejected(ScreeningReport),

	#[error("at least 2 compatible chains are required, found {found}")]
	NotEnoughChains { found: usize },
}

impl CombineError {
	/// True for the incompatible-state family: compiled inputs and state
	/// size mismatches, including strict rejections that counted either.
	pub fn is_incompatible_state(&self) -> bool {
		match self {
			CombineError::CompiledChain | CombineError::StateSizeMismatch { .. } => true,
			CombineError::Rejected(report) => report.compiled + report.state_size_mismatch > 0,
			CombineError::NotEnoughChains { .. } => false,
		}
	}
}

/// Counts of each disqualifying reason found while screening a pool of
/// candidate models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreeningReport {
	pub candidates: usize,
	pub not_ready: usize,
	pub compiled: usize,
	pub state_size_mismatch: usize,
}

impl ScreeningReport {
	/// Number of disqualified candidates.
	pub fn rejected(&self) -> usize {
		self.not_ready + self.compiled + self.state_size_mismatch
	}

	/// Number of candidates that passed screening.
	pub fn accepted(&self) -> usize {
		self.candidates - self.rejected()
	}
}

impl fmt::Display for ScreeningReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} candidates, {} not ready, {} compiled, {} with mismatched state size",
			self.candidates, self.not_ready, self.compiled, self.state_size_mismatch
		)
	}
}

/// Persistence failures.
#[derive(Error, Debug)]
pub enum StorageError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("corrupt model document: {0}")]
	CorruptDocument(String),

	#[error("model not found: {0}")]
	NotFound(ModelId),
}
