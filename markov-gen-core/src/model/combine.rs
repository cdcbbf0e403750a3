use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use super::chain::SparseChain;
use super::document::ChainData;
use crate::error::{CombineError, MarkovResult, ScreeningReport, ValidationError};

/// How a pool of candidates is screened before merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombineMode {
	/// Any disqualified candidate fails the whole batch.
	#[default]
	Strict,
	/// Disqualified candidates are dropped.
	Permissive,
}

impl FromStr for CombineMode {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"strict" => Ok(CombineMode::Strict),
			"permissive" => Ok(CombineMode::Permissive),
			other => Err(ValidationError::UnknownMode(other.to_owned())),
		}
	}
}

impl fmt::Display for CombineMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CombineMode::Strict => "strict",
			CombineMode::Permissive => "permissive",
		})
	}
}

/// What a combination hands back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnType {
	/// A new stored model.
	#[default]
	Persisted,
	/// The merged chain only, nothing stored.
	Transient,
}

impl FromStr for ReturnType {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"persisted" => Ok(ReturnType::Persisted),
			"transient" => Ok(ReturnType::Transient),
			other => Err(ValidationError::UnknownReturnType(other.to_owned())),
		}
	}
}

/// Merged chain and how many sources went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationResult {
	pub chain: SparseChain,
	pub merged: usize,
}

/// Candidates that passed screening, as indices into the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
	pub accepted: Vec<usize>,
	pub report: ScreeningReport,
}

/// Checks that there is one finite, non-negative weight per chain.
pub fn validate_weights(weights: &[f64], expected: usize) -> Result<(), ValidationError> {
	if weights.len() != expected {
		return Err(ValidationError::WeightsLength { expected, found: weights.len() });
	}
	match weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
		Some(weight) => Err(ValidationError::InvalidWeight(*weight)),
		None => Ok(()),
	}
}

/// Merges chains, scaling chain `i` by `weights[i]` (default 1.0).
///
/// Every precondition is checked before any merge work: at least two
/// chains, one weight per chain, none compiled, identical state sizes.
pub fn combine(chains: &[&ChainData], weights: Option<&[f64]>) -> MarkovResult<SparseChain> {
	if let Some(weights) = weights {
		validate_weights(weights, chains.len())?;
	}
	if chains.len() < 2 {
		return Err(CombineError::NotEnoughChains { found: chains.len() }.into());
	}

	let mut sparse = Vec::with_capacity(chains.len());
	for chain in chains {
		match chain {
			ChainData::Sparse(chain) => sparse.push(chain),
			ChainData::Compiled(_) => return Err(CombineError::CompiledChain.into()),
		}
	}

	let state_size = sparse[0].state_size();
	if let Some(other) = sparse.iter().find(|chain| chain.state_size() != state_size) {
		return Err(CombineError::StateSizeMismatch { expected: state_size, found: other.state_size() }.into());
	}

	let mut merged = SparseChain::new(state_size)?;
	for (i, chain) in sparse.iter().enumerate() {
		let weight = weights.map_or(1.0, |weights| weights[i]);
		merged.merge(chain, weight)?;
	}
	Ok(merged)
}

/// Screens a pool of candidates. `None` stands for a model without data.
///
/// The whole pool is always scanned so the report counts every reason:
/// not ready, compiled, or a state size different from the first
/// workable candidate. In strict mode any rejection fails the batch.
pub fn screen(candidates: &[Option<&ChainData>], mode: CombineMode) -> Result<Screening, CombineError> {
	let mut report = ScreeningReport { candidates: candidates.len(), ..ScreeningReport::default() };
	let mut accepted = Vec::new();
	let mut state_size = None;

	for (i, candidate) in candidates.iter().enumerate() {
		let chain = match candidate {
			Some(chain) if !chain.is_empty() => chain,
			_ => {
				report.not_ready += 1;
				continue;
			}
		};
		if chain.is_compiled() {
			report.compiled += 1;
			continue;
		}
		match state_size {
			None => state_size = Some(chain.state_size()),
			Some(size) if size != chain.state_size() => {
				report.state_size_mismatch += 1;
				continue;
			}
			Some(_) => (),
		}
		accepted.push(i);
	}

	debug!("screened {mode} pool: {report}");
	if mode == CombineMode::Strict && report.rejected() > 0 {
		warn!("strict combination rejected: {report}");
		return Err(CombineError::Rejected(report));
	}
	if accepted.len() < 2 {
		return Err(CombineError::NotEnoughChains { found: accepted.len() });
	}
	Ok(Screening { accepted, report })
}

/// Screens a pool of candidates and merges the survivors.
///
/// Weights are only accepted in strict mode, with one weight per
/// candidate; parameters are validated before screening starts.
pub fn combine_candidates(
	candidates: &[Option<&ChainData>],
	mode: CombineMode,
	weights: Option<&[f64]>,
) -> MarkovResult<CombinationResult> {
	if let Some(weights) = weights {
		if mode == CombineMode::Permissive {
			return Err(ValidationError::WeightsInPermissiveMode.into());
		}
		validate_weights(weights, candidates.len())?;
	}

	let screening = screen(candidates, mode)?;
	let chains: Vec<&ChainData> = screening.accepted.iter().filter_map(|&i| candidates[i]).collect();
	let chain = combine(&chains, weights)?;
	Ok(CombinationResult { chain, merged: chains.len() })
}
