use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};

use super::compiled::CompiledChain;
use super::state::{State, Token, Transitions};
use crate::error::{CombineError, ValidationError};
use crate::text::WordSplitter;

/// Mutable transition model built from a tokenized corpus.
///
/// The `SparseChain` maps every observed state to the tokens that
/// followed it, weighted by how often they did.
///
/// # Responsibilities
/// - Build the chain from sentences
/// - Accumulate transition counts for each state
/// - Merge with another chain of the same state size, with a weight
/// - Compile into a `CompiledChain` for sampling
///
/// # Invariants
/// - `state_size` is always >= 1
/// - Every key of `states` holds exactly `state_size` tokens
/// - All weights are >= 0
#[derive(Clone, Debug, PartialEq)]
pub struct SparseChain {
	state_size: usize,
	states: BTreeMap<State, Transitions>,
}

impl SparseChain {
	/// Creates an empty chain.
	///
	/// # Errors
	/// Returns an error if `state_size < 1`.
	pub fn new(state_size: usize) -> Result<Self, ValidationError> {
		if state_size < 1 {
			return Err(ValidationError::InvalidStateSize(state_size));
		}
		Ok(Self { state_size, states: BTreeMap::new() })
	}

	/// Builds a chain from sentences, tokenized by `splitter`.
	///
	/// Identical sentences and splitter output always give an identical
	/// chain. An empty corpus gives an empty chain.
	pub fn build<S: AsRef<str>>(
		sentences: &[S],
		state_size: usize,
		splitter: &dyn WordSplitter,
	) -> Result<Self, ValidationError> {
		let mut chain = Self::new(state_size)?;
		for sentence in sentences {
			chain.add_sentence(&splitter.split(sentence.as_ref()));
		}
		Ok(chain)
	}

	/// Builds a chain on several threads.
	///
	/// Sentences are split into chunks (based on CPU cores * factor), a
	/// partial chain is built per chunk and the partials are merged.
	/// Counts are integer sums, so the result equals `build`. Corpora with
	/// fewer than `threshold` sentences are built sequentially.
	pub fn build_parallel<S: AsRef<str> + Sync>(
		sentences: &[S],
		state_size: usize,
		splitter: &dyn WordSplitter,
		threshold: usize,
	) -> Result<Self, ValidationError> {
		if sentences.len() < threshold.max(2) {
			return Self::build(sentences, state_size, splitter);
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = sentences.len().div_ceil(chunks);
		debug!("building chain from {} sentences in chunks of {}", sentences.len(), chunk_size);

		let mut final_chain = Self::new(state_size)?;
		thread::scope(|scope| -> Result<(), ValidationError> {
			let (tx, rx) = mpsc::channel();
			for chunk in sentences.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					// The receiver outlives every sender inside the scope.
					let _ = tx.send(Self::build(chunk, state_size, splitter));
				});
			}
			drop(tx);

			for partial_chain in rx.iter() {
				final_chain.absorb(&partial_chain?, 1.0);
			}
			Ok(())
		})?;

		Ok(final_chain)
	}

	/// Adds one tokenized sentence.
	///
	/// The sentence is padded with `state_size` `BEGIN` tokens and one
	/// `END` token; each window position counts one transition. Input
	/// tokens equal to a sentinel are dropped. Sentences without tokens
	/// are ignored.
	pub fn add_sentence(&mut self, tokens: &[Token]) {
		let mut padded = vec![Token::begin(); self.state_size];
		for token in tokens {
			if token.is_begin() || token.is_end() {
				warn!("dropping reserved token {token} from input sentence");
			} else {
				padded.push(token.clone());
			}
		}
		if padded.len() == self.state_size {
			return;
		}
		padded.push(Token::end());

		for window in padded.windows(self.state_size + 1) {
			let (state, next) = window.split_at(self.state_size);
			self.states
				.entry(State::from_tokens(state.to_vec()))
				.or_default()
				.add_transition(next[0].clone());
		}
	}

	/// Merges another chain into this one, scaling its weights by `weight`.
	///
	/// # Errors
	/// Returns an error if the state sizes do not match.
	pub fn merge(&mut self, other: &Self, weight: f64) -> Result<(), CombineError> {
		if self.state_size != other.state_size {
			return Err(CombineError::StateSizeMismatch {
				expected: self.state_size,
				found: other.state_size,
			});
		}
		self.absorb(other, weight);
		Ok(())
	}

	fn absorb(&mut self, other: &Self, weight: f64) {
		for (state, transitions) in &other.states {
			self.states.entry(state.clone()).or_default().merge_scaled(transitions, weight);
		}
	}

	/// Sets the transitions of a state, replacing previous ones.
	///
	/// Used when loading persisted chains.
	pub(crate) fn insert_state(&mut self, state: State, transitions: Transitions) {
		self.states.insert(state, transitions);
	}

	/// Converts every state into a cumulative weight table.
	pub fn compile(&self) -> CompiledChain {
		let mut compiled = CompiledChain::with_state_size(self.state_size);
		for (state, transitions) in &self.states {
			compiled.insert_state(state.clone(), transitions.cumulative());
		}
		compiled
	}

	pub fn state_size(&self) -> usize {
		self.state_size
	}

	/// True if the chain holds no transition.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Number of distinct states.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Outgoing transitions of `state`, if it was observed.
	pub fn transitions(&self, state: &State) -> Option<&Transitions> {
		self.states.get(state)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&State, &Transitions)> {
		self.states.iter()
	}
}
