use std::collections::BTreeMap;

use rand::Rng;

use super::state::{State, Token};

/// Immutable sampling model.
///
/// Every state maps to its successors with cumulative weights, so drawing
/// the next token is a binary search instead of a linear scan.
///
/// # Invariants
/// - Built once from a `SparseChain` and never mutated afterwards
/// - Cumulative weights are non-decreasing within a state
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledChain {
	state_size: usize,
	states: BTreeMap<State, Vec<(Token, f64)>>,
}

/// Outcome of one walk through a compiled chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Walk {
	/// Emitted tokens, sentinels excluded.
	pub tokens: Vec<Token>,
	/// False if the walk stopped before drawing `END` (step ceiling or
	/// unknown state).
	pub complete: bool,
}

impl CompiledChain {
	pub(crate) fn with_state_size(state_size: usize) -> Self {
		Self { state_size, states: BTreeMap::new() }
	}

	pub(crate) fn insert_state(&mut self, state: State, cumulative: Vec<(Token, f64)>) {
		self.states.insert(state, cumulative);
	}

	/// Compiling a compiled chain gives the same chain.
	pub fn compile(&self) -> CompiledChain {
		self.clone()
	}

	pub fn state_size(&self) -> usize {
		self.state_size
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// Cumulative table of a state, if it was observed.
	pub fn successors(&self, state: &State) -> Option<&[(Token, f64)]> {
		self.states.get(state).map(Vec::as_slice)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&State, &[(Token, f64)])> {
		self.states.iter().map(|(state, table)| (state, table.as_slice()))
	}

	/// Total weight of a state (the last cumulative value).
	pub fn total_weight(&self, state: &State) -> f64 {
		self.successors(state).and_then(<[_]>::last).map_or(0.0, |(_, total)| *total)
	}

	/// Draws the successor of `state`.
	///
	/// A value is drawn uniformly in `[0, total)` and the first entry whose
	/// cumulative weight exceeds it wins. Returns `None` for an unknown
	/// state or one whose weights sum to zero.
	pub fn next_token<R: Rng>(&self, state: &State, rng: &mut R) -> Option<&Token> {
		let table = self.states.get(state)?;
		let total = table.last()?.1;
		if !(total > 0.0 && total.is_finite()) {
			return None;
		}

		let draw = rng.random_range(0.0..total);
		let index = table.partition_point(|(_, cumulative)| *cumulative <= draw);
		// Rounding can leave `draw` on the last boundary.
		table.get(index).or_else(|| table.last()).map(|(token, _)| token)
	}

	/// Walks from the all-`BEGIN` state until `END` is drawn or
	/// `max_steps` tokens were drawn.
	///
	/// States may form cycles, the step ceiling bounds every walk.
	pub fn walk<R: Rng>(&self, rng: &mut R, max_steps: usize) -> Walk {
		let mut state = State::initial(self.state_size);
		let mut tokens = Vec::new();

		for _ in 0..max_steps {
			let Some(next) = self.next_token(&state, rng) else {
				return Walk { tokens, complete: false };
			};
			if next.is_end() {
				return Walk { tokens, complete: true };
			}
			tokens.push(next.clone());
			state.shift(next.clone());
		}

		Walk { tokens, complete: false }
	}
}
