use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved token opening every sentence.
pub const BEGIN: &str = "___BEGIN__";
/// Reserved token closing every sentence.
pub const END: &str = "___END__";
/// Separator between the surface form and the grammatical tag of a token.
pub const TAG_DELIMITER: &str = "::";
/// Separator between tokens in a persisted state key.
pub const STATE_KEY_SEPARATOR: char = '\u{1f}';
/// Escape character inside a persisted state key.
const KEY_ESCAPE: char = '\\';

/// Atomic generated unit.
///
/// A token is an opaque string. Tagged tokens encode `surface::TAG`,
/// which is only unambiguous while the surface never contains `::`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
	/// Wraps a raw token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Encodes a surface form with its tag.
	///
	/// Returns `None` if the surface contains the tag delimiter.
	pub fn tagged(surface: &str, tag: &str) -> Option<Self> {
		if surface.contains(TAG_DELIMITER) {
			return None;
		}
		Some(Self(format!("{surface}{TAG_DELIMITER}{tag}")))
	}

	pub fn begin() -> Self {
		Self(BEGIN.to_owned())
	}

	pub fn end() -> Self {
		Self(END.to_owned())
	}

	pub fn is_begin(&self) -> bool {
		self.0 == BEGIN
	}

	pub fn is_end(&self) -> bool {
		self.0 == END
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Surface form (the part before the tag delimiter, if any).
	pub fn surface(&self) -> &str {
		match self.0.split_once(TAG_DELIMITER) {
			Some((surface, _)) => surface,
			None => &self.0,
		}
	}

	/// Grammatical tag, if the token carries one.
	pub fn tag(&self) -> Option<&str> {
		self.0.split_once(TAG_DELIMITER).map(|(_, tag)| tag)
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Sampling context: the last `state_size` tokens of a walk.
///
/// ## Invariants
/// - The length always equals the owning chain's state size
/// - A sentence starts from the all-`BEGIN` state
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State(Vec<Token>);

impl State {
	/// All-`BEGIN` state of the given size.
	pub fn initial(state_size: usize) -> Self {
		Self(vec![Token::begin(); state_size])
	}

	pub fn from_tokens(tokens: Vec<Token>) -> Self {
		Self(tokens)
	}

	pub fn tokens(&self) -> &[Token] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Slides the window: drops the oldest token and appends `next`.
	pub fn shift(&mut self, next: Token) {
		if !self.0.is_empty() {
			self.0.remove(0);
		}
		self.0.push(next);
	}

	/// Deterministic string form used as the persisted key.
	///
	/// Tokens are joined with `STATE_KEY_SEPARATOR`. Inside a token, the
	/// separator is written `\s` and a backslash `\\`, so any token text
	/// survives `from_key`.
	pub fn key(&self) -> String {
		let mut key = String::new();
		for (i, token) in self.0.iter().enumerate() {
			if i > 0 {
				key.push(STATE_KEY_SEPARATOR);
			}
			for c in token.as_str().chars() {
				match c {
					KEY_ESCAPE => key.push_str("\\\\"),
					STATE_KEY_SEPARATOR => key.push_str("\\s"),
					c => key.push(c),
				}
			}
		}
		key
	}

	/// Parses a persisted key.
	///
	/// Returns `None` if it does not hold exactly `state_size` tokens or
	/// holds an unknown escape.
	pub fn from_key(key: &str, state_size: usize) -> Option<Self> {
		let mut tokens = Vec::with_capacity(state_size);
		let mut current = String::new();
		let mut chars = key.chars();
		while let Some(c) = chars.next() {
			match c {
				KEY_ESCAPE => match chars.next()? {
					KEY_ESCAPE => current.push(KEY_ESCAPE),
					's' => current.push(STATE_KEY_SEPARATOR),
					_ => return None,
				},
				STATE_KEY_SEPARATOR => tokens.push(Token(std::mem::take(&mut current))),
				c => current.push(c),
			}
		}
		tokens.push(Token(current));

		if tokens.len() != state_size {
			return None;
		}
		Some(Self(tokens))
	}
}

/// Outgoing transitions of one state.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by how often they were observed. Weights start as integer
/// counts and may become fractional after a weighted combination.
///
/// ## Invariants
/// - Every weight is finite and >= 0
/// - Iteration order is the token order, so compiling is stable
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transitions {
	/// Example: { "name::NOUN" => 42.0, "dog::NOUN" => 3.0 }
	weights: BTreeMap<Token, f64>,
}

impl Transitions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: Token) {
		*self.weights.entry(next).or_insert(0.0) += 1.0;
	}

	/// Sets the weight of a transition, replacing any previous one.
	pub fn insert(&mut self, next: Token, weight: f64) {
		self.weights.insert(next, weight);
	}

	/// Adds every transition of `other`, scaled by `factor`.
	pub fn merge_scaled(&mut self, other: &Self, factor: f64) {
		for (next, weight) in &other.weights {
			*self.weights.entry(next.clone()).or_insert(0.0) += weight * factor;
		}
	}

	pub fn get(&self, next: &Token) -> Option<f64> {
		self.weights.get(next).copied()
	}

	pub fn contains(&self, next: &Token) -> bool {
		self.weights.contains_key(next)
	}

	pub fn len(&self) -> usize {
		self.weights.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	/// Sum of all weights.
	pub fn total(&self) -> f64 {
		self.weights.values().sum()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Token, f64)> {
		self.weights.iter().map(|(token, weight)| (token, *weight))
	}

	/// Running sums of the weights, in token order.
	pub fn cumulative(&self) -> Vec<(Token, f64)> {
		let mut running = 0.0;
		self.weights
			.iter()
			.map(|(token, weight)| {
				running += weight;
				(token.clone(), running)
			})
			.collect()
	}
}
