use log::debug;
use rand::Rng;

use super::compiled::{CompiledChain, Walk};
use crate::config::DEFAULT_MAX_WALK_STEPS;
use crate::text::WordSplitter;

/// Sentence generation over a compiled chain.
///
/// # Responsibilities
/// - Walk the chain from the all-`BEGIN` state
/// - Join the drawn tokens with the splitter
/// - Retry up to a number of attempts, rejecting degenerate or too long
///   sentences
///
/// The cost of a call is bounded by its attempt count, never by the
/// shape of the chain: each walk is also capped by `max_walk_steps`.
pub struct SentenceGenerator<'a> {
	chain: &'a CompiledChain,
	splitter: &'a dyn WordSplitter,
	max_walk_steps: usize,
}

impl<'a> SentenceGenerator<'a> {
	pub fn new(chain: &'a CompiledChain, splitter: &'a dyn WordSplitter) -> Self {
		Self { chain, splitter, max_walk_steps: DEFAULT_MAX_WALK_STEPS }
	}

	/// Overrides the step ceiling of a single walk.
	pub fn with_max_walk_steps(mut self, max_walk_steps: usize) -> Self {
		self.max_walk_steps = max_walk_steps;
		self
	}

	/// One walk through the chain.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Walk {
		self.chain.walk(rng, self.max_walk_steps)
	}

	/// Returns the first non-empty sentence in `max_attempts` walks.
	pub fn make_sentence(&self, max_attempts: usize) -> Option<String> {
		self.make_sentence_with(&mut rand::rng(), max_attempts)
	}

	pub fn make_sentence_with<R: Rng>(&self, rng: &mut R, max_attempts: usize) -> Option<String> {
		self.attempt(rng, max_attempts, |_| true)
	}

	/// Returns the first sentence shorter than `max_chars` characters in
	/// `max_attempts` walks.
	pub fn make_short_sentence(&self, max_chars: usize, max_attempts: usize) -> Option<String> {
		self.make_short_sentence_with(&mut rand::rng(), max_chars, max_attempts)
	}

	pub fn make_short_sentence_with<R: Rng>(&self, rng: &mut R, max_chars: usize, max_attempts: usize) -> Option<String> {
		self.attempt(rng, max_attempts, |sentence| sentence.chars().count() < max_chars)
	}

	/// Rejection sampling loop.
	///
	/// Walks cut by the step ceiling and empty sentences never count as a
	/// result.
	fn attempt<R, F>(&self, rng: &mut R, max_attempts: usize, accept: F) -> Option<String>
	where
		R: Rng,
		F: Fn(&str) -> bool,
	{
		for attempt in 1..=max_attempts {
			let walk = self.sample(rng);
			if !walk.complete {
				debug!("attempt {attempt}/{max_attempts}: walk stopped after {} tokens", walk.tokens.len());
				continue;
			}

			let sentence = self.splitter.join(&walk.tokens);
			if sentence.trim().is_empty() {
				debug!("attempt {attempt}/{max_attempts}: empty sentence");
				continue;
			}
			if !accept(&sentence) {
				debug!("attempt {attempt}/{max_attempts}: rejected {} chars", sentence.chars().count());
				continue;
			}
			return Some(sentence);
		}

		debug!("no sentence after {max_attempts} attempts");
		None
	}
}
