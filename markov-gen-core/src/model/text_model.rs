use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::ModelId;
use super::chain::SparseChain;
use super::combine::{combine, validate_weights};
use super::compiled::CompiledChain;
use super::document::{ChainData, ModelDocument, ModelRecord};
use super::engine::Engine;
use super::generator::SentenceGenerator;
use crate::error::{CombineError, MarkovError, MarkovResult, ValidationError};
use crate::events::SentenceGenerated;
use crate::text::split_into_sentences;

/// Options of a full build. `None` fields use the engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
	/// Corpus character limit; `None` or `Some(0)` use the configured one.
	pub char_limit: Option<usize>,
	/// Persist the compiled chain instead of the sparse one.
	pub store_compiled: Option<bool>,
	pub state_size: Option<usize>,
}

/// A stored model and its lifecycle.
///
/// ```text
/// Empty --build--> Populated/Uncompiled --compile--> Populated/CompiledCache
///                  Populated/Uncompiled --augment--> Populated/Uncompiled
/// ```
///
/// Mutations take `&mut self` and write the whole record once, after every
/// check passed. The compiled chain is cached for the lifetime of the
/// instance until the chain data is replaced or reloaded.
pub struct MarkovModel {
	engine: Engine,
	record: ModelRecord,
	compiled: OnceLock<Arc<CompiledChain>>,
}

impl fmt::Debug for MarkovModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MarkovModel")
			.field("id", &self.record.id)
			.field("modified_at", &self.record.modified_at)
			.field("state_size", &self.state_size())
			.finish_non_exhaustive()
	}
}

impl MarkovModel {
	pub(crate) fn from_record(engine: Engine, record: ModelRecord) -> Self {
		Self { engine, record, compiled: OnceLock::new() }
	}

	pub fn id(&self) -> ModelId {
		self.record.id
	}

	pub fn record(&self) -> &ModelRecord {
		&self.record
	}

	pub fn created_at(&self) -> DateTime<Utc> {
		self.record.created_at
	}

	pub fn modified_at(&self) -> DateTime<Utc> {
		self.record.modified_at
	}

	/// True iff chain data is present and non-empty.
	pub fn is_ready(&self) -> bool {
		self.record.is_ready()
	}

	/// Stored chain, if any.
	pub fn chain(&self) -> Option<&ChainData> {
		self.record.data.as_ref().map(ModelDocument::chain)
	}

	pub fn state_size(&self) -> Option<usize> {
		self.chain().map(ChainData::state_size)
	}

	/// Whether the stored chain is compiled.
	///
	/// # Errors
	/// Returns `EmptyModel` if the model has no chain data.
	pub fn is_compiled(&self) -> MarkovResult<bool> {
		match self.chain() {
			Some(chain) => Ok(chain.is_compiled()),
			None => Err(MarkovError::EmptyModel(self.id())),
		}
	}

	/// Reloads the record from the store and drops the compiled cache.
	pub fn refresh(&mut self) -> MarkovResult<()> {
		let id = self.id();
		self.record = self.engine.load_model(&id)?.record;
		self.compiled = OnceLock::new();
		Ok(())
	}

	/// Compiled chain for sampling, compiled at most once per instance.
	///
	/// A stored compiled chain is used as is. Returns `None` if the model
	/// is not ready.
	pub fn compiled_chain(&self) -> Option<Arc<CompiledChain>> {
		if !self.is_ready() {
			return None;
		}
		let chain = self.chain()?;
		let compiled = self.compiled.get_or_init(|| {
			debug!("model {}: compiling {} chain", self.id(), if chain.is_compiled() { "stored" } else { "sparse" });
			Arc::new(chain.compile())
		});
		Some(Arc::clone(compiled))
	}

	/// Replaces the chain with one built from `entries`.
	///
	/// Entries are split into sentences; their joined length must not
	/// exceed the character limit.
	pub fn build<S: AsRef<str>>(&mut self, entries: &[S], options: BuildOptions) -> MarkovResult<()> {
		let config = self.engine.config();
		let state_size = options.state_size.unwrap_or(config.state_size);
		let store_compiled = options.store_compiled.unwrap_or(config.store_compiled);

		let chain = self.build_chain(entries, options.char_limit, state_size)?;
		let states = chain.len();
		let data = if store_compiled {
			ChainData::Compiled(chain.compile())
		} else {
			ChainData::Sparse(chain)
		};

		self.persist(data)?;
		info!("model {}: built {states} states (state size {state_size}, compiled: {store_compiled})", self.id());
		Ok(())
	}

	/// Merges a chain built from `entries` into the stored sparse chain.
	///
	/// An empty model is built instead. `weights`, if given, weight the
	/// existing chain and the new one, in that order.
	///
	/// # Errors
	/// - `CombineError::CompiledChain` if the stored chain is compiled
	/// - `EmptyCorpus` if `entries` hold no token
	/// - a validation error for bad weights or an oversized corpus
	pub fn augment<S: AsRef<str>>(
		&mut self,
		entries: &[S],
		char_limit: Option<usize>,
		weights: Option<&[f64]>,
	) -> MarkovResult<()> {
		if !self.is_ready() {
			return self.build(entries, BuildOptions { char_limit, ..BuildOptions::default() });
		}

		let current = match self.chain() {
			Some(chain @ ChainData::Sparse(_)) => chain,
			_ => return Err(CombineError::CompiledChain.into()),
		};
		if entries.iter().all(|entry| entry.as_ref().trim().is_empty()) {
			return Err(MarkovError::EmptyCorpus);
		}
		if let Some(weights) = weights {
			validate_weights(weights, 2)?;
		}

		let addition = self.build_chain(entries, char_limit, current.state_size())?;
		if addition.is_empty() {
			return Err(MarkovError::EmptyCorpus);
		}
		let merged = combine(&[current, &ChainData::Sparse(addition)], weights)?;
		let states = merged.len();

		self.persist(ChainData::Sparse(merged))?;
		info!("model {}: augmented to {states} states", self.id());
		Ok(())
	}

	/// Generates a sentence, shorter than `char_limit` characters if it
	/// is above 0.
	///
	/// Returns `Ok(None)` if the model is not ready or no attempt gave a
	/// conforming sentence. On success, listeners receive a
	/// `SentenceGenerated` event before this returns.
	pub fn generate_sentence(&self, char_limit: usize, max_attempts: Option<usize>) -> MarkovResult<Option<String>> {
		let config = self.engine.config();
		let max_attempts = max_attempts.unwrap_or(config.max_attempts);
		if max_attempts == 0 {
			return Err(ValidationError::InvalidAttempts.into());
		}

		let Some(chain) = self.compiled_chain() else {
			return Ok(None);
		};
		let generator =
			SentenceGenerator::new(&chain, self.engine.splitter()).with_max_walk_steps(config.max_walk_steps);
		let sentence = if char_limit > 0 {
			generator.make_short_sentence(char_limit, max_attempts)
		} else {
			generator.make_sentence(max_attempts)
		};

		if let Some(sentence) = &sentence {
			self.engine.emit(&SentenceGenerated {
				model_id: self.id(),
				char_limit,
				sentence: sentence.clone(),
			});
		}
		Ok(sentence)
	}

	/// Checks the corpus length and builds a chain from its sentences.
	fn build_chain<S: AsRef<str>>(
		&self,
		entries: &[S],
		char_limit: Option<usize>,
		state_size: usize,
	) -> MarkovResult<SparseChain> {
		let config = self.engine.config();
		let limit = config.resolve_char_limit(char_limit);
		let corpus = entries.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(" ");
		let length = corpus.chars().count();
		if limit != 0 && length > limit {
			return Err(ValidationError::CorpusTooLong { limit, length }.into());
		}

		let sentences: Vec<String> = entries.iter().flat_map(|entry| split_into_sentences(entry.as_ref())).collect();
		Ok(SparseChain::build_parallel(&sentences, state_size, self.engine.splitter(), config.parallel_threshold)?)
	}

	/// Writes new chain data in one update, then swaps it in.
	fn persist(&mut self, data: ChainData) -> MarkovResult<()> {
		let record = ModelRecord {
			id: self.record.id,
			created_at: self.record.created_at,
			modified_at: Utc::now().max(self.record.modified_at),
			data: Some(ModelDocument::new(data)),
		};
		self.engine.store().update(&record)?;

		self.record = record;
		self.compiled = OnceLock::new();
		Ok(())
	}
}
