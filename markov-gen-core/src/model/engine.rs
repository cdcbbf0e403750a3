use std::sync::Arc;

use log::info;

use super::ModelId;
use super::chain::SparseChain;
use super::combine::{CombinationResult, CombineMode, ReturnType, combine_candidates};
use super::document::{ChainData, ModelDocument, ModelRecord};
use super::text_model::MarkovModel;
use crate::config::MarkovConfig;
use crate::error::{MarkovResult, StorageError};
use crate::events::{SentenceGenerated, SentenceListener, SentenceStats};
use crate::store::ModelStore;
use crate::text::{WhitespaceSplitter, WordSplitter};

/// Shared handle over the store, splitter, configuration and listeners.
///
/// Cloning is cheap; every `MarkovModel` keeps a clone.
#[derive(Clone)]
pub struct Engine {
	inner: Arc<EngineInner>,
}

struct EngineInner {
	store: Arc<dyn ModelStore>,
	splitter: Arc<dyn WordSplitter>,
	config: MarkovConfig,
	listeners: Vec<Arc<dyn SentenceListener>>,
}

/// Builder for `Engine`.
pub struct EngineBuilder {
	store: Arc<dyn ModelStore>,
	splitter: Arc<dyn WordSplitter>,
	config: MarkovConfig,
	listeners: Vec<Arc<dyn SentenceListener>>,
}

impl EngineBuilder {
	pub fn config(mut self, config: MarkovConfig) -> Self {
		self.config = config;
		self
	}

	pub fn splitter(mut self, splitter: Arc<dyn WordSplitter>) -> Self {
		self.splitter = splitter;
		self
	}

	/// Adds a listener called after every successful generation.
	pub fn listener(mut self, listener: Arc<dyn SentenceListener>) -> Self {
		self.listeners.push(listener);
		self
	}

	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn build(self) -> MarkovResult<Engine> {
		self.config.validate()?;
		Ok(Engine {
			inner: Arc::new(EngineInner {
				store: self.store,
				splitter: self.splitter,
				config: self.config,
				listeners: self.listeners,
			}),
		})
	}
}

/// Result of `Engine::combine_models`.
#[derive(Debug)]
pub enum Combined {
	/// A new, stored, uncompiled model.
	Model(MarkovModel),
	/// The merged chain, not stored.
	Chain(SparseChain),
}

#[derive(Debug)]
pub struct CombineOutcome {
	pub result: Combined,
	/// Number of models actually merged.
	pub merged: usize,
}

/// Counts over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSummary {
	pub ready_models: usize,
	pub total_sentences: u64,
	pub total_short_sentences: u64,
}

impl Engine {
	/// Starts an engine over `store` with the default configuration and
	/// the whitespace splitter.
	pub fn builder(store: Arc<dyn ModelStore>) -> EngineBuilder {
		EngineBuilder {
			store,
			splitter: Arc::new(WhitespaceSplitter),
			config: MarkovConfig::default(),
			listeners: Vec::new(),
		}
	}

	pub fn config(&self) -> &MarkovConfig {
		&self.inner.config
	}

	pub fn splitter(&self) -> &dyn WordSplitter {
		self.inner.splitter.as_ref()
	}

	pub fn store(&self) -> &dyn ModelStore {
		self.inner.store.as_ref()
	}

	/// Creates and stores an empty model.
	pub fn create_model(&self) -> MarkovResult<MarkovModel> {
		let record = ModelRecord::new(ModelId::new_v4());
		self.store().insert(&record)?;
		Ok(MarkovModel::from_record(self.clone(), record))
	}

	/// Loads a stored model.
	pub fn load_model(&self, id: &ModelId) -> MarkovResult<MarkovModel> {
		let record = self.store().get(id)?.ok_or(StorageError::NotFound(*id))?;
		Ok(MarkovModel::from_record(self.clone(), record))
	}

	/// Deletes a stored model. Returns false if it did not exist.
	///
	/// Listeners are told about the deletion once the record is gone.
	pub fn delete_model(&self, id: &ModelId) -> MarkovResult<bool> {
		let deleted = self.store().delete(id)?;
		if deleted {
			info!("model {id}: deleted");
			for listener in &self.inner.listeners {
				listener.model_deleted(id);
			}
		}
		Ok(deleted)
	}

	/// Screens `models` and merges the survivors.
	///
	/// With `ReturnType::Persisted`, a new uncompiled model is stored from
	/// the merged chain; with `ReturnType::Transient`, the chain is returned
	/// and nothing is stored. Inputs are never modified.
	///
	/// # Errors
	/// - weights in permissive mode, or not one weight per model
	/// - strict mode with any not ready, compiled or mismatched model
	/// - fewer than 2 models left to merge
	pub fn combine_models(
		&self,
		models: &[&MarkovModel],
		mode: CombineMode,
		return_type: ReturnType,
		weights: Option<&[f64]>,
	) -> MarkovResult<CombineOutcome> {
		let candidates: Vec<Option<&ChainData>> = models.iter().map(|model| model.chain()).collect();
		let CombinationResult { chain, merged } = combine_candidates(&candidates, mode, weights)?;

		let result = match return_type {
			ReturnType::Transient => Combined::Chain(chain),
			ReturnType::Persisted => {
				let mut record = ModelRecord::new(ModelId::new_v4());
				record.data = Some(ModelDocument::new(ChainData::Sparse(chain)));
				self.store().insert(&record)?;
				info!("model {}: combined from {merged} models", record.id);
				Combined::Model(MarkovModel::from_record(self.clone(), record))
			}
		};

		Ok(CombineOutcome { result, merged })
	}

	/// Ready model count and generated sentence totals.
	pub fn summary(&self, stats: &SentenceStats) -> MarkovResult<StoreSummary> {
		let mut ready_models = 0;
		for id in self.store().list_ids()? {
			if self.store().get(&id)?.is_some_and(|record| record.is_ready()) {
				ready_models += 1;
			}
		}

		let totals = stats.totals();
		Ok(StoreSummary {
			ready_models,
			total_sentences: totals.sentences,
			total_short_sentences: totals.short_sentences,
		})
	}

	pub(crate) fn emit(&self, event: &SentenceGenerated) {
		for listener in &self.inner.listeners {
			listener.sentence_generated(event);
		}
	}
}
