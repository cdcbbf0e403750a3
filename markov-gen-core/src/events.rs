//! Generation events and the usage statistics built from them.

use dashmap::DashMap;

use crate::model::ModelId;

/// Emitted after a sentence was generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGenerated {
	pub model_id: ModelId,
	/// Character limit of the request (0 = none).
	pub char_limit: usize,
	pub sentence: String,
}

/// Receives generation events, synchronously, on the generating thread.
///
/// Delivery is at-least-once if the caller retries a generation, so
/// listeners must tolerate duplicates.
pub trait SentenceListener: Send + Sync {
	fn sentence_generated(&self, event: &SentenceGenerated);

	/// Called after a model was deleted from the store.
	fn model_deleted(&self, _id: &ModelId) {}
}

impl<F> SentenceListener for F
where
	F: Fn(&SentenceGenerated) + Send + Sync,
{
	fn sentence_generated(&self, event: &SentenceGenerated) {
		self(event)
	}
}

/// Generated sentence counters of one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentenceCounts {
	/// Number of sentences generated from the model.
	pub sentences: u64,
	/// Of the total, how many had a character limit.
	pub short_sentences: u64,
}

/// Usage statistics aggregated from generation events.
///
/// Counters of a model are dropped when the engine deletes it, so totals
/// only cover models still in the store.
#[derive(Debug, Default)]
pub struct SentenceStats {
	counts: DashMap<ModelId, SentenceCounts>,
}

impl SentenceStats {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counters of one model (zero if it never generated anything).
	pub fn model(&self, id: &ModelId) -> SentenceCounts {
		self.counts.get(id).map(|counts| *counts).unwrap_or_default()
	}

	/// Counters summed over every model.
	pub fn totals(&self) -> SentenceCounts {
		self.counts.iter().fold(SentenceCounts::default(), |total, counts| SentenceCounts {
			sentences: total.sentences + counts.sentences,
			short_sentences: total.short_sentences + counts.short_sentences,
		})
	}

	/// Drops the counters of a model.
	pub fn forget(&self, id: &ModelId) {
		self.counts.remove(id);
	}
}

impl SentenceListener for SentenceStats {
	fn sentence_generated(&self, event: &SentenceGenerated) {
		let mut entry = self.counts.entry(event.model_id).or_default();
		entry.sentences += 1;
		if event.char_limit > 0 {
			entry.short_sentences += 1;
		}
	}

	fn model_deleted(&self, id: &ModelId) {
		self.forget(id);
	}
}
