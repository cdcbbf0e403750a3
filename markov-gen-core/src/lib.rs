//! Markov chain sentence generation library.
//!
//! This crate builds, stores, merges and samples from n-gram transition
//! models over token sequences:
//! - Chain construction from a tokenized corpus
//! - Compilation into a cumulative-weight structure for fast sampling
//! - Weighted combination of compatible chains, with candidate screening
//! - Retry-bounded sentence generation under a length limit
//! - A stored model lifecycle emitting generation events
//!
//! ```no_run
//! use std::sync::Arc;
//! use markov_gen_core::model::{BuildOptions, Engine};
//! use markov_gen_core::store::MemoryStore;
//!
//! let engine = Engine::builder(Arc::new(MemoryStore::new())).build()?;
//! let mut model = engine.create_model()?;
//! model.build(&["My name is Inigo Montoya."], BuildOptions::default())?;
//! let sentence = model.generate_sentence(0, None)?;
//! # Ok::<(), markov_gen_core::error::MarkovError>(())
//! ```

/// Chains, sampling and the stored model lifecycle.
pub mod model;

/// Word splitters and sentence splitting.
pub mod text;

/// Model record persistence.
pub mod store;

/// Generation events and usage statistics.
pub mod events;

/// Engine configuration.
pub mod config;

/// Error types.
pub mod error;

/// File helpers (corpus loading, atomic writes).
pub mod io;
