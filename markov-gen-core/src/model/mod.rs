//! Top-level module for the Markov chain engine.
//!
//! This module provides:
//! - Tokens and sampling states (`Token`, `State`)
//! - Sparse, combinable chains (`SparseChain`)
//! - Compiled chains for O(log n) sampling (`CompiledChain`)
//! - Weighted combination with candidate screening
//! - Sentence generation under attempt and length constraints
//! - The stored model lifecycle (`Engine`, `MarkovModel`)

/// Identifier of a stored model.
pub type ModelId = uuid::Uuid;

/// Tokens, sampling states and per-state transitions.
pub mod state;

/// Sparse chain construction and merging.
///
/// Handles sentence ingestion, transition counting,
/// parallel construction, and weighted merging.
pub mod chain;

/// Compiled chain and the random walk over it.
pub mod compiled;

/// Weighted combination of chains and screening of candidate pools.
pub mod combine;

/// Persisted form of a model.
pub mod document;

/// Retry-bounded sentence generation.
pub mod generator;

/// Engine handle: store, splitter, configuration and listeners.
pub mod engine;

/// Stored model lifecycle: build, augment, compile, generate.
pub mod text_model;

pub use chain::SparseChain;
pub use combine::{CombinationResult, CombineMode, ReturnType};
pub use compiled::{CompiledChain, Walk};
pub use document::{ChainData, ModelDocument, ModelRecord};
pub use engine::{CombineOutcome, Combined, Engine, EngineBuilder, StoreSummary};
pub use generator::SentenceGenerator;
pub use state::{State, Token};
pub use text_model::{BuildOptions, MarkovModel};
