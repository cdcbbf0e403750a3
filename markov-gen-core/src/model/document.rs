use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ModelId;
use super::chain::SparseChain;
use super::compiled::CompiledChain;
use super::state::{State, Token, Transitions};
use crate::error::StorageError;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Chain stored in a model: either still sparse or already compiled.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainData {
	Sparse(SparseChain),
	Compiled(CompiledChain),
}

impl ChainData {
	pub fn state_size(&self) -> usize {
		match self {
			ChainData::Sparse(chain) => chain.state_size(),
			ChainData::Compiled(chain) => chain.state_size(),
		}
	}

	pub fn is_compiled(&self) -> bool {
		matches!(self, ChainData::Compiled(_))
	}

	pub fn is_empty(&self) -> bool {
		match self {
			ChainData::Sparse(chain) => chain.is_empty(),
			ChainData::Compiled(chain) => chain.is_empty(),
		}
	}

	/// Compiled form of the chain. Idempotent on compiled data.
	pub fn compile(&self) -> CompiledChain {
		match self {
			ChainData::Sparse(chain) => chain.compile(),
			ChainData::Compiled(chain) => chain.compile(),
		}
	}

	pub fn as_sparse(&self) -> Option<&SparseChain> {
		match self {
			ChainData::Sparse(chain) => Some(chain),
			ChainData::Compiled(_) => None,
		}
	}
}

/// Persisted chain document: `{stateSize, compiled, chain}`.
///
/// The sparse form maps a state key to `{token: weight}`; the compiled
/// form maps a state key to `[[token, cumulativeWeight], ...]`. Whole
/// weights are written as integers.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDocument {
	chain: ChainData,
}

impl ModelDocument {
	pub fn new(chain: ChainData) -> Self {
		Self { chain }
	}

	pub fn chain(&self) -> &ChainData {
		&self.chain
	}

	pub fn into_chain(self) -> ChainData {
		self.chain
	}

	pub fn state_size(&self) -> usize {
		self.chain.state_size()
	}

	pub fn is_compiled(&self) -> bool {
		self.chain.is_compiled()
	}
}

/// One stored model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
	pub id: ModelId,
	pub created_at: DateTime<Utc>,
	pub modified_at: DateTime<Utc>,
	/// `None` until the first build.
	pub data: Option<ModelDocument>,
}

impl ModelRecord {
	/// New, empty record stamped with the current time.
	pub fn new(id: ModelId) -> Self {
		let now = Utc::now();
		Self { id, created_at: now, modified_at: now, data: None }
	}

	/// True iff chain data is present and non-empty.
	pub fn is_ready(&self) -> bool {
		self.data.as_ref().is_some_and(|document| !document.chain().is_empty())
	}

	/// Sparse chain of a ready, uncompiled record.
	pub fn sparse_chain(&self) -> Option<&SparseChain> {
		self.data.as_ref().and_then(|document| document.chain().as_sparse())
	}
}

/// Weight written as an integer when it has no fractional part.
struct Weight(f64);

impl Serialize for Weight {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let value = self.0;
		if value.fract() == 0.0 && (0.0..=MAX_EXACT_INTEGER).contains(&value) {
			serializer.serialize_u64(value as u64)
		} else {
			serializer.serialize_f64(value)
		}
	}
}

struct SparseWire<'a>(&'a SparseChain);
struct TransitionsWire<'a>(&'a Transitions);
struct CompiledWire<'a>(&'a CompiledChain);
struct TableWire<'a>(&'a [(Token, f64)]);

impl Serialize for SparseWire<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (state, transitions) in self.0.iter() {
			map.serialize_entry(&state.key(), &TransitionsWire(transitions))?;
		}
		map.end()
	}
}

impl Serialize for TransitionsWire<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (token, weight) in self.0.iter() {
			map.serialize_entry(token.as_str(), &Weight(weight))?;
		}
		map.end()
	}
}

impl Serialize for CompiledWire<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.0.len()))?;
		for (state, table) in self.0.iter() {
			map.serialize_entry(&state.key(), &TableWire(table))?;
		}
		map.end()
	}
}

impl Serialize for TableWire<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
		for (token, cumulative) in self.0 {
			seq.serialize_element(&(token.as_str(), Weight(*cumulative)))?;
		}
		seq.end()
	}
}

impl Serialize for ModelDocument {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut document = serializer.serialize_struct("ModelDocument", 3)?;
		document.serialize_field("stateSize", &self.state_size())?;
		document.serialize_field("compiled", &self.is_compiled())?;
		match &self.chain {
			ChainData::Sparse(chain) => document.serialize_field("chain", &SparseWire(chain))?,
			ChainData::Compiled(chain) => document.serialize_field("chain", &CompiledWire(chain))?,
		}
		document.end()
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
	state_size: usize,
	compiled: bool,
	chain: serde_json::Value,
}

type SparseRaw = BTreeMap<String, BTreeMap<String, f64>>;
type CompiledRaw = BTreeMap<String, Vec<(String, f64)>>;

impl TryFrom<RawDocument> for ModelDocument {
	type Error = StorageError;

	fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
		if raw.state_size == 0 {
			return Err(StorageError::CorruptDocument("state size 0".to_owned()));
		}
		let parse_state = |key: &str| {
			State::from_key(key, raw.state_size).ok_or_else(|| {
				StorageError::CorruptDocument(format!("state {key:?} does not hold {} tokens", raw.state_size))
			})
		};
		let check_weight = |weight: f64| {
			if weight.is_finite() && weight >= 0.0 {
				Ok(weight)
			} else {
				Err(StorageError::CorruptDocument(format!("invalid weight {weight}")))
			}
		};

		let chain = if raw.compiled {
			let states: CompiledRaw = serde_json::from_value(raw.chain)?;
			let mut chain = CompiledChain::with_state_size(raw.state_size);
			for (key, table) in states {
				let table = table
					.into_iter()
					.map(|(token, cumulative)| Ok((Token::new(token), check_weight(cumulative)?)))
					.collect::<Result<Vec<_>, StorageError>>()?;
				chain.insert_state(parse_state(&key)?, table);
			}
			ChainData::Compiled(chain)
		} else {
			let states: SparseRaw = serde_json::from_value(raw.chain)?;
			let mut chain = SparseChain::new(raw.state_size)
				.map_err(|e| StorageError::CorruptDocument(e.to_string()))?;
			for (key, weights) in states {
				let mut transitions = Transitions::new();
				for (token, weight) in weights {
					transitions.insert(Token::new(token), check_weight(weight)?);
				}
				chain.insert_state(parse_state(&key)?, transitions);
			}
			ChainData::Sparse(chain)
		};

		Ok(Self { chain })
	}
}

impl<'de> Deserialize<'de> for ModelDocument {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = RawDocument::deserialize(deserializer)?;
		ModelDocument::try_from(raw).map_err(serde::de::Error::custom)
	}
}
