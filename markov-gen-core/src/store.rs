//! Persistence of model records.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use log::warn;

use crate::error::StorageError;
use crate::io::{build_file_path, list_files, write_atomic};
use crate::model::ModelId;
use crate::model::document::ModelRecord;

const RECORD_EXTENSION: &str = "json";

/// Storage backend for model records.
///
/// Every write replaces one whole record, so an operation that fails
/// before calling `update` leaves the stored record untouched.
pub trait ModelStore: Send + Sync {
	/// Stores a new record.
	fn insert(&self, record: &ModelRecord) -> Result<(), StorageError>;
	/// Loads a record, `None` if it does not exist.
	fn get(&self, id: &ModelId) -> Result<Option<ModelRecord>, StorageError>;
	/// Replaces an existing record.
	fn update(&self, record: &ModelRecord) -> Result<(), StorageError>;
	/// Deletes a record. Returns false if it did not exist.
	fn delete(&self, id: &ModelId) -> Result<bool, StorageError>;
	/// Ids of all stored records.
	fn list_ids(&self) -> Result<Vec<ModelId>, StorageError>;
}

/// In-memory store keeping each record as its JSON document.
#[derive(Debug, Default)]
pub struct MemoryStore {
	records: DashMap<ModelId, String>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Raw stored JSON of a record.
	pub fn raw(&self, id: &ModelId) -> Option<String> {
		self.records.get(id).map(|json| json.value().clone())
	}
}

impl ModelStore for MemoryStore {
	fn insert(&self, record: &ModelRecord) -> Result<(), StorageError> {
		let json = serde_json::to_string(record)?;
		self.records.insert(record.id, json);
		Ok(())
	}

	fn get(&self, id: &ModelId) -> Result<Option<ModelRecord>, StorageError> {
		match self.records.get(id) {
			Some(json) => Ok(Some(serde_json::from_str(json.value())?)),
			None => Ok(None),
		}
	}

	fn update(&self, record: &ModelRecord) -> Result<(), StorageError> {
		let json = serde_json::to_string(record)?;
		match self.records.get_mut(&record.id) {
			Some(mut stored) => {
				*stored = json;
				Ok(())
			}
			None => Err(StorageError::NotFound(record.id)),
		}
	}

	fn delete(&self, id: &ModelId) -> Result<bool, StorageError> {
		Ok(self.records.remove(id).is_some())
	}

	fn list_ids(&self) -> Result<Vec<ModelId>, StorageError> {
		let mut ids: Vec<ModelId> = self.records.iter().map(|entry| *entry.key()).collect();
		ids.sort();
		Ok(ids)
	}
}

/// Directory store: one `<id>.json` file per model.
///
/// Files are replaced atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
	folder: PathBuf,
}

impl FileStore {
	/// Opens (and creates if needed) a store directory.
	///
	/// # Errors
	/// Returns an error if the path exists and is not a directory.
	pub fn open<P: AsRef<Path>>(folder: P) -> Result<Self, StorageError> {
		let folder = folder.as_ref().to_path_buf();
		fs::create_dir_all(&folder)?;
		if !folder.is_dir() {
			return Err(StorageError::Io(std::io::Error::new(
				std::io::ErrorKind::InvalidInput,
				format!("Expected a directory, got: {}", folder.display()),
			)));
		}
		Ok(Self { folder })
	}

	pub fn folder(&self) -> &Path {
		&self.folder
	}

	fn path_of(&self, id: &ModelId) -> PathBuf {
		build_file_path(&self.folder, &id.to_string(), RECORD_EXTENSION)
	}

	fn write(&self, record: &ModelRecord) -> Result<(), StorageError> {
		let bytes = serde_json::to_vec(record)?;
		write_atomic(self.path_of(&record.id), &bytes)?;
		Ok(())
	}
}

impl ModelStore for FileStore {
	fn insert(&self, record: &ModelRecord) -> Result<(), StorageError> {
		self.write(record)
	}

	fn get(&self, id: &ModelId) -> Result<Option<ModelRecord>, StorageError> {
		let bytes = match fs::read(self.path_of(id)) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		Ok(Some(serde_json::from_slice(&bytes)?))
	}

	fn update(&self, record: &ModelRecord) -> Result<(), StorageError> {
		if !self.path_of(&record.id).is_file() {
			return Err(StorageError::NotFound(record.id));
		}
		self.write(record)
	}

	fn delete(&self, id: &ModelId) -> Result<bool, StorageError> {
		match fs::remove_file(self.path_of(id)) {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(e) => Err(e.into()),
		}
	}

	fn list_ids(&self) -> Result<Vec<ModelId>, StorageError> {
		let mut ids = Vec::new();
		for file in list_files(&self.folder, RECORD_EXTENSION)? {
			match file.file_stem().and_then(|stem| stem.to_str()).map(str::parse::<ModelId>) {
				Some(Ok(id)) => ids.push(id),
				_ => warn!("ignoring {} in model store {}", file.display(), self.folder.display()),
			}
		}
		ids.sort();
		Ok(ids)
	}
}
