//! JSON file adapter: Implementation of RecordRepository.
//!
//! The whole collection lives in one JSON object keyed by patient id:
//!
//! ```json
//! { "P001": { "name": "...", "city": "...", "age": 28, ... }, ... }
//! ```
//!
//! Every operation loads the full file and every write overwrites it. Writes
//! go to a sibling `.tmp` file that is then renamed over the original, so a
//! crash mid-write leaves either the old or the new collection on disk.
//!
//! # Mutex Behavior
//!
//! File access is serialized by a `Mutex` within one process. Separate
//! processes sharing the same file are not coordinated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::domain::PatientRecord;
use crate::ports::RecordRepository;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Flat-file record repository.
pub struct JsonFileRepository {
    path: PathBuf,
    io: Mutex<()>,
}

impl JsonFileRepository {
    /// Create a repository backed by `path`. The file is created on first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            io: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.io.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Read the whole collection. A missing or blank file is an empty collection.
    fn load(&self) -> Result<Vec<(String, PatientRecord)>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let map: Map<String, Value> = serde_json::from_str(&content).map_err(|e| {
            StorageError::Serialization(format!(
                "{} is not a JSON object: {e}",
                self.path.display()
            ))
        })?;

        map.into_iter()
            .map(|(id, value)| {
                serde_json::from_value::<PatientRecord>(value)
                    .map(|record| (id.clone(), record))
                    .map_err(|e| StorageError::Serialization(format!("record {id}: {e}")))
            })
            .collect()
    }

    /// Overwrite the whole collection.
    fn save(&self, records: &[(String, PatientRecord)]) -> Result<(), StorageError> {
        let mut map = Map::with_capacity(records.len());
        for (id, record) in records {
            let value = serde_json::to_value(record)
                .map_err(|e| StorageError::Serialization(format!("record {id}: {e}")))?;
            map.insert(id.clone(), value);
        }
        let json = serde_json::to_string_pretty(&map)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordRepository for JsonFileRepository {
    type Error = StorageError;

    fn list(&self) -> Result<Vec<(String, PatientRecord)>, Self::Error> {
        let _guard = self.lock()?;
        self.load()
    }

    fn get(&self, id: &str) -> Result<Option<PatientRecord>, Self::Error> {
        let _guard = self.lock()?;
        Ok(self
            .load()?
            .into_iter()
            .find(|(key, _)| key == id)
            .map(|(_, record)| record))
    }

    fn put(&self, id: &str, record: &PatientRecord) -> Result<(), Self::Error> {
        let _guard = self.lock()?;
        let mut records = self.load()?;
        match records.iter_mut().find(|(key, _)| key == id) {
            Some((_, existing)) => *existing = record.clone(),
            None => records.push((id.to_string(), record.clone())),
        }
        self.save(&records)
    }

    fn delete(&self, id: &str) -> Result<bool, Self::Error> {
        let _guard = self.lock()?;
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|(key, _)| key != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }
}
