//! Record service: Patient record CRUD over a repository.
//!
//! Every operation is a full read-modify-write against the repository.
//! Check-then-write sequences (create, update, delete) run under a
//! service-level lock so two requests cannot both pass the existence check.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::adapters::StorageError;
use crate::domain::{Patient, PatientRecord, PatientUpdate, SortField, SortOrder, ValidationError};
use crate::ports::RecordRepository;

/// Errors returned by record operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Patient not found")]
    NotFound(String),

    #[error("Patient already exists")]
    Conflict(String),

    #[error("Invalid field. Choose from {:?}", SortField::NAMES)]
    InvalidSortField(String),

    #[error("Invalid order. Choose asc or desc")]
    InvalidSortOrder(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Record task failed: {0}")]
    Task(String),
}

/// Service for patient record management.
pub struct RecordService<R>
where
    R: RecordRepository,
{
    repo: Arc<R>,
    write_lock: Mutex<()>,
}

impl<R> RecordService<R>
where
    R: RecordRepository,
    R::Error: Into<StorageError>,
{
    /// Create a new record service.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, RecordError> {
        self.write_lock
            .lock()
            .map_err(|_| RecordError::Storage(StorageError::LockPoisoned))
    }

    /// All records in insertion order.
    ///
    /// # Errors
    /// Returns error if the repository cannot be read.
    pub fn list(&self) -> Result<Vec<(String, PatientRecord)>, RecordError> {
        self.repo.list().map_err(|e| RecordError::Storage(e.into()))
    }

    /// One record by id.
    ///
    /// # Errors
    /// Returns `RecordError::NotFound` if no record has this id.
    pub fn get(&self, id: &str) -> Result<PatientRecord, RecordError> {
        self.repo
            .get(id)
            .map_err(|e| RecordError::Storage(e.into()))?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))
    }

    /// Insert a new record.
    ///
    /// # Errors
    /// Returns `RecordError::Conflict` if the id is taken.
    pub fn create(&self, patient: Patient) -> Result<(), RecordError> {
        let _guard = self.lock()?;
        let exists = self
            .repo
            .get(&patient.id)
            .map_err(|e| RecordError::Storage(e.into()))?
            .is_some();
        if exists {
            tracing::info!("Create rejected: {} already exists", patient.id);
            return Err(RecordError::Conflict(patient.id));
        }

        self.repo
            .put(&patient.id, &patient.record)
            .map_err(|e| RecordError::Storage(e.into()))?;
        tracing::info!("Created patient {}", patient.id);
        Ok(())
    }

    /// Merge supplied fields into an existing record.
    ///
    /// Returns the record as stored.
    ///
    /// # Errors
    /// Returns `RecordError::NotFound` if the id is absent (nothing is
    /// written), or `RecordError::Validation` if the merged record is invalid.
    pub fn update(&self, id: &str, update: &PatientUpdate) -> Result<PatientRecord, RecordError> {
        let _guard = self.lock()?;
        let existing = self
            .repo
            .get(id)
            .map_err(|e| RecordError::Storage(e.into()))?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;

        let merged = update.apply(&existing);
        merged.validate()?;

        self.repo
            .put(id, &merged)
            .map_err(|e| RecordError::Storage(e.into()))?;
        tracing::info!("Updated patient {id}");
        Ok(merged)
    }

    /// Remove a record.
    ///
    /// # Errors
    /// Returns `RecordError::NotFound` if the id is absent.
    pub fn delete(&self, id: &str) -> Result<(), RecordError> {
        let _guard = self.lock()?;
        let removed = self
            .repo
            .delete(id)
            .map_err(|e| RecordError::Storage(e.into()))?;
        if !removed {
            return Err(RecordError::NotFound(id.to_string()));
        }
        tracing::info!("Deleted patient {id}");
        Ok(())
    }

    /// Records ordered by `sort_by`, with ties kept in insertion order.
    ///
    /// Parameters are checked before the repository is touched. A missing
    /// `order` means ascending.
    ///
    /// # Errors
    /// Returns `InvalidSortField` or `InvalidSortOrder` for unknown values.
    pub fn sort(
        &self,
        sort_by: &str,
        order: Option<&str>,
    ) -> Result<Vec<(String, PatientRecord)>, RecordError> {
        let field = SortField::parse(sort_by)
            .ok_or_else(|| RecordError::InvalidSortField(sort_by.to_string()))?;
        let order = match order {
            None => SortOrder::default(),
            Some(o) => {
                SortOrder::parse(o).ok_or_else(|| RecordError::InvalidSortOrder(o.to_string()))?
            }
        };

        let mut records = self.list()?;
        match order {
            SortOrder::Asc => {
                records.sort_by(|(_, a), (_, b)| a.sort_key(field).total_cmp(&b.sort_key(field)))
            }
            SortOrder::Desc => {
                records.sort_by(|(_, a), (_, b)| b.sort_key(field).total_cmp(&a.sort_key(field)))
            }
        }
        Ok(records)
    }
}
