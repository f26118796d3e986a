//! Record repository port: Trait for patient record persistence.
//!
//! The application layer only needs a keyed collection with
//! get/list/put/delete. Backends decide how (and how durably) it is stored.

use crate::domain::PatientRecord;

/// Keyed patient record collection.
///
/// Implementations must preserve insertion order in [`list`](Self::list):
/// new ids go to the end, replacing an existing id keeps its position.
pub trait RecordRepository: Send + Sync {
    /// Error type for repository operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every record with its id, in insertion order.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read.
    fn list(&self) -> Result<Vec<(String, PatientRecord)>, Self::Error>;

    /// Load one record.
    ///
    /// # Returns
    /// `None` if no record has this id.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read.
    fn get(&self, id: &str) -> Result<Option<PatientRecord>, Self::Error>;

    /// Insert or replace a record.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn put(&self, id: &str, record: &PatientRecord) -> Result<(), Self::Error>;

    /// Remove a record.
    ///
    /// # Returns
    /// `false` if no record had this id.
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written.
    fn delete(&self, id: &str) -> Result<bool, Self::Error>;
}
