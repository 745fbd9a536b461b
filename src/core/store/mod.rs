//! Case persistence
//!
//! The engine needs three guarantees from storage:
//! - an atomic per-bucket increment-and-get for case sequences
//! - a compare-and-set on the "no extension yet" slot of an open case
//! - a compare-and-set on the current status of a case
//!
//! Two backends are provided: [`SqliteStore`] (the one the CLI uses) and
//! [`MemoryStore`].

mod memory;
mod serialize;
mod sqlite;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use thiserror::Error;

use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::core::extension::Extension;
use crate::core::sequence::Bucket;
use crate::entities::case::{Case, CaseId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors raised by a case store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Case store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Case not found: {id}")]
    CaseNotFound { id: CaseId },

    #[error("Case {case_number} is already stored")]
    DuplicateCase { case_number: CaseNumber },
}

impl StoreError {
    /// The store could not serve the request at all
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Database(_)
        )
    }
}

/// Selection criteria for listing cases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub status: Option<Status>,
    pub judge_id: Option<String>,
    pub bucket: Option<Bucket>,
}

impl CaseFilter {
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_judge(mut self, judge_id: impl Into<String>) -> Self {
        self.judge_id = Some(judge_id.into());
        self
    }

    pub fn with_bucket(mut self, bucket: Bucket) -> Self {
        self.bucket = Some(bucket);
        self
    }

    pub fn matches(&self, case: &Case) -> bool {
        self.status.map_or(true, |s| case.status == s)
            && self
                .judge_id
                .as_deref()
                .map_or(true, |j| case.judge_id == j)
            && self
                .bucket
                .map_or(true, |b| case.case_number.bucket() == b)
    }
}

/// Storage collaborator of the case engine
///
/// Implementations must make `next_sequence`, `set_extension_if_absent` and
/// `update_status` atomic with respect to concurrent callers.
pub trait CaseStore: Send + Sync {
    /// Increment the counter of `bucket` and return the new value (first call yields 1)
    fn next_sequence(&self, bucket: Bucket) -> Result<u32, StoreError>;

    fn insert_case(&self, case: &Case) -> Result<(), StoreError>;

    fn get_case(&self, id: &CaseId) -> Result<Option<Case>, StoreError>;

    fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, StoreError>;

    /// Store `extension` if the case has none yet and is still `en_tramite`;
    /// `false` means either condition no longer held
    fn set_extension_if_absent(
        &self,
        id: &CaseId,
        extension: &Extension,
    ) -> Result<bool, StoreError>;

    /// Replace the lifecycle fields of `case` if its stored status is still
    /// `expected`; `false` means another writer got there first
    fn update_status(&self, case: &Case, expected: Status) -> Result<bool, StoreError>;

    /// Matching cases, most recently filed first
    fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError>;
}

impl<T: CaseStore + ?Sized> CaseStore for Arc<T> {
    fn next_sequence(&self, bucket: Bucket) -> Result<u32, StoreError> {
        (**self).next_sequence(bucket)
    }

    fn insert_case(&self, case: &Case) -> Result<(), StoreError> {
        (**self).insert_case(case)
    }

    fn get_case(&self, id: &CaseId) -> Result<Option<Case>, StoreError> {
        (**self).get_case(id)
    }

    fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, StoreError> {
        (**self).find_by_number(number)
    }

    fn set_extension_if_absent(
        &self,
        id: &CaseId,
        extension: &Extension,
    ) -> Result<bool, StoreError> {
        (**self).set_extension_if_absent(id, extension)
    }

    fn update_status(&self, case: &Case, expected: Status) -> Result<bool, StoreError> {
        (**self).update_status(case, expected)
    }

    fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError> {
        (**self).list_cases(filter)
    }
}
