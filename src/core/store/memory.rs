//! In-process case store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{CaseFilter, CaseStore, StoreError};
use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::core::extension::{Extension, ExtensionState};
use crate::core::sequence::Bucket;
use crate::entities::case::{Case, CaseId};

#[derive(Debug, Default)]
struct State {
    counters: HashMap<Bucket, u32>,
    cases: HashMap<CaseId, Case>,
}

/// Mutex-guarded maps; every operation holds the lock for its whole
/// read-modify-write
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing store going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "memory store is offline".to_string(),
            });
        }
        self.state.lock().map_err(|_| StoreError::Unavailable {
            message: "memory store lock poisoned".to_string(),
        })
    }
}

impl CaseStore for MemoryStore {
    fn next_sequence(&self, bucket: Bucket) -> Result<u32, StoreError> {
        let mut state = self.state()?;
        let counter = state.counters.entry(bucket).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn insert_case(&self, case: &Case) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let duplicate = state
            .cases
            .values()
            .any(|c| c.id == case.id || c.case_number == case.case_number);
        if duplicate {
            return Err(StoreError::DuplicateCase {
                case_number: case.case_number,
            });
        }
        state.cases.insert(case.id, case.clone());
        Ok(())
    }

    fn get_case(&self, id: &CaseId) -> Result<Option<Case>, StoreError> {
        Ok(self.state()?.cases.get(id).cloned())
    }

    fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, StoreError> {
        Ok(self
            .state()?
            .cases
            .values()
            .find(|c| c.case_number == *number)
            .cloned())
    }

    fn set_extension_if_absent(
        &self,
        id: &CaseId,
        extension: &Extension,
    ) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        let case = state
            .cases
            .get_mut(id)
            .ok_or(StoreError::CaseNotFound { id: *id })?;
        if case.extension.is_granted() || case.status != Status::EnTramite {
            return Ok(false);
        }
        case.extension = ExtensionState::Granted(extension.clone());
        case.updated_at = extension.granted_at;
        Ok(true)
    }

    fn update_status(&self, case: &Case, expected: Status) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        let stored = state
            .cases
            .get_mut(&case.id)
            .ok_or(StoreError::CaseNotFound { id: case.id })?;
        if stored.status != expected {
            return Ok(false);
        }
        stored.status = case.status;
        stored.resolution = case.resolution.clone();
        stored.resolved_at = case.resolved_at;
        stored.closed_at = case.closed_at;
        stored.archived_at = case.archived_at;
        stored.updated_at = case.updated_at;
        Ok(true)
    }

    fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError> {
        let state = self.state()?;
        let mut cases: Vec<Case> = state
            .cases
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        cases.sort_by(|a, b| {
            b.filed_at
                .cmp(&a.filed_at)
                .then_with(|| b.case_number.cmp(&a.case_number))
        });
        Ok(cases)
    }
}
