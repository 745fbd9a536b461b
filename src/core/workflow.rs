//! Workflow engine for case status transitions
//!
//! Status changes are validated against a fixed transition table. Deadlines
//! are never consulted here: a judge may close a case early or keep it open
//! after it is overdue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::entities::case::{Case, CaseId};

/// Errors that can occur during workflow operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Invalid status transition: {from} → {to}")]
    InvalidTransition { from: Status, to: Status },
}

/// Record of an accepted transition, handed to the audit sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub case_id: CaseId,
    pub case_number: CaseNumber,
    pub from: Status,
    pub to: Status,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// State machine over [`Status`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseStateMachine;

impl CaseStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Check if a status transition is valid
    pub fn is_valid_transition(&self, from: Status, to: Status) -> bool {
        matches!(
            (from, to),
            // Normal forward transitions
            (Status::EnTramite, Status::Resuelto)
                | (Status::Resuelto, Status::Cerrado)
                // Administrative override from any non-terminal status
                | (Status::EnTramite, Status::Archivado)
                | (Status::Resuelto, Status::Archivado)
        )
    }

    /// Get allowed transitions from the current status
    pub fn allowed_transitions(&self, current: Status) -> Vec<Status> {
        match current {
            Status::EnTramite => vec![Status::Resuelto, Status::Archivado],
            Status::Resuelto => vec![Status::Cerrado, Status::Archivado],
            Status::Cerrado => vec![],
            Status::Archivado => vec![],
        }
    }

    /// Apply a transition to a copy of `case`
    ///
    /// On rejection the input is untouched. On success the returned case
    /// carries the new status and the matching lifecycle timestamp.
    pub fn transition(
        &self,
        case: &Case,
        target: Status,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(Case, TransitionEvent), WorkflowError> {
        let from = case.status;
        if !self.is_valid_transition(from, target) {
            return Err(WorkflowError::InvalidTransition { from, to: target });
        }

        let mut next = case.clone();
        next.status = target;
        next.updated_at = now;
        match target {
            Status::Resuelto => next.resolved_at = Some(now),
            Status::Cerrado => next.closed_at = Some(now),
            Status::Archivado => next.archived_at = Some(now),
            Status::EnTramite => {}
        }

        let event = TransitionEvent {
            case_id: case.id,
            case_number: case.case_number,
            from,
            to: target,
            actor: actor.to_string(),
            at: now,
        };

        Ok((next, event))
    }
}
