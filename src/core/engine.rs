//! Case engine: the operations callers actually use
//!
//! Filing, deadline views, extensions and status changes all go through
//! [`CaseEngine`]. Every write first reloads the stored case and then relies on
//! the store's compare-and-set, so a stale `Case` held by the caller can never
//! overwrite newer state.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink};
use crate::core::case_number::{CaseNumber, CaseNumberError, CaseNumberGenerator};
use crate::core::config::{Config, ConfigError};
use crate::core::deadline::{DeadlinePolicy, DeadlineTracker, DeadlineView};
use crate::core::entity::Status;
use crate::core::extension::{ExtensionError, ExtensionManager};
use crate::core::sequence::Bucket;
use crate::core::store::{CaseFilter, CaseStore, StoreError};
use crate::core::workflow::{CaseStateMachine, TransitionEvent, WorkflowError};
use crate::entities::case::{Case, CaseId, NewCase, Resolution};

/// Errors returned by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    #[error("Sequence exhausted for {bucket}: limit is {max} cases per month")]
    SequenceExhausted { bucket: Bucket, max: u32 },

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Case not found: {reference}")]
    CaseNotFound { reference: String },

    #[error("Not a case number or case id: '{reference}'")]
    InvalidReference { reference: String },

    #[error("Case {case_number} changed status concurrently (expected {expected}); reload and retry")]
    ConcurrentModification {
        case_number: CaseNumber,
        expected: Status,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The change to `case` is stored; only its audit record is missing
    #[error("Case {case_number} was saved ({action}) but its audit record failed: {source}")]
    AuditFailed {
        case_number: CaseNumber,
        action: AuditAction,
        case: Box<Case>,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    /// The caller can fix the input (or reload) and try again
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            EngineError::StorageUnavailable(_)
                | EngineError::SequenceExhausted { .. }
                | EngineError::AuditFailed { .. }
        )
    }

    /// Case state that was stored even though the operation reported an error
    pub fn committed_case(&self) -> Option<&Case> {
        match self {
            EngineError::AuditFailed { case, .. } => Some(case.as_ref()),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CaseNotFound { id } => EngineError::CaseNotFound {
                reference: id.to_string(),
            },
            other => EngineError::StorageUnavailable(other),
        }
    }
}

impl From<CaseNumberError> for EngineError {
    fn from(err: CaseNumberError) -> Self {
        match err {
            CaseNumberError::SequenceExhausted { bucket, max, .. } => {
                EngineError::SequenceExhausted { bucket, max }
            }
            CaseNumberError::Malformed { input, .. } => {
                EngineError::InvalidReference { reference: input }
            }
            CaseNumberError::Storage(e) => e.into(),
        }
    }
}

/// Case lifecycle engine over a store and an audit sink
pub struct CaseEngine<S, A = TracingAuditSink> {
    store: S,
    audit: A,
    numbers: CaseNumberGenerator,
    deadlines: DeadlineTracker,
    extensions: ExtensionManager,
    workflow: CaseStateMachine,
}

impl<S: CaseStore> CaseEngine<S> {
    /// Engine with statutory periods, UTC numbering and a tracing audit sink
    pub fn new(store: S) -> Self {
        Self::with_audit(store, TracingAuditSink)
    }
}

impl<S: CaseStore, A: AuditSink> CaseEngine<S, A> {
    pub fn with_audit(store: S, audit: A) -> Self {
        Self {
            store,
            audit,
            numbers: CaseNumberGenerator::utc(),
            deadlines: DeadlineTracker::default(),
            extensions: ExtensionManager::default(),
            workflow: CaseStateMachine::new(),
        }
    }

    /// Use `policy` for deadlines and for the length of extensions
    pub fn with_policy(mut self, policy: DeadlinePolicy) -> Self {
        self.deadlines = DeadlineTracker::new(policy);
        self.extensions = ExtensionManager::new(policy.extension_days);
        self
    }

    pub fn with_numbering(mut self, numbers: CaseNumberGenerator) -> Self {
        self.numbers = numbers;
        self
    }

    /// Apply the deadline and numbering sections of a loaded config
    pub fn configure(self, config: &Config) -> Result<Self, ConfigError> {
        let offset = config.utc_offset()?;
        Ok(self
            .with_policy(config.deadlines)
            .with_numbering(CaseNumberGenerator::new(offset)))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        self.deadlines.policy()
    }

    pub fn workflow(&self) -> &CaseStateMachine {
        &self.workflow
    }

    /// File a new case: allocate its number and store it as `en_tramite`
    ///
    /// Nothing is stored unless a number was obtained. A number allocated for
    /// an insert that then fails is skipped, never reused.
    pub fn file_case(&self, request: NewCase, now: DateTime<Utc>) -> Result<Case, EngineError> {
        let judge_id = request.judge_id.trim();
        if judge_id.is_empty() {
            return Err(EngineError::InvalidRequest(
                "a case must be assigned to a judge".to_string(),
            ));
        }
        let request = NewCase {
            judge_id: judge_id.to_string(),
            ..request
        };

        let number = self.numbers.generate(&self.store, now).map_err(|e| {
            tracing::warn!(error = %e, "case numbering failed");
            EngineError::from(e)
        })?;

        let case = Case::file(number, request, now);
        self.store.insert_case(&case)?;
        tracing::info!(
            case_number = %case.case_number,
            case_id = %case.id,
            judge = %case.judge_id,
            conflict = %case.conflict_type,
            block = %case.residential_block,
            "case filed"
        );

        let event = AuditEvent::filed(&case, &case.judge_id);
        self.audited(&event, case)
    }

    /// Deadline state of `case` at `now`; pure
    pub fn view_deadline(&self, case: &Case, now: DateTime<Utc>) -> DeadlineView {
        self.deadlines.evaluate(case.filed_at, &case.extension, now)
    }

    /// Grant the one-time extension and return the updated case
    pub fn grant_extension(
        &self,
        case: &Case,
        reason: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Case, EngineError> {
        let stored = self.load(&case.id)?;

        let extension = self
            .extensions
            .grant(&stored, reason, now)
            .map_err(|e| {
                tracing::warn!(case_number = %stored.case_number, error = %e, "extension refused");
                e
            })?
            .granted_by(actor);

        if !self.store.set_extension_if_absent(&stored.id, &extension)? {
            // Another writer changed the case between load and write
            let current = self.load(&stored.id)?;
            let err = match self.extensions.grant(&current, reason, now) {
                Err(e) => e,
                Ok(_) => ExtensionError::AlreadyExtended {
                    case_number: current.case_number,
                    granted_at: now,
                },
            };
            tracing::warn!(
                case_number = %stored.case_number,
                error = %err,
                "extension lost to a concurrent write"
            );
            return Err(err.into());
        }

        let event = AuditEvent::extension_granted(&stored, actor, now, &extension.reason);
        tracing::info!(
            case_number = %stored.case_number,
            extra_days = extension.extra_days,
            actor,
            "extension granted"
        );
        let mut updated = stored;
        updated.attach_extension(extension)?;
        self.audited(&event, updated)
    }

    /// Move `case` to `target` if the transition table allows it
    pub fn change_status(
        &self,
        case: &Case,
        target: Status,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Case, EngineError> {
        let stored = self.load(&case.id)?;
        let (next, event) = self.transition(&stored, target, actor, now)?;
        self.commit(stored.status, next, event)
    }

    /// Resolve an open case, recording how it was resolved
    pub fn resolve(
        &self,
        case: &Case,
        resolution: Resolution,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Case, EngineError> {
        let stored = self.load(&case.id)?;
        let (mut next, event) = self.transition(&stored, Status::Resuelto, actor, now)?;
        next.resolution = Some(resolution);
        self.commit(stored.status, next, event)
    }

    pub fn get_case(&self, id: &CaseId) -> Result<Case, EngineError> {
        self.load(id)
    }

    /// Look a case up by rendered case number or by case id
    pub fn find_case(&self, reference: &str) -> Result<Case, EngineError> {
        let reference = reference.trim();
        let found = if let Ok(number) = reference.parse::<CaseNumber>() {
            self.store.find_by_number(&number)?
        } else if let Ok(id) = reference.parse::<CaseId>() {
            self.store.get_case(&id)?
        } else {
            return Err(EngineError::InvalidReference {
                reference: reference.to_string(),
            });
        };
        found.ok_or_else(|| EngineError::CaseNotFound {
            reference: reference.to_string(),
        })
    }

    pub fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, EngineError> {
        Ok(self.store.list_cases(filter)?)
    }

    fn load(&self, id: &CaseId) -> Result<Case, EngineError> {
        self.store
            .get_case(id)?
            .ok_or_else(|| EngineError::CaseNotFound {
                reference: id.to_string(),
            })
    }

    fn transition(
        &self,
        stored: &Case,
        target: Status,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<(Case, TransitionEvent), EngineError> {
        self.workflow
            .transition(stored, target, actor, now)
            .map_err(|e| {
                tracing::warn!(case_number = %stored.case_number, error = %e, "transition refused");
                e.into()
            })
    }

    fn commit(
        &self,
        expected: Status,
        next: Case,
        event: TransitionEvent,
    ) -> Result<Case, EngineError> {
        if !self.store.update_status(&next, expected)? {
            tracing::warn!(case_number = %next.case_number, %expected, "status changed concurrently");
            return Err(EngineError::ConcurrentModification {
                case_number: next.case_number,
                expected,
            });
        }
        tracing::info!(
            case_number = %next.case_number,
            from = %event.from,
            to = %event.to,
            actor = %event.actor,
            "status changed"
        );
        self.audited(&AuditEvent::from(event), next)
    }

    /// Record `event` for a change already stored as `case`
    fn audited(&self, event: &AuditEvent, case: Case) -> Result<Case, EngineError> {
        match self.audit.record(event) {
            Ok(()) => Ok(case),
            Err(source) => {
                tracing::error!(
                    case_number = %case.case_number,
                    action = %event.action,
                    error = %source,
                    "audit record failed after commit"
                );
                Err(EngineError::AuditFailed {
                    case_number: case.case_number,
                    action: event.action,
                    case: Box::new(case),
                    source,
                })
            }
        }
    }
}
