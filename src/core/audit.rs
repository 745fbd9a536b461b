//! Audit trail of case lifecycle events
//!
//! The engine emits one [`AuditEvent`] per filing, granted extension and
//! accepted status change. Where the events end up is the sink's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::core::store::StoreError;
use crate::core::workflow::TransitionEvent;
use crate::entities::case::{Case, CaseId};

/// Kind of audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Filed,
    ExtensionGranted,
    StatusChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Filed => "filed",
            AuditAction::ExtensionGranted => "extension_granted",
            AuditAction::StatusChanged => "status_changed",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filed" => Ok(AuditAction::Filed),
            "extension_granted" => Ok(AuditAction::ExtensionGranted),
            "status_changed" => Ok(AuditAction::StatusChanged),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// One audited event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub case_id: CaseId,
    pub case_number: CaseNumber,
    pub action: AuditAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<Status>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<Status>,

    pub actor: String,
    pub at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn filed(case: &Case, actor: &str) -> Self {
        Self {
            case_id: case.id,
            case_number: case.case_number,
            action: AuditAction::Filed,
            from_status: None,
            to_status: Some(case.status),
            actor: actor.to_string(),
            at: case.filed_at,
            detail: Some(format!(
                "{} / {}",
                case.conflict_type, case.residential_block
            )),
        }
    }

    pub fn extension_granted(case: &Case, actor: &str, at: DateTime<Utc>, reason: &str) -> Self {
        Self {
            case_id: case.id,
            case_number: case.case_number,
            action: AuditAction::ExtensionGranted,
            from_status: None,
            to_status: None,
            actor: actor.to_string(),
            at,
            detail: Some(reason.to_string()),
        }
    }
}

impl From<TransitionEvent> for AuditEvent {
    fn from(event: TransitionEvent) -> Self {
        Self {
            case_id: event.case_id,
            case_number: event.case_number,
            action: AuditAction::StatusChanged,
            from_status: Some(event.from),
            to_status: Some(event.to),
            actor: event.actor,
            at: event.at,
            detail: None,
        }
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> Result<(), StoreError>;
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        (**self).record(event)
    }
}

/// Emits audit events as structured log records
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        tracing::info!(
            target: "jpc::audit",
            case_id = %event.case_id,
            case_number = %event.case_number,
            action = %event.action,
            from = event.from_status.map(|s| s.as_str()),
            to = event.to_status.map(|s| s.as_str()),
            actor = %event.actor,
            at = %event.at,
            detail = event.detail.as_deref(),
            "audit"
        );
        Ok(())
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in arrival order
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.events
            .lock()
            .map_err(|_| StoreError::Unavailable {
                message: "audit buffer lock poisoned".to_string(),
            })?
            .push(event.clone());
        Ok(())
    }
}
