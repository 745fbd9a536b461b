//! One-time deadline extension
//!
//! A case may be granted exactly one extension, with a written reason, while it
//! is still `en_tramite`. The manager only decides; persisting the grant is a
//! compare-and-set in the store so two concurrent requests cannot both win.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::entities::case::Case;

/// Extra days granted by the statutory extension
pub const DEFAULT_EXTENSION_DAYS: u32 = 15;

/// A granted extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub granted_at: DateTime<Utc>,

    /// Written justification, never blank
    pub reason: String,

    pub extra_days: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,
}

impl Extension {
    pub fn new(granted_at: DateTime<Utc>, reason: impl Into<String>, extra_days: u32) -> Self {
        Self {
            granted_at,
            reason: reason.into(),
            extra_days,
            granted_by: None,
        }
    }

    /// Record who granted the extension
    pub fn granted_by(mut self, actor: impl Into<String>) -> Self {
        self.granted_by = Some(actor.into());
        self
    }
}

/// Extension slot of a case: empty, or granted once and for all
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExtensionState {
    #[default]
    NotExtended,
    Granted(Extension),
}

impl ExtensionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, ExtensionState::Granted(_))
    }

    pub fn granted(&self) -> Option<&Extension> {
        match self {
            ExtensionState::NotExtended => None,
            ExtensionState::Granted(ext) => Some(ext),
        }
    }

    /// Days added to the allowance (0 when not extended)
    pub fn extra_days(&self) -> u32 {
        self.granted().map(|ext| ext.extra_days).unwrap_or(0)
    }
}

/// Reasons an extension request is refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("Case {case_number} was already extended on {granted_at}; only one extension is allowed")]
    AlreadyExtended {
        case_number: CaseNumber,
        granted_at: DateTime<Utc>,
    },

    #[error("An extension requires a written justification")]
    EmptyReason,

    #[error("Case {case_number} is {status}; extensions are only granted while en_tramite")]
    CaseNotOpen {
        case_number: CaseNumber,
        status: Status,
    },
}

/// Validates extension requests
#[derive(Debug, Clone, Copy)]
pub struct ExtensionManager {
    extra_days: u32,
}

impl Default for ExtensionManager {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION_DAYS)
    }
}

impl ExtensionManager {
    pub fn new(extra_days: u32) -> Self {
        Self { extra_days }
    }

    pub fn extra_days(&self) -> u32 {
        self.extra_days
    }

    /// Decide whether `case` may be extended and build the extension
    ///
    /// Does not touch the case; the caller persists the result.
    pub fn grant(
        &self,
        case: &Case,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Extension, ExtensionError> {
        if let ExtensionState::Granted(existing) = &case.extension {
            return Err(ExtensionError::AlreadyExtended {
                case_number: case.case_number,
                granted_at: existing.granted_at,
            });
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ExtensionError::EmptyReason);
        }

        if case.status != Status::EnTramite {
            return Err(ExtensionError::CaseNotOpen {
                case_number: case.case_number,
                status: case.status,
            });
        }

        Ok(Extension::new(now, reason, self.extra_days))
    }
}
