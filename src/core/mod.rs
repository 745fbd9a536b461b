//! Core module - case lifecycle engine and its collaborators

pub mod audit;
pub mod case_number;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod entity;
pub mod extension;
pub mod project;
pub mod sequence;
pub mod store;
pub mod workflow;

pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use case_number::{CaseNumber, CaseNumberError, CaseNumberGenerator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use deadline::{DeadlinePolicy, DeadlineTracker, DeadlineView, Tier};
pub use engine::{CaseEngine, EngineError};
pub use entity::Status;
pub use extension::{Extension, ExtensionError, ExtensionManager, ExtensionState};
pub use project::{Project, ProjectError};
pub use sequence::{Bucket, SequenceAllocator};
pub use store::{CaseFilter, CaseStore, MemoryStore, SqliteStore, StoreError};
pub use workflow::{CaseStateMachine, TransitionEvent, WorkflowError};
