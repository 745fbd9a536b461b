//! SQLite-backed case store
//!
//! Sequence counters and case rows share one database file. Every write that
//! has to be atomic runs in an `IMMEDIATE` transaction, which takes SQLite's
//! write lock up front, so separate processes filing into the same month are
//! serialised by the database itself.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{CaseFilter, CaseStore, StoreError};
use crate::core::audit::{AuditEvent, AuditSink};
use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::core::extension::{Extension, ExtensionState};
use crate::core::sequence::Bucket;
use crate::entities::case::{Case, CaseId, Resolution, ResolutionMethod};

/// How long a writer waits for another writer's lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sequence_counters (
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL,
    last_value  INTEGER NOT NULL,
    PRIMARY KEY (year, month)
);

CREATE TABLE IF NOT EXISTS cases (
    id                  TEXT PRIMARY KEY,
    case_number         TEXT NOT NULL UNIQUE,
    year                INTEGER NOT NULL,
    month               INTEGER NOT NULL,
    sequence            INTEGER NOT NULL,
    filed_at            TEXT NOT NULL,
    status              TEXT NOT NULL,
    conflict_type       TEXT NOT NULL,
    residential_block   TEXT NOT NULL,
    judge_id            TEXT NOT NULL,
    ext_granted_at      TEXT,
    ext_reason          TEXT,
    ext_extra_days      INTEGER,
    ext_granted_by      TEXT,
    resolution_method   TEXT,
    resolution_notes    TEXT,
    resolved_at         TEXT,
    closed_at           TEXT,
    archived_at         TEXT,
    updated_at          TEXT NOT NULL,
    UNIQUE (year, month, sequence)
);

CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status);
CREATE INDEX IF NOT EXISTS idx_cases_judge ON cases(judge_id, status);

CREATE TABLE IF NOT EXISTS audit_log (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id      TEXT NOT NULL,
    case_number  TEXT NOT NULL,
    action       TEXT NOT NULL,
    from_status  TEXT,
    to_status    TEXT,
    actor        TEXT NOT NULL,
    at           TEXT NOT NULL,
    detail       TEXT
);

CREATE INDEX IF NOT EXISTS idx_audit_case ON audit_log(case_id);
"#;

const CASE_COLUMNS: &str = "id, case_number, filed_at, status, conflict_type, residential_block, \
     judge_id, ext_granted_at, ext_reason, ext_extra_days, ext_granted_by, resolution_method, \
     resolution_notes, resolved_at, closed_at, archived_at, updated_at";

/// Case store on a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(StoreError::Unavailable {
                    message: format!("database directory {} does not exist", parent.display()),
                });
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::from_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Unavailable {
            message: "database connection lock poisoned".to_string(),
        })
    }

    /// Audit events of one case, oldest first
    pub fn audit_trail(&self, id: &CaseId) -> Result<Vec<AuditEvent>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT case_id, case_number, action, from_status, to_status, actor, at, detail
             FROM audit_log WHERE case_id = ?1 ORDER BY id",
        )?;
        let events = stmt
            .query_map([id], |row| {
                Ok(AuditEvent {
                    case_id: row.get(0)?,
                    case_number: row.get(1)?,
                    action: row.get(2)?,
                    from_status: row.get(3)?,
                    to_status: row.get(4)?,
                    actor: row.get(5)?,
                    at: row.get(6)?,
                    detail: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn case_exists(conn: &Connection, id: &CaseId) -> Result<bool, StoreError> {
        let found = conn
            .query_row("SELECT 1 FROM cases WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    let extension = match row.get::<_, Option<chrono::DateTime<chrono::Utc>>>(7)? {
        Some(granted_at) => ExtensionState::Granted(Extension {
            granted_at,
            reason: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            extra_days: row.get::<_, Option<u32>>(9)?.unwrap_or_default(),
            granted_by: row.get(10)?,
        }),
        None => ExtensionState::NotExtended,
    };

    let resolution = match row.get::<_, Option<ResolutionMethod>>(11)? {
        Some(method) => Some(Resolution {
            method,
            notes: row.get(12)?,
        }),
        None => None,
    };

    Ok(Case {
        id: row.get(0)?,
        case_number: row.get(1)?,
        filed_at: row.get(2)?,
        status: row.get(3)?,
        extension,
        conflict_type: row.get(4)?,
        residential_block: row.get(5)?,
        judge_id: row.get(6)?,
        resolution,
        resolved_at: row.get(13)?,
        closed_at: row.get(14)?,
        archived_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl CaseStore for SqliteStore {
    fn next_sequence(&self, bucket: Bucket) -> Result<u32, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value: u32 = tx.query_row(
            "INSERT INTO sequence_counters (year, month, last_value) VALUES (?1, ?2, 1)
             ON CONFLICT (year, month) DO UPDATE SET last_value = last_value + 1
             RETURNING last_value",
            params![bucket.year, bucket.month],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(value)
    }

    fn insert_case(&self, case: &Case) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let ext = case.extension.granted();
        let result = conn.execute(
            "INSERT INTO cases (id, case_number, year, month, sequence, filed_at, status,
                 conflict_type, residential_block, judge_id, ext_granted_at, ext_reason,
                 ext_extra_days, ext_granted_by, resolution_method, resolution_notes,
                 resolved_at, closed_at, archived_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20)",
            params![
                case.id,
                case.case_number,
                case.case_number.year(),
                case.case_number.month(),
                case.case_number.sequence(),
                case.filed_at,
                case.status,
                case.conflict_type,
                case.residential_block,
                case.judge_id,
                ext.map(|e| e.granted_at),
                ext.map(|e| e.reason.as_str()),
                ext.map(|e| e.extra_days),
                ext.and_then(|e| e.granted_by.as_deref()),
                case.resolution.as_ref().map(|r| r.method),
                case.resolution.as_ref().and_then(|r| r.notes.as_deref()),
                case.resolved_at,
                case.closed_at,
                case.archived_at,
                case.updated_at,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateCase {
                case_number: case.case_number,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn get_case(&self, id: &CaseId) -> Result<Option<Case>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM cases WHERE id = ?1", CASE_COLUMNS);
        Ok(conn.query_row(&sql, [id], case_from_row).optional()?)
    }

    fn find_by_number(&self, number: &CaseNumber) -> Result<Option<Case>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM cases WHERE case_number = ?1", CASE_COLUMNS);
        Ok(conn.query_row(&sql, [number], case_from_row).optional()?)
    }

    fn set_extension_if_absent(
        &self,
        id: &CaseId,
        extension: &Extension,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE cases
             SET ext_granted_at = ?2, ext_reason = ?3, ext_extra_days = ?4,
                 ext_granted_by = ?5, updated_at = ?2
             WHERE id = ?1 AND ext_granted_at IS NULL AND status = ?6",
            params![
                id,
                extension.granted_at,
                extension.reason,
                extension.extra_days,
                extension.granted_by,
                Status::EnTramite,
            ],
        )?;
        if changed == 0 && !Self::case_exists(&tx, id)? {
            return Err(StoreError::CaseNotFound { id: *id });
        }
        tx.commit()?;
        Ok(changed == 1)
    }

    fn update_status(&self, case: &Case, expected: Status) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE cases
             SET status = ?2, resolution_method = ?3, resolution_notes = ?4,
                 resolved_at = ?5, closed_at = ?6, archived_at = ?7, updated_at = ?8
             WHERE id = ?1 AND status = ?9",
            params![
                case.id,
                case.status,
                case.resolution.as_ref().map(|r| r.method),
                case.resolution.as_ref().and_then(|r| r.notes.as_deref()),
                case.resolved_at,
                case.closed_at,
                case.archived_at,
                case.updated_at,
                expected,
            ],
        )?;
        if changed == 0 && !Self::case_exists(&tx, &case.id)? {
            return Err(StoreError::CaseNotFound { id: case.id });
        }
        tx.commit()?;
        Ok(changed == 1)
    }

    fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(judge) = &filter.judge_id {
            clauses.push("judge_id = ?");
            values.push(Value::Text(judge.clone()));
        }
        if let Some(bucket) = filter.bucket {
            clauses.push("year = ? AND month = ?");
            values.push(Value::Integer(i64::from(bucket.year)));
            values.push(Value::Integer(i64::from(bucket.month)));
        }

        let mut sql = format!("SELECT {} FROM cases", CASE_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY filed_at DESC, year DESC, month DESC, sequence DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let cases = stmt
            .query_map(params_from_iter(values), case_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cases)
    }
}

impl AuditSink for SqliteStore {
    fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO audit_log (case_id, case_number, action, from_status, to_status,
                 actor, at, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.case_id,
                event.case_number,
                event.action,
                event.from_status,
                event.to_status,
                event.actor,
                event.at,
                event.detail,
            ],
        )?;
        Ok(())
    }
}
