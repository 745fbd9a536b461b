//! SQLite serialization for typed values
//!
//! Implements ToSql and FromSql for the identifiers and enums stored in the
//! case database so rows map straight onto typed fields.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::core::audit::AuditAction;
use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::entities::case::{CaseId, ConflictType, ResidentialBlock, ResolutionMethod};

fn invalid_text(message: String) -> FromSqlError {
    FromSqlError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

// =========================================================================
// Identifiers - ToSql/FromSql
// =========================================================================

impl ToSql for CaseId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for CaseId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

impl ToSql for CaseNumber {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for CaseNumber {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: crate::core::case_number::CaseNumberError| invalid_text(e.to_string()))
    }
}

// =========================================================================
// Status - ToSql/FromSql
// =========================================================================

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

// =========================================================================
// Case attributes - ToSql/FromSql
// =========================================================================

impl ToSql for ConflictType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ConflictType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

impl ToSql for ResidentialBlock {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ResidentialBlock {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

impl ToSql for ResolutionMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ResolutionMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

// =========================================================================
// AuditAction - ToSql/FromSql
// =========================================================================

impl ToSql for AuditAction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AuditAction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(invalid_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::Bucket;
    use rusqlite::Connection;

    #[test]
    fn test_status_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (status TEXT)", []).unwrap();

        for status in Status::ALL {
            conn.execute("DELETE FROM test", []).unwrap();
            conn.execute("INSERT INTO test VALUES (?1)", [&status])
                .unwrap();

            let retrieved: Status = conn
                .query_row("SELECT status FROM test", [], |row| row.get(0))
                .unwrap();

            assert_eq!(status, retrieved);
        }
    }

    #[test]
    fn test_case_number_stored_as_rendered_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (number TEXT)", []).unwrap();

        let number = CaseNumber::new(Bucket::new(2024, 11), 128).unwrap();
        conn.execute("INSERT INTO test VALUES (?1)", [&number])
            .unwrap();

        let raw: String = conn
            .query_row("SELECT number FROM test", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "JC-2024-11-0128");

        let retrieved: CaseNumber = conn
            .query_row("SELECT number FROM test", [], |row| row.get(0))
            .unwrap();
        assert_eq!(retrieved, number);
    }

    #[test]
    fn test_unknown_text_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test (block TEXT)", []).unwrap();
        conn.execute("INSERT INTO test VALUES ('BLOQUE_99')", [])
            .unwrap();

        let result: rusqlite::Result<ResidentialBlock> =
            conn.query_row("SELECT block FROM test", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
