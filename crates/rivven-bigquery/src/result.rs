//! Summary of a non-row-returning statement

use crate::error::{Error, Result};

/// Outcome of [`execute`](crate::connection::BigQueryConnection::execute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    rows_affected: u64,
}

impl ExecResult {
    pub(crate) fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }

    /// Rows touched by a DML statement, otherwise the number of result rows
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// The warehouse has no auto-increment keys
    pub fn last_insert_id(&self) -> Result<i64> {
        Err(Error::unsupported("last insert id is not supported"))
    }
}
