//! Session-scoped transactions
//!
//! The warehouse ties a multi-statement transaction to the session, not to a
//! transaction handle. Beginning, committing and rolling back are ordinary
//! statements sent through the owning connection; the first of them also
//! creates the session when none exists yet.
//!
//! A transaction dropped without commit or rollback stays open inside the
//! session until the session is aborted on close.

use crate::connection::BigQueryConnection;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::options::StatementArg;
use crate::result::ExecResult;
use crate::rows::Rows;

/// Statement starting a transaction
pub const BEGIN_SQL: &str = "BEGIN TRANSACTION";
/// Statement committing a transaction
pub const COMMIT_SQL: &str = "COMMIT TRANSACTION";
/// Statement rolling back a transaction
pub const ROLLBACK_SQL: &str = "ROLLBACK TRANSACTION";

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    /// Whatever the warehouse provides (snapshot isolation)
    #[default]
    Default,
    /// Read uncommitted
    ReadUncommitted,
    /// Read committed
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable
    Serializable,
    /// Snapshot
    Snapshot,
}

impl IsolationLevel {
    /// SQL name of the level
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
            Self::Snapshot => "SNAPSHOT",
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Options requested when beginning a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    /// Isolation level
    pub isolation: IsolationLevel,
    /// Read-only transaction
    pub read_only: bool,
}

impl TxOptions {
    /// Request an isolation level
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    /// Request a read-only transaction
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Reject anything but the default options
    pub fn validate(&self) -> Result<()> {
        if self.isolation != IsolationLevel::Default {
            return Err(Error::unsupported_transaction_option(format!(
                "invalid isolation level (only the default level is supported): {}",
                self.isolation
            )));
        }
        if self.read_only {
            return Err(Error::unsupported_transaction_option(
                "read-only transactions are not supported",
            ));
        }
        Ok(())
    }
}

/// An open transaction; holds the connection exclusively until finished
#[derive(Debug)]
pub struct BigQueryTransaction<'a> {
    conn: &'a mut BigQueryConnection,
}

impl<'a> BigQueryTransaction<'a> {
    pub(crate) async fn begin(
        conn: &'a mut BigQueryConnection,
        ctx: &Context,
        options: TxOptions,
    ) -> Result<Self> {
        options.validate()?;
        conn.execute(ctx, BEGIN_SQL, Vec::new()).await?;
        Ok(Self { conn })
    }

    /// Owning connection
    pub fn connection(&self) -> &BigQueryConnection {
        self.conn
    }

    /// Run a statement inside the transaction
    pub async fn execute(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<ExecResult> {
        self.conn.execute(ctx, query, args).await
    }

    /// Query inside the transaction
    pub async fn query(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<Rows> {
        self.conn.query(ctx, query, args).await
    }

    /// Commit the transaction
    pub async fn commit(self, ctx: &Context) -> Result<()> {
        self.conn.execute(ctx, COMMIT_SQL, Vec::new()).await?;
        Ok(())
    }

    /// Roll back the transaction
    pub async fn rollback(self, ctx: &Context) -> Result<()> {
        self.conn.execute(ctx, ROLLBACK_SQL, Vec::new()).await?;
        Ok(())
    }
}
