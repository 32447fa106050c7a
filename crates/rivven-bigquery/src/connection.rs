//! Warehouse connection
//!
//! A [`BigQueryConnection`] owns one [`JobClient`], the immutable [`Config`]
//! and the session state. All statement-issuing operations take `&mut self`,
//! so statements on one connection are always serialized; share a
//! connection across tasks behind a mutex if needed.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::JobClient;
use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::options::StatementArg;
use crate::result::ExecResult;
use crate::rows::Rows;
use crate::session::SessionState;
use crate::statement::Statement;
use crate::transaction::{BigQueryTransaction, TxOptions};

/// Statement terminating the active session
pub const ABORT_SESSION_SQL: &str = "CALL BQ.ABORT_SESSION()";

/// Time allowed for the session abort on close
pub const ABORT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection to the warehouse
pub struct BigQueryConnection {
    pub(crate) client: Arc<dyn JobClient>,
    pub(crate) config: Config,
    pub(crate) session: SessionState,
    pub(crate) valid: bool,
    closed: bool,
    cleanup_errors: Vec<Error>,
}

impl BigQueryConnection {
    /// Wrap a client created for `config`
    pub fn new(client: Arc<dyn JobClient>, config: Config) -> Self {
        Self {
            client,
            config,
            session: SessionState::default(),
            valid: true,
            closed: false,
            cleanup_errors: Vec::new(),
        }
    }

    /// Connection configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Active session token
    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id()
    }

    /// Errors swallowed while closing (a failed session abort)
    pub fn cleanup_errors(&self) -> &[Error] {
        &self.cleanup_errors
    }

    /// Whether the connection can still run statements. Once false, it
    /// stays false.
    pub fn is_valid(&self) -> bool {
        self.valid && !self.closed
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        if !self.valid {
            return Err(Error::BadConnection);
        }
        Ok(())
    }

    /// Prepare a statement; no remote call is made
    pub fn prepare(&mut self, query: impl Into<String>) -> Result<Statement<'_>> {
        self.ensure_usable()?;
        Ok(Statement::new(self, query))
    }

    /// Check that the configured dataset is reachable
    pub async fn ping(&self, ctx: &Context) -> Result<()> {
        self.ensure_usable()?;
        let dataset = self
            .config
            .dataset
            .as_deref()
            .ok_or_else(|| Error::config("ping requires a dataset"))?;
        let metadata = ctx.run(self.client.dataset_metadata(dataset)).await?;
        debug!(dataset = %metadata.dataset_id, "Ping succeeded");
        Ok(())
    }

    /// Run a statement, discarding any rows
    pub async fn execute(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<ExecResult> {
        let submission = self.submit(ctx, query, args).await?;
        Ok(submission.into_exec_result())
    }

    /// Run a statement and return a cursor over its rows
    pub async fn query(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<Rows> {
        let submission = self.submit(ctx, query, args).await?;
        Ok(submission.into_rows(ctx))
    }

    /// Begin a session-scoped transaction
    pub async fn begin_transaction(
        &mut self,
        ctx: &Context,
        options: TxOptions,
    ) -> Result<BigQueryTransaction<'_>> {
        BigQueryTransaction::begin(self, ctx, options).await
    }

    /// Abort the session (best effort) and release the client. A second
    /// call is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        if let Some(session_id) = self.session.session_id().map(str::to_owned) {
            let ctx = Context::background().with_timeout(ABORT_SESSION_TIMEOUT);
            match self.submit_job(&ctx, ABORT_SESSION_SQL, Vec::new()).await {
                Ok(_) => info!(session_id = %session_id, "Session aborted"),
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to abort session");
                    self.cleanup_errors.push(e);
                }
            }
        }

        self.closed = true;
        self.valid = false;
        self.session.close();
        self.client.close().await
    }
}

impl std::fmt::Debug for BigQueryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryConnection")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("valid", &self.valid)
            .field("closed", &self.closed)
            .finish()
    }
}
