//! Statements and the job submission path
//!
//! Every statement, including transaction control and session teardown,
//! goes through [`BigQueryConnection::submit`]: parameters are bound as
//! given, the session token (or a session-creation request) is attached,
//! observers run, the job is submitted, and the session state is updated
//! from what the job reports.

use tracing::{debug, info, warn};

use crate::client::{Job, QueryRequest, RowSource};
use crate::connection::BigQueryConnection;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::options::{StatementArg, StatementOptions};
use crate::result::ExecResult;
use crate::rows::Rows;
use crate::session::SessionDirective;

/// Outcome of one submission
pub(crate) enum Submission {
    /// The request was a dry run; nothing to read
    DryRun,
    /// The job completed and its results are ready
    Read {
        job: Job,
        source: Box<dyn RowSource>,
    },
}

impl Submission {
    pub(crate) fn into_exec_result(self) -> ExecResult {
        match self {
            Self::DryRun => ExecResult::default(),
            Self::Read { job, source } => {
                let rows = job
                    .dml_affected_rows()
                    .and_then(|n| u64::try_from(n).ok())
                    .unwrap_or_else(|| source.total_rows());
                ExecResult::new(rows)
            }
        }
    }

    pub(crate) fn into_rows(self, ctx: &Context) -> Rows {
        match self {
            Self::DryRun => Rows::empty(),
            Self::Read { source, .. } => Rows::new(source, ctx.clone()),
        }
    }
}

/// A statement bound to its connection.
///
/// Parameter arity is not known in advance; whatever arguments are passed at
/// execution time are bound.
pub struct Statement<'c> {
    conn: &'c mut BigQueryConnection,
    query: String,
}

impl<'c> Statement<'c> {
    pub(crate) fn new(conn: &'c mut BigQueryConnection, query: impl Into<String>) -> Self {
        Self {
            conn,
            query: query.into(),
        }
    }

    /// Statement text
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// Number of placeholders; always unknown
    pub fn num_input(&self) -> Option<usize> {
        None
    }

    /// Run the statement, discarding any rows
    pub async fn execute(&mut self, ctx: &Context, args: Vec<StatementArg>) -> Result<ExecResult> {
        let submission = self.conn.submit(ctx, &self.query, args).await?;
        Ok(submission.into_exec_result())
    }

    /// Run the statement and return a cursor over its rows
    pub async fn query(&mut self, ctx: &Context, args: Vec<StatementArg>) -> Result<Rows> {
        let submission = self.conn.submit(ctx, &self.query, args).await?;
        Ok(submission.into_rows(ctx))
    }

    /// Release the statement. Nothing is held remotely.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("query", &self.query)
            .finish()
    }
}

impl BigQueryConnection {
    fn build_request(&self, query: &str, directive: &SessionDirective) -> QueryRequest {
        let mut request = QueryRequest::new(query);
        request.default_dataset = self.config.dataset.clone();
        request.location = self.config.location.clone();
        directive.apply(&mut request);
        request
    }

    /// Submit `query` and update the session from the resulting job
    pub(crate) async fn submit(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<Submission> {
        let Some(job) = self.submit_job(ctx, query, args).await? else {
            return Ok(Submission::DryRun);
        };
        let source = ctx.run(self.client.read(&job)).await?;
        Ok(Submission::Read { job, source })
    }

    /// Run the job without opening its results; `None` for a dry run
    pub(crate) async fn submit_job(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<StatementArg>,
    ) -> Result<Option<Job>> {
        self.ensure_usable()?;

        let mut options = StatementOptions::default();
        let parameters = options.intercept(args);

        let directive = self.session.begin_submission()?;
        let mut request = self.build_request(query, &directive);
        request.parameters = parameters;
        options.observe_query(&mut request);

        debug!(
            create_session = request.create_session,
            session_id = directive.session_id().unwrap_or_default(),
            dry_run = request.dry_run,
            parameters = request.parameters.len(),
            "Submitting query job"
        );

        let job = match ctx.run(self.client.run_query(&request)).await {
            Ok(job) => job,
            Err(e) => {
                self.session.job_failed();
                return Err(self.classify_failure(&directive, e));
            }
        };
        options.observe_job(&job);

        if request.dry_run {
            self.session.job_failed();
            debug!(job_id = %job.job_id, "Dry run completed");
            return Ok(None);
        }

        if self.session.job_completed(job.session_id()) {
            info!(
                session_id = job.session_id().unwrap_or_default(),
                "Session created"
            );
        }
        debug!(job_id = %job.job_id, "Query job completed");
        Ok(Some(job))
    }

    /// Turn a session-expired failure into [`Error::SessionBroken`] and
    /// invalidate the connection; other errors pass through unchanged.
    fn classify_failure(&mut self, directive: &SessionDirective, err: Error) -> Error {
        let Some(session_id) = directive.session_id() else {
            return err;
        };
        match err {
            Error::Remote(remote) if remote.is_session_expired(session_id) => {
                self.session.invalidate();
                self.valid = false;
                warn!(session_id, "Session expired, connection invalidated");
                Error::SessionBroken {
                    session_id: session_id.to_string(),
                    source: remote,
                }
            }
            other => other,
        }
    }
}
