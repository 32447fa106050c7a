//! Statement arguments and one-shot observers
//!
//! Besides named values, a statement may receive two observer callbacks:
//! a query observer that sees (and may modify) the request before it is
//! submitted, for example to enable a dry run, and a job observer that sees
//! the job handle afterwards, for example to read statistics. Observers are
//! intercepted here and never bound as data parameters.

use std::fmt;

use crate::client::{Job, QueryParameter, QueryRequest};
use crate::types::ScalarValue;

/// Callback invoked with the request before submission
pub type QueryObserver = Box<dyn FnOnce(&mut QueryRequest) + Send>;

/// Callback invoked with the job handle after submission
pub type JobObserver = Box<dyn FnOnce(&Job) + Send>;

/// One argument passed to execute/query
pub enum StatementArg {
    /// Named (or, with an empty name, positional) value
    Named {
        /// Parameter name
        name: String,
        /// Parameter value
        value: ScalarValue,
    },
    /// Request observer
    QueryObserver(QueryObserver),
    /// Job observer
    JobObserver(JobObserver),
}

impl StatementArg {
    /// Named parameter (`@name` in the statement)
    pub fn named(name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::Named {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Positional parameter (`?` in the statement)
    pub fn positional(value: impl Into<ScalarValue>) -> Self {
        Self::named(String::new(), value)
    }

    /// Observe the request before it is submitted
    pub fn query_observer(f: impl FnOnce(&mut QueryRequest) + Send + 'static) -> Self {
        Self::QueryObserver(Box::new(f))
    }

    /// Observe the job handle after it completes
    pub fn job_observer(f: impl FnOnce(&Job) + Send + 'static) -> Self {
        Self::JobObserver(Box::new(f))
    }
}

impl fmt::Debug for StatementArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, value } => f
                .debug_struct("Named")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::QueryObserver(_) => f.write_str("QueryObserver"),
            Self::JobObserver(_) => f.write_str("JobObserver"),
        }
    }
}

/// Observer slots of a single submission. Each slot is emptied on use.
#[derive(Default)]
pub struct StatementOptions {
    query_observer: Option<QueryObserver>,
    job_observer: Option<JobObserver>,
}

impl StatementOptions {
    /// Split `args` into observers (kept here) and parameters (returned in order).
    /// A later observer of the same kind replaces an earlier one.
    pub fn intercept(&mut self, args: Vec<StatementArg>) -> Vec<QueryParameter> {
        let mut parameters = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                StatementArg::Named { name, value } => {
                    parameters.push(QueryParameter { name, value });
                }
                StatementArg::QueryObserver(observer) => self.query_observer = Some(observer),
                StatementArg::JobObserver(observer) => self.job_observer = Some(observer),
            }
        }
        parameters
    }

    /// Invoke and clear the query observer
    pub fn observe_query(&mut self, request: &mut QueryRequest) {
        if let Some(observer) = self.query_observer.take() {
            observer(request);
        }
    }

    /// Invoke and clear the job observer
    pub fn observe_job(&mut self, job: &Job) {
        if let Some(observer) = self.job_observer.take() {
            observer(job);
        }
    }

    /// Whether any observer is still pending
    pub fn has_pending(&self) -> bool {
        self.query_observer.is_some() || self.job_observer.is_some()
    }
}

impl fmt::Debug for StatementOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementOptions")
            .field("query_observer", &self.query_observer.is_some())
            .field("job_observer", &self.job_observer.is_some())
            .finish()
    }
}
