//! Remote execution boundary
//!
//! The driver never talks to the network itself. A [`JobClient`] submits
//! query jobs and opens paginated result streams; a [`ClientFactory`] builds
//! one client per connection from the [`Config`](crate::config::Config).
//! Authentication and transport live behind these traits.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::types::{FieldSchema, RawValue, ScalarValue};

/// Named query parameter, bound verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    /// Parameter name (empty for positional `?` parameters)
    pub name: String,
    /// Parameter value
    pub value: ScalarValue,
}

/// Connection-scoped property attached to a job (e.g. `session_id`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProperty {
    /// Property key
    pub key: String,
    /// Property value
    pub value: String,
}

impl ConnectionProperty {
    /// Create a connection property
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A query job request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRequest {
    /// Statement text
    pub query: String,
    /// Dataset used for unqualified table names
    pub default_dataset: Option<String>,
    /// Processing location
    pub location: Option<String>,
    /// Bound parameters, in argument order
    pub parameters: Vec<QueryParameter>,
    /// Connection properties
    pub connection_properties: Vec<ConnectionProperty>,
    /// Ask the service to start a new session with this job
    pub create_session: bool,
    /// Validate and estimate only; no results are produced
    pub dry_run: bool,
    /// Job labels
    pub labels: BTreeMap<String, String>,
}

impl QueryRequest {
    /// Create a request for the given statement text
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Value of a connection property, if set
    pub fn connection_property(&self, key: &str) -> Option<&str> {
        self.connection_properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

/// Session information reported by a completed job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionInfo {
    /// Session token
    pub session_id: String,
}

/// Statistics of a completed job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobStatistics {
    /// Session the job ran in, if any
    pub session_info: Option<SessionInfo>,
    /// Rows touched by a DML statement
    pub num_dml_affected_rows: Option<i64>,
    /// Bytes scanned (or estimated, for dry runs)
    pub total_bytes_processed: Option<i64>,
}

/// Handle and metadata of a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Job {
    /// Job identifier
    pub job_id: String,
    /// Location the job ran in
    pub location: Option<String>,
    /// Last reported statistics
    pub statistics: Option<JobStatistics>,
}

impl Job {
    /// Create a job handle without statistics
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Default::default()
        }
    }

    /// Attach a session token to the job statistics
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.statistics
            .get_or_insert_with(JobStatistics::default)
            .session_info = Some(SessionInfo {
            session_id: session_id.into(),
        });
        self
    }

    /// Attach a DML affected-row count to the job statistics
    pub fn with_dml_affected_rows(mut self, rows: i64) -> Self {
        self.statistics
            .get_or_insert_with(JobStatistics::default)
            .num_dml_affected_rows = Some(rows);
        self
    }

    /// Non-empty session token reported by the job
    pub fn session_id(&self) -> Option<&str> {
        self.statistics
            .as_ref()
            .and_then(|s| s.session_info.as_ref())
            .map(|info| info.session_id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// DML affected-row count reported by the job
    pub fn dml_affected_rows(&self) -> Option<i64> {
        self.statistics.as_ref().and_then(|s| s.num_dml_affected_rows)
    }
}

/// Dataset metadata (used for health checks)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatasetMetadata {
    /// Dataset identifier
    pub dataset_id: String,
    /// Dataset location
    pub location: Option<String>,
}

/// Paginated stream of result rows belonging to one job
#[async_trait]
pub trait RowSource: Send {
    /// Pull the next row, fetching a new page when needed. `Ok(None)` marks
    /// the end of the stream.
    async fn next_row(&mut self) -> Result<Option<Vec<RawValue>>>;

    /// Result schema. Empty until the first page has been fetched.
    fn schema(&self) -> &[FieldSchema];

    /// Total rows in the result, as reported by the service
    fn total_rows(&self) -> u64;
}

/// Remote execution handle owned by one connection
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Submit a query job and wait for it to complete
    async fn run_query(&self, request: &QueryRequest) -> Result<Job>;

    /// Open the result stream of a completed job
    async fn read(&self, job: &Job) -> Result<Box<dyn RowSource>>;

    /// Fetch dataset metadata
    async fn dataset_metadata(&self, dataset: &str) -> Result<DatasetMetadata>;

    /// Release the handle
    async fn close(&self) -> Result<()>;
}

/// Builds job clients from configuration
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Create a new client for `config`
    async fn connect(&self, config: &Config) -> Result<Arc<dyn JobClient>>;
}
