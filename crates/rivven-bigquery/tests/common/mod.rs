//! Scripted in-memory warehouse used by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use rivven_bigquery::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// What the fake service answers to the next query job
pub enum Reply {
    /// A job producing rows
    Rows {
        schema: Vec<FieldSchema>,
        rows: Vec<Vec<RawValue>>,
    },
    /// A DML job touching `n` rows
    Dml(i64),
    /// A failing job
    Fail(RemoteError),
    /// A job that never completes
    Hang,
}

#[derive(Default)]
struct State {
    requests: Vec<QueryRequest>,
    replies: VecDeque<Reply>,
    results: HashMap<String, (Vec<FieldSchema>, Vec<Vec<RawValue>>)>,
    report_sessions: bool,
    sessions_created: usize,
    datasets: Vec<String>,
    close_calls: usize,
    read_calls: usize,
    next_job: u64,
}

/// Fake job client that records every request
#[derive(Clone)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                report_sessions: true,
                ..Default::default()
            })),
        }
    }

    /// Stop reporting session info on completed jobs
    pub fn without_sessions(self) -> Self {
        self.state.lock().unwrap().report_sessions = false;
        self
    }

    pub fn push(&self, reply: Reply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.query).collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn sessions_created(&self) -> usize {
        self.state.lock().unwrap().sessions_created
    }

    pub fn datasets(&self) -> Vec<String> {
        self.state.lock().unwrap().datasets.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    /// Result sets opened so far
    pub fn read_calls(&self) -> usize {
        self.state.lock().unwrap().read_calls
    }

    pub fn connection(&self, config: Config) -> BigQueryConnection {
        BigQueryConnection::new(Arc::new(self.clone()), config)
    }

    pub fn factory(&self) -> Arc<MockFactory> {
        Arc::new(MockFactory {
            client: self.clone(),
            configs: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl JobClient for MockClient {
    async fn run_query(&self, request: &QueryRequest) -> Result<Job> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.replies.pop_front()
        };

        let (schema, rows, dml) = match reply {
            None => (Vec::new(), Vec::new(), None),
            Some(Reply::Rows { schema, rows }) => (schema, rows, None),
            Some(Reply::Dml(n)) => (Vec::new(), Vec::new(), Some(n)),
            Some(Reply::Fail(err)) => return Err(err.into()),
            Some(Reply::Hang) => std::future::pending().await,
        };

        let mut state = self.state.lock().unwrap();
        state.next_job += 1;
        let mut job = Job::new(format!("job-{}", state.next_job));

        if state.report_sessions && !request.dry_run {
            if request.create_session {
                state.sessions_created += 1;
                job = job.with_session(format!("session-{}", state.sessions_created));
            } else if let Some(session_id) = request.connection_property("session_id") {
                job = job.with_session(session_id);
            }
        }
        if let Some(n) = dml {
            job = job.with_dml_affected_rows(n);
        }

        state.results.insert(job.job_id.clone(), (schema, rows));
        Ok(job)
    }

    async fn read(&self, job: &Job) -> Result<Box<dyn RowSource>> {
        let (schema, rows) = {
            let mut state = self.state.lock().unwrap();
            state.read_calls += 1;
            state.results.remove(&job.job_id).unwrap_or_default()
        };
        Ok(Box::new(MockSource {
            total: rows.len() as u64,
            schema,
            rows: rows.into(),
            fetched: false,
        }))
    }

    async fn dataset_metadata(&self, dataset: &str) -> Result<DatasetMetadata> {
        self.state.lock().unwrap().datasets.push(dataset.to_string());
        Ok(DatasetMetadata {
            dataset_id: dataset.to_string(),
            location: Some("US".into()),
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}

/// Row source whose schema only appears after the first pull
pub struct MockSource {
    schema: Vec<FieldSchema>,
    rows: VecDeque<Vec<RawValue>>,
    total: u64,
    fetched: bool,
}

#[async_trait]
impl RowSource for MockSource {
    async fn next_row(&mut self) -> Result<Option<Vec<RawValue>>> {
        self.fetched = true;
        Ok(self.rows.pop_front())
    }

    fn schema(&self) -> &[FieldSchema] {
        if self.fetched {
            &self.schema
        } else {
            &[]
        }
    }

    fn total_rows(&self) -> u64 {
        self.total
    }
}

/// Factory handing out the shared mock client
pub struct MockFactory {
    client: MockClient,
    configs: Mutex<Vec<Config>>,
}

impl MockFactory {
    pub fn connects(&self) -> usize {
        self.configs.lock().unwrap().len()
    }
}

#[async_trait]
impl ClientFactory for MockFactory {
    async fn connect(&self, config: &Config) -> Result<Arc<dyn JobClient>> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(Arc::new(self.client.clone()))
    }
}

pub fn config() -> Config {
    Config::new("test-project")
        .with_dataset("analytics")
        .with_location("US")
}

pub fn session_expired(session_id: &str) -> RemoteError {
    RemoteError::new(400, "session expired").with_item(RemoteErrorItem::new(
        "resourcesExceeded",
        rivven_bigquery::error::session_expired_message(session_id),
    ))
}
