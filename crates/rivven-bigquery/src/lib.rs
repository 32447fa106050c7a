//! # rivven-bigquery
//!
//! BigQuery driver for the Rivven platform.
//!
//! The warehouse executes every statement as an independent job. This crate
//! layers a relational connection on top of that:
//!
//! - **Sessions**: the first statement on a connection asks for a session;
//!   every later statement runs inside it, which makes temporary tables,
//!   variables and multi-statement transactions work across jobs.
//! - **Transactions**: `BEGIN`/`COMMIT`/`ROLLBACK TRANSACTION` sent through the
//!   session.
//! - **Value conversion**: nested, repeated and arbitrary-precision values
//!   are mapped onto flat scalars; arrays and records become canonical JSON
//!   bytes, NUMERIC/BIGNUMERIC become exact decimal strings.
//!
//! Transport and authentication live behind [`client::JobClient`] and
//! [`client::ClientFactory`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rivven_bigquery::prelude::*;
//!
//! let connector = Connector::from_dsn("bigquery://my-project/US/analytics", factory)?;
//! let ctx = Context::background().with_timeout(Duration::from_secs(60));
//! let mut conn = connector.connect(&ctx).await?;
//!
//! let tx = conn.begin_transaction(&ctx, TxOptions::default()).await?;
//! tx.commit(&ctx).await?;
//!
//! let mut rows = conn
//!     .query(&ctx, "SELECT id, name FROM users WHERE id = @id", vec![StatementArg::named("id", 1_i64)])
//!     .await?;
//! while let Some(row) = rows.next().await? {
//!     println!("{:?}", row.get_by_name("name"));
//! }
//! conn.close().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod column;
pub mod config;
pub mod connection;
pub mod connector;
pub mod context;
pub mod convert;
pub mod error;
pub mod numeric;
pub mod options;
pub mod result;
pub mod rows;
pub mod session;
pub mod statement;
pub mod transaction;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, RemoteError, RemoteErrorItem, Result};

    // Value types
    pub use crate::types::{FieldSchema, FieldType, RawValue, Row, ScalarValue};

    // Column metadata
    pub use crate::column::{ColumnType, ScanType};

    // Remote boundary
    pub use crate::client::{
        ClientFactory, ConnectionProperty, DatasetMetadata, Job, JobClient, JobStatistics,
        QueryParameter, QueryRequest, RowSource, SessionInfo,
    };

    // Connection types
    pub use crate::config::{ClientOptions, Config};
    pub use crate::connection::BigQueryConnection;
    pub use crate::connector::Connector;
    pub use crate::context::Context;
    pub use crate::options::StatementArg;
    pub use crate::result::ExecResult;
    pub use crate::rows::Rows;
    pub use crate::session::SessionState;
    pub use crate::statement::Statement;
    pub use crate::transaction::{BigQueryTransaction, IsolationLevel, TxOptions};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use types::ScalarValue;
