//! Error types for rivven-bigquery
//!
//! Classification follows the propagation rules of the driver:
//! - conversion errors abort the current row or statement, never the connection
//! - session breakage invalidates the connection but close still runs
//! - configuration errors happen before any remote resource is acquired
//! - remote errors are surfaced unchanged; nothing is retried internally

use std::fmt;
use thiserror::Error;

use crate::types::{FieldType, RawValue};

/// Result type for rivven-bigquery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed connection string or configuration
    Configuration,
    /// Cell value does not match its schema, or schema type is unknown
    TypeConversion,
    /// Row shape does not match the result schema
    Schema,
    /// Session expired or connection invalidated
    Session,
    /// Transaction option rejected
    Transaction,
    /// Connection already closed
    Connection,
    /// Caller cancelled the operation
    Cancelled,
    /// Deadline exceeded
    Timeout,
    /// Error reported by the warehouse service
    Remote,
    /// Unknown/other errors
    Other,
}

impl ErrorCategory {
    /// Whether errors in this category are generally retriable by the caller
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Schema => write!(f, "schema"),
            Self::Session => write!(f, "session"),
            Self::Transaction => write!(f, "transaction"),
            Self::Connection => write!(f, "connection"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Timeout => write!(f, "timeout"),
            Self::Remote => write!(f, "remote"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One structured error detail reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteErrorItem {
    /// Machine-readable reason (e.g. `invalidQuery`, `resourcesExceeded`)
    pub reason: String,
    /// Human-readable message
    pub message: String,
    /// Where the error occurred, if reported
    pub location: Option<String>,
}

impl RemoteErrorItem {
    /// Create an error item
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
            location: None,
        }
    }
}

/// Error returned by the remote service or its transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote error {code}: {message}")]
pub struct RemoteError {
    /// HTTP status code of the failed call (0 if unknown)
    pub code: u16,
    /// Top-level message
    pub message: String,
    /// Structured error details
    pub errors: Vec<RemoteErrorItem>,
}

/// HTTP status used by the service for client-side request errors
pub const STATUS_BAD_REQUEST: u16 = 400;

impl RemoteError {
    /// Create a remote error without details
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Attach a structured error item
    pub fn with_item(mut self, item: RemoteErrorItem) -> Self {
        self.errors.push(item);
        self
    }

    /// Whether this error reports that `session_id` has expired.
    ///
    /// The service signals this as a bad request with a `resourcesExceeded`
    /// item whose message names the session token.
    pub fn is_session_expired(&self, session_id: &str) -> bool {
        if self.code != STATUS_BAD_REQUEST || session_id.is_empty() {
            return false;
        }
        let expected = session_expired_message(session_id);
        self.errors
            .iter()
            .any(|item| item.reason == "resourcesExceeded" && item.message == expected)
    }

    /// Whether the status code indicates a transient server-side condition
    pub fn is_transient(&self) -> bool {
        matches!(self.code, 429 | 500 | 502 | 503 | 504)
    }
}

/// Message the service uses when a session token is no longer usable
pub fn session_expired_message(session_id: &str) -> String {
    format!("Session {session_id} has expired and is no longer available.")
}

/// Main error type for rivven-bigquery
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Connection string could not be parsed
    #[error("invalid connection string: {message}")]
    InvalidConnectionString { message: String },

    /// Configuration is incomplete for the requested operation
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Cell value does not have the runtime shape its schema declares
    #[error(
        "received unexpected type: {} for BigQuery field: {field_type} (expected: {expected})",
        .actual.kind()
    )]
    UnexpectedType {
        field_type: FieldType,
        expected: &'static str,
        actual: Box<RawValue>,
    },

    /// Schema declares a type tag the converter does not recognize
    #[error("invalid field type: {field_type}")]
    InvalidFieldType { field_type: FieldType },

    /// Row shape does not match the result schema
    #[error("schema error: {message}")]
    Schema { message: String },

    /// The service reported that the connection's session has expired
    #[error("session {session_id} is broken")]
    SessionBroken {
        session_id: String,
        #[source]
        source: RemoteError,
    },

    /// Transaction option not supported by the warehouse
    #[error("unsupported transaction option: {message}")]
    UnsupportedTransactionOption { message: String },

    /// Connection was invalidated and can no longer issue statements
    #[error("bad connection: session is no longer usable")]
    BadConnection,

    /// Connection is closed
    #[error("connection is closed")]
    Closed,

    /// Operation cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Operation exceeded its deadline
    #[error("timeout: {message}")]
    Timeout { message: String },

    /// Error from the remote service, surfaced unchanged
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Canonical encoding of a nested value failed
    #[error("encoding error: {message}")]
    Encoding { message: String },

    /// Unsupported operation
    #[error("unsupported: {message}")]
    Unsupported { message: String },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConnectionString { .. } | Self::Configuration { .. } => {
                ErrorCategory::Configuration
            }
            Self::UnexpectedType { .. } | Self::InvalidFieldType { .. } | Self::Encoding { .. } => {
                ErrorCategory::TypeConversion
            }
            Self::Schema { .. } => ErrorCategory::Schema,
            Self::SessionBroken { .. } | Self::BadConnection => ErrorCategory::Session,
            Self::UnsupportedTransactionOption { .. } => ErrorCategory::Transaction,
            Self::Closed => ErrorCategory::Connection,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Remote(_) => ErrorCategory::Remote,
            Self::Unsupported { .. } => ErrorCategory::Other,
        }
    }

    /// Whether the caller may reasonably retry the operation
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Remote(remote) => remote.is_transient(),
            other => other.category().is_retriable(),
        }
    }

    /// Whether the error invalidated the connection it happened on
    #[inline]
    pub fn is_session_broken(&self) -> bool {
        matches!(self, Self::SessionBroken { .. } | Self::BadConnection)
    }

    /// Create an invalid connection string error
    pub fn invalid_connection_string(message: impl Into<String>) -> Self {
        Self::InvalidConnectionString {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unexpected type error
    pub fn unexpected_type(field_type: FieldType, expected: &'static str, actual: RawValue) -> Self {
        Self::UnexpectedType {
            field_type,
            expected,
            actual: Box::new(actual),
        }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create an unsupported transaction option error
    pub fn unsupported_transaction_option(message: impl Into<String>) -> Self {
        Self::UnsupportedTransactionOption {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}
