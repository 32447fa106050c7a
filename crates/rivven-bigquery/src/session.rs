//! Session state machine
//!
//! The warehouse is stateless between jobs; a session token makes a sequence
//! of jobs share temporary tables, variables and transactions. A connection
//! moves through:
//!
//! ```text
//! NoSession --submit--> PendingFirstUse --job with session--> Active
//!     ^                      |                                  |
//!     +------job without-----+                                  |
//!                                                               v
//!        (session broken, or close) ------------------------> Closed
//! ```
//!
//! While a session is pending every submission asks the service to create
//! one; once active, every submission carries the token as a connection
//! property instead.

use crate::client::{ConnectionProperty, QueryRequest};
use crate::error::{Error, Result};

/// Connection property key carrying the session token
pub const SESSION_ID_PROPERTY: &str = "session_id";

/// How the next submission relates to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    /// Request a new session
    Create,
    /// Run inside the given session
    Attach(String),
}

impl SessionDirective {
    /// Apply the directive to a request
    pub fn apply(&self, request: &mut QueryRequest) {
        match self {
            Self::Create => {
                request.create_session = true;
            }
            Self::Attach(session_id) => {
                request.create_session = false;
                request
                    .connection_properties
                    .push(ConnectionProperty::new(SESSION_ID_PROPERTY, session_id.clone()));
            }
        }
    }

    /// Token the submission runs under, if any
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Attach(session_id) => Some(session_id),
        }
    }
}

/// Session lifecycle of one connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session yet
    #[default]
    NoSession,
    /// A submission requesting a session is in flight
    PendingFirstUse,
    /// Session established
    Active {
        /// Session token
        session_id: String,
    },
    /// Session torn down; no further statements
    Closed,
}

impl SessionState {
    /// Active session token
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Active { session_id } => Some(session_id),
            _ => None,
        }
    }

    /// Whether a session is established
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Whether the session has been torn down
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Decide how the next submission uses the session
    pub fn begin_submission(&mut self) -> Result<SessionDirective> {
        match self {
            Self::NoSession | Self::PendingFirstUse => {
                *self = Self::PendingFirstUse;
                Ok(SessionDirective::Create)
            }
            Self::Active { session_id } => Ok(SessionDirective::Attach(session_id.clone())),
            Self::Closed => Err(Error::BadConnection),
        }
    }

    /// Record a successful job; returns `true` when a session was just created
    pub fn job_completed(&mut self, reported: Option<&str>) -> bool {
        let Some(session_id) = reported else {
            self.job_failed();
            return false;
        };
        match self {
            Self::PendingFirstUse => {
                *self = Self::Active {
                    session_id: session_id.to_string(),
                };
                true
            }
            Self::Active { session_id: current } => {
                if current.as_str() != session_id {
                    *current = session_id.to_string();
                }
                false
            }
            _ => false,
        }
    }

    /// Record a failed submission
    pub fn job_failed(&mut self) {
        if matches!(self, Self::PendingFirstUse) {
            *self = Self::NoSession;
        }
    }

    /// Tear down after the service reported the session as broken.
    /// Returns the discarded token.
    pub fn invalidate(&mut self) -> Option<String> {
        match std::mem::replace(self, Self::Closed) {
            Self::Active { session_id } => Some(session_id),
            _ => None,
        }
    }

    /// Tear down on close. Returns the token that still needs aborting.
    pub fn close(&mut self) -> Option<String> {
        self.invalidate()
    }
}
