//! Client error types.

use eventflow_core::{EventId, TracingError, Violations};
use eventflow_engine::{ControllerError, SessionError};
use eventflow_remote::RemoteError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    /// A `pass::` or `env::` reference could not be resolved.
    #[error("secret error: {0}")]
    Secret(String),

    #[error("not logged in, run `eventflow login` first")]
    AuthRequired,

    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("event {id} has no occurrence starting at {start}")]
    NoSuchOccurrence { id: EventId, start: String },

    /// The event list could not be loaded.
    #[error("could not load events: {0}")]
    Catalog(String),

    #[error(transparent)]
    Session(SessionError),

    #[error(transparent)]
    Controller(ControllerError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tracing(#[from] TracingError),
}

impl ClientError {
    /// The field violations behind a rejected draft, if that is what failed.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Controller(ControllerError::Validation(violations)) => Some(violations),
            _ => None,
        }
    }

    /// Returns true if the stored credential is no longer usable.
    pub fn is_stale_credential(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired
                | Self::Controller(ControllerError::StaleCredential)
                | Self::Session(SessionError::StaleCredential)
        )
    }
}

impl From<ControllerError> for ClientError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::Unauthorized => Self::AuthRequired,
            other => Self::Controller(other),
        }
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::StaleCredential => Self::SessionExpired,
            other => Self::Session(other),
        }
    }
}

impl From<Violations> for ClientError {
    fn from(violations: Violations) -> Self {
        Self::Controller(ControllerError::Validation(violations))
    }
}
