//! Engine error types.

use eventflow_core::Violations;
use eventflow_remote::RemoteError;
use thiserror::Error;

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Why a controller operation did not go through.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The input has field violations; nothing was sent.
    #[error("invalid event: {0}")]
    Validation(#[from] Violations),

    /// No authenticated session; nothing was sent.
    #[error("not logged in")]
    Unauthorized,

    /// The store call failed.
    #[error(transparent)]
    Remote(RemoteError),

    /// The store no longer accepts the stored credential. The caller is
    /// expected to log out.
    #[error("session expired, please log in again")]
    StaleCredential,
}

impl From<RemoteError> for ControllerError {
    fn from(err: RemoteError) -> Self {
        if err.is_authentication() {
            Self::StaleCredential
        } else {
            Self::Remote(err)
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The stored credential was rejected on resolve and has been discarded.
    #[error("stored credential was rejected and has been discarded")]
    StaleCredential,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
