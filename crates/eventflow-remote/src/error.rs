//! Error types for calls to the remote event store.

use std::fmt;
use thiserror::Error;

/// The category of a remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorCode {
    /// No credential, or the store rejected it (401).
    AuthenticationFailed,
    /// The credential is valid but lacks access (403).
    AuthorizationFailed,
    /// Connection failed, timed out, or the body could not be read.
    NetworkError,
    /// Any other non-success status.
    ServerError,
    /// The body did not decode into the expected shape.
    InvalidResponse,
    NotFound,
    /// The store refused the request as malformed (400).
    BadRequest,
    /// Local setup problem: bad base URL, unreadable credential file.
    ConfigurationError,
    InternalError,
}

impl RemoteErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while talking to the event store or touching the
/// persisted credential.
#[derive(Debug, Error)]
pub struct RemoteError {
    code: RemoteErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteError {
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::NetworkError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::InternalError, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> RemoteErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the store rejected (or never saw) a credential.
    pub fn is_authentication(&self) -> bool {
        self.code == RemoteErrorCode::AuthenticationFailed
    }

    /// A detached copy without the source chain, for fan-out to several
    /// consumers.
    pub fn duplicate(&self) -> Self {
        Self::new(self.code, self.message.clone())
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = RemoteError::not_found("event 4");
        assert_eq!(err.to_string(), "not_found: event 4");
    }

    #[test]
    fn authentication_predicate() {
        assert!(RemoteError::authentication("no credential").is_authentication());
        assert!(!RemoteError::authorization("forbidden").is_authentication());
    }

    #[test]
    fn source_is_kept_but_not_duplicated() {
        use std::error::Error;
        let err = RemoteError::configuration("cannot write credential")
            .with_source(std::io::Error::other("read-only"));
        assert!(err.source().is_some());
        let copy = err.duplicate();
        assert!(copy.source().is_none());
        assert_eq!(copy.code(), RemoteErrorCode::ConfigurationError);
        assert_eq!(copy.message(), "cannot write credential");
    }
}
