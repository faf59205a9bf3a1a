//! The remote collaborator seam.
//!
//! [`EventStore`] covers event persistence and recurrence expansion;
//! [`SessionApi`] covers account and token operations. Both are object safe
//! so the engine can hold them as `Arc<dyn ...>` and tests can substitute
//! in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use eventflow_core::{EventId, EventPayload, EventRecord, OccurrenceSpan};
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// A boxed future for trait methods that must stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Username and password exchanged for a token.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A new account request.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(username, password),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Tokens handed out by the store on login.
#[derive(Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The account a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Event persistence as offered by the remote store.
///
/// Every call is authenticated with the currently stored credential.
pub trait EventStore: Send + Sync {
    fn list_events(&self) -> BoxFuture<'_, RemoteResult<Vec<EventRecord>>>;

    fn get_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<EventRecord>>;

    /// Creates an event; the store assigns the id.
    fn create_event(&self, payload: EventPayload) -> BoxFuture<'_, RemoteResult<EventRecord>>;

    fn update_event(
        &self,
        id: EventId,
        payload: EventPayload,
    ) -> BoxFuture<'_, RemoteResult<EventRecord>>;

    /// Deletes a record together with every occurrence of its series.
    fn delete_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<()>>;

    /// Expands a recurring series into at most `max_count` instance windows.
    fn list_occurrences(
        &self,
        id: EventId,
        max_count: usize,
    ) -> BoxFuture<'_, RemoteResult<Vec<OccurrenceSpan>>>;

    /// Removes the single occurrence of series `id` starting at `start`.
    fn delete_occurrence(
        &self,
        id: EventId,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, RemoteResult<()>>;
}

/// Account and token operations.
pub trait SessionApi: Send + Sync {
    fn obtain_token(&self, credentials: Credentials) -> BoxFuture<'_, RemoteResult<TokenPair>>;

    /// Resolves the owner of `access_token`. An authentication error means the
    /// token is no longer accepted.
    fn current_user(&self, access_token: String) -> BoxFuture<'_, RemoteResult<UserProfile>>;

    fn register(&self, registration: Registration) -> BoxFuture<'_, RemoteResult<()>>;
}
