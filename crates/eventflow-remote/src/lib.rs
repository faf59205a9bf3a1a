//! Access to the remote event store.
//!
//! - [`EventStore`] / [`SessionApi`]: the traits the engine talks to
//! - [`HttpClient`]: the REST implementation of both
//! - [`CredentialStore`]: the persisted session credential shared by the
//!   session gate (writer) and the HTTP client (reader)
//! - [`RemoteError`]: what every call can fail with

pub mod credentials;
pub mod error;
pub mod http;
pub mod store;

pub use credentials::{CREDENTIAL_FILE, CredentialStore, StoredCredential};
pub use error::{RemoteError, RemoteErrorCode, RemoteResult};
pub use http::{ApiConfig, DEFAULT_BASE_URL, HttpClient};
pub use store::{
    BoxFuture, Credentials, EventStore, Registration, SessionApi, TokenPair, UserProfile,
};
