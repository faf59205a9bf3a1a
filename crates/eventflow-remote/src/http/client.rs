//! reqwest-backed implementation of [`EventStore`] and [`SessionApi`].

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use eventflow_core::{EventId, EventPayload, EventRecord, OccurrenceSpan};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::credentials::CredentialStore;
use crate::error::{RemoteError, RemoteResult};
use crate::http::config::ApiConfig;
use crate::store::{
    BoxFuture, Credentials, EventStore, Registration, SessionApi, TokenPair, UserProfile,
};

/// Client for the event store REST API.
///
/// Event calls read the bearer token from the shared [`CredentialStore`] at
/// request time, so a login or logout elsewhere takes effect immediately.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: ApiConfig,
    credentials: Arc<CredentialStore>,
}

impl HttpClient {
    pub fn new(config: ApiConfig, credentials: Arc<CredentialStore>) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                RemoteError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The stored access token, or an authentication error before any
    /// request is built.
    fn bearer(&self) -> RemoteResult<String> {
        self.credentials
            .access_token()
            .ok_or_else(|| RemoteError::authentication("not logged in"))
    }

    /// Sends a request and turns transport failures and non-success statuses
    /// into errors.
    async fn execute(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            RemoteError::network(message).with_source(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "store rejected request");
        Err(error_for_status(status, &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.execute(request).await?;
        read_json(response).await
    }
}

/// Maps a non-success status to a remote error.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::authentication("credential expired or invalid"),
        StatusCode::FORBIDDEN => RemoteError::authorization("access denied"),
        StatusCode::NOT_FOUND => RemoteError::not_found(format!("not found: {}", body.trim())),
        StatusCode::BAD_REQUEST => {
            RemoteError::bad_request(format!("request rejected: {}", body.trim()))
        }
        _ => RemoteError::server(format!("API error ({}): {}", status, body.trim())),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::network(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&body)
        .map_err(|e| RemoteError::invalid_response(format!("failed to parse response: {}", e)))
}

fn with_json<T: Serialize>(request: RequestBuilder, body: &T) -> RemoteResult<RequestBuilder> {
    let body = serde_json::to_string(body)
        .map_err(|e| RemoteError::internal(format!("failed to serialize request: {}", e)))?;
    Ok(request
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body))
}

fn event_path(id: EventId) -> String {
    format!("events/{}/", id)
}

impl EventStore for HttpClient {
    fn list_events(&self) -> BoxFuture<'_, RemoteResult<Vec<EventRecord>>> {
        Box::pin(async move {
            let url = self.config.endpoint("events/")?;
            let request = self.http.get(url).bearer_auth(self.bearer()?);
            let events: Vec<EventRecord> = self.fetch(request).await?;
            debug!(count = events.len(), "fetched events");
            Ok(events)
        })
    }

    fn get_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        Box::pin(async move {
            let url = self.config.endpoint(&event_path(id))?;
            self.fetch(self.http.get(url).bearer_auth(self.bearer()?)).await
        })
    }

    fn create_event(&self, payload: EventPayload) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        Box::pin(async move {
            let url = self.config.endpoint("events/")?;
            let request = with_json(self.http.post(url).bearer_auth(self.bearer()?), &payload)?;
            let record: EventRecord = self.fetch(request).await?;
            debug!(id = %record.id, title = %record.title, "created event");
            Ok(record)
        })
    }

    fn update_event(
        &self,
        id: EventId,
        payload: EventPayload,
    ) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        Box::pin(async move {
            let url = self.config.endpoint(&event_path(id))?;
            let request = with_json(self.http.put(url).bearer_auth(self.bearer()?), &payload)?;
            let record: EventRecord = self.fetch(request).await?;
            debug!(id = %record.id, "updated event");
            Ok(record)
        })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            let url = self.config.endpoint(&event_path(id))?;
            self.execute(self.http.delete(url).bearer_auth(self.bearer()?))
                .await?;
            debug!(id = %id, "deleted event");
            Ok(())
        })
    }

    fn list_occurrences(
        &self,
        id: EventId,
        max_count: usize,
    ) -> BoxFuture<'_, RemoteResult<Vec<OccurrenceSpan>>> {
        Box::pin(async move {
            let url = self.config.endpoint(&format!("events/{}/occurrences/", id))?;
            let request = self
                .http
                .get(url)
                .bearer_auth(self.bearer()?)
                .query(&[("count", max_count.to_string())]);
            let spans: Vec<OccurrenceSpan> = self.fetch(request).await?;
            debug!(id = %id, count = spans.len(), "expanded series");
            Ok(spans)
        })
    }

    fn delete_occurrence(
        &self,
        id: EventId,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            let url = self.config.endpoint(&format!("events/{}/occurrences/", id))?;
            let request = self
                .http
                .delete(url)
                .bearer_auth(self.bearer()?)
                .query(&[("start", start.to_rfc3339_opts(SecondsFormat::Secs, true))]);
            self.execute(request).await?;
            debug!(id = %id, start = %start, "deleted occurrence");
            Ok(())
        })
    }
}

impl SessionApi for HttpClient {
    fn obtain_token(&self, credentials: Credentials) -> BoxFuture<'_, RemoteResult<TokenPair>> {
        Box::pin(async move {
            let url = self.config.endpoint("token/")?;
            let request = with_json(self.http.post(url), &credentials)?;
            let pair: TokenPair = self.fetch(request).await?;
            debug!(username = %credentials.username, "obtained token");
            Ok(pair)
        })
    }

    fn current_user(&self, access_token: String) -> BoxFuture<'_, RemoteResult<UserProfile>> {
        Box::pin(async move {
            let url = self.config.endpoint("users/me/")?;
            self.fetch(self.http.get(url).bearer_auth(access_token))
                .await
        })
    }

    fn register(&self, registration: Registration) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            let url = self.config.endpoint("users/register/")?;
            let request = with_json(self.http.post(url), &registration)?;
            self.execute(request).await?;
            debug!(username = %registration.credentials.username, "registered account");
            Ok(())
        })
    }
}
