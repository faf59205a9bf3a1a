//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod events;

use std::sync::Arc;

use eventflow_core::Occurrence;
use eventflow_engine::{CatalogState, EventController, SessionGate};
use eventflow_remote::{CredentialStore, EventStore, HttpClient, SessionApi, UserProfile};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Everything a command needs to talk to the store: the session gate that
/// owns the credential and the controller that reads and changes events.
pub struct App {
    gate: SessionGate,
    store: Arc<dyn EventStore>,
    controller: EventController,
}

impl App {
    /// Wires the HTTP client, session gate and controller from configuration.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let credentials = Arc::new(CredentialStore::new(config.credential_path()));
        let client = Arc::new(HttpClient::new(config.api_config()?, credentials.clone())?);
        debug!(base_url = %client.config().base_url, "connecting to event store");
        Ok(Self::with_parts(client.clone(), client, credentials, config))
    }

    pub fn with_parts(
        store: Arc<dyn EventStore>,
        api: Arc<dyn SessionApi>,
        credentials: Arc<CredentialStore>,
        config: &ClientConfig,
    ) -> Self {
        let gate = SessionGate::new(api, credentials);
        let controller =
            EventController::new(store.clone(), gate.view(), config.controller_config());
        Self {
            gate,
            store,
            controller,
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn controller(&self) -> &EventController {
        &self.controller
    }

    /// Resolves the stored credential, failing if there is none.
    pub async fn require_user(&self) -> ClientResult<UserProfile> {
        self.gate.restore().await?.ok_or(ClientError::AuthRequired)
    }

    /// Fetches the full occurrence list.
    pub async fn catalog(&self) -> ClientResult<Vec<Occurrence>> {
        match self.controller.refresh().await {
            CatalogState::Ready(occurrences) => Ok(occurrences),
            CatalogState::Unauthenticated(_) if self.gate.state().is_authenticated() => {
                Err(ClientError::SessionExpired)
            }
            CatalogState::Unauthenticated(_) => Err(ClientError::AuthRequired),
            CatalogState::Error(message) => Err(ClientError::Catalog(message)),
            CatalogState::Loading => Err(ClientError::Catalog(
                "fetch did not complete".to_string(),
            )),
        }
    }

    /// Logs out when `result` shows the store no longer accepts the
    /// credential, then passes the result through.
    pub fn settle<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result
            && err.is_stale_credential()
        {
            warn!("stored credential rejected, logging out");
            self.gate.logout();
        }
        result
    }
}
