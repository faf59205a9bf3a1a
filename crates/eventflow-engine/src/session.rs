//! Session lifecycle.
//!
//! [`SessionGate`] owns the process-wide credential and is its only writer.
//! Everything else observes the gate through a [`SessionView`], which reads
//! the current state synchronously and can wait for changes.
//!
//! ```text
//! Unknown ──restore──▶ Checking ──ok──▶ Authenticated(user)
//!    │                    │                   │
//!    │ (no credential)    └──rejected──┐      │ logout
//!    ▼                                 ▼      ▼
//! Unauthenticated ◀────────────────────────────
//! ```

use std::sync::Arc;

use eventflow_remote::{
    CredentialStore, Credentials, Registration, SessionApi, StoredCredential, UserProfile,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The stored credential has not been looked at yet.
    #[default]
    Unknown,
    /// A stored credential is being resolved against the store.
    Checking,
    Authenticated(UserProfile),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Read-only handle on the gate's state.
#[derive(Debug, Clone)]
pub struct SessionView {
    rx: watch::Receiver<SessionState>,
}

impl SessionView {
    /// Synchronous check used before every controller operation.
    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state change. Returns false once the gate is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

pub struct SessionGate {
    api: Arc<dyn SessionApi>,
    credentials: Arc<CredentialStore>,
    state: watch::Sender<SessionState>,
}

impl SessionGate {
    pub fn new(api: Arc<dyn SessionApi>, credentials: Arc<CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            api,
            credentials,
            state,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            rx: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn transition(&self, next: SessionState) {
        debug!(state = ?next, "session transition");
        self.state.send_replace(next);
    }

    /// Process-start check of the stored credential.
    ///
    /// Returns `Ok(None)` when there is nothing stored. Any failure to resolve
    /// the stored credential discards it.
    pub async fn restore(&self) -> SessionResult<Option<UserProfile>> {
        let loaded = match self.credentials.load() {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(error = %err, "unreadable stored credential, discarding");
                self.discard();
                false
            }
        };
        let token = match self.credentials.access_token() {
            Some(token) if loaded => token,
            _ => {
                self.transition(SessionState::Unauthenticated);
                return Ok(None);
            }
        };

        self.transition(SessionState::Checking);
        match self.api.current_user(token).await {
            Ok(user) => {
                info!(username = %user.username, "restored session");
                self.transition(SessionState::Authenticated(user.clone()));
                Ok(Some(user))
            }
            Err(err) => {
                warn!(error = %err, "stored credential could not be resolved");
                self.discard();
                self.transition(SessionState::Unauthenticated);
                if err.is_authentication() {
                    Err(SessionError::StaleCredential)
                } else {
                    Err(SessionError::Remote(err))
                }
            }
        }
    }

    /// Exchanges credentials for a token, stores it, and resolves the user.
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SessionResult<UserProfile> {
        let result = self.try_login(Credentials::new(username, password)).await;
        match &result {
            Ok(user) => {
                info!(username = %user.username, "logged in");
                self.transition(SessionState::Authenticated(user.clone()));
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.transition(SessionState::Unauthenticated);
            }
        }
        result
    }

    async fn try_login(&self, credentials: Credentials) -> SessionResult<UserProfile> {
        let pair = self.api.obtain_token(credentials).await?;
        let credential = StoredCredential::from(pair);
        let token = credential.access_token.clone();
        self.credentials.set(credential)?;

        match self.api.current_user(token).await {
            Ok(user) => Ok(user),
            Err(err) => {
                self.discard();
                Err(err.into())
            }
        }
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(&self, registration: Registration) -> SessionResult<UserProfile> {
        let credentials = registration.credentials.clone();
        if let Err(err) = self.api.register(registration).await {
            warn!(error = %err, "registration failed");
            self.transition(SessionState::Unauthenticated);
            return Err(err.into());
        }
        info!(username = %credentials.username, "registered account");
        self.login(credentials.username, credentials.password).await
    }

    /// Discards the credential and flips to `Unauthenticated`. Never touches
    /// the network.
    pub fn logout(&self) {
        self.discard();
        self.transition(SessionState::Unauthenticated);
        info!("logged out");
    }

    fn discard(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "failed to remove stored credential");
        }
    }
}
