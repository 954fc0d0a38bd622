//! Staff authentication against the backend.

mod session;

use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{AuthError, Error, StoreError, ValidationError},
    models::User,
    store::{ApiClient, Envelope},
};

pub use session::StoredSession;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(flatten)]
    envelope: Envelope,
}

#[derive(Debug)]
struct AuthState {
    user: Option<User>,
    initializing: bool,
}

/// Tracks the signed-in user and keeps the API client's token in sync.
#[derive(Clone)]
pub struct AuthManager {
    client: ApiClient,
    session_path: PathBuf,
    state: Arc<RwLock<AuthState>>,
}

impl AuthManager {
    /// New manager. It reports `initializing` until [`AuthManager::restore`]
    /// has run.
    pub fn new(client: ApiClient, session_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            session_path: session_path.into(),
            state: Arc::new(RwLock::new(AuthState {
                user: None,
                initializing: true,
            })),
        }
    }

    /// Currently signed-in user.
    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Whether the persisted session has not been checked yet.
    pub fn initializing(&self) -> bool {
        self.state.read().initializing
    }

    /// Pick up a session persisted by an earlier run.
    ///
    /// An unreadable session file is discarded rather than reported.
    pub fn restore(&self) -> Option<User> {
        let restored = match StoredSession::load(&self.session_path) {
            Ok(session) => session,
            Err(err) => {
                warn!("Discarding unreadable session: {err:#}");
                if let Err(err) = StoredSession::clear(&self.session_path) {
                    warn!("Failed to remove session file: {err:#}");
                }
                None
            }
        };

        let mut state = self.state.write();
        state.initializing = false;
        match restored {
            Some(session) => {
                self.client.set_token(Some(session.access_token));
                state.user = Some(session.user.clone());
                Some(session.user)
            }
            None => {
                self.client.set_token(None);
                state.user = None;
                None
            }
        }
    }

    /// Sign in with e-mail and password.
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<User, Error> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let body = json!({ "login": login, "password": password });
        let (status, bytes) = self
            .client
            .send_raw(Method::POST, "auth/login", Some(&body))
            .await
            .map_err(AuthError::from)?;

        let response: LoginResponse = match serde_json::from_slice(&bytes) {
            Ok(response) => response,
            Err(_) if !status.is_success() => {
                return Err(AuthError::Store(StoreError::Status(status.as_u16())).into())
            }
            Err(err) => return Err(AuthError::Store(StoreError::Decode(err)).into()),
        };

        if response.envelope.is_error() || !status.is_success() {
            return Err(AuthError::Rejected(response.envelope.error_msg).into());
        }

        let (access_token, user) = match (response.access_token, response.user) {
            (Some(token), Some(user)) => (token, user),
            _ => {
                return Err(AuthError::Rejected(Some(
                    "sign-in response is missing the session".to_string(),
                ))
                .into())
            }
        };

        let session = StoredSession {
            access_token: access_token.clone(),
            refresh_token: response.refresh_token,
            user: user.clone(),
            signed_in_at: Utc::now(),
        };
        session
            .persist(&self.session_path)
            .map_err(AuthError::Session)?;

        self.client.set_token(Some(access_token));
        {
            let mut state = self.state.write();
            state.user = Some(user.clone());
            state.initializing = false;
        }
        info!("signed in as {}", user.id);
        Ok(user)
    }

    /// Sign the current user out. Does nothing when nobody is signed in.
    ///
    /// The local session is dropped even when the backend call fails.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let Some(user) = self.user() else {
            return Ok(());
        };

        let body = json!({ "userId": user.id });
        let remote = self
            .client
            .send(Method::POST, "auth/logout", Some(&body))
            .await;

        self.client.set_token(None);
        self.state.write().user = None;
        StoredSession::clear(&self.session_path).map_err(AuthError::Session)?;

        match remote {
            Ok(_) => {
                info!("signed out {}", user.id);
                Ok(())
            }
            Err(err) => {
                warn!("Sign-out request failed: {err}");
                Err(AuthError::Store(err).into())
            }
        }
    }
}
