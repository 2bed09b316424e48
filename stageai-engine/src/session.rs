use crate::events::{StateChange, StateListener, notify};
use crate::traits::{ApiError, PlaygroundApi};
use serde::Serialize;
use stageai_core::text::{
    MSG_FILL_ALL_FIELDS, MSG_LOGIN_FAILED, MSG_SERVER_UNREACHABLE, require_present,
};
use stageai_core::types::{AuthStatus, Identity};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub status: AuthStatus,
}

#[derive(Default)]
struct Inner {
    identity: Option<Identity>,
    status: AuthStatus,
}

/// Holds who is logged in. Nothing else may write the identity.
///
/// State starts empty on every process start; there is no persistence.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn PlaygroundApi>,
    inner: Arc<Mutex<Inner>>,
    listener: Option<StateListener>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn PlaygroundApi>) -> Self {
        Self {
            api,
            inner: Arc::new(Mutex::new(Inner::default())),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: StateListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns whether the service accepted the credentials.
    ///
    /// A declined login is not an error for the caller; the reason is recorded
    /// in the session status.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        if require_present("username", username).is_err()
            || require_present("password", password).is_err()
        {
            self.transition(None, AuthStatus::error(MSG_FILL_ALL_FIELDS))
                .await;
            return false;
        }

        match self.api.login(username, password).await {
            Ok(()) => {
                log::info!("logged in as {username}");
                self.transition(Some(Identity::new(username)), AuthStatus::LoggedIn)
                    .await;
                true
            }
            Err(e) => {
                log::warn!("login failed: {e}");
                self.transition(None, AuthStatus::error(login_failure_message(&e)))
                    .await;
                false
            }
        }
    }

    /// Unconditional local logout, then a best-effort remote revoke.
    ///
    /// The session reads as logged out before the revoke is sent, so a slow or
    /// dead backend cannot hold the user in the logged-in state.
    pub async fn logout(&self) {
        self.transition(None, AuthStatus::LoggedOut).await;
        log::info!("logged out");

        if let Err(e) = self.api.logout().await {
            log::warn!("logout request failed; session already cleared locally: {e}");
        }
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.inner.lock().await.identity.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.inner.lock().await.status.is_logged_in()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            identity: inner.identity.clone(),
            status: inner.status.clone(),
        }
    }

    async fn transition(&self, identity: Option<Identity>, status: AuthStatus) {
        {
            let mut inner = self.inner.lock().await;
            if inner.status != status {
                log::debug!("auth status: {:?} -> {:?}", inner.status, status);
            }
            inner.identity = identity;
            inner.status = status;
        }
        notify(&self.listener, StateChange::Auth);
    }
}

fn login_failure_message(e: &ApiError) -> String {
    match e {
        ApiError::Status { .. } => e.server_message().unwrap_or(MSG_LOGIN_FAILED).to_string(),
        ApiError::Transport(_) | ApiError::Decode(_) => MSG_SERVER_UNREACHABLE.into(),
        ApiError::MissingField(_) => MSG_LOGIN_FAILED.into(),
    }
}
