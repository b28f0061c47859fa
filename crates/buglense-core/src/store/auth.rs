use super::OpState;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{LoginCredentials, RegisterData, User, UserPatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The signed-in user and bearer token, set and cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthSession {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// The auth slice written to disk.
///
/// `is_authenticated` is stored for format compatibility; rehydration
/// derives it again from `user` and `token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAuth {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Deserialize)]
struct SessionResponse {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug)]
pub struct AuthStore {
    client: Arc<ApiClient>,
    session: AuthSession,
    op: OpState,
}

impl AuthStore {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            session: AuthSession::default(),
            op: OpState::default(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.op.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.op.error.as_deref()
    }

    pub fn login(&mut self, credentials: &LoginCredentials) -> Result<User, ApiError> {
        let client = &self.client;
        let response = self.op.track("auth.login", || {
            credentials.validate()?;
            client.post::<SessionResponse, _>("/auth/login", Some(credentials))
        })?;
        Ok(self.establish(response))
    }

    pub fn register(&mut self, data: &RegisterData) -> Result<User, ApiError> {
        let client = &self.client;
        let response = self.op.track("auth.register", || {
            data.validate()?;
            client.post::<SessionResponse, _>("/auth/register", Some(data))
        })?;
        Ok(self.establish(response))
    }

    fn establish(&mut self, response: SessionResponse) -> User {
        let SessionResponse { user, token } = response;
        info!(user = %user.id, "signed in");
        self.client.set_token(Some(token.clone()));
        self.session = AuthSession {
            user: Some(user.clone()),
            token: Some(token),
        };
        user
    }

    /// End the session. Local state is cleared even when the server call
    /// fails or cannot be made. A signed-out store starts clean, so any
    /// recorded `error` is cleared along with `is_loading`.
    pub fn logout(&mut self) {
        self.op.is_loading = true;
        if self.session.token.is_some() {
            if let Err(err) = self.client.post::<Value, Value>("/auth/logout", None) {
                warn!(code = %err.code(), "logout request failed: {err}");
            }
        }
        self.client.set_token(None);
        self.session = AuthSession::default();
        self.op = OpState::default();
    }

    pub fn update_profile(&mut self, patch: &UserPatch) -> Result<User, ApiError> {
        let client = &self.client;
        let UserResponse { user } = self.op.track("auth.update_profile", || {
            client.put::<UserResponse, _>("/auth/profile", Some(patch))
        })?;
        self.session.user = Some(user.clone());
        Ok(user)
    }

    /// Re-read the current user. A 401 ends the session; other failures are
    /// only recorded in `error`.
    pub fn refresh_user(&mut self) {
        if self.session.token.is_none() {
            return;
        }
        let client = &self.client;
        match self
            .op
            .track("auth.refresh", || client.get::<UserResponse>("/auth/me", &[]))
        {
            Ok(UserResponse { user }) => self.session.user = Some(user),
            Err(err) if err.is_unauthorized() => {
                info!("session expired, signing out");
                self.logout();
            }
            Err(_) => {}
        }
    }

    pub fn reset_state(&mut self) {
        self.client.set_token(None);
        self.session = AuthSession::default();
        self.op = OpState::default();
    }

    #[must_use]
    pub fn persisted(&self) -> PersistedAuth {
        PersistedAuth {
            user: self.session.user.clone(),
            token: self.session.token.clone(),
            is_authenticated: self.session.is_authenticated(),
        }
    }

    /// Restore a persisted slice and prime the client's bearer token.
    pub fn rehydrate(&mut self, saved: PersistedAuth) {
        self.client.set_token(saved.token.clone());
        self.session = AuthSession {
            user: saved.user,
            token: saved.token,
        };
    }
}
