//! The application root: one API client, every store, and the state
//! directory they persist to.

use crate::api::ApiClient;
use crate::config::EffectiveConfig;
use crate::error::ApiError;
use crate::model::User;
use crate::persist::{AUTH_KEY, StateStorage, UI_KEY};
use crate::store::{
    AuthStore, BugStore, PersistedAuth, PersistedUi, ProjectStore, TeamStore, UiStore,
};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct App {
    client: Arc<ApiClient>,
    storage: StateStorage,
    pub auth: AuthStore,
    pub projects: ProjectStore,
    pub bugs: BugStore,
    pub teams: TeamStore,
    pub ui: UiStore,
}

impl App {
    /// Build the app over the real HTTP transport.
    pub fn bootstrap(config: &EffectiveConfig) -> Self {
        let client = Arc::new(ApiClient::from_config(&config.api));
        Self::with_client(client, StateStorage::new(&config.state_dir))
    }

    /// Build the app over `client` and restore persisted slices.
    ///
    /// Rehydration happens here, before any store can issue a request, so
    /// the first request already carries a restored bearer token.
    pub fn with_client(client: Arc<ApiClient>, storage: StateStorage) -> Self {
        let mut app = Self {
            auth: AuthStore::new(Arc::clone(&client)),
            projects: ProjectStore::new(Arc::clone(&client)),
            bugs: BugStore::new(Arc::clone(&client)),
            teams: TeamStore::new(Arc::clone(&client)),
            ui: UiStore::new(),
            client,
            storage,
        };

        if let Some(saved) = load_or_default::<PersistedAuth>(&app.storage, AUTH_KEY) {
            app.auth.rehydrate(saved);
        }
        if let Some(saved) = load_or_default::<PersistedUi>(&app.storage, UI_KEY) {
            app.ui.rehydrate(saved);
        }
        debug!(
            authenticated = app.auth.is_authenticated(),
            state_dir = %app.storage.dir().display(),
            "app ready"
        );
        app
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub const fn storage(&self) -> &StateStorage {
        &self.storage
    }

    /// Write the persisted auth and UI slices.
    pub fn persist(&self) -> Result<()> {
        self.storage.save(AUTH_KEY, &self.auth.persisted())?;
        self.storage.save(UI_KEY, &self.ui.persisted())?;
        Ok(())
    }

    /// The signed-in user, or an authentication error for guarded views.
    pub fn require_user(&self) -> Result<&User, ApiError> {
        match self.auth.user() {
            Some(user) if self.auth.is_authenticated() => Ok(user),
            _ => Err(ApiError::Http {
                status: 401,
                message: "Authentication required".to_string(),
                data: None,
            }),
        }
    }

    /// Log out and drop every server-derived slice.
    pub fn sign_out(&mut self) {
        self.auth.logout();
        self.projects.reset_state();
        self.bugs.reset_state();
        self.teams.reset_state();
    }
}

fn load_or_default<T: DeserializeOwned>(storage: &StateStorage, key: &str) -> Option<T> {
    storage.load(key).unwrap_or_else(|err| {
        warn!(key, "discarding unreadable state: {err:#}");
        None
    })
}
