use super::{OpState, clear_selection, refresh_selection, remove_by_key, replace_by_key, segment};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{Envelope, Team, TeamDraft, TeamPatch};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug)]
pub struct TeamStore {
    client: Arc<ApiClient>,
    teams: Vec<Team>,
    selected: Option<Team>,
    op: OpState,
}

impl TeamStore {
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            teams: Vec::new(),
            selected: None,
            op: OpState {
                is_loading: false,
                error: None,
            },
        }
    }

    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&Team> {
        self.selected.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.op.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.op.error.as_deref()
    }

    pub fn fetch_teams(&mut self) {
        let client = &self.client;
        if let Ok(Envelope { data }) = self
            .op
            .track("teams.fetch", || client.get::<Envelope<Vec<Team>>>("/teams", &[]))
        {
            self.teams = data;
        }
    }

    pub fn fetch_team(&mut self, id: &str) {
        let client = &self.client;
        let path = format!("/teams/{}", segment(id));
        if let Ok(Envelope { data }) = self
            .op
            .track("teams.fetch_one", || client.get::<Envelope<Team>>(&path, &[]))
        {
            self.selected = Some(data);
        }
    }

    pub fn create_team(&mut self, draft: &TeamDraft) -> Result<Team, ApiError> {
        let client = &self.client;
        let Envelope { data } = self.op.track("teams.create", || {
            client.post::<Envelope<Team>, _>("/teams", Some(draft))
        })?;
        self.teams.push(data.clone());
        self.selected = Some(data.clone());
        Ok(data)
    }

    pub fn update_team(&mut self, id: &str, patch: &TeamPatch) -> Result<Team, ApiError> {
        let client = &self.client;
        let path = format!("/teams/{}", segment(id));
        let Envelope { data } = self.op.track("teams.update", || {
            client.put::<Envelope<Team>, _>(&path, Some(patch))
        })?;
        replace_by_key(&mut self.teams, &data);
        refresh_selection(&mut self.selected, &data);
        Ok(data)
    }

    pub fn delete_team(&mut self, id: &str) -> Result<(), ApiError> {
        let client = &self.client;
        let path = format!("/teams/{}", segment(id));
        self.op.track("teams.delete", || client.delete::<Value>(&path))?;
        remove_by_key(&mut self.teams, id);
        clear_selection(&mut self.selected, id);
        Ok(())
    }

    pub fn set_selected_team(&mut self, team: Option<Team>) {
        self.selected = team;
    }

    pub fn reset_state(&mut self) {
        self.teams.clear();
        self.selected = None;
        self.op = OpState::default();
    }
}
