use super::{OpState, clear_selection, refresh_selection, remove_by_key, replace_by_key, segment};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{Envelope, Project, ProjectDraft, ProjectPatch};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug)]
pub struct ProjectStore {
    client: Arc<ApiClient>,
    projects: Vec<Project>,
    selected: Option<Project>,
    op: OpState,
}

impl ProjectStore {
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            projects: Vec::new(),
            selected: None,
            op: OpState {
                is_loading: false,
                error: None,
            },
        }
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&Project> {
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

    pub fn fetch_projects(&mut self) {
        let client = &self.client;
        if let Ok(Envelope { data }) = self
            .op
            .track("projects.fetch", || client.get::<Envelope<Vec<Project>>>("/projects", &[]))
        {
            self.projects = data;
        }
    }

    pub fn fetch_project(&mut self, id: &str) {
        let path = format!("/projects/{}", segment(id));
        self.fetch_selected("projects.fetch_one", &path);
    }

    pub fn fetch_project_by_key(&mut self, key: &str) {
        let path = format!("/projects/key/{}", segment(key));
        self.fetch_selected("projects.fetch_by_key", &path);
    }

    fn fetch_selected(&mut self, op: &str, path: &str) {
        let client = &self.client;
        if let Ok(Envelope { data }) = self
            .op
            .track(op, || client.get::<Envelope<Project>>(path, &[]))
        {
            self.selected = Some(data);
        }
    }

    pub fn create_project(&mut self, draft: &ProjectDraft) -> Result<Project, ApiError> {
        let client = &self.client;
        let Envelope { data } = self.op.track("projects.create", || {
            client.post::<Envelope<Project>, _>("/projects", Some(draft))
        })?;
        self.projects.push(data.clone());
        self.selected = Some(data.clone());
        Ok(data)
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Result<Project, ApiError> {
        let client = &self.client;
        let path = format!("/projects/{}", segment(id));
        let Envelope { data } = self.op.track("projects.update", || {
            client.put::<Envelope<Project>, _>(&path, Some(patch))
        })?;
        replace_by_key(&mut self.projects, &data);
        refresh_selection(&mut self.selected, &data);
        Ok(data)
    }

    pub fn delete_project(&mut self, id: &str) -> Result<(), ApiError> {
        let client = &self.client;
        let path = format!("/projects/{}", segment(id));
        self.op
            .track("projects.delete", || client.delete::<Value>(&path))?;
        remove_by_key(&mut self.projects, id);
        clear_selection(&mut self.selected, id);
        Ok(())
    }

    pub fn set_selected_project(&mut self, project: Option<Project>) {
        self.selected = project;
    }

    pub fn reset_state(&mut self) {
        self.projects.clear();
        self.selected = None;
        self.op = OpState::default();
    }
}
