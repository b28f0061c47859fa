//! Bug list state with client-side filtering.
//!
//! `filtered_bugs` is derived: it is recomputed from `bugs` and the active
//! [`BugFilters`] after every fetch, every mutation and every filter change,
//! and is never edited directly.

use super::{OpState, clear_selection, refresh_selection, remove_by_key, replace_by_key, segment};
use crate::api::{ApiClient, MultipartForm};
use crate::error::ApiError;
use crate::model::{Bug, BugDraft, BugPatch, BugPriority, BugStatus, Envelope, ParseEnumError};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Active predicates. Unset fields match everything; set fields combine
/// with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugFilters {
    pub status: Option<BugStatus>,
    pub priority: Option<BugPriority>,
    /// Exact match on `assigneeId`.
    pub assignee: Option<String>,
    /// Case-insensitive substring of title or description.
    pub search_term: String,
}

impl BugFilters {
    /// Returns true if no filter criteria are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assignee.as_deref().is_none_or(str::is_empty)
            && self.search_term.is_empty()
    }

    /// Returns a new vec containing only bugs that match all active criteria.
    #[must_use]
    pub fn apply(&self, bugs: &[Bug]) -> Vec<Bug> {
        let needle = self.search_term.to_lowercase();
        bugs.iter()
            .filter(|bug| self.matches_with(bug, &needle))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn matches(&self, bug: &Bug) -> bool {
        self.matches_with(bug, &self.search_term.to_lowercase())
    }

    fn matches_with(&self, bug: &Bug, needle_lower: &str) -> bool {
        if self.status.is_some_and(|status| bug.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| bug.priority != priority) {
            return false;
        }
        if let Some(assignee) = self.assignee.as_deref().filter(|a| !a.is_empty()) {
            if bug.assignee_id.as_deref() != Some(assignee) {
                return false;
            }
        }
        needle_lower.is_empty() || bug.mentions(needle_lower)
    }
}

/// One predicate change, as issued by [`BugStore::set_filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BugFilter {
    Status(Option<BugStatus>),
    Priority(Option<BugPriority>),
    Assignee(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter '{0}': expected status, priority or assignee")]
    UnknownFilter(String),
    #[error(transparent)]
    Value(#[from] ParseEnumError),
}

impl BugFilter {
    /// Build a filter change from its text name and value.
    ///
    /// A missing or blank value clears that predicate.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, FilterError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match name.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status(value.map(str::parse).transpose()?)),
            "priority" => Ok(Self::Priority(value.map(str::parse).transpose()?)),
            "assignee" => Ok(Self::Assignee(value.map(str::to_string))),
            _ => Err(FilterError::UnknownFilter(name.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct BugStore {
    client: Arc<ApiClient>,
    bugs: Vec<Bug>,
    filtered: Vec<Bug>,
    selected: Option<Bug>,
    filters: BugFilters,
    op: OpState,
}

impl BugStore {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            bugs: Vec::new(),
            filtered: Vec::new(),
            selected: None,
            filters: BugFilters::default(),
            op: OpState::default(),
        }
    }

    #[must_use]
    pub fn bugs(&self) -> &[Bug] {
        &self.bugs
    }

    #[must_use]
    pub fn filtered_bugs(&self) -> &[Bug] {
        &self.filtered
    }

    #[must_use]
    pub const fn selected(&self) -> Option<&Bug> {
        self.selected.as_ref()
    }

    #[must_use]
    pub const fn filters(&self) -> &BugFilters {
        &self.filters
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.op.is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.op.error.as_deref()
    }

    pub fn fetch_bugs(&mut self) {
        self.fetch_list("bugs.fetch", "/bugs");
    }

    pub fn fetch_bugs_by_project(&mut self, project_id: &str) {
        let path = format!("/projects/{}/bugs", segment(project_id));
        self.fetch_list("bugs.fetch_by_project", &path);
    }

    fn fetch_list(&mut self, op: &str, path: &str) {
        let client = &self.client;
        if let Ok(Envelope { data }) = self
            .op
            .track(op, || client.get::<Envelope<Vec<Bug>>>(path, &[]))
        {
            self.bugs = data;
            self.apply_filters();
        }
    }

    pub fn fetch_bug(&mut self, id: &str) {
        let client = &self.client;
        let path = format!("/bugs/{}", segment(id));
        if let Ok(Envelope { data }) = self
            .op
            .track("bugs.fetch_one", || client.get::<Envelope<Bug>>(&path, &[]))
        {
            self.selected = Some(data);
        }
    }

    pub fn create_bug(&mut self, draft: &BugDraft) -> Result<Bug, ApiError> {
        let client = &self.client;
        let Envelope { data } = self.op.track("bugs.create", || {
            client.post::<Envelope<Bug>, _>("/bugs", Some(draft))
        })?;
        self.bugs.push(data.clone());
        self.selected = Some(data.clone());
        self.apply_filters();
        Ok(data)
    }

    /// Create a bug with file attachments in one multipart request.
    ///
    /// Without attachments this is [`Self::create_bug`].
    pub fn report_bug(
        &mut self,
        draft: &BugDraft,
        attachments: &[PathBuf],
    ) -> Result<Bug, ApiError> {
        if attachments.is_empty() {
            return self.create_bug(draft);
        }
        let client = &self.client;
        let Envelope { data } = self.op.track("bugs.report", || {
            let form = draft_form(draft, attachments)?;
            client.post_multipart::<Envelope<Bug>>("/bugs", form)
        })?;
        self.bugs.push(data.clone());
        self.selected = Some(data.clone());
        self.apply_filters();
        Ok(data)
    }

    pub fn update_bug(&mut self, id: &str, patch: &BugPatch) -> Result<Bug, ApiError> {
        let client = &self.client;
        let path = format!("/bugs/{}", segment(id));
        let Envelope { data } = self.op.track("bugs.update", || {
            client.put::<Envelope<Bug>, _>(&path, Some(patch))
        })?;
        self.absorb(&data);
        Ok(data)
    }

    /// Move a bug to any status; no transition is refused.
    pub fn update_bug_status(&mut self, id: &str, status: BugStatus) -> Result<Bug, ApiError> {
        let client = &self.client;
        let path = format!("/bugs/{}/status", segment(id));
        let body = json!({ "status": status });
        let Envelope { data } = self.op.track("bugs.update_status", || {
            client.patch::<Envelope<Bug>, _>(&path, Some(&body))
        })?;
        self.absorb(&data);
        Ok(data)
    }

    /// Assign to `user_id`, or unassign with `None`.
    pub fn assign_bug(&mut self, id: &str, user_id: Option<&str>) -> Result<Bug, ApiError> {
        let client = &self.client;
        let path = format!("/bugs/{}/assign", segment(id));
        let body = json!({ "userId": user_id });
        let Envelope { data } = self.op.track("bugs.assign", || {
            client.post::<Envelope<Bug>, _>(&path, Some(&body))
        })?;
        self.absorb(&data);
        Ok(data)
    }

    pub fn delete_bug(&mut self, id: &str) -> Result<(), ApiError> {
        let client = &self.client;
        let path = format!("/bugs/{}", segment(id));
        self.op.track("bugs.delete", || client.delete::<Value>(&path))?;
        remove_by_key(&mut self.bugs, id);
        clear_selection(&mut self.selected, id);
        self.apply_filters();
        Ok(())
    }

    fn absorb(&mut self, updated: &Bug) {
        replace_by_key(&mut self.bugs, updated);
        refresh_selection(&mut self.selected, updated);
        self.apply_filters();
    }

    pub fn set_selected_bug(&mut self, bug: Option<Bug>) {
        self.selected = bug;
    }

    pub fn set_filter(&mut self, filter: BugFilter) {
        match filter {
            BugFilter::Status(status) => self.filters.status = status,
            BugFilter::Priority(priority) => self.filters.priority = priority,
            BugFilter::Assignee(assignee) => self.filters.assignee = assignee,
        }
        self.apply_filters();
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filters.search_term = term.into();
        self.apply_filters();
    }

    /// Recompute `filtered_bugs` from `bugs` and the active filters.
    pub fn apply_filters(&mut self) {
        self.filtered = self.filters.apply(&self.bugs);
    }

    pub fn reset_filters(&mut self) {
        self.filters = BugFilters::default();
        self.filtered.clone_from(&self.bugs);
    }

    /// Count of every status over the full (unfiltered) list.
    #[must_use]
    pub fn counts_by_status(&self) -> BTreeMap<BugStatus, usize> {
        let mut counts: BTreeMap<_, _> = BugStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for bug in &self.bugs {
            *counts.entry(bug.status).or_default() += 1;
        }
        counts
    }

    #[must_use]
    pub fn counts_by_priority(&self) -> BTreeMap<BugPriority, usize> {
        let mut counts: BTreeMap<_, _> = BugPriority::ALL.iter().map(|p| (*p, 0)).collect();
        for bug in &self.bugs {
            *counts.entry(bug.priority).or_default() += 1;
        }
        counts
    }

    pub fn reset_state(&mut self) {
        self.bugs.clear();
        self.filtered.clear();
        self.selected = None;
        self.filters = BugFilters::default();
        self.op = OpState::default();
    }
}

fn draft_form(draft: &BugDraft, attachments: &[PathBuf]) -> Result<MultipartForm, ApiError> {
    let mut form = MultipartForm::new()
        .text("title", draft.title.clone())
        .text("description", draft.description.clone())
        .text("projectId", draft.project_id.clone());
    if let Some(status) = draft.status {
        form = form.text("status", status.as_str());
    }
    if let Some(priority) = draft.priority {
        form = form.text("priority", priority.as_str());
    }
    if let Some(assignee) = &draft.assignee_id {
        form = form.text("assigneeId", assignee.clone());
    }
    for path in attachments {
        form = form.file_from_path("attachments", path).map_err(|err| {
            ApiError::Invalid(format!("cannot read attachment {}: {err}", path.display()))
        })?;
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::{BugFilter, BugFilters, FilterError, draft_form};
    use crate::model::{Bug, BugDraft, BugPriority, BugStatus};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn bug(id: &str, title: &str, status: BugStatus, assignee: Option<&str>) -> Bug {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Bug {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            status,
            priority: BugPriority::Medium,
            project_id: "P1".to_string(),
            reporter_id: "U1".to_string(),
            assignee_id: assignee.map(str::to_string),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn empty_filters_match_everything() {
        let filters = BugFilters::default();
        assert!(filters.is_empty());
        let bugs = vec![
            bug("B1", "a", BugStatus::Open, None),
            bug("B2", "b", BugStatus::Closed, Some("U2")),
        ];
        assert_eq!(filters.apply(&bugs), bugs);
    }

    #[test]
    fn blank_assignee_is_inactive() {
        let filters = BugFilters {
            assignee: Some(String::new()),
            ..BugFilters::default()
        };
        assert!(filters.is_empty());
        assert!(filters.matches(&bug("B1", "a", BugStatus::Open, None)));
    }

    #[test]
    fn predicates_combine_with_and() {
        let filters = BugFilters {
            status: Some(BugStatus::Open),
            assignee: Some("U2".to_string()),
            search_term: "LOGIN".to_string(),
            ..BugFilters::default()
        };
        assert!(filters.matches(&bug("B1", "Login fails", BugStatus::Open, Some("U2"))));
        assert!(!filters.matches(&bug("B2", "Login fails", BugStatus::Closed, Some("U2"))));
        assert!(!filters.matches(&bug("B3", "Login fails", BugStatus::Open, None)));
        assert!(!filters.matches(&bug("B4", "Crash", BugStatus::Open, Some("U2"))));
    }

    #[test]
    fn draft_form_lists_set_fields_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("crash.log");
        std::fs::write(&log, "trace").unwrap();
        let draft = BugDraft {
            title: "Crash".to_string(),
            description: "on save".to_string(),
            priority: Some(BugPriority::High),
            project_id: "P1".to_string(),
            ..BugDraft::default()
        };

        let form = draft_form(&draft, &[log]).unwrap();
        let names: Vec<_> = form.field_names().collect();
        assert_eq!(
            names.join(","),
            "title,description,projectId,priority,attachments"
        );

        let missing = draft_form(&draft, &[PathBuf::from("/nonexistent/x.log")]);
        assert!(matches!(missing, Err(crate::error::ApiError::Invalid(_))));
    }

    #[test]
    fn parse_filter_from_text() {
        assert_eq!(
            BugFilter::parse("status", Some("in progress")).unwrap(),
            BugFilter::Status(Some(BugStatus::InProgress))
        );
        assert_eq!(
            BugFilter::parse("Priority", Some("high")).unwrap(),
            BugFilter::Priority(Some(BugPriority::High))
        );
        assert_eq!(
            BugFilter::parse("assignee", Some("  ")).unwrap(),
            BugFilter::Assignee(None)
        );
        assert_eq!(
            BugFilter::parse("status", None).unwrap(),
            BugFilter::Status(None)
        );
        assert!(matches!(
            BugFilter::parse("reporter", Some("U1")),
            Err(FilterError::UnknownFilter(_))
        ));
        assert!(matches!(
            BugFilter::parse("status", Some("Reopened")),
            Err(FilterError::Value(_))
        ));
    }
}
