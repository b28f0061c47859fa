//! Client-side state containers.
//!
//! Each domain store owns one slice of server-derived state plus an
//! [`OpState`]. Network operations take `&mut self`, so a store never has
//! two operations in flight and its loading/error flags cannot be clobbered.
//!
//! Conventions shared by every domain store:
//! - mutating operations record a failure in `error` and also return it;
//! - `fetch_*` operations record a failure in `error` and return nothing;
//! - create appends and selects, update replaces by id, delete removes by id,
//!   and the selection follows the entity it points at.

pub mod auth;
pub mod bug;
pub mod project;
pub mod team;
pub mod ui;

pub use auth::{AuthSession, AuthStore, PersistedAuth};
pub use bug::{BugFilter, BugFilters, BugStore, FilterError};
pub use project::ProjectStore;
pub use team::TeamStore;
pub use ui::{NewToast, PersistedUi, Theme, Toast, ToastKind, UiStore};

use crate::error::ApiError;
use crate::model::Keyed;
use tracing::debug;

/// Loading/error bookkeeping for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpState {
    pub is_loading: bool,
    pub error: Option<String>,
}

impl OpState {
    fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    fn finish<T>(&mut self, op: &str, result: &Result<T, ApiError>) {
        self.is_loading = false;
        match result {
            Ok(_) => debug!(op, "store operation succeeded"),
            Err(err) => {
                debug!(op, code = %err.code(), "store operation failed: {err}");
                self.error = Some(err.to_string());
            }
        }
    }

    /// Run `call` between `begin` and `finish`.
    pub(crate) fn track<T>(
        &mut self,
        op: &str,
        call: impl FnOnce() -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        self.begin();
        let result = call();
        self.finish(op, &result);
        result
    }
}

/// Replace the entry whose id matches `updated`; absent ids are ignored.
pub(crate) fn replace_by_key<T: Keyed + Clone>(items: &mut [T], updated: &T) {
    for item in items.iter_mut().filter(|item| item.key() == updated.key()) {
        item.clone_from(updated);
    }
}

pub(crate) fn remove_by_key<T: Keyed>(items: &mut Vec<T>, id: &str) {
    items.retain(|item| item.key() != id);
}

/// Point the selection at `updated` when it already referenced that id.
pub(crate) fn refresh_selection<T: Keyed + Clone>(selected: &mut Option<T>, updated: &T) {
    if selected.as_ref().is_some_and(|s| s.key() == updated.key()) {
        *selected = Some(updated.clone());
    }
}

pub(crate) fn clear_selection<T: Keyed>(selected: &mut Option<T>, id: &str) {
    if selected.as_ref().is_some_and(|s| s.key() == id) {
        *selected = None;
    }
}

/// Percent-encode one path segment so ids and keys cannot escape it.
pub(crate) fn segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        OpState, clear_selection, refresh_selection, remove_by_key, replace_by_key, segment,
    };
    use crate::error::ApiError;
    use crate::model::Keyed;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row(&'static str, u32);

    impl Keyed for Row {
        fn key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn track_clears_error_and_records_failure() {
        let mut op = OpState {
            is_loading: false,
            error: Some("stale".to_string()),
        };

        let ok: Result<u8, ApiError> = op.track("ok", || Ok(1));
        assert_eq!(ok, Ok(1));
        assert_eq!(op, OpState::default());

        let failed: Result<u8, ApiError> =
            op.track("fail", || Err(ApiError::Network("down".to_string())));
        assert!(failed.is_err());
        assert!(!op.is_loading);
        assert_eq!(op.error.as_deref(), Some("network error: down"));
    }

    #[test]
    fn track_invokes_call_exactly_once() {
        let mut op = OpState::default();
        let mut calls = 0;
        let _ = op.track("count calls", || {
            calls += 1;
            Ok::<_, ApiError>(())
        });
        assert_eq!(calls, 1);
        assert!(!op.is_loading);
    }

    #[test]
    fn list_helpers_follow_ids() {
        let mut rows = vec![Row("a", 1), Row("b", 1)];
        replace_by_key(&mut rows, &Row("b", 2));
        replace_by_key(&mut rows, &Row("zzz", 9));
        assert_eq!(rows, vec![Row("a", 1), Row("b", 2)]);

        remove_by_key(&mut rows, "a");
        assert_eq!(rows, vec![Row("b", 2)]);
    }

    #[test]
    fn selection_helpers_only_touch_matching_id() {
        let mut selected = Some(Row("a", 1));
        refresh_selection(&mut selected, &Row("b", 5));
        assert_eq!(selected, Some(Row("a", 1)));
        refresh_selection(&mut selected, &Row("a", 2));
        assert_eq!(selected, Some(Row("a", 2)));

        clear_selection(&mut selected, "b");
        assert!(selected.is_some());
        clear_selection(&mut selected, "a");
        assert!(selected.is_none());
    }

    #[test]
    fn segment_escapes_reserved_characters() {
        assert_eq!(segment("B-1_x.y~"), "B-1_x.y~");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("../admin"), "..%2Fadmin");
    }
}
