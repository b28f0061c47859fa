//! Presentation state: sidebar, theme and transient toasts.
//!
//! Toasts carry a deadline taken from the store's [`Clock`]. Nothing runs
//! in the background; expired toasts are dropped whenever the list is read
//! through [`UiStore::toasts`] or [`UiStore::prune_expired`], and removing a
//! toast early leaves no pending work behind.

use crate::clock::{Clock, SystemClock};
use crate::model::{ParseEnumError, normalize};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use std::{fmt, str::FromStr};

pub const DEFAULT_TOAST_MILLIS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" | "auto" => Ok(Self::System),
            _ => Err(ParseEnumError {
                expected: "theme",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A toast waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToast {
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
    /// Milliseconds; `None` or zero means [`DEFAULT_TOAST_MILLIS`].
    pub duration: Option<u64>,
}

impl NewToast {
    #[must_use]
    pub fn new(kind: ToastKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
            duration: None,
        }
    }

    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, title)
    }

    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, title)
    }

    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, title)
    }

    #[must_use]
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, title)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Milliseconds.
    pub duration: u64,
    #[serde(skip)]
    deadline: Instant,
}

impl Toast {
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// The UI slice written to disk. Toasts are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUi {
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
    #[serde(default)]
    pub theme: Theme,
}

const fn default_sidebar_open() -> bool {
    true
}

impl Default for PersistedUi {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            theme: Theme::System,
        }
    }
}

#[derive(Debug)]
pub struct UiStore<C: Clock = SystemClock> {
    clock: C,
    sidebar_open: bool,
    theme: Theme,
    toasts: Vec<Toast>,
    last_id: i64,
}

impl UiStore<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for UiStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> UiStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            sidebar_open: true,
            theme: Theme::System,
            toasts: Vec::new(),
            last_id: 0,
        }
    }

    #[must_use]
    pub const fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    pub const fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub const fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    pub const fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Append a toast and return its id.
    ///
    /// Ids come from the wall clock in milliseconds, bumped when needed so
    /// each id is larger than the last one handed out.
    pub fn add_toast(&mut self, toast: NewToast) -> i64 {
        let next = self.last_id.saturating_add(1);
        let id = self.clock.epoch_millis().max(next);
        self.last_id = id;

        let duration = toast
            .duration
            .filter(|millis| *millis > 0)
            .unwrap_or(DEFAULT_TOAST_MILLIS);
        self.toasts.push(Toast {
            id,
            kind: toast.kind,
            title: toast.title,
            message: toast.message,
            duration,
            deadline: self.clock.now() + Duration::from_millis(duration),
        });
        id
    }

    /// Remove one toast. Unknown ids are ignored.
    pub fn remove_toast(&mut self, id: i64) {
        self.toasts.retain(|toast| toast.id != id);
    }

    pub fn clear_toasts(&mut self) {
        self.toasts.clear();
    }

    /// Live toasts in insertion order, after dropping expired ones.
    pub fn toasts(&mut self) -> &[Toast] {
        self.prune_expired();
        &self.toasts
    }

    /// Live toasts without pruning.
    pub fn active_toasts(&self) -> impl Iterator<Item = &Toast> {
        let now = self.clock.now();
        self.toasts.iter().filter(move |toast| toast.deadline > now)
    }

    /// Drop expired toasts and return how many were removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.deadline > now);
        before - self.toasts.len()
    }

    /// Time until the nearest toast deadline, if any toast is live.
    #[must_use]
    pub fn next_expiry(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.toasts
            .iter()
            .filter(|toast| toast.deadline > now)
            .map(|toast| toast.deadline - now)
            .min()
    }

    #[must_use]
    pub const fn persisted(&self) -> PersistedUi {
        PersistedUi {
            sidebar_open: self.sidebar_open,
            theme: self.theme,
        }
    }

    pub const fn rehydrate(&mut self, saved: PersistedUi) {
        self.sidebar_open = saved.sidebar_open;
        self.theme = saved.theme;
    }
}
