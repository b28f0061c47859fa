//! Command handlers. Each one drives the stores on an [`App`], posts its
//! outcome as a toast, and writes results to stdout.

pub mod auth;
pub mod bug;
pub mod completions;
pub mod project;
pub mod team;
pub mod ui;

use crate::output::CliError;
use buglense_core::App;
use buglense_core::error::{ApiError, ErrorCode};
use buglense_core::model::User;
use buglense_core::store::{NewToast, UiStore};

/// A command failure already shown to the user as an error toast.
#[derive(Debug, thiserror::Error)]
#[error("{title}: {message}")]
pub struct CommandFailed {
    pub title: String,
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl CommandFailed {
    pub fn to_cli_error(&self) -> CliError {
        CliError {
            message: self.to_string(),
            suggestion: self.code.and_then(ErrorCode::hint).map(str::to_string),
            error_code: self.code.map(|code| code.code().to_string()),
        }
    }
}

/// Post an error toast for `err` and return the matching failure.
pub fn api_failure(ui: &mut UiStore, title: &str, err: &ApiError) -> anyhow::Error {
    ui.add_toast(NewToast::error(title).with_message(err.to_string()));
    CommandFailed {
        title: title.to_string(),
        message: err.to_string(),
        code: Some(err.code()),
    }
    .into()
}

/// Turn an error recorded by a `fetch_*` operation into a failure.
pub fn ensure_fetched(ui: &mut UiStore, title: &str, error: Option<&str>) -> anyhow::Result<()> {
    let Some(message) = error else {
        return Ok(());
    };
    ui.add_toast(NewToast::error(title).with_message(message));
    Err(CommandFailed {
        title: title.to_string(),
        message: message.to_string(),
        code: None,
    }
    .into())
}

/// Reject invalid command-line input with a warning toast.
pub fn invalid_input(ui: &mut UiStore, message: impl Into<String>) -> anyhow::Error {
    let message = message.into();
    let title = "Invalid input";
    ui.add_toast(NewToast::warning(title).with_message(message.clone()));
    CommandFailed {
        title: title.to_string(),
        message,
        code: Some(ErrorCode::InvalidEnumValue),
    }
    .into()
}

/// Post a success toast with a detail line.
pub fn toast_success(ui: &mut UiStore, title: &str, message: impl Into<String>) {
    ui.add_toast(NewToast::success(title).with_message(message));
}

/// Guard for commands that need a signed-in user.
pub fn require_session(app: &mut App) -> anyhow::Result<User> {
    match app.require_user() {
        Ok(user) => Ok(user.clone()),
        Err(err) => Err(api_failure(&mut app.ui, "Sign in required", &err)),
    }
}
