//! Output layer shared by every `bl` command.
//!
//! Results go to stdout in one of three modes; errors and toasts go to
//! stderr so stdout stays parseable.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `BUGLENSE_FORMAT` env var: `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY, [`OutputMode::Text`] if piped.

use buglense_core::error::ApiError;
use buglense_core::store::{Toast, ToastKind};
use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

pub const PRETTY_RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Left-aligned key/value line for human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Labelled sections for people.
    Pretty,
    /// Tab-separated rows for scripts and pipes.
    Text,
    /// Stable JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }
    if json_flag {
        return OutputMode::Json;
    }
    match format_env.map(str::to_lowercase).as_deref() {
        Some("json") => OutputMode::Json,
        Some("text") => OutputMode::Text,
        Some("pretty") => OutputMode::Pretty,
        _ if is_tty => OutputMode::Pretty,
        _ => OutputMode::Text,
    }
}

pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("BUGLENSE_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// A result type that can be shown in every output mode.
///
/// JSON output is the value's `Serialize` form; `render_table` writes one
/// tab-separated row in the column order of `table_headers`.
pub trait Renderable: Serialize {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

pub fn write_item<R: Renderable>(w: &mut dyn Write, item: &R, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => item.render_human(w),
        OutputMode::Text => item.render_table(w),
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, item)?;
            writeln!(w)
        }
    }
}

pub fn write_list<R: Renderable>(
    w: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            if items.is_empty() {
                writeln!(w, "(none)")?;
            }
            for item in items {
                item.render_human(w)?;
                writeln!(w)?;
            }
        }
        OutputMode::Text => {
            if !items.is_empty() && !R::table_headers().is_empty() {
                writeln!(w, "{}", R::table_headers().join("\t"))?;
            }
            for item in items {
                item.render_table(w)?;
            }
        }
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, items)?;
            writeln!(w)?;
        }
    }
    Ok(())
}

pub fn render_item<R: Renderable>(item: &R, mode: OutputMode) -> io::Result<()> {
    write_item(&mut io::stdout().lock(), item, mode)
}

pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> io::Result<()> {
    write_list(&mut io::stdout().lock(), items, mode)
}

/// Render a serializable value; pretty and text share `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&ApiError> for CliError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

pub fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, &serde_json::json!({ "error": error }))?;
            writeln!(w)
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(suggestion) = &error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
            Ok(())
        }
    }
}

pub fn render_error(mode: OutputMode, error: &CliError) -> io::Result<()> {
    write_error(&mut io::stderr().lock(), mode, error)
}

const fn toast_marker(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "✓",
        ToastKind::Error => "✗",
        ToastKind::Info => "•",
        ToastKind::Warning => "!",
    }
}

pub fn write_toasts<'a>(
    w: &mut dyn Write,
    mode: OutputMode,
    toasts: impl IntoIterator<Item = &'a Toast>,
) -> io::Result<()> {
    for toast in toasts {
        if mode.is_json() {
            serde_json::to_writer(&mut *w, &serde_json::json!({ "toast": toast }))?;
            writeln!(w)?;
            continue;
        }
        let marker = toast_marker(toast.kind);
        match &toast.message {
            Some(message) => writeln!(w, "{marker} {}: {message}", toast.title)?,
            None => writeln!(w, "{marker} {}", toast.title)?,
        }
    }
    Ok(())
}

/// Show live toasts on stderr.
pub fn render_toasts<'a>(
    mode: OutputMode,
    toasts: impl IntoIterator<Item = &'a Toast>,
) -> io::Result<()> {
    write_toasts(&mut io::stderr().lock(), mode, toasts)
}
