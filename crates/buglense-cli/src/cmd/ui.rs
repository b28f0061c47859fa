//! `bl ui`: local layout preferences. These never touch the network.

use crate::output::{OutputMode, pretty_kv, render};
use buglense_core::App;
use buglense_core::store::{NewToast, PersistedUi, Theme};
use clap::{Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SidebarState {
    Open,
    Closed,
    Toggle,
}

#[derive(Subcommand, Debug)]
pub enum UiCommand {
    /// Show the current sidebar and theme settings.
    Show,
    /// Open, close or toggle the sidebar.
    Sidebar {
        #[arg(value_enum)]
        state: SidebarState,
    },
    /// Pick light, dark or system theme.
    Theme { theme: Theme },
}

pub fn run_ui(app: &mut App, command: UiCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        UiCommand::Show => {}
        UiCommand::Sidebar { state } => {
            match state {
                SidebarState::Open => app.ui.set_sidebar_open(true),
                SidebarState::Closed => app.ui.set_sidebar_open(false),
                SidebarState::Toggle => app.ui.toggle_sidebar(),
            }
            let label = sidebar_label(app.ui.sidebar_open());
            let toast = NewToast::info("Sidebar").with_message(label);
            app.ui.add_toast(toast.with_duration(2_000));
        }
        UiCommand::Theme { theme } => {
            app.ui.set_theme(theme);
            let toast = NewToast::info("Theme").with_message(theme.as_str());
            app.ui.add_toast(toast.with_duration(2_000));
        }
    }
    show(&app.ui.persisted(), output)
}

const fn sidebar_label(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

fn show(settings: &PersistedUi, output: OutputMode) -> anyhow::Result<()> {
    render(output, settings, |s, w| {
        pretty_kv(w, "Sidebar", sidebar_label(s.sidebar_open))?;
        pretty_kv(w, "Theme", s.theme.as_str())
    })
}
