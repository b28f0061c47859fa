//! `bl project`: list, inspect and manage projects.

use super::{api_failure, ensure_fetched, toast_success};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render, render_item, render_list,
};
use buglense_core::App;
use buglense_core::model::{Project, ProjectDraft, ProjectPatch};
use buglense_core::store::NewToast;
use clap::Subcommand;
use serde_json::json;
use std::io::{self, Write};

impl Renderable for Project {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("{} ({})", self.name, self.key))?;
        pretty_kv(w, "ID", &self.id)?;
        pretty_kv(w, "Team", &self.team_id)?;
        if let Some(description) = &self.description {
            pretty_kv(w, "About", description)?;
        }
        let updated = self.updated_at.format("%Y-%m-%d %H:%M");
        pretty_kv(w, "Updated", updated.to_string())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            self.id, self.key, self.name, self.team_id
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "KEY", "NAME", "TEAM"]
    }
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List every project.
    List,
    /// Show one project by id.
    Show { id: String },
    /// Show one project by its short key.
    Key { key: String },
    /// Create a project.
    Create {
        #[arg(long)]
        name: String,
        /// Short uppercase handle, e.g. WEB.
        #[arg(long)]
        key: String,
        #[arg(long)]
        description: Option<String>,
        /// Owning team id.
        #[arg(long)]
        team: String,
    },
    /// Change a project's fields.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },
    /// Delete a project.
    Delete { id: String },
}

pub fn run_project(
    app: &mut App,
    command: ProjectCommand,
    output: OutputMode,
) -> anyhow::Result<()> {
    match command {
        ProjectCommand::List => {
            app.projects.fetch_projects();
            ensure_fetched(&mut app.ui, "Could not load projects", app.projects.error())?;
            render_list(app.projects.projects(), output)?;
        }
        ProjectCommand::Show { id } => {
            app.projects.fetch_project(&id);
            show_selected(app, output)?;
        }
        ProjectCommand::Key { key } => {
            app.projects.fetch_project_by_key(&key.to_uppercase());
            show_selected(app, output)?;
        }
        ProjectCommand::Create {
            name,
            key,
            description,
            team,
        } => {
            let draft = ProjectDraft {
                name,
                key: key.to_uppercase(),
                description,
                team_id: team,
            };
            let project = app
                .projects
                .create_project(&draft)
                .map_err(|err| api_failure(&mut app.ui, "Could not create project", &err))?;
            toast_success(&mut app.ui, "Project created", project.key.clone());
            render_item(&project, output)?;
        }
        ProjectCommand::Update {
            id,
            name,
            key,
            description,
            team,
        } => {
            let patch = ProjectPatch {
                name,
                key: key.map(|k| k.to_uppercase()),
                description,
                team_id: team,
            };
            let project = app
                .projects
                .update_project(&id, &patch)
                .map_err(|err| api_failure(&mut app.ui, "Could not update project", &err))?;
            app.ui.add_toast(NewToast::success("Project updated"));
            render_item(&project, output)?;
        }
        ProjectCommand::Delete { id } => {
            app.projects
                .delete_project(&id)
                .map_err(|err| api_failure(&mut app.ui, "Could not delete project", &err))?;
            toast_success(&mut app.ui, "Project deleted", id.clone());
            render(output, &json!({ "deleted": id }), |_, _| Ok(()))?;
        }
    }
    Ok(())
}

fn show_selected(app: &mut App, output: OutputMode) -> anyhow::Result<()> {
    ensure_fetched(&mut app.ui, "Could not load project", app.projects.error())?;
    if let Some(project) = app.projects.selected() {
        render_item(project, output)?;
    }
    Ok(())
}
