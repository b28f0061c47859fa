//! `bl team`: list, inspect and manage teams.

use super::{api_failure, ensure_fetched, invalid_input, toast_success};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render, render_item, render_list,
};
use buglense_core::App;
use buglense_core::model::{Team, TeamDraft, TeamPatch};
use buglense_core::store::NewToast;
use clap::Subcommand;
use serde_json::json;
use std::io::{self, Write};

impl Renderable for Team {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &self.name)?;
        pretty_kv(w, "ID", &self.id)?;
        pretty_kv(w, "Owner", &self.owner_id)?;
        pretty_kv(w, "Members", self.members.len().to_string())?;
        for member in &self.members {
            writeln!(
                w,
                "  {:<10} {} <{}>",
                member.role, member.user.name, member.user.email
            )?;
        }
        Ok(())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let members = self.members.len();
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            self.id, self.name, self.owner_id, members
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "OWNER", "MEMBERS"]
    }
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// List every team.
    List,
    /// Show one team with its members.
    Show { id: String },
    /// Create a team owned by you.
    Create {
        #[arg(long)]
        name: String,
    },
    /// Rename a team or hand it to another owner.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// New owner user id.
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a team.
    Delete { id: String },
}

pub fn run_team(app: &mut App, command: TeamCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        TeamCommand::List => {
            app.teams.fetch_teams();
            ensure_fetched(&mut app.ui, "Could not load teams", app.teams.error())?;
            render_list(app.teams.teams(), output)?;
        }
        TeamCommand::Show { id } => {
            app.teams.fetch_team(&id);
            ensure_fetched(&mut app.ui, "Could not load team", app.teams.error())?;
            if let Some(team) = app.teams.selected() {
                render_item(team, output)?;
            }
        }
        TeamCommand::Create { name } => {
            let team = app
                .teams
                .create_team(&TeamDraft { name })
                .map_err(|err| api_failure(&mut app.ui, "Could not create team", &err))?;
            toast_success(&mut app.ui, "Team created", team.name.clone());
            render_item(&team, output)?;
        }
        TeamCommand::Update { id, name, owner } => {
            let patch = TeamPatch {
                name,
                owner_id: owner,
            };
            if patch == TeamPatch::default() {
                let message = "nothing to update; pass --name or --owner";
                return Err(invalid_input(&mut app.ui, message));
            }
            let team = app
                .teams
                .update_team(&id, &patch)
                .map_err(|err| api_failure(&mut app.ui, "Could not update team", &err))?;
            app.ui.add_toast(NewToast::success("Team updated"));
            render_item(&team, output)?;
        }
        TeamCommand::Delete { id } => {
            app.teams
                .delete_team(&id)
                .map_err(|err| api_failure(&mut app.ui, "Could not delete team", &err))?;
            toast_success(&mut app.ui, "Team deleted", id.clone());
            render(output, &json!({ "deleted": id }), |_, _| Ok(()))?;
        }
    }
    Ok(())
}
