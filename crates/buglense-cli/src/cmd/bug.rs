//! `bl bug`: list, filter, report and triage bugs.

use super::{api_failure, ensure_fetched, invalid_input, toast_success};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render, render_item, render_list,
};
use buglense_core::App;
use buglense_core::model::{Bug, BugDraft, BugPatch, BugPriority, BugStatus};
use buglense_core::store::{BugFilter, FilterError, NewToast};
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;

impl Renderable for Bug {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("{}  {}", self.id, self.title))?;
        pretty_kv(w, "Status", self.status.as_str())?;
        pretty_kv(w, "Priority", self.priority.as_str())?;
        pretty_kv(w, "Project", &self.project_id)?;
        pretty_kv(w, "Reporter", &self.reporter_id)?;
        let assignee = self.assignee_id.as_deref().unwrap_or("unassigned");
        pretty_kv(w, "Assignee", assignee)?;
        let updated = self.updated_at.format("%Y-%m-%d %H:%M");
        pretty_kv(w, "Updated", updated.to_string())?;
        if !self.description.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", self.description)?;
        }
        Ok(())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            self.id,
            self.status,
            self.priority,
            self.assignee_id.as_deref().unwrap_or("-"),
            self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "STATUS", "PRIORITY", "ASSIGNEE", "TITLE"]
    }
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only bugs in this project.
    #[arg(long)]
    pub project: Option<String>,

    /// Open, "In Progress", Resolved or Closed.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Low, Medium, High or Critical.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Assignee user id.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Case-insensitive text in title or description.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum BugCommand {
    /// List bugs, optionally filtered.
    List(ListArgs),
    /// Show one bug.
    Show { id: String },
    /// Report a new bug.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Project id.
        #[arg(long)]
        project: String,
        #[arg(long)]
        status: Option<BugStatus>,
        #[arg(long)]
        priority: Option<BugPriority>,
        #[arg(long)]
        assignee: Option<String>,
        /// Attach a file; repeat for several.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
    /// Change a bug's fields.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<BugStatus>,
        #[arg(long)]
        priority: Option<BugPriority>,
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Move a bug to another status.
    Status { id: String, status: BugStatus },
    /// Assign a bug. Omit USER to unassign.
    Assign { id: String, user: Option<String> },
    /// Delete a bug.
    Delete { id: String },
    /// Count bugs by status and priority.
    Stats {
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Count {
    value: &'static str,
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BugStats {
    total: usize,
    by_status: Vec<Count>,
    by_priority: Vec<Count>,
}

impl ListArgs {
    fn filters(&self) -> Result<Vec<BugFilter>, FilterError> {
        [
            ("status", self.status.as_deref()),
            ("priority", self.priority.as_deref()),
            ("assignee", self.assignee.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(name, value)| BugFilter::parse(name, value))
        .collect()
    }
}

pub fn run_bug(app: &mut App, command: BugCommand, output: OutputMode) -> anyhow::Result<()> {
    match command {
        BugCommand::List(args) => run_list(app, &args, output),
        BugCommand::Show { id } => {
            app.bugs.fetch_bug(&id);
            ensure_fetched(&mut app.ui, "Could not load bug", app.bugs.error())?;
            if let Some(bug) = app.bugs.selected() {
                render_item(bug, output)?;
            }
            Ok(())
        }
        BugCommand::Create {
            title,
            description,
            project,
            status,
            priority,
            assignee,
            attachments,
        } => {
            let draft = BugDraft {
                title,
                description,
                status,
                priority,
                project_id: project,
                assignee_id: assignee,
            };
            let bug = app
                .bugs
                .report_bug(&draft, &attachments)
                .map_err(|err| api_failure(&mut app.ui, "Could not report bug", &err))?;
            toast_success(&mut app.ui, "Bug reported", bug.id.clone());
            render_item(&bug, output)?;
            Ok(())
        }
        BugCommand::Update {
            id,
            title,
            description,
            status,
            priority,
            assignee,
        } => {
            let patch = BugPatch {
                title,
                description,
                status,
                priority,
                assignee_id: assignee,
            };
            if patch.is_empty() {
                let message = "nothing to update; pass at least one field";
                return Err(invalid_input(&mut app.ui, message));
            }
            let bug = app
                .bugs
                .update_bug(&id, &patch)
                .map_err(|err| api_failure(&mut app.ui, "Could not update bug", &err))?;
            app.ui.add_toast(NewToast::success("Bug updated"));
            render_item(&bug, output)?;
            Ok(())
        }
        BugCommand::Status { id, status } => {
            let bug = app
                .bugs
                .update_bug_status(&id, status)
                .map_err(|err| api_failure(&mut app.ui, "Could not change status", &err))?;
            toast_success(&mut app.ui, "Status changed", status.as_str());
            render_item(&bug, output)?;
            Ok(())
        }
        BugCommand::Assign { id, user } => {
            let bug = app
                .bugs
                .assign_bug(&id, user.as_deref())
                .map_err(|err| api_failure(&mut app.ui, "Could not assign bug", &err))?;
            app.ui.add_toast(match &user {
                Some(user) => NewToast::success("Bug assigned").with_message(user),
                None => NewToast::success("Bug unassigned"),
            });
            render_item(&bug, output)?;
            Ok(())
        }
        BugCommand::Delete { id } => {
            app.bugs
                .delete_bug(&id)
                .map_err(|err| api_failure(&mut app.ui, "Could not delete bug", &err))?;
            toast_success(&mut app.ui, "Bug deleted", id.clone());
            render(output, &json!({ "deleted": id }), |_, _| Ok(()))
        }
        BugCommand::Stats { project } => run_stats(app, project.as_deref(), output),
    }
}

fn fetch(app: &mut App, project: Option<&str>) -> anyhow::Result<()> {
    match project {
        Some(project) => app.bugs.fetch_bugs_by_project(project),
        None => app.bugs.fetch_bugs(),
    }
    ensure_fetched(&mut app.ui, "Could not load bugs", app.bugs.error())
}

fn run_list(app: &mut App, args: &ListArgs, output: OutputMode) -> anyhow::Result<()> {
    let filters = args
        .filters()
        .map_err(|err| invalid_input(&mut app.ui, err.to_string()))?;

    fetch(app, args.project.as_deref())?;
    for filter in filters {
        app.bugs.set_filter(filter);
    }
    if let Some(term) = &args.search {
        app.bugs.set_search_term(term.as_str());
    }
    render_list(app.bugs.filtered_bugs(), output)?;
    Ok(())
}

fn run_stats(app: &mut App, project: Option<&str>, output: OutputMode) -> anyhow::Result<()> {
    fetch(app, project)?;
    let stats = BugStats {
        total: app.bugs.bugs().len(),
        by_status: app
            .bugs
            .counts_by_status()
            .into_iter()
            .map(|(status, count)| Count {
                value: status.as_str(),
                count,
            })
            .collect(),
        by_priority: app
            .bugs
            .counts_by_priority()
            .into_iter()
            .map(|(priority, count)| Count {
                value: priority.as_str(),
                count,
            })
            .collect(),
    };
    render(output, &stats, |stats, w| {
        pretty_section(w, &format!("{} bugs", stats.total))?;
        for row in stats.by_status.iter().chain(&stats.by_priority) {
            pretty_kv(w, row.value, row.count.to_string())?;
        }
        Ok(())
    })
}
