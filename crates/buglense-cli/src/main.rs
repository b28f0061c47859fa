#![forbid(unsafe_code)]

mod cmd;
mod output;

use buglense_core::App;
use buglense_core::config::{Overrides, resolve_config};
use buglense_core::error::ErrorCode;
use buglense_core::persist;
use clap::{CommandFactory, Parser, Subcommand};
use cmd::CommandFailed;
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "bl",
    author,
    version,
    about = "buglense: bug tracker client",
    long_about = None
)]
struct Cli {
    /// API base URL (overrides BUGLENSE_API_URL and the config file).
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Directory for persisted session and UI state.
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Do not print toasts.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging on stderr (ignored when BUGLENSE_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            state_dir: self.state_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Session",
        about = "Sign in",
        after_help = "EXAMPLES:\n    bl login --email ada@example.com --password secret\n\n    # Keep the session longer\n    bl login --email ada@example.com --password secret --remember"
    )]
    Login(cmd::auth::LoginArgs),

    #[command(next_help_heading = "Session", about = "Create an account and sign in")]
    Register(cmd::auth::RegisterArgs),

    #[command(
        next_help_heading = "Session",
        about = "Sign out",
        long_about = "Sign out. Local session state is cleared even when the server cannot be reached."
    )]
    Logout,

    #[command(next_help_heading = "Session", about = "Show the signed-in user")]
    Whoami,

    #[command(
        next_help_heading = "Session",
        about = "Show or update your profile",
        after_help = "EXAMPLES:\n    bl profile\n\n    bl profile --name \"Ada L.\" --avatar https://example.com/ada.png"
    )]
    Profile(cmd::auth::ProfileArgs),

    #[command(next_help_heading = "Tracker", about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(
        next_help_heading = "Tracker",
        about = "Manage bugs",
        after_help = "EXAMPLES:\n    # Open high-priority bugs mentioning \"crash\"\n    bl bug list --status open --priority high --search crash\n\n    # Report a bug with a log file\n    bl bug create --project P1 --title \"Crash on save\" --attach crash.log\n\n    # Move to In Progress and assign\n    bl bug status B1 in-progress\n    bl bug assign B1 U2"
    )]
    Bug {
        #[command(subcommand)]
        command: cmd::bug::BugCommand,
    },

    #[command(next_help_heading = "Tracker", about = "Manage teams")]
    Team {
        #[command(subcommand)]
        command: cmd::team::TeamCommand,
    },

    #[command(
        next_help_heading = "Local",
        about = "Sidebar and theme preferences",
        after_help = "EXAMPLES:\n    bl ui theme dark\n    bl ui sidebar toggle"
    )]
    Ui {
        #[command(subcommand)]
        command: cmd::ui::UiCommand,
    },

    #[command(next_help_heading = "Local", about = "Generate shell completions")]
    Completions(cmd::completions::CompletionsArgs),
}

impl Commands {
    /// Commands that only make sense for a signed-in user.
    const fn needs_session(&self) -> bool {
        matches!(
            self,
            Self::Whoami
                | Self::Profile(_)
                | Self::Project { .. }
                | Self::Bug { .. }
                | Self::Team { .. }
        )
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BUGLENSE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "buglense_core=debug,buglense_cli=debug,info"
        } else {
            "buglense_cli=info,warn"
        })
    });

    let format = env::var("BUGLENSE_LOG_FORMAT").ok();

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_deref() {
        Some("json") => {
            let layer = fmt::layer().json().with_ansi(false);
            registry.with(layer.with_writer(std::io::stderr)).init();
        }
        _ => {
            let layer = fmt::layer().compact();
            registry.with(layer.with_writer(std::io::stderr)).init();
        }
    }
}

fn dispatch(app: &mut App, command: Commands, output: OutputMode) -> anyhow::Result<()> {
    if command.needs_session() {
        app.auth.refresh_user();
        cmd::require_session(app)?;
    }

    match command {
        Commands::Login(args) => cmd::auth::run_login(app, &args, output),
        Commands::Register(args) => cmd::auth::run_register(app, &args, output),
        Commands::Logout => cmd::auth::run_logout(app, output),
        Commands::Whoami => cmd::auth::run_whoami(app, output),
        Commands::Profile(args) => cmd::auth::run_profile(app, &args, output),
        Commands::Project { command } => cmd::project::run_project(app, command, output),
        Commands::Bug { command } => cmd::bug::run_bug(app, command, output),
        Commands::Team { command } => cmd::team::run_team(app, command, output),
        Commands::Ui { command } => cmd::ui::run_ui(app, command, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn report_failure(output: OutputMode, err: &anyhow::Error, toasts_shown: bool) {
    // A failure already shown as a toast only needs a structured copy in JSON mode.
    let cli_error = match err.downcast_ref::<CommandFailed>() {
        Some(_) if toasts_shown && !output.is_json() => return,
        Some(failed) => failed.to_cli_error(),
        None => CliError::new(format!("{err:#}")),
    };
    let _ = output::render_error(output, &cli_error);
}

fn coded_error(code: ErrorCode, err: &anyhow::Error) -> CliError {
    CliError {
        message: format!("{err:#}"),
        suggestion: code.hint().map(str::to_string),
        error_code: Some(code.code().to_string()),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output = cli.output_mode();
    let config = match resolve_config(&cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            let _ = output::render_error(output, &coded_error(ErrorCode::ConfigParseError, &err));
            return Err(err);
        }
    };
    debug!(api = %config.api.url, state_dir = %config.state_dir.display(), "resolved config");

    let mut app = App::bootstrap(&config);
    let result = dispatch(&mut app, cli.command, output);
    let saved = app.persist();

    if !cli.quiet {
        let _ = output::render_toasts(output, app.ui.toasts());
    }
    if let Err(err) = &result {
        report_failure(output, err, !cli.quiet);
    }
    if let Err(err) = &saved {
        let _ = output::render_error(output, &coded_error(persist::save_error_code(err), err));
    }
    result.and(saved)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("command failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
