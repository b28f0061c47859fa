use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for the completion script.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write a completion script for `bl` to stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    generate(shell, command, "bl", &mut std::io::stdout());
    Ok(())
}
