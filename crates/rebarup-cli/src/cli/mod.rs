//! CLI for rebarup.

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rebarup_core::ToolIdentifier;

use commands::{run_completions, run_install, run_man};

/// Install rebar and rebar3 into the local tool home.
///
/// With no arguments both tools are resolved from the signed mirror manifest and
/// installed. `rebarup rebar3 ./rebar3` installs a file you downloaded yourself.
#[derive(Debug, Parser)]
#[command(name = "rebarup", version)]
#[command(about = "Install rebar and rebar3 into the local tool home", long_about = None)]
pub struct Cli {
    /// Tool to install. Omit to install both from the mirror.
    #[arg(value_enum)]
    pub tool: Option<ToolArg>,

    /// Local path or http(s) URL to install the tool from instead of the mirror.
    #[arg(requires = "tool")]
    pub source: Option<String>,

    /// Overwrite an existing install without asking.
    #[arg(long)]
    pub force: bool,

    /// Expected SHA-512 (hex) of the file at SOURCE.
    #[arg(long, value_name = "DIGEST", requires = "source")]
    pub sha512: Option<String>,

    /// Do nothing if the tool is already installed.
    #[arg(long)]
    pub if_missing: bool,

    /// Print shell completions to stdout and exit.
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<clap_complete::Shell>,

    /// Print the man page (roff) to stdout and exit.
    #[arg(long, exclusive = true)]
    pub man: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolArg {
    Rebar,
    Rebar3,
}

impl From<ToolArg> for ToolIdentifier {
    fn from(t: ToolArg) -> Self {
        match t {
            ToolArg::Rebar => ToolIdentifier::Rebar,
            ToolArg::Rebar3 => ToolIdentifier::Rebar3,
        }
    }
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    pub fn run(self) -> Result<()> {
        if let Some(shell) = self.completions {
            return run_completions(shell);
        }
        if self.man {
            return run_man();
        }
        run_install(self)
    }
}

#[cfg(test)]
mod tests;
