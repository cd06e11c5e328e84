//! `rebarup [TOOL [SOURCE]]` – resolve, fetch, verify and install.

use anyhow::Result;
use rebarup_core::config;
use rebarup_core::{InstallOptions, InstallOrchestrator, InstallOutcome};

use crate::cli::prompt::TerminalShell;
use crate::cli::Cli;

pub fn run_install(cli: Cli) -> Result<()> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let orchestrator = InstallOrchestrator::from_config(&cfg, TerminalShell)?;
    tracing::debug!(home = %orchestrator.installer().tool_home().display(), "tool home");

    let opts = InstallOptions {
        force: cli.force,
        sha512: cli.sha512,
        if_missing: cli.if_missing,
    };
    let outcomes = orchestrator.run(cli.tool.map(Into::into), cli.source.as_deref(), &opts)?;
    for outcome in &outcomes {
        if let InstallOutcome::Declined(path) = outcome {
            println!("Skipped {}", path.display());
        }
    }
    Ok(())
}
