//! CLI command handlers.

mod completions;
mod install;

pub use completions::{run_completions, run_man};
pub use install::run_install;
