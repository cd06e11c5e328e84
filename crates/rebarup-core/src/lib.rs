//! Resolve, fetch, verify and install the `rebar` / `rebar3` build tools into
//! a local tool home.

pub mod config;
pub mod logging;

pub mod checksum;
pub mod error;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod source;
pub mod storage;
pub mod tool;

pub use error::InstallError;
pub use install::{InstallOptions, InstallOrchestrator, InstallOutcome, Shell};
pub use tool::ToolIdentifier;
