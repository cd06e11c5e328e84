//! Per-invocation inputs and outcomes.

use crate::checksum::Digest;
use crate::source::Source;
use crate::tool::ToolIdentifier;
use std::path::PathBuf;

/// Flags as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Skip the overwrite confirmation.
    pub force: bool,
    /// Expected SHA-512 (hex) of an explicit source.
    pub sha512: Option<String>,
    /// Do nothing if the tool is already installed.
    pub if_missing: bool,
}

/// One tool's install, built once and consumed by the pipeline.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub tool: ToolIdentifier,
    pub source: Source,
    pub expected_checksum: Option<Digest>,
    pub force: bool,
}

/// How a tool's pipeline ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Artifact written to this absolute path.
    Installed(PathBuf),
    /// The user declined to overwrite this path; nothing was fetched.
    Declined(PathBuf),
    /// `--if-missing` and this path already exists; nothing was fetched.
    AlreadyPresent(PathBuf),
}

impl InstallOutcome {
    pub fn path(&self) -> &std::path::Path {
        match self {
            InstallOutcome::Installed(p)
            | InstallOutcome::Declined(p)
            | InstallOutcome::AlreadyPresent(p) => p,
        }
    }
}

/// Pipeline stage, for logging where a tool's install stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Resolving,
    Fetching,
    Verifying,
    Installing,
    Done,
    Aborted,
}
