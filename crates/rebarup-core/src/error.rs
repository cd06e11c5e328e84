//! Error taxonomy for the resolve → fetch → verify → install pipeline.
//!
//! None of these are retried. `RemoteFetchError` and `ChecksumMismatch` reach the
//! user wrapped in [`InstallError::Remediation`], which carries the manual
//! install instructions.

use crate::checksum::Digest;
use crate::tool::ToolIdentifier;
use std::error::Error as _;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Name of the binary used in the suggested follow-up command.
pub const COMMAND_NAME: &str = "rebarup";

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Source is neither an existing-looking path nor an http(s) URL.
    #[error("Expected {0:?} to be a URL or a local file path")]
    InvalidSource(String),

    /// `--sha512` value is not a well-formed digest, or was given without a source.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("could not read {}", path.display())]
    LocalReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Transport failure, timeout, or non-2xx response.
    #[error("request to {url} failed: {reason}")]
    RemoteFetchError { url: String, reason: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: Digest, actual: Digest },

    #[error("could not verify manifest {url}: {reason}")]
    ManifestTrustError { url: String, reason: String },

    #[error("no matching version of {tool} found in {url}")]
    NoMatchingVersion { tool: ToolIdentifier, url: String },

    #[error(
        "could not determine the host version to resolve {tool} for; \
         set host_version in the config or REBARUP_HOST_VERSION"
    )]
    UnknownHostVersion { tool: ToolIdentifier },

    #[error("failed to install {}", path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A fetch or verify failure with instructions for finishing the install by hand.
    #[error(
        "{cause}\n\nCould not fetch {tool} at:\n\n    {attempted}\n\n\
         Please download the file above manually to your current directory and run:\n\n    \
         {} {tool} ./{tool}\n",
        COMMAND_NAME
    )]
    Remediation {
        tool: ToolIdentifier,
        attempted: String,
        cause: Box<InstallError>,
    },

    /// More than one independent tool pipeline failed.
    #[error("{}", format_multiple(.0))]
    Multiple(Vec<InstallError>),

    #[error("failed to load configuration")]
    Config(#[source] anyhow::Error),
}

impl InstallError {
    /// Wrap fetch/verify failures in the remediation message; pass everything else through.
    pub fn with_remediation(self, tool: ToolIdentifier, attempted: &str) -> Self {
        match self {
            InstallError::RemoteFetchError { .. } | InstallError::ChecksumMismatch { .. } => {
                InstallError::Remediation {
                    tool,
                    attempted: attempted.to_string(),
                    cause: Box::new(self),
                }
            }
            other => other,
        }
    }

    /// Collapse per-tool failures: one error stays as is, several become `Multiple`.
    pub fn collect(mut errors: Vec<InstallError>) -> Option<InstallError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(InstallError::Multiple(errors)),
        }
    }
}

/// Render an error with its source chain, `a: b: c`.
pub fn display_chain(err: &InstallError) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        let _ = write!(out, ": {e}");
        cur = e.source();
    }
    out
}

fn format_multiple(errors: &[InstallError]) -> String {
    errors
        .iter()
        .map(display_chain)
        .collect::<Vec<_>>()
        .join("\n")
}
