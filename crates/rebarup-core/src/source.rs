//! Classify a user-supplied artifact source as a local path or a remote URL.

use crate::error::InstallError;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where artifact bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(Url),
}

impl Source {
    /// `http://` / `https://` strings become URLs, other `scheme://` strings are
    /// rejected, anything else non-empty is a filesystem path. Whether the path
    /// exists is checked when it is read.
    pub fn parse(raw: &str) -> Result<Self, InstallError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InstallError::InvalidSource(raw.to_string()));
        }
        if trimmed.contains("://") {
            let url = Url::parse(trimmed).map_err(|_| InstallError::InvalidSource(raw.to_string()))?;
            return match url.scheme() {
                "http" | "https" if url.host().is_some() => Ok(Source::Url(url)),
                _ => Err(InstallError::InvalidSource(raw.to_string())),
            };
        }
        Ok(Source::Path(PathBuf::from(trimmed)))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => f.write_str(u.as_str()),
        }
    }
}
