//! Artifact retrieval: read a local file or GET a URL, then optionally verify
//! the SHA-512 of the bytes. Nothing here writes to disk.

mod http;

pub use http::{CurlOptions, CurlTransport};

use crate::checksum::{self, Digest};
use crate::error::InstallError;
use crate::source::Source;
use url::Url;

/// Remote byte source. `CurlTransport` in production; tests may substitute.
pub trait Transport {
    /// GET `url` and return the full body. Non-2xx, transport failures and
    /// timeouts are all `RemoteFetchError`.
    fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
        (**self).get(url)
    }
}

/// Retrieves artifact bytes from a [`Source`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactFetcher<T = CurlTransport> {
    transport: T,
}

impl<T: Transport> ArtifactFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Fetch `source`; when `expected` is given the bytes must hash to it or
    /// they are discarded with `ChecksumMismatch`.
    pub fn fetch(&self, source: &Source, expected: Option<&Digest>) -> Result<Vec<u8>, InstallError> {
        let bytes = match source {
            Source::Path(path) => {
                std::fs::read(path).map_err(|e| InstallError::LocalReadError {
                    path: path.clone(),
                    source: e,
                })?
            }
            Source::Url(url) => self.transport.get(url)?,
        };
        tracing::debug!(%source, bytes = bytes.len(), "fetched artifact");

        if let Some(expected) = expected {
            checksum::verify(&bytes, expected)?;
            tracing::debug!(%source, "checksum verified");
        }
        Ok(bytes)
    }

    /// GET a URL with no verification (manifest and signature documents).
    pub fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
        self.transport.get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    struct Unreachable;

    impl Transport for Unreachable {
        fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
            Err(InstallError::RemoteFetchError {
                url: url.to_string(),
                reason: "connection refused".into(),
            })
        }
    }

    #[test]
    fn reads_local_file_without_checksum() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"#!/usr/bin/env escript\n").unwrap();
        f.flush().unwrap();
        let fetcher = ArtifactFetcher::new(Unreachable);
        let bytes = fetcher
            .fetch(&Source::Path(f.path().to_path_buf()), None)
            .unwrap();
        assert_eq!(bytes, b"#!/usr/bin/env escript\n");
    }

    #[test]
    fn missing_local_file_is_local_read_error() {
        let fetcher = ArtifactFetcher::new(Unreachable);
        let err = fetcher
            .fetch(&Source::Path(PathBuf::from("/nonexistent/rebar3")), None)
            .unwrap_err();
        match err {
            InstallError::LocalReadError { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/rebar3"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected LocalReadError, got {other:?}"),
        }
    }

    #[test]
    fn checksum_mismatch_on_local_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"payload").unwrap();
        f.flush().unwrap();
        let fetcher = ArtifactFetcher::new(Unreachable);
        let wrong = Digest::of(b"other payload");
        let err = fetcher
            .fetch(&Source::Path(f.path().to_path_buf()), Some(&wrong))
            .unwrap_err();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));

        let right = Digest::of(b"payload");
        let ok = fetcher
            .fetch(&Source::Path(f.path().to_path_buf()), Some(&right))
            .unwrap();
        assert_eq!(ok, b"payload");
    }

    #[test]
    fn transport_failure_propagates() {
        let fetcher = ArtifactFetcher::new(Unreachable);
        let url = Url::parse("https://repo.example/rebar").unwrap();
        let err = fetcher.fetch(&Source::Url(url), None).unwrap_err();
        assert!(matches!(err, InstallError::RemoteFetchError { .. }));
    }
}
