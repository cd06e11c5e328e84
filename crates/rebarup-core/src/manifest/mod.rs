//! Signed version manifests: fetch, authenticate, parse, pick a release.
//!
//! A manifest lives at a tool-specific URL with its detached signature at the
//! same URL plus [`SIGNATURE_SUFFIX`]. Nothing is parsed until the signature
//! checks out against one of the trusted keys. The signature covers the bytes
//! as served, so a gzipped manifest is inflated only after it verifies.

mod parse;
mod pin;
mod signature;

pub use parse::{parse_entries, select_latest, Release, VersionEntry};
pub use pin::MirrorKey;
pub use signature::{parse_public_key, TrustedKeys};

use crate::error::InstallError;
use crate::fetch::{ArtifactFetcher, Transport};
use crate::tool::ToolIdentifier;
use semver::Version;
use url::Url;

/// Appended to the manifest URL to locate its signature.
pub const SIGNATURE_SUFFIX: &str = ".signed";

/// Resolves a tool's manifest to the newest release with a build for `host_version`.
pub struct ManifestResolver<'a, T> {
    fetcher: &'a ArtifactFetcher<T>,
    keys: &'a TrustedKeys,
    host_version: Version,
}

impl<'a, T: Transport> ManifestResolver<'a, T> {
    pub fn new(fetcher: &'a ArtifactFetcher<T>, keys: &'a TrustedKeys, host_version: Version) -> Self {
        Self {
            fetcher,
            keys,
            host_version,
        }
    }

    pub fn resolve(&self, tool: ToolIdentifier, list_url: &str) -> Result<Release, InstallError> {
        let trust = |reason: String| InstallError::ManifestTrustError {
            url: list_url.to_string(),
            reason,
        };
        let url = Url::parse(list_url).map_err(|e| InstallError::RemoteFetchError {
            url: list_url.to_string(),
            reason: format!("invalid manifest URL: {e}"),
        })?;
        let sig_url = Url::parse(&format!("{list_url}{SIGNATURE_SUFFIX}"))
            .map_err(|e| trust(format!("invalid signature URL: {e}")))?;

        tracing::debug!(%tool, %url, "fetching manifest");
        let raw = self.fetcher.get(&url)?;
        let sig = self
            .fetcher
            .get(&sig_url)
            .map_err(|e| trust(format!("signature unavailable: {e}")))?;
        self.keys.verify(&raw, &sig).map_err(trust)?;
        tracing::debug!(%tool, "manifest signature verified");

        let doc = parse::decompress(&raw).map_err(|e| trust(format!("corrupt gzip: {e}")))?;
        let text = String::from_utf8_lossy(&doc);
        let entries = parse_entries(&text);
        tracing::debug!(%tool, rows = entries.len(), host = %self.host_version, "parsed manifest");

        let picked = select_latest(entries, &self.host_version).ok_or_else(|| {
            InstallError::NoMatchingVersion {
                tool,
                url: list_url.to_string(),
            }
        })?;
        tracing::info!(%tool, version = %picked.version, host_build = %picked.host_build, "resolved release");
        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::signature::tests::{sign_b64, MIRROR_KEY, MIRROR_PUB, ROGUE_PUB};
    use super::*;
    use crate::checksum::Digest;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;

    /// Serves fixed bodies by URL and records what was requested.
    #[derive(Default)]
    struct MapTransport {
        bodies: HashMap<String, Vec<u8>>,
        requested: RefCell<Vec<String>>,
    }

    impl MapTransport {
        fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.bodies.insert(url.to_string(), body.into());
            self
        }
    }

    impl Transport for MapTransport {
        fn get(&self, url: &Url) -> Result<Vec<u8>, InstallError> {
            self.requested.borrow_mut().push(url.to_string());
            self.bodies
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| InstallError::RemoteFetchError {
                    url: url.to_string(),
                    reason: "HTTP 404".into(),
                })
        }
    }

    const LIST: &str = "https://mirror.example/installs/rebar3-1.x.csv";

    fn signed(manifest: &[u8]) -> MapTransport {
        MapTransport::default()
            .with(LIST, manifest)
            .with(&format!("{LIST}.signed"), sign_b64(MIRROR_KEY, manifest))
    }

    fn keys(public_pem: &str) -> TrustedKeys {
        TrustedKeys::from_pem(&[public_pem]).unwrap()
    }

    #[test]
    fn resolves_newest_release() {
        let manifest = format!(
            "1.0.0,{},1.0.0\n2.0.0,{},1.0.0\n",
            Digest::of(b"A"),
            Digest::of(b"B")
        );
        let fetcher = ArtifactFetcher::new(signed(manifest.as_bytes()));
        let keys = keys(MIRROR_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 15, 0));
        let release = resolver.resolve(ToolIdentifier::Rebar3, LIST).unwrap();
        assert_eq!(release.version, Version::new(2, 0, 0));
        assert_eq!(release.checksum, Digest::of(b"B"));
        assert_eq!(release.host_build, Version::new(1, 0, 0));
    }

    #[test]
    fn gzipped_manifest_resolves_like_plain_text() {
        let manifest = format!("3.22.1,{},1.14.0\n", Digest::of(b"r3"));
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(manifest.as_bytes()).unwrap();
        let gz = enc.finish().unwrap();

        let keys = keys(MIRROR_PUB);
        let host = Version::new(1, 15, 0);
        let plain = ArtifactFetcher::new(signed(manifest.as_bytes()));
        let zipped = ArtifactFetcher::new(signed(&gz));
        let a = ManifestResolver::new(&plain, &keys, host.clone())
            .resolve(ToolIdentifier::Rebar3, LIST)
            .unwrap();
        let b = ManifestResolver::new(&zipped, &keys, host)
            .resolve(ToolIdentifier::Rebar3, LIST)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn signature_over_inflated_text_does_not_cover_gzip() {
        let manifest = format!("3.22.1,{}\n", Digest::of(b"r3"));
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(manifest.as_bytes()).unwrap();
        let gz = enc.finish().unwrap();
        let transport = MapTransport::default()
            .with(LIST, gz)
            .with(&format!("{LIST}.signed"), sign_b64(MIRROR_KEY, manifest.as_bytes()));

        let fetcher = ArtifactFetcher::new(transport);
        let keys = keys(MIRROR_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 15, 0));
        let err = resolver.resolve(ToolIdentifier::Rebar3, LIST).unwrap_err();
        assert!(matches!(err, InstallError::ManifestTrustError { .. }));
    }

    #[test]
    fn untrusted_signature_is_trust_error() {
        let manifest = format!("1.0.0,{}\n", Digest::of(b"A"));
        let fetcher = ArtifactFetcher::new(signed(manifest.as_bytes()));
        let keys = keys(ROGUE_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 0, 0));
        let err = resolver.resolve(ToolIdentifier::Rebar3, LIST).unwrap_err();
        assert!(matches!(err, InstallError::ManifestTrustError { .. }));
    }

    #[test]
    fn missing_signature_is_trust_error() {
        let manifest = format!("1.0.0,{}\n", Digest::of(b"A"));
        let fetcher = ArtifactFetcher::new(MapTransport::default().with(LIST, manifest));
        let keys = keys(MIRROR_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 0, 0));
        let err = resolver.resolve(ToolIdentifier::Rebar, LIST).unwrap_err();
        assert!(matches!(err, InstallError::ManifestTrustError { .. }));
    }

    #[test]
    fn empty_manifest_is_no_matching_version() {
        let fetcher = ArtifactFetcher::new(signed(b""));
        let keys = keys(MIRROR_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 0, 0));
        let err = resolver.resolve(ToolIdentifier::Rebar3, LIST).unwrap_err();
        assert!(matches!(
            err,
            InstallError::NoMatchingVersion {
                tool: ToolIdentifier::Rebar3,
                ..
            }
        ));
    }

    #[test]
    fn unreachable_manifest_is_remote_error() {
        let fetcher = ArtifactFetcher::new(MapTransport::default());
        let keys = keys(MIRROR_PUB);
        let resolver = ManifestResolver::new(&fetcher, &keys, Version::new(1, 0, 0));
        let err = resolver.resolve(ToolIdentifier::Rebar3, LIST).unwrap_err();
        assert!(matches!(err, InstallError::RemoteFetchError { .. }));
    }
}
