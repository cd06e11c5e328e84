//! The mirror's own signing key, fetched once and pinned on disk.
//!
//! The first default install downloads the key from the mirror, logs its
//! fingerprint and stores it as `<pin_dir>/<host>.pem`. Later runs read the
//! pinned copy and never refetch it, so a key served after the first contact
//! cannot replace it. Delete the file to re-pin.

use super::signature::{fingerprint, parse_public_key};
use crate::error::InstallError;
use crate::fetch::{ArtifactFetcher, Transport};
use rsa::RsaPublicKey;
use std::fs;
use std::io;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct MirrorKey {
    url: String,
    pin_dir: PathBuf,
}

impl MirrorKey {
    pub fn new(url: impl Into<String>, pin_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            pin_dir: pin_dir.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn trust_err(&self, reason: String) -> InstallError {
        InstallError::ManifestTrustError {
            url: self.url.clone(),
            reason,
        }
    }

    /// `<pin_dir>/<host>.pem`, with `-<port>` when the URL names one.
    pub fn pin_path(&self) -> Result<PathBuf, InstallError> {
        let url = Url::parse(&self.url)
            .map_err(|e| self.trust_err(format!("invalid public key URL: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| self.trust_err("public key URL has no host".to_string()))?;
        let name = match url.port() {
            Some(port) => format!("{host}-{port}.pem"),
            None => format!("{host}.pem"),
        };
        Ok(self.pin_dir.join(name))
    }

    /// The pinned key, fetching and pinning it first if needed.
    pub fn load<T: Transport>(&self, fetcher: &ArtifactFetcher<T>) -> Result<RsaPublicKey, InstallError> {
        let pin = self.pin_path()?;
        match fs::read_to_string(&pin) {
            Ok(pem) => {
                return parse_public_key(&pem)
                    .map_err(|e| self.trust_err(format!("pinned key {}: {e}", pin.display())));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(InstallError::LocalReadError { path: pin, source }),
        }

        let url = Url::parse(&self.url)
            .map_err(|e| self.trust_err(format!("invalid public key URL: {e}")))?;
        let body = fetcher
            .get(&url)
            .map_err(|e| self.trust_err(format!("public key unavailable: {e}")))?;
        let pem = String::from_utf8(body)
            .map_err(|_| self.trust_err("public key is not PEM text".to_string()))?;
        let key = parse_public_key(&pem).map_err(|e| self.trust_err(e))?;

        fs::create_dir_all(&self.pin_dir).map_err(|source| InstallError::WriteError {
            path: self.pin_dir.clone(),
            source,
        })?;
        fs::write(&pin, pem.trim().to_string() + "\n").map_err(|source| InstallError::WriteError {
            path: pin.clone(),
            source,
        })?;
        let fp = fingerprint(&key).unwrap_or_else(|e| e);
        tracing::info!(url = %self.url, fingerprint = %fp, path = %pin.display(), "pinned mirror public key");
        Ok(key)
    }
}
