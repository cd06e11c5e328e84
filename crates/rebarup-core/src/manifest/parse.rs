//! Manifest rows and latest-eligible selection.
//!
//! A row is `version,checksum[,host_version...]`. Each host column is the
//! minimum host version a build of this release runs on (a leading `>=` is
//! accepted and means the same); the first column the host satisfies names the
//! build to download. A row with no host columns runs on any host.

use crate::checksum::Digest;
use flate2::read::GzDecoder;
use semver::Version;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: Version,
    pub checksum: Digest,
    /// Minimum host versions, in manifest order.
    pub host_versions: Vec<Version>,
}

impl VersionEntry {
    /// Host build of this release to use on `host`, or `None` if `host` is too old.
    pub fn build_for(&self, host: &Version) -> Option<Version> {
        if self.host_versions.is_empty() {
            return Some(host.clone());
        }
        self.host_versions.iter().find(|min| *min <= host).cloned()
    }
}

/// The selected release, with the host build it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub checksum: Digest,
    pub host_build: Version,
}

/// Gunzip if the document carries the gzip magic, otherwise return it as is.
pub(super) fn decompress(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    if raw.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(raw).read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(raw.to_vec())
    }
}

/// Parse every well-formed row. Malformed rows are logged and skipped.
pub fn parse_entries(text: &str) -> Vec<VersionEntry> {
    let mut entries = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(e) => entries.push(e),
            Err(reason) => {
                tracing::warn!(line = lineno + 1, %reason, "skipping manifest row");
            }
        }
    }
    entries
}

fn parse_row(line: &str) -> Result<VersionEntry, String> {
    let mut fields = line.split(',').map(str::trim);
    let version = fields.next().filter(|s| !s.is_empty()).ok_or("missing version")?;
    let checksum = fields.next().filter(|s| !s.is_empty()).ok_or("missing checksum")?;

    let version = Version::parse(version).map_err(|e| format!("version {version:?}: {e}"))?;
    let checksum = Digest::from_hex(checksum).map_err(|e| e.to_string())?;
    let host_versions = fields
        .filter(|s| !s.is_empty())
        .map(parse_host_minimum)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VersionEntry {
        version,
        checksum,
        host_versions,
    })
}

fn parse_host_minimum(raw: &str) -> Result<Version, String> {
    let bare = raw.strip_prefix(">=").unwrap_or(raw).trim();
    Version::parse(bare).map_err(|e| format!("host version {raw:?}: {e}"))
}

/// Highest release with a build that runs on `host`.
pub fn select_latest(entries: Vec<VersionEntry>, host: &Version) -> Option<Release> {
    entries
        .into_iter()
        .filter_map(|e| {
            let host_build = e.build_for(host)?;
            Some(Release {
                version: e.version,
                checksum: e.checksum,
                host_build,
            })
        })
        .max_by(|a, b| a.version.cmp(&b.version))
}
