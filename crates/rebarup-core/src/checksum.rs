//! SHA-512 digests for artifact integrity.
//!
//! Digests travel as lowercase hex (manifest column, `--sha512` flag) and are
//! compared as raw bytes.

use crate::error::InstallError;
use sha2::{Digest as _, Sha512};
use std::fmt;

/// Length in bytes of a SHA-512 digest.
pub const DIGEST_LEN: usize = 64;

/// A fixed-length SHA-512 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Compute the SHA-512 of `data`.
    pub fn of(data: &[u8]) -> Self {
        let out = Sha512::digest(data);
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&out);
        Digest(bytes)
    }

    /// Parse a hex digest (case-insensitive, surrounding whitespace ignored).
    pub fn from_hex(s: &str) -> Result<Self, InstallError> {
        let s = s.trim();
        let raw = hex::decode(s)
            .map_err(|e| InstallError::InvalidChecksum(format!("{s:?} is not hex: {e}")))?;
        let bytes: [u8; DIGEST_LEN] = raw.try_into().map_err(|v: Vec<u8>| {
            InstallError::InvalidChecksum(format!(
                "expected a {DIGEST_LEN}-byte SHA-512 digest, got {} bytes",
                v.len()
            ))
        })?;
        Ok(Digest(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Byte-for-byte comparison that does not short-circuit on the first difference.
    pub fn matches(&self, other: &Digest) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// Check `data` against `expected`; on mismatch the error carries both digests.
pub fn verify(data: &[u8], expected: &Digest) -> Result<(), InstallError> {
    let actual = Digest::of(data);
    if actual.matches(expected) {
        Ok(())
    } else {
        Err(InstallError::ChecksumMismatch {
            expected: *expected,
            actual,
        })
    }
}
