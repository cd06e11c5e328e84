//! Detached RSA signatures over manifest bytes.
//!
//! The signature document is the base64 encoding of a PKCS#1 v1.5 signature
//! over the SHA-512 digest of the manifest; line breaks and surrounding
//! whitespace are ignored. Keys are PEM encoded RSA public keys, either SPKI
//! (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`).

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest as _, Sha256, Sha512};

/// Public keys a manifest may be signed with.
#[derive(Debug, Clone, Default)]
pub struct TrustedKeys {
    keys: Vec<RsaPublicKey>,
}

impl TrustedKeys {
    /// Parse PEM public keys. Fails on the first malformed key.
    pub fn from_pem<S: AsRef<str>>(pems: &[S]) -> Result<Self, String> {
        let mut keys = Vec::with_capacity(pems.len());
        for (i, pem) in pems.iter().enumerate() {
            let key = parse_public_key(pem.as_ref()).map_err(|e| format!("trusted key #{i}: {e}"))?;
            keys.push(key);
        }
        Ok(Self { keys })
    }

    pub fn push(&mut self, key: RsaPublicKey) {
        self.keys.push(key);
    }

    /// Ok if any trusted key verifies `signature_doc` over `message`.
    pub fn verify(&self, message: &[u8], signature_doc: &[u8]) -> Result<(), String> {
        if self.keys.is_empty() {
            return Err("no trusted keys configured".to_string());
        }
        let signature = decode_signature(signature_doc)?;
        let hashed = Sha512::digest(message);
        if self
            .keys
            .iter()
            .any(|k| k.verify(Pkcs1v15Sign::new::<Sha512>(), &hashed, &signature).is_ok())
        {
            Ok(())
        } else {
            Err("signature does not match any trusted key".to_string())
        }
    }
}

/// Parse one PEM public key (SPKI first, then PKCS#1).
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, String> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| format!("not a PEM encoded RSA public key: {e}"))
}

/// `SHA256:<base64>` over the DER encoded key, for logs.
pub fn fingerprint(key: &RsaPublicKey) -> Result<String, String> {
    let der = key
        .to_public_key_der()
        .map_err(|e| format!("could not encode key: {e}"))?;
    Ok(format!(
        "SHA256:{}",
        STANDARD_NO_PAD.encode(Sha256::digest(der.as_bytes()))
    ))
}

fn decode_signature(doc: &[u8]) -> Result<Vec<u8>, String> {
    let compact: Vec<u8> = doc
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err("signature is empty".to_string());
    }
    STANDARD
        .decode(&compact)
        .map_err(|e| format!("signature is not base64: {e}"))
}
