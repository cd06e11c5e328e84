//! Fixed RSA keys and mirror-style signature documents for tests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest as _, Sha512};

pub const MIRROR_KEY: &str = include_str!("../fixtures/mirror_key.pem");
pub const MIRROR_PUB: &str = include_str!("../fixtures/mirror_key.pub.pem");
pub const ROGUE_KEY: &str = include_str!("../fixtures/rogue_key.pem");

/// Base64 PKCS#1 v1.5 / SHA-512 signature over `message`.
pub fn sign_b64(private_pem: &str, message: &[u8]) -> String {
    let key = RsaPrivateKey::from_pkcs8_pem(private_pem).expect("test key");
    let sig = key
        .sign(Pkcs1v15Sign::new::<Sha512>(), &Sha512::digest(message))
        .expect("sign");
    STANDARD.encode(sig)
}
