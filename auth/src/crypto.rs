//! Public-key capability used to seal the credential envelope.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("public key is not valid UTF-8")]
    KeyNotUtf8,
    #[error("unrecognized public key: {0}")]
    InvalidKey(String),
    #[error("encryption failed: {0}")]
    Encrypt(String),
}

/// Decode a server-supplied key and encrypt with it.
pub trait CryptoProvider: Send + Sync {
    type Key: Send + Sync;

    fn decode_public_key(&self, encoded: &[u8]) -> Result<Self::Key, CryptoError>;

    fn encrypt(&self, plaintext: &[u8], key: &Self::Key) -> Result<Vec<u8>, CryptoError>;
}

/// RSA with PKCS#1 v1.5 padding, the scheme the token authority decrypts.
///
/// Accepts `BEGIN PUBLIC KEY` (SPKI) and `BEGIN RSA PUBLIC KEY` (PKCS#1) PEM.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaProvider;

impl CryptoProvider for RsaProvider {
    type Key = RsaPublicKey;

    fn decode_public_key(&self, encoded: &[u8]) -> Result<RsaPublicKey, CryptoError> {
        let pem = std::str::from_utf8(encoded).map_err(|_| CryptoError::KeyNotUtf8)?;
        let pem = pem.trim();
        RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    fn encrypt(&self, plaintext: &[u8], key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
        key.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))
    }
}
