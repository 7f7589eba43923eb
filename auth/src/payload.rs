//! Credential envelope construction.
//!
//! Wire shape:
//!
//! ```text
//! {"user":{"credentials":"<base64(encrypt(json({email,password,id,version})))>"}}
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use seedling_types::{Credentials, RequestId, Secret};
use serde::Serialize;
use zeroize::Zeroize;

use crate::ENVELOPE_VERSION;
use crate::crypto::{CryptoError, CryptoProvider};
use crate::error::EncodingError;

#[derive(Serialize)]
struct CredentialEnvelope<'a> {
    email: &'a str,
    password: &'a str,
    id: &'a RequestId,
    version: u8,
}

#[derive(Serialize)]
struct TokenRequestBody<'a> {
    user: UserCredentials<'a>,
}

#[derive(Serialize)]
struct UserCredentials<'a> {
    credentials: &'a str,
}

/// Serialized wire body for one attempt.
#[derive(Debug)]
pub struct Payload {
    pub request_id: RequestId,
    pub body: Vec<u8>,
}

/// Encrypt the credential envelope and base64 it.
///
/// The serialized plaintext is wiped before returning, on success or failure.
pub fn build_secret<C: CryptoProvider>(
    crypto: &C,
    credentials: &Credentials,
    key: &C::Key,
    request_id: &RequestId,
) -> Result<Secret, EncodingError> {
    let envelope = CredentialEnvelope {
        email: credentials.email().as_str(),
        password: credentials.password().expose_secret(),
        id: request_id,
        version: ENVELOPE_VERSION,
    };

    let mut plaintext = serde_json::to_vec(&envelope).map_err(EncodingError::Serialize)?;
    let sealed = crypto.encrypt(&plaintext, key);
    plaintext.zeroize();

    let sealed = sealed.map_err(EncodingError::Encrypt)?;
    Secret::new(STANDARD.encode(sealed))
        .map_err(|_| EncodingError::Encrypt(CryptoError::Encrypt("empty ciphertext".to_string())))
}

/// Wrap an encrypted blob as the `POST /api/tokens` body.
pub fn wrap_secret(secret: &Secret) -> Result<Vec<u8>, EncodingError> {
    let body = TokenRequestBody {
        user: UserCredentials {
            credentials: secret.expose_secret(),
        },
    };
    serde_json::to_vec(&body).map_err(EncodingError::Serialize)
}

/// Build the complete wire body for one attempt.
pub fn build_payload<C: CryptoProvider>(
    crypto: &C,
    credentials: &Credentials,
    key: &C::Key,
    request_id: RequestId,
) -> Result<Payload, EncodingError> {
    let secret = build_secret(crypto, credentials, key, &request_id)?;
    let body = wrap_secret(&secret)?;
    Ok(Payload { request_id, body })
}
