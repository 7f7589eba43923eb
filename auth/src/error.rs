//! Terminal error taxonomy.

use std::fmt;

use seedling_types::{EmptyFieldError, ServerAddress, ServerAddressError};
use thiserror::Error;

use crate::crypto::CryptoError;

/// Which HTTP exchange a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    KeyFetch,
    TokenRequest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::KeyFetch => f.write_str("public key fetch"),
            Stage::TokenRequest => f.write_str("token request"),
        }
    }
}

/// Failure while turning credentials into the wire body.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to encrypt envelope: {0}")]
    Encrypt(#[source] CryptoError),
}

/// Every way an authorization can end without a token.
///
/// None of these are retried. Transient responses are handled inside the
/// orchestrator and never appear here.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(#[from] EmptyFieldError),

    #[error(transparent)]
    InvalidServer(#[from] ServerAddressError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to decode public key from {server}: {source}")]
    KeyDecode {
        server: ServerAddress,
        #[source]
        source: CryptoError,
    },

    #[error("{stage} to {server} failed: {source}")]
    Network {
        stage: Stage,
        server: ServerAddress,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Failed to authorize with the Farmbot web application at: {server} with code: {status}")]
    Rejected { server: ServerAddress, status: u16 },

    #[error("token response is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("unknown error: token response has no `{missing}` field")]
    UnknownStructure { missing: &'static str },

    /// A provisioned secret carries a fixed request id and cannot be resent.
    #[error("{server} is not ready (HTTP {status}); provision a new secret and try again")]
    SecretNotAccepted { server: ServerAddress, status: u16 },

    #[error("authorization cancelled")]
    Cancelled,
}

impl AuthError {
    /// HTTP status for a rejection, if this is one.
    #[must_use]
    pub fn rejected_status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
