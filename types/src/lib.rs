//! Core domain types for Seedling.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
pub use ids::RequestId;

use std::fmt;

use thiserror::Error;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Credential Types
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field} must not be empty")]
pub struct EmptyFieldError {
    pub field: &'static str,
}

/// Account email, guaranteed non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyFieldError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyFieldError { field: "email" });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account password.
///
/// Passwords are used verbatim (no trimming), wiped from memory on drop, and
/// never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyFieldError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptyFieldError { field: "password" });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Caller-owned login pair. Lives across retries, never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: Email,
    password: Password,
}

impl Credentials {
    #[must_use]
    pub fn new(email: Email, password: Password) -> Self {
        Self { email, password }
    }

    /// Validate raw strings into credentials.
    pub fn parse(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, EmptyFieldError> {
        Ok(Self::new(Email::new(email)?, Password::new(password)?))
    }

    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Pre-encrypted credential blob (the base64 text sent as `user.credentials`).
///
/// Lets a provisioned device authorize without holding the plaintext password.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyFieldError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyFieldError { field: "secret" });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

// ============================================================================
// Server Address
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerAddressError {
    #[error("server address must not be empty")]
    Empty,
    #[error("invalid server address {address:?}: {reason}")]
    Invalid { address: String, reason: String },
    #[error("server address {address:?} must use http or https (got {scheme})")]
    UnsupportedScheme { address: String, scheme: String },
}

/// Base URL of the token authority, normalized without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress(String);

impl ServerAddress {
    pub fn parse(raw: &str) -> Result<Self, ServerAddressError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ServerAddressError::Empty);
        }

        let url = Url::parse(trimmed).map_err(|e| ServerAddressError::Invalid {
            address: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ServerAddressError::UnsupportedScheme {
                    address: trimmed.to_string(),
                    scheme: other.to_string(),
                });
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ServerAddressError::Invalid {
                address: trimmed.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join an absolute API path (e.g. `/api/tokens`) onto the base address.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.0)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Token
// ============================================================================

/// Opaque session token issued by the server.
///
/// Note: `Debug` is manually implemented to redact the value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}
