//! Response classification shared by the key fetch and the token request.

use seedling_types::ServerAddress;

use crate::error::{AuthError, Stage};

/// Transport-agnostic view of an HTTP response. Never outlives one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Rejected,
    Indeterminate,
}

/// 200 is success, 400-499 is a permanent rejection, everything else means
/// the API is not ready (maintenance mode, mid-deployment, redirects).
#[must_use]
pub const fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Success,
        400..=499 => StatusClass::Rejected,
        _ => StatusClass::Indeterminate,
    }
}

/// Result of one stage that can either produce a value or tell the
/// orchestrator to start over.
#[derive(Debug)]
pub enum Attempt<T> {
    Ready(T),
    Indeterminate(RawResponse),
}

/// Classified result of the token request.
#[derive(Debug)]
pub enum Outcome {
    /// 200, body unparsed.
    Success(Vec<u8>),
    /// 400-499.
    Rejected(u16),
    /// Any other status. A signal to retry, not a fault.
    Indeterminate(RawResponse),
    /// The exchange itself failed.
    TransportFailure(reqwest::Error),
}

impl Outcome {
    #[must_use]
    pub fn from_response(response: RawResponse) -> Self {
        match classify_status(response.status) {
            StatusClass::Success => Outcome::Success(response.body),
            StatusClass::Rejected => Outcome::Rejected(response.status),
            StatusClass::Indeterminate => Outcome::Indeterminate(response),
        }
    }

    /// Fold into the orchestrator's view: terminal outcomes become errors.
    pub fn into_attempt(self, server: &ServerAddress) -> Result<Attempt<Vec<u8>>, AuthError> {
        match self {
            Outcome::Success(body) => Ok(Attempt::Ready(body)),
            Outcome::Indeterminate(raw) => Ok(Attempt::Indeterminate(raw)),
            Outcome::Rejected(status) => Err(AuthError::Rejected {
                server: server.clone(),
                status,
            }),
            Outcome::TransportFailure(source) => Err(AuthError::Network {
                stage: Stage::TokenRequest,
                server: server.clone(),
                source,
            }),
        }
    }
}
