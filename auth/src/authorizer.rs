//! Swappable authorization capability.
//!
//! Callers depend on [`Authorizer`] rather than on [`Authorization`] directly,
//! so tests can substitute [`StaticAuthorizer`] for the network flow.

use std::future::Future;
use std::pin::Pin;

use seedling_types::{Credentials, ServerAddress, Token};

use crate::crypto::CryptoProvider;
use crate::error::AuthError;
use crate::orchestrator::Authorization;

pub type AuthFut<'a> = Pin<Box<dyn Future<Output = Result<Token, AuthError>> + Send + 'a>>;

pub trait Authorizer: Send + Sync {
    fn authorize<'a>(
        &'a self,
        credentials: &'a Credentials,
        server: &'a ServerAddress,
    ) -> AuthFut<'a>;
}

impl<C> Authorizer for Authorization<C>
where
    C: CryptoProvider + 'static,
{
    fn authorize<'a>(
        &'a self,
        credentials: &'a Credentials,
        server: &'a ServerAddress,
    ) -> AuthFut<'a> {
        Box::pin(Authorization::authorize(self, credentials, server))
    }
}

#[derive(Debug, Clone)]
enum StaticResponse {
    Grant(Token),
    Reject(u16),
}

/// Answers every call with the same canned result and never touches the network.
#[derive(Debug, Clone)]
pub struct StaticAuthorizer {
    response: StaticResponse,
}

impl StaticAuthorizer {
    #[must_use]
    pub fn granting(token: Token) -> Self {
        Self {
            response: StaticResponse::Grant(token),
        }
    }

    /// Reject every call as if the server answered with `status`.
    #[must_use]
    pub fn rejecting(status: u16) -> Self {
        Self {
            response: StaticResponse::Reject(status),
        }
    }
}

impl Authorizer for StaticAuthorizer {
    fn authorize<'a>(
        &'a self,
        _credentials: &'a Credentials,
        server: &'a ServerAddress,
    ) -> AuthFut<'a> {
        let result = match &self.response {
            StaticResponse::Grant(token) => Ok(token.clone()),
            StaticResponse::Reject(status) => Err(AuthError::Rejected {
                server: server.clone(),
                status: *status,
            }),
        };
        Box::pin(async move { result })
    }
}
