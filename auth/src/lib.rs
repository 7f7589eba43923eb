//! Credential exchange with the Farmbot token authority.
//!
//! # Architecture
//!
//! One logical operation, "exchange an email and password for a session token",
//! split into stages that the [`Authorization`] orchestrator sequences:
//!
//! | Module | Stage |
//! |--------|-------|
//! | [`key`] | GET `{server}/api/public_key` and decode it through a [`CryptoProvider`] |
//! | [`payload`] | Build the credential envelope, encrypt it, wrap it as the wire body |
//! | [`token`] | POST `{server}/api/tokens` and classify the raw response |
//! | [`decode`] | Extract `token.encoded` from the success body |
//! | [`orchestrator`] | Sequence the stages and retry on transient outcomes |
//!
//! # Retry Policy
//!
//! Any response that is neither a clear success (200) nor a clear rejection
//! (400-499) is treated as the API being mid-deployment or in maintenance mode.
//! The orchestrator waits a fixed [`RETRY_DELAY`] and restarts from the key
//! fetch with a fresh key and a fresh request id. There is no attempt limit;
//! use [`Authorization::authorize_with_cancel`] to bound it externally.
//!
//! # Error Handling
//!
//! Everything that reaches the caller is terminal and surfaced as [`AuthError`].
//! Transient outcomes never escape the orchestrator.

pub mod authorizer;
pub mod crypto;
pub mod decode;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod outcome;
pub mod payload;
pub mod token;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER};

pub use authorizer::{AuthFut, Authorizer, StaticAuthorizer};
pub use crypto::{CryptoError, CryptoProvider, RsaProvider};
pub use error::{AuthError, EncodingError, Stage};
pub use orchestrator::{
    AuthState, Authorization, IdSource, Login, SleepFut, Sleeper, TokioSleeper, UuidSource,
};
pub use outcome::{Attempt, Outcome, RawResponse, StatusClass, classify_status};
pub use payload::{Payload, build_payload, build_secret, wrap_secret};
pub use seedling_types;
pub use seedling_types::{Credentials, RequestId, Secret, ServerAddress, Token};

/// Public key endpoint, relative to the server address.
pub const PUBLIC_KEY_PATH: &str = "/api/public_key";
/// Token endpoint, relative to the server address.
pub const TOKENS_PATH: &str = "/api/tokens";
/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = "FarmbotOSBootstrap";
/// Fixed wait between attempts after a transient outcome.
pub const RETRY_DELAY: Duration = Duration::from_millis(5000);
/// Envelope format version understood by the server.
pub const ENVELOPE_VERSION: u8 = 1;

// No request timeout. Bound a call with a cancellation token instead.
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Builder for the HTTP client used by [`Authorization`].
///
/// Redirects are disabled: a 3xx must reach the classifier as an indeterminate
/// response rather than being followed.
#[must_use]
pub fn http_client_builder() -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));

    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Exchange an email and password for a token using the default RSA provider.
///
/// Validates the raw inputs, then runs [`Authorization::authorize`].
pub async fn authorize(email: &str, password: &str, server: &str) -> Result<Token, AuthError> {
    let credentials = Credentials::parse(email, password)?;
    let server = ServerAddress::parse(server)?;
    let authorization = Authorization::new()?;
    authorization.authorize(&credentials, &server).await
}
