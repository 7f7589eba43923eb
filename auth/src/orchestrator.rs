//! Attempt sequencing and the retry loop.
//!
//! One attempt runs `FetchingKey -> BuildingPayload -> Requesting -> Decoding`.
//! An indeterminate response from either HTTP stage moves to `Retrying`, waits
//! [`RETRY_DELAY`], and starts a new attempt with a fresh key and request id.
//! Every other failure ends in `Failed`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use seedling_types::{Credentials, RequestId, Secret, ServerAddress, Token};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::crypto::{CryptoProvider, RsaProvider};
use crate::decode::decode;
use crate::error::AuthError;
use crate::key::fetch_key;
use crate::outcome::Attempt;
use crate::payload::{build_payload, build_secret, wrap_secret};
use crate::token::request_token;
use crate::{RETRY_DELAY, http_client_builder};

pub type SleepFut<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// How the retry delay is waited out.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> SleepFut<'_>;
}

/// Suspends only the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> SleepFut<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Mints request ids. One id per attempt.
pub trait IdSource: Send + Sync {
    fn new_id(&self) -> RequestId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn new_id(&self) -> RequestId {
        RequestId::new(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    FetchingKey,
    BuildingPayload,
    Requesting,
    Decoding,
    Retrying,
    Succeeded,
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthState::FetchingKey => "fetching_key",
            AuthState::BuildingPayload => "building_payload",
            AuthState::Requesting => "requesting",
            AuthState::Decoding => "decoding",
            AuthState::Retrying => "retrying",
            AuthState::Succeeded => "succeeded",
            AuthState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the caller proves identity with.
#[derive(Debug, Clone, Copy)]
pub enum Login<'a> {
    /// Plaintext credentials, sealed with a freshly fetched key every attempt.
    Password(&'a Credentials),
    /// A blob sealed earlier by [`Authorization::provision_secret`]. Skips the key fetch.
    ///
    /// The blob embeds one request id, so it is submitted at most once: an
    /// indeterminate response ends in [`AuthError::SecretNotAccepted`].
    Secret(&'a Secret),
}

/// The credential-exchange orchestrator.
///
/// Holds no per-call state: concurrent calls on one instance never share keys,
/// ids, or responses.
pub struct Authorization<C: CryptoProvider = RsaProvider> {
    client: reqwest::Client,
    crypto: C,
    ids: Box<dyn IdSource>,
    sleeper: Box<dyn Sleeper>,
}

impl Authorization<RsaProvider> {
    pub fn new() -> Result<Self, AuthError> {
        let client = http_client_builder().build().map_err(AuthError::Client)?;
        Ok(Self::with_client(client))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self::with_crypto(client, RsaProvider)
    }
}

impl<C: CryptoProvider> Authorization<C> {
    #[must_use]
    pub fn with_crypto(client: reqwest::Client, crypto: C) -> Self {
        Self {
            client,
            crypto,
            ids: Box::new(UuidSource),
            sleeper: Box::new(TokioSleeper),
        }
    }

    #[must_use]
    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Exchange credentials for a token, retrying transient outcomes forever.
    pub async fn authorize(
        &self,
        credentials: &Credentials,
        server: &ServerAddress,
    ) -> Result<Token, AuthError> {
        self.exchange(
            Login::Password(credentials),
            server,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like [`authorize`](Self::authorize), but stops with
    /// [`AuthError::Cancelled`] once `cancel` fires, checked before each
    /// attempt and during the retry wait.
    pub async fn authorize_with_cancel(
        &self,
        credentials: &Credentials,
        server: &ServerAddress,
        cancel: &CancellationToken,
    ) -> Result<Token, AuthError> {
        self.exchange(Login::Password(credentials), server, cancel).await
    }

    /// Exchange a previously provisioned secret for a token.
    ///
    /// Never retried: see [`Login::Secret`].
    pub async fn authorize_with_secret(
        &self,
        secret: &Secret,
        server: &ServerAddress,
    ) -> Result<Token, AuthError> {
        self.exchange(Login::Secret(secret), server, &CancellationToken::new())
            .await
    }

    pub async fn exchange(
        &self,
        login: Login<'_>,
        server: &ServerAddress,
        cancel: &CancellationToken,
    ) -> Result<Token, AuthError> {
        self.run(server, cancel, || async move {
            match login {
                Login::Password(credentials) => self.password_attempt(credentials, server).await,
                Login::Secret(secret) => {
                    let body = wrap_secret(secret)?;
                    match self.submit(server, body).await? {
                        Attempt::Indeterminate(raw) => Err(AuthError::SecretNotAccepted {
                            server: server.clone(),
                            status: raw.status,
                        }),
                        ready => Ok(ready),
                    }
                }
            }
        })
        .await
    }

    /// Seal credentials with the server's current key without requesting a token.
    ///
    /// The result can be stored and later passed to
    /// [`authorize_with_secret`](Self::authorize_with_secret).
    pub async fn provision_secret(
        &self,
        credentials: &Credentials,
        server: &ServerAddress,
    ) -> Result<Secret, AuthError> {
        self.run(server, &CancellationToken::new(), || async move {
            enter(AuthState::FetchingKey);
            let key = match fetch_key(&self.client, &self.crypto, server).await? {
                Attempt::Ready(key) => key,
                Attempt::Indeterminate(raw) => return Ok(Attempt::Indeterminate(raw)),
            };
            enter(AuthState::BuildingPayload);
            let secret = build_secret(&self.crypto, credentials, &key, &self.ids.new_id())?;
            Ok::<_, AuthError>(Attempt::Ready(secret))
        })
        .await
    }

    async fn run<T, F, Fut>(
        &self,
        server: &ServerAddress,
        cancel: &CancellationToken,
        attempt: F,
    ) -> Result<T, AuthError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, AuthError>>,
    {
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(%server, attempts, "Authorization cancelled");
                return Err(AuthError::Cancelled);
            }

            attempts += 1;
            tracing::debug!(%server, attempt = attempts, "Starting authorization attempt");

            match attempt().await {
                Ok(Attempt::Ready(value)) => {
                    enter(AuthState::Succeeded);
                    return Ok(value);
                }
                Ok(Attempt::Indeterminate(raw)) => {
                    enter(AuthState::Retrying);
                    tracing::warn!(
                        %server,
                        status = raw.status,
                        attempt = attempts,
                        delay_ms = RETRY_DELAY.as_millis(),
                        "API not ready (maintenance mode or mid-deployment), retrying"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => {
                            tracing::debug!(%server, attempts, "Authorization cancelled during retry wait");
                            return Err(AuthError::Cancelled);
                        }
                        () = self.sleeper.sleep(RETRY_DELAY) => {}
                    }
                }
                Err(e) => {
                    enter(AuthState::Failed);
                    tracing::debug!(%server, attempt = attempts, error = %e, "Authorization failed");
                    return Err(e);
                }
            }
        }
    }

    async fn password_attempt(
        &self,
        credentials: &Credentials,
        server: &ServerAddress,
    ) -> Result<Attempt<Token>, AuthError> {
        enter(AuthState::FetchingKey);
        let key = match fetch_key(&self.client, &self.crypto, server).await? {
            Attempt::Ready(key) => key,
            Attempt::Indeterminate(raw) => {
                tracing::debug!(status = raw.status, "Public key endpoint not ready");
                return Ok(Attempt::Indeterminate(raw));
            }
        };

        enter(AuthState::BuildingPayload);
        let payload = build_payload(&self.crypto, credentials, &key, self.ids.new_id())?;
        drop(key);
        tracing::debug!(request_id = %payload.request_id, "Built credential envelope");

        self.submit(server, payload.body).await
    }

    async fn submit(
        &self,
        server: &ServerAddress,
        body: Vec<u8>,
    ) -> Result<Attempt<Token>, AuthError> {
        enter(AuthState::Requesting);
        let body = match request_token(&self.client, server, body)
            .await
            .into_attempt(server)?
        {
            Attempt::Ready(body) => body,
            Attempt::Indeterminate(raw) => {
                tracing::debug!(status = raw.status, "Token endpoint not ready");
                return Ok(Attempt::Indeterminate(raw));
            }
        };

        enter(AuthState::Decoding);
        decode(&body).map(Attempt::Ready)
    }
}

fn enter(state: AuthState) {
    tracing::trace!(%state, "Authorization state");
}
