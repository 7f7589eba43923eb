//! Public key retrieval.

use seedling_types::ServerAddress;

use crate::crypto::CryptoProvider;
use crate::error::{AuthError, Stage};
use crate::outcome::{Attempt, RawResponse};
use crate::PUBLIC_KEY_PATH;

/// GET the server's current public key and decode it.
///
/// Any status other than 200 is handed back unclassified as
/// [`Attempt::Indeterminate`]; the key endpoint needs no authentication, so a
/// non-200 here only ever means the API is not serving yet.
pub async fn fetch_key<C: CryptoProvider>(
    client: &reqwest::Client,
    crypto: &C,
    server: &ServerAddress,
) -> Result<Attempt<C::Key>, AuthError> {
    let network = |source: reqwest::Error| AuthError::Network {
        stage: Stage::KeyFetch,
        server: server.clone(),
        source,
    };

    let response = client
        .get(server.endpoint(PUBLIC_KEY_PATH))
        .send()
        .await
        .map_err(network)?;
    let status = response.status().as_u16();

    if status != 200 {
        // The status alone decides; a body cut short here is still a retry.
        let body = response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .unwrap_or_default();
        return Ok(Attempt::Indeterminate(RawResponse { status, body }));
    }

    let body = response.bytes().await.map_err(network)?;
    crypto
        .decode_public_key(&body)
        .map(Attempt::Ready)
        .map_err(|source| AuthError::KeyDecode {
            server: server.clone(),
            source,
        })
}
