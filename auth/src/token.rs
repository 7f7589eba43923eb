//! Token request submission.

use reqwest::header::{CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use seedling_types::ServerAddress;

use crate::outcome::{Outcome, RawResponse};
use crate::{TOKENS_PATH, USER_AGENT};

/// POST the wire body to `{server}/api/tokens` and classify the response.
///
/// Never fails: transport errors come back as [`Outcome::TransportFailure`]
/// for the orchestrator to surface.
pub async fn request_token(
    client: &reqwest::Client,
    server: &ServerAddress,
    body: Vec<u8>,
) -> Outcome {
    let response = match client
        .post(server.endpoint(TOKENS_PATH))
        .header(USER_AGENT_HEADER, USER_AGENT)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return Outcome::TransportFailure(e),
    };

    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(body) => Outcome::from_response(RawResponse {
            status,
            body: body.to_vec(),
        }),
        Err(e) => Outcome::TransportFailure(e),
    }
}
