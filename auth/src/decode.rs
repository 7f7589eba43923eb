//! Token extraction from the success body.

use seedling_types::Token;
use serde_json::Value;

use crate::error::AuthError;

/// Parse `{"token": {"encoded": "<token>", ...}}` and return the encoded token.
///
/// Unparsable JSON is [`AuthError::MalformedResponse`]. Valid JSON without
/// `token`, or a `token` without a string `encoded`, is
/// [`AuthError::UnknownStructure`].
pub fn decode(body: &[u8]) -> Result<Token, AuthError> {
    let parsed: Value = serde_json::from_slice(body).map_err(AuthError::MalformedResponse)?;

    let token = parsed
        .get("token")
        .ok_or(AuthError::UnknownStructure { missing: "token" })?;

    token
        .get("encoded")
        .and_then(Value::as_str)
        .map(Token::new)
        .ok_or(AuthError::UnknownStructure { missing: "encoded" })
}
