use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried in the payload segment of the bearer token issued by the
/// identity provider.
///
/// The client only *reads* these claims to decide what to show. It never
/// verifies the signature: the backend re-validates the token on every
/// request, so nothing here is a security decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account name, shown as the username.
    pub name: String,

    /// Permission groups, e.g. `create-aliases`.
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token does not have three dot-separated segments")]
    Segments,

    #[error("token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenClaims {
    /// Decode the middle segment of `header.payload.signature`.
    ///
    /// Decode-only: the signature segment is ignored.
    pub fn decode_unverified(token: &str) -> Result<Self, TokenError> {
        let mut segments = token.trim().split('.');

        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => return Err(TokenError::Segments),
        };

        // Padding is optional on the wire.
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}
