//! Data model shared by the token manager and its callers.

use serde::{Deserialize, Serialize};

/// The identity a token pair is minted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: String,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
        }
    }
}

/// Signed payload carried by both halves of a token pair.
///
/// `tid` is shared between an access token and its paired refresh token
/// and is the unit of revocation: blacklisting one id invalidates both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    pub username: String,
    /// Authorization tier captured at issuance time.
    pub role: String,
    /// Token pair id (UUID), the revocation key.
    pub tid: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds). Hard boundary, no grace period.
    pub exp: i64,
}

/// Issuance result handed back to the login/refresh handler.
///
/// Wire shape toward clients:
/// `{ "token": ..., "refresh_token": ..., "csrf_token": ...,
///    "expires_in": ..., "token_type": "Bearer" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: String,
    /// Random opaque value for double-submit CSRF protection by the web
    /// layer. Not embedded in either JWT.
    pub csrf_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    /// Always `"Bearer"`.
    pub token_type: String,
}
