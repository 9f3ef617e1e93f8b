//! Error taxonomy for token lifecycle and TOTP operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token signature invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("TOTP secret decode error: {0}")]
    SecretDecode(String),

    #[error("Secure random source unavailable: {0}")]
    RandomSourceFailure(String),

    #[error("Revocation store unavailable: {0}")]
    StoreUnavailable(String),

    /// Token rotation aborted. `old_token_still_valid` tells the caller
    /// whether the consumed refresh token escaped revocation, so it can
    /// decide between retrying the refresh and denying the session.
    #[error("Token rotation failed (old token still valid: {old_token_still_valid}): {reason}")]
    Rotation {
        old_token_still_valid: bool,
        reason: String,
    },

    #[error("Principal rejected: {0}")]
    PrincipalRejected(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => AuthError::SignatureInvalid,
            _ => AuthError::TokenMalformed,
        }
    }
}
