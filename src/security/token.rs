//! Bearer credential lifecycle: issuance, validation, revocation,
//! rotation.
//!
//! Access and refresh tokens are HS256 JWTs that differ only in `exp`
//! and share a `tid`, so one revocation entry covers the whole pair.
//! Revocation state lives in the injected [`RevocationStore`]; the
//! manager itself holds no mutable state and every call is a pure
//! function of (token, store state, current time).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::models::{Claims, Principal, TokenPair};
use crate::store::RevocationStore;

const TOKEN_TYPE_BEARER: &str = "Bearer";
const CSRF_TOKEN_BYTES: usize = 32;

/// Re-fetches the authoritative principal during refresh.
///
/// Without it, `refresh_tokens` trusts the claims of the consumed
/// refresh token, so a demoted or deactivated account keeps its
/// privileges until absolute expiry. Inject an implementation to close
/// that window: returning `None` rejects the refresh.
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    async fn lookup(&self, subject: &str) -> AuthResult<Option<Principal>>;
}

pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl_secs: u64,
    refresh_token_ttl_secs: u64,
    store: Arc<dyn RevocationStore>,
    principals: Option<Arc<dyn PrincipalLookup>>,
}

impl TokenManager {
    pub fn new(config: &AuthConfig, store: Arc<dyn RevocationStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard boundary; the default 60s leeway would grant
        // a grace period the token contract does not have.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_token_ttl_secs: config.access_token_ttl_secs,
            refresh_token_ttl_secs: config.refresh_token_ttl_secs,
            store,
            principals: None,
        }
    }

    pub fn with_principal_lookup(mut self, principals: Arc<dyn PrincipalLookup>) -> Self {
        self.principals = Some(principals);
        self
    }

    /// Mint an access/refresh pair for `principal`.
    ///
    /// Both tokens carry the same freshly generated `tid`; the CSRF
    /// token is independent random material for the web layer's
    /// double-submit check. No store I/O happens at issuance.
    pub fn generate_token_pair(&self, principal: &Principal) -> AuthResult<TokenPair> {
        if principal.username.is_empty() || principal.role.is_empty() {
            return Err(AuthError::Validation(
                "principal requires a non-empty username and role".to_string(),
            ));
        }

        let token_id = new_token_id()?;
        let now = Utc::now();

        let access_token =
            self.sign_claims(principal, &token_id, now, self.access_token_ttl_secs)?;
        let refresh_token =
            self.sign_claims(principal, &token_id, now, self.refresh_token_ttl_secs)?;
        let csrf_token = random_hex(CSRF_TOKEN_BYTES)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            csrf_token,
            expires_in: self.access_token_ttl_secs as i64,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }

    /// Verify a bearer credential and return its claims.
    ///
    /// The single authorization choke point: signature (HS256 only),
    /// expiry with zero leeway, then the revocation lookup. A store
    /// failure is `StoreUnavailable` — the caller denies; an unreachable
    /// store never admits a revoked token.
    pub async fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        let claims = self.decode_claims(token)?;

        let revoked = self
            .store
            .exists(&claims.tid)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        if revoked {
            tracing::debug!(tid = %claims.tid, "rejected revoked token");
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Revoke `token_id` until `not_after` (the expiry of the
    /// longest-lived token sharing the id).
    ///
    /// A `not_after` already in the past is a success no-op: the token
    /// cannot be presented anyway and the store would reject a zero TTL.
    /// Idempotent — re-revoking an id just refreshes its entry.
    pub async fn blacklist_token(
        &self,
        token_id: &str,
        not_after: DateTime<Utc>,
    ) -> AuthResult<()> {
        let remaining = not_after.signed_duration_since(Utc::now()).num_seconds();
        if remaining <= 0 {
            tracing::debug!(tid = %token_id, "skipping revocation of already-expired token");
            return Ok(());
        }

        self.store
            .put(token_id, Duration::from_secs(remaining as u64))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        tracing::info!(tid = %token_id, ttl_secs = remaining, "token revoked");
        Ok(())
    }

    /// Pure revocation lookup; never mutates the store.
    pub async fn is_token_blacklisted(&self, token_id: &str) -> AuthResult<bool> {
        self.store
            .exists(token_id)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    /// Exchange a valid refresh token for a fresh pair under a new
    /// `tid`, revoking the old id in the same step.
    ///
    /// The revocation check and the revocation write are one atomic
    /// `put_if_absent`, so of two concurrent refreshes with the same
    /// token exactly one wins; the other sees `TokenRevoked`. If the
    /// store write fails the refresh aborts with a `Rotation` error
    /// tagged `old_token_still_valid: true` — a new pair is never handed
    /// out while the old token silently stays live.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.decode_claims(refresh_token)?;

        let remaining = (claims.exp - Utc::now().timestamp()).max(1) as u64;
        let newly_revoked = self
            .store
            .put_if_absent(&claims.tid, Duration::from_secs(remaining))
            .await
            .map_err(|e| AuthError::Rotation {
                old_token_still_valid: true,
                reason: e.to_string(),
            })?;
        if !newly_revoked {
            tracing::debug!(tid = %claims.tid, "refresh token already consumed or revoked");
            return Err(AuthError::TokenRevoked);
        }

        let principal = match &self.principals {
            Some(lookup) => lookup.lookup(&claims.sub).await?.ok_or_else(|| {
                AuthError::PrincipalRejected(format!("{} is no longer active", claims.sub))
            })?,
            None => Principal::new(claims.username.clone(), claims.role.clone()),
        };

        let pair = self.generate_token_pair(&principal)?;
        tracing::info!(old_tid = %claims.tid, "token pair rotated");
        Ok(pair)
    }

    fn sign_claims(
        &self,
        principal: &Principal,
        token_id: &str,
        issued_at: DateTime<Utc>,
        ttl_secs: u64,
    ) -> AuthResult<String> {
        let claims = Claims {
            sub: principal.username.clone(),
            username: principal.username.clone(),
            role: principal.role.clone(),
            tid: token_id.to_string(),
            iat: issued_at.timestamp(),
            exp: issued_at.timestamp() + ttl_secs as i64,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing: {e}")))
    }

    fn decode_claims(&self, token: &str) -> AuthResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }
}

/// UUID v4 from fallibly drawn OS entropy. RNG failure fails the call;
/// a predictable substitute id would break revocation.
fn new_token_id() -> AuthResult<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::RandomSourceFailure(e.to_string()))?;
    Ok(uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string())
}

fn random_hex(len: usize) -> AuthResult<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::RandomSourceFailure(e.to_string()))?;
    Ok(hex::encode(bytes))
}
