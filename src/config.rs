//! Environment-driven configuration for the token and TOTP managers.

use serde::Deserialize;

fn default_access_token_ttl_secs() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_ttl_secs() -> u64 {
    2_592_000 // 30 days
}

/// Token manager configuration.
///
/// `JWT_SECRET` is required; the TTLs fall back to a short-lived access
/// token and a 30-day refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: u64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
        }
    }
}

fn default_totp_secret_len() -> usize {
    20
}

fn default_totp_digits() -> u32 {
    6
}

fn default_totp_period_secs() -> u64 {
    30
}

fn default_totp_skew_steps() -> u32 {
    1
}

/// TOTP parameters. Defaults follow RFC 6238 and what standard
/// authenticator apps expect: 20-byte secret, 6 digits, 30-second
/// period, one step of clock-skew tolerance each direction.
#[derive(Debug, Clone, Deserialize)]
pub struct TotpConfig {
    #[serde(default = "default_totp_secret_len")]
    pub totp_secret_len: usize,
    #[serde(default = "default_totp_digits")]
    pub totp_digits: u32,
    #[serde(default = "default_totp_period_secs")]
    pub totp_period_secs: u64,
    #[serde(default = "default_totp_skew_steps")]
    pub totp_skew_steps: u32,
}

impl TotpConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            totp_secret_len: default_totp_secret_len(),
            totp_digits: default_totp_digits(),
            totp_period_secs: default_totp_period_secs(),
            totp_skew_steps: default_totp_skew_steps(),
        }
    }
}
