//! Time-based one-time passwords (RFC 6238) for the second login factor.
//!
//! Codes are HMAC-SHA1 over the big-endian time counter with RFC 4226
//! dynamic truncation. Secrets are base32 (RFC 4648, no padding),
//! formatted with a space every 4 characters for transcription; spaces
//! are insignificant.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;

use crate::config::TotpConfig;
use crate::error::{AuthError, AuthResult};

type HmacSha1 = Hmac<Sha1>;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const SECRET_GROUP_LEN: usize = 4;

pub struct TotpManager {
    config: TotpConfig,
}

impl TotpManager {
    pub fn new(config: TotpConfig) -> Self {
        Self { config }
    }

    /// Generate a fresh shared secret from OS entropy.
    ///
    /// Returns the base32 encoding, grouped for human transcription
    /// (`"JBSW Y3DP EHPK 3PXP"`). RNG failure is a hard error; there is
    /// no degraded fallback source.
    pub fn generate_secret(&self) -> AuthResult<String> {
        let mut bytes = vec![0u8; self.config.totp_secret_len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::RandomSourceFailure(e.to_string()))?;

        Ok(group_secret(&base32_encode_nopad(&bytes)))
    }

    /// Compute the code for `secret` at `at`.
    pub fn generate_code(&self, secret: &str, at: DateTime<Utc>) -> AuthResult<String> {
        let key = self.decode_secret(secret)?;
        hotp(&key, self.counter_at(at), self.config.totp_digits)
    }

    pub fn generate_code_now(&self, secret: &str) -> AuthResult<String> {
        self.generate_code(secret, Utc::now())
    }

    /// Check `candidate` against the windows `at ± skew_steps · period`.
    ///
    /// Comparison is constant-time. Single use is NOT enforced: a valid
    /// code can be replayed within its window unless the caller tracks
    /// consumed (secret, counter) pairs.
    pub fn validate_code(
        &self,
        secret: &str,
        candidate: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let digits = self.config.totp_digits as usize;
        if candidate.len() != digits || !candidate.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }

        let key = self.decode_secret(secret)?;
        let current = self.counter_at(at) as i64;
        let skew = self.config.totp_skew_steps as i64;

        let mut matched = false;
        for offset in -skew..=skew {
            let counter = current + offset;
            if counter < 0 {
                continue;
            }
            let expected = hotp(&key, counter as u64, self.config.totp_digits)?;
            matched |= constant_time_eq(candidate.as_bytes(), expected.as_bytes());
        }

        Ok(matched)
    }

    pub fn validate_code_now(&self, secret: &str, candidate: &str) -> AuthResult<bool> {
        self.validate_code(secret, candidate, Utc::now())
    }

    /// Build the `otpauth://` URI that authenticator apps enroll from.
    ///
    /// Pure formatting, no I/O.
    pub fn provisioning_uri(&self, secret: &str, account: &str, issuer: &str) -> String {
        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits={}&period={}",
            urlencoding::encode(issuer),
            urlencoding::encode(account),
            strip_spaces(secret),
            urlencoding::encode(issuer),
            self.config.totp_digits,
            self.config.totp_period_secs,
        )
    }

    /// Render a provisioning URI as an SVG QR code for enrollment pages.
    pub fn provisioning_qr_svg(&self, uri: &str) -> AuthResult<String> {
        let code = qrcode::QrCode::new(uri)
            .map_err(|e| AuthError::Internal(format!("QR encode: {e}")))?;
        Ok(code.render::<qrcode::render::svg::Color>().build())
    }

    fn counter_at(&self, at: DateTime<Utc>) -> u64 {
        let unix = at.timestamp().max(0) as u64;
        unix / self.config.totp_period_secs.max(1)
    }

    fn decode_secret(&self, secret: &str) -> AuthResult<Vec<u8>> {
        base32_decode_nopad(&strip_spaces(secret))
            .ok_or_else(|| AuthError::SecretDecode("not valid unpadded base32".to_string()))
    }
}

/// RFC 4226 HOTP: HMAC-SHA1 over the 8-byte big-endian counter, dynamic
/// truncation, reduced modulo `10^digits` and left-zero-padded.
fn hotp(key: &[u8], counter: u64, digits: u32) -> AuthResult<String> {
    if digits == 0 || digits > 9 {
        return Err(AuthError::Internal(format!(
            "unsupported OTP width: {digits} digits"
        )));
    }

    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| AuthError::Internal(format!("HMAC key: {e}")))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: the last nibble selects a 4-byte window, whose
    // top bit is masked to keep the value a 31-bit integer.
    let offset = (digest[19] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    let code = u64::from(binary) % 10u64.pow(digits);
    Ok(format!("{:0width$}", code, width = digits as usize))
}

/// RFC 4648 base32, uppercase, without padding.
fn base32_encode_nopad(data: &[u8]) -> String {
    let mut output = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer = 0u32;
    let mut bits = 0;

    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            output.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }

    if bits > 0 {
        buffer <<= 5 - bits;
        output.push(BASE32_ALPHABET[(buffer & 0x1f) as usize] as char);
    }

    output
}

/// Decode unpadded uppercase base32; trailing `=` is tolerated. Returns
/// `None` on any character outside the RFC 4648 alphabet.
fn base32_decode_nopad(data: &str) -> Option<Vec<u8>> {
    let data = data.trim_end_matches('=');
    let mut output = Vec::with_capacity(data.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0;

    for ch in data.chars() {
        let value = match ch {
            'A'..='Z' => (ch as u32) - ('A' as u32),
            '2'..='7' => (ch as u32) - ('2' as u32) + 26,
            _ => return None,
        };

        buffer = (buffer << 5) | value;
        bits += 5;

        if bits >= 8 {
            bits -= 8;
            output.push(((buffer >> bits) & 0xff) as u8);
        }
    }

    Some(output)
}

fn strip_spaces(secret: &str) -> String {
    secret.chars().filter(|c| *c != ' ').collect()
}

fn group_secret(encoded: &str) -> String {
    let mut output = String::with_capacity(encoded.len() + encoded.len() / SECRET_GROUP_LEN);
    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % SECRET_GROUP_LEN == 0 {
            output.push(' ');
        }
        output.push(ch);
    }
    output
}

/// Compare two byte slices without an input-dependent early exit.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
