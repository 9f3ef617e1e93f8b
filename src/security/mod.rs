//! Credential and second-factor management.

pub mod token;
pub mod totp;

pub use token::{PrincipalLookup, TokenManager};
pub use totp::TotpManager;
