//! Second-factor enrollment and validation flow through the public API.

use anyhow::Result;
use chrono::{TimeZone, Utc};

use auth_core::{AuthError, TotpConfig, TotpManager};

fn manager() -> TotpManager {
    TotpManager::new(TotpConfig::default())
}

#[test]
fn enrollment_round_trip() -> Result<()> {
    let manager = manager();

    let secret = manager.generate_secret()?;
    let now = Utc.timestamp_opt(1_754_000_000, 0).unwrap();

    let code = manager.generate_code(&secret, now)?;
    assert_eq!(code.len(), 6);
    assert!(manager.validate_code(&secret, &code, now)?);

    // Distinct enrollments produce distinct secrets.
    assert_ne!(secret, manager.generate_secret()?);

    Ok(())
}

#[test]
fn codes_survive_one_period_of_clock_drift_but_not_two() -> Result<()> {
    let manager = manager();
    let secret = manager.generate_secret()?;
    let issued = Utc.timestamp_opt(1_754_000_000, 0).unwrap();

    let code = manager.generate_code(&secret, issued)?;

    for drift in [-29i64, 0, 29] {
        let at = Utc.timestamp_opt(1_754_000_000 + drift, 0).unwrap();
        assert!(
            manager.validate_code(&secret, &code, at)?,
            "drift {drift}s should be tolerated"
        );
    }

    // Deterministic far-drift rejection: the shared RFC 6238 secret at
    // t=59 yields "287082"; two periods later its window has passed.
    let rfc_secret = "GEZD GNBV GY3T QOJQ GEZD GNBV GY3T QOJQ";
    let issued = Utc.timestamp_opt(59, 0).unwrap();
    let code = manager.generate_code(rfc_secret, issued)?;
    assert_eq!(code, "287082");
    let far = Utc.timestamp_opt(59 + 60, 0).unwrap();
    assert!(!manager.validate_code(rfc_secret, &code, far)?);

    Ok(())
}

#[test]
fn validation_rejects_garbage_without_leaking_codes() -> Result<()> {
    let manager = manager();
    let now = Utc.timestamp_opt(1_754_000_000, 0).unwrap();

    assert!(matches!(
        manager.generate_code("not-base32!!!", now),
        Err(AuthError::SecretDecode(_))
    ));
    assert!(matches!(
        manager.validate_code("not-base32!!!", "123456", now),
        Err(AuthError::SecretDecode(_))
    ));

    Ok(())
}

#[test]
fn provisioning_artifacts_use_the_unformatted_secret() -> Result<()> {
    let manager = manager();
    let secret = manager.generate_secret()?;
    let compact: String = secret.chars().filter(|c| *c != ' ').collect();

    let uri = manager.provisioning_uri(&secret, "alice@example.com", "Acme");
    assert!(uri.starts_with("otpauth://totp/Acme:alice%40example.com?"));
    assert!(uri.contains(&format!("secret={compact}")));
    assert!(uri.contains("algorithm=SHA1"));
    assert!(uri.contains("digits=6"));
    assert!(uri.contains("period=30"));
    assert!(!uri.contains(' '));

    let svg = manager.provisioning_qr_svg(&uri)?;
    assert!(svg.contains("<svg"));

    Ok(())
}

#[test]
fn custom_parameters_flow_through() -> Result<()> {
    let manager = TotpManager::new(TotpConfig {
        totp_secret_len: 32,
        totp_digits: 8,
        totp_period_secs: 60,
        totp_skew_steps: 1,
    });

    let secret = manager.generate_secret()?;
    let now = Utc.timestamp_opt(1_754_000_000, 0).unwrap();

    let code = manager.generate_code(&secret, now)?;
    assert_eq!(code.len(), 8);
    assert!(manager.validate_code(&secret, &code, now)?);

    let uri = manager.provisioning_uri(&secret, "alice@example.com", "Acme");
    assert!(uri.contains("digits=8"));
    assert!(uri.contains("period=60"));

    Ok(())
}
