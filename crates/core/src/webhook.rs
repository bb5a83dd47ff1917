//! Payment-processor webhook signature verification.
//!
//! The processor signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and sends the result in a header shaped like
//! `t=1700000000,v1=<hex signature>`. Verification checks the timestamp
//! against a tolerance window before comparing signatures; the comparison
//! itself goes through [`hmac::Mac::verify_slice`], which is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;
use crate::hex;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed skew between the signed timestamp and now, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parse a `t=..,v1=..` signature header into (timestamp, hex signature).
pub fn parse_signature_header(header: &str) -> Result<(i64, String), CoreError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<String> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = Some(value.to_string()),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(sig)) if !sig.is_empty() => Ok((t, sig)),
        _ => Err(CoreError::Validation(
            "Invalid signature header format".into(),
        )),
    }
}

/// Compute the hex HMAC-SHA256 signature for a timestamped payload.
///
/// This is the same construction the processor uses, exposed so tests can
/// sign synthetic deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook delivery against the shared `secret`.
///
/// `now_unix` is passed in rather than read from the clock so the tolerance
/// window is testable. Any failure maps to a client error at the API layer.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), CoreError> {
    let (timestamp, signature_hex) = parse_signature_header(header)?;

    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(CoreError::Validation(
            "Signature timestamp outside tolerance window".into(),
        ));
    }

    let signature = hex::decode(&signature_hex)
        .ok_or_else(|| CoreError::Validation("Signature is not valid hex".into()))?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| CoreError::Validation("Invalid signature".into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    fn header_for(payload: &[u8], timestamp: i64) -> String {
        format!("t={timestamp},v1={}", sign_payload(SECRET, timestamp, payload))
    }

    #[test]
    fn parses_well_formed_header() {
        let (t, sig) = parse_signature_header("t=1700000000,v1=abcdef12").unwrap();
        assert_eq!(t, 1_700_000_000);
        assert_eq!(sig, "abcdef12");
    }

    #[test]
    fn parse_ignores_extra_schemes() {
        let (t, sig) = parse_signature_header("t=5,v0=old,v1=aa11").unwrap();
        assert_eq!(t, 5);
        assert_eq!(sig, "aa11");
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!(parse_signature_header("v1=abcdef").is_err());
        assert!(parse_signature_header("t=1700000000").is_err());
        assert!(parse_signature_header("garbage").is_err());
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = header_for(payload, NOW);
        assert!(verify_signature(payload, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = header_for(payload, NOW);
        let result = verify_signature(b"{}", &header, SECRET, NOW);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"body";
        let header = header_for(payload, NOW);
        assert!(verify_signature(payload, &header, "other_secret", NOW).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"body";
        let stale = NOW - SIGNATURE_TOLERANCE_SECS - 1;
        let header = header_for(payload, stale);
        assert!(verify_signature(payload, &header, SECRET, NOW).is_err());
    }

    #[test]
    fn accepts_timestamp_at_tolerance_edge() {
        let payload = b"body";
        let edge = NOW - SIGNATURE_TOLERANCE_SECS;
        let header = header_for(payload, edge);
        assert!(verify_signature(payload, &header, SECRET, NOW).is_ok());
    }
}
