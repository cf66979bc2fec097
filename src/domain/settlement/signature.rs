//! Gateway notification signature verification.
//!
//! The gateway signs the manifest `id:<dataId>;request-id:<requestId>;ts:<ts>;`
//! with HMAC-SHA256 and sends `x-signature: ts=<ts>,v1=<hex digest>` plus
//! `x-request-id: <requestId>`.
//!
//! Verification answers yes or no. Malformed input is simply "no", and an
//! unset secret rejects everything.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Parsed components of the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Timestamp exactly as sent; it is signed verbatim.
    pub ts: String,
    /// Decoded v1 digest.
    pub v1: Vec<u8>,
}

impl SignatureHeader {
    /// Parses `ts=<ts>,v1=<hex>`. Unknown keys are ignored.
    pub fn parse(header: &str) -> Option<Self> {
        let mut ts: Option<String> = None;
        let mut v1: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.split_once('=')?;
            match key.trim() {
                "ts" => ts = Some(value.trim().to_string()),
                "v1" => v1 = Some(hex::decode(value.trim()).ok()?),
                _ => {}
            }
        }

        let ts = ts.filter(|t| !t.is_empty())?;
        let v1 = v1.filter(|d| !d.is_empty())?;
        Some(Self { ts, v1 })
    }
}

/// Builds the exact string the gateway signs.
pub fn signature_manifest(data_id: &str, request_id: &str, ts: &str) -> String {
    format!("id:{};request-id:{};ts:{};", data_id, request_id, ts)
}

/// Verifier holding the shared notification secret.
pub struct SignatureVerifier {
    secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// True only if the secret is configured and the digest matches.
    pub fn verify(
        &self,
        data_id: &str,
        signature_header: Option<&str>,
        request_id: Option<&str>,
    ) -> bool {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            tracing::error!("Notification secret not configured, rejecting signature");
            return false;
        }

        let (Some(header), Some(request_id)) = (signature_header, request_id) else {
            return false;
        };
        if request_id.is_empty() || data_id.is_empty() {
            return false;
        }
        let Some(header) = SignatureHeader::parse(header) else {
            return false;
        };

        let manifest = signature_manifest(data_id, request_id, &header.ts);
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(manifest.as_bytes());
        let expected = mac.finalize().into_bytes();

        constant_time_compare(&expected, &header.v1)
    }
}

/// Length check first, then constant-time byte comparison.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Produces a valid `x-signature` header value, for fixtures and local tooling.
pub fn sign_notification(secret: &str, data_id: &str, request_id: &str, ts: &str) -> String {
    let manifest = signature_manifest(data_id, request_id, ts);
    let digest = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(manifest.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    };
    format!("ts={},v1={}", ts, digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "notification-secret-123";

    fn verifier(secret: &str) -> SignatureVerifier {
        SignatureVerifier::new(SecretString::new(secret.to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Header parsing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parses_ts_and_v1() {
        let header = SignatureHeader::parse("ts=1704908010,v1=abcd").unwrap();
        assert_eq!(header.ts, "1704908010");
        assert_eq!(header.v1, vec![0xab, 0xcd]);
    }

    #[test]
    fn tolerates_spaces_and_unknown_keys() {
        let header = SignatureHeader::parse("ts=1, v1=00ff, v2=zz").unwrap();
        assert_eq!(header.ts, "1");
        assert_eq!(header.v1, vec![0x00, 0xff]);
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(SignatureHeader::parse("v1=abcd").is_none());
        assert!(SignatureHeader::parse("ts=1").is_none());
        assert!(SignatureHeader::parse("ts=1,v1=").is_none());
        assert!(SignatureHeader::parse("garbage").is_none());
        assert!(SignatureHeader::parse("ts=1,v1=not-hex").is_none());
    }

    #[test]
    fn manifest_format_is_exact() {
        assert_eq!(
            signature_manifest("123", "req-1", "999"),
            "id:123;request-id:req-1;ts:999;"
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn accepts_valid_signature() {
        let header = sign_notification(SECRET, "123456", "req-1", "1704908010000");
        assert!(verifier(SECRET).verify("123456", Some(&header), Some("req-1")));
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = sign_notification("other", "123456", "req-1", "1");
        assert!(!verifier(SECRET).verify("123456", Some(&header), Some("req-1")));
    }

    #[test]
    fn rejects_when_id_differs() {
        let header = sign_notification(SECRET, "123456", "req-1", "1");
        assert!(!verifier(SECRET).verify("654321", Some(&header), Some("req-1")));
    }

    #[test]
    fn rejects_when_request_id_differs_or_missing() {
        let header = sign_notification(SECRET, "123456", "req-1", "1");
        assert!(!verifier(SECRET).verify("123456", Some(&header), Some("req-2")));
        assert!(!verifier(SECRET).verify("123456", Some(&header), None));
        assert!(!verifier(SECRET).verify("123456", Some(&header), Some("")));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(!verifier(SECRET).verify("123456", None, Some("req-1")));
    }

    #[test]
    fn fails_closed_without_secret() {
        let header = sign_notification("", "123456", "req-1", "1");
        assert!(!verifier("").verify("123456", Some(&header), Some("req-1")));
    }

    #[test]
    fn rejects_truncated_digest() {
        let header = sign_notification(SECRET, "123456", "req-1", "1");
        let truncated = &header[..header.len() - 2];
        assert!(!verifier(SECRET).verify("123456", Some(truncated), Some("req-1")));
    }

    proptest! {
        #[test]
        fn tampered_digest_is_always_rejected(byte in 0usize..32, flip in 1u8..=255) {
            let header = sign_notification(SECRET, "42", "req", "7");
            let parsed = SignatureHeader::parse(&header).unwrap();
            let mut digest = parsed.v1.clone();
            digest[byte] ^= flip;
            let forged = format!("ts={},v1={}", parsed.ts, hex::encode(digest));
            prop_assert!(!verifier(SECRET).verify("42", Some(&forged), Some("req")));
        }

        #[test]
        fn arbitrary_headers_never_verify(header in ".*", request_id in ".*") {
            prop_assert!(!verifier(SECRET).verify("42", Some(&header), Some(&request_id)));
        }

        #[test]
        fn unset_secret_rejects_everything(header in ".*") {
            prop_assert!(!verifier("").verify("42", Some(&header), Some("req")));
        }
    }
}
