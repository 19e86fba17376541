use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

pub fn get_remote_ip(req: &HttpRequest) -> String {
    req.connection_info().realip_remote_addr().map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string())
}

/// Lower-case hex HMAC-SHA-512 of `body`, as Paystack computes it for the
/// `x-paystack-signature` header.
pub fn calculate_hmac(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this branch is unreachable in practice.
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    let result = mac.finalize().into_bytes();
    result.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verifies a hex-encoded HMAC-SHA-512 signature over `body`. The comparison runs through
/// `Mac::verify_slice`, which is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(expected) = decode_hex(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time equality for header-borne secrets. Both sides are reduced to fixed-length HMAC
/// tags first (the key only needs to be fixed, not secret), and the tag comparison goes through
/// `Mac::verify_slice`.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let Ok(mac) = HmacSha512::new_from_slice(b"header-secret-comparison") else {
        return false;
    };
    let mut lhs = mac.clone();
    lhs.update(a);
    let tag = lhs.finalize().into_bytes();
    let mut rhs = mac;
    rhs.update(b);
    rhs.verify_slice(&tag).is_ok()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hmac_matches_reference_vector() {
        // RFC 4231, test case 2 (key "Jefe", data "what do ya want for nothing?").
        let sig = calculate_hmac("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea2505549758bf75c05a994a6d034f65f8f0e6fd\
             caeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn verify_accepts_the_matching_signature() {
        let body = br#"{"event":"charge.success"}"#;
        let sig = calculate_hmac("sk_test_123", body);
        assert!(verify_signature("sk_test_123", body, &sig));
    }

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq(b"alpha", b"alpha"));
        assert!(!constant_time_eq(b"alpha", b"alphb"));
        assert!(!constant_time_eq(b"alpha", b"alpha "));
        assert!(!constant_time_eq(b"", b"alpha"));
    }

    #[test]
    fn verify_rejects_wrong_key_and_garbage() {
        let body = b"payload";
        let sig = calculate_hmac("right-key", body);
        assert!(!verify_signature("wrong-key", body, &sig));
        assert!(!verify_signature("right-key", body, "not-hex-at-all"));
        assert!(!verify_signature("right-key", body, "abc"));
        assert!(!verify_signature("right-key", body, ""));
    }
}
