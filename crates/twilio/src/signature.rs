//! Twilio webhook signature validation.
//!
//! Twilio signs each webhook with HMAC-SHA1 over the full request URL
//! followed by every POST parameter, sorted by key, appended as `{key}{value}`.
//! The digest is base64-encoded into the `X-Twilio-Signature` header.

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    hmac::{Hmac, Mac},
    secrecy::{ExposeSecret, Secret},
    sha1::Sha1,
    tracing::warn,
};

type HmacSha1 = Hmac<Sha1>;

/// Validates that a webhook genuinely originated from Twilio.
pub struct SignatureValidator {
    auth_token: Secret<String>,
}

impl std::fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureValidator")
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

impl SignatureValidator {
    #[must_use]
    pub fn new(auth_token: Secret<String>) -> Self {
        Self { auth_token }
    }

    /// Check `signature` against the expected signature for `url` and the
    /// form `params`. Returns false (never panics) on any malformed input.
    #[must_use]
    pub fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        if signature.is_empty() {
            return false;
        }

        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut payload = String::from(url);
        for (key, value) in sorted {
            payload.push_str(key);
            payload.push_str(value);
        }

        let mut mac = match HmacSha1::new_from_slice(self.auth_token.expose_secret().as_bytes()) {
            Ok(mac) => mac,
            Err(_) => {
                warn!("failed to create HMAC for signature validation");
                return false;
            },
        };
        mac.update(payload.as_bytes());
        let expected = STANDARD.encode(mac.finalize().into_bytes());

        // Constant-time comparison to prevent timing attacks.
        constant_time_eq(&expected, signature)
    }
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "12345678901234567890123456789012";

    fn sign(url: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();
        let mut payload = String::from(url);
        for (key, value) in sorted {
            payload.push_str(key);
            payload.push_str(value);
        }
        let mut mac = HmacSha1::new_from_slice(TOKEN.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".into(), "whatsapp:+15551234567".into()),
            ("Body".into(), "hello".into()),
            ("NumMedia".into(), "0".into()),
        ]
    }

    #[test]
    fn valid_signature_accepted() {
        let validator = SignatureValidator::new(Secret::new(TOKEN.into()));
        let url = "https://example.com/whatsapp";
        let params = params();
        let signature = sign(url, &params);
        assert!(validator.validate(url, &params, &signature));
    }

    #[test]
    fn tampered_field_rejected() {
        let validator = SignatureValidator::new(Secret::new(TOKEN.into()));
        let url = "https://example.com/whatsapp";
        let mut params = params();
        let signature = sign(url, &params);
        params[1].1 = "hello!".into();
        assert!(!validator.validate(url, &params, &signature));
    }

    #[test]
    fn tampered_url_rejected() {
        let validator = SignatureValidator::new(Secret::new(TOKEN.into()));
        let params = params();
        let signature = sign("https://example.com/whatsapp", &params);
        assert!(!validator.validate("http://example.com/whatsapp", &params, &signature));
    }

    #[test]
    fn malformed_signature_rejected() {
        let validator = SignatureValidator::new(Secret::new(TOKEN.into()));
        let params = params();
        assert!(!validator.validate("https://example.com/whatsapp", &params, ""));
        assert!(!validator.validate("https://example.com/whatsapp", &params, "not base64 at all"));
    }

    #[test]
    fn param_order_does_not_matter() {
        let validator = SignatureValidator::new(Secret::new(TOKEN.into()));
        let url = "https://example.com/whatsapp";
        let params = params();
        let signature = sign(url, &params);

        let mut reversed = params.clone();
        reversed.reverse();
        assert!(validator.validate(url, &reversed, &signature));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("", "a"));
    }
}
