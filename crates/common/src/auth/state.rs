//! Signed, time-boxed authorization state tokens
//!
//! The OAuth provider's redirect is an untrusted hop through the user's
//! browser. The `state` parameter therefore has to prove that this server
//! issued it for this professional/user pair, and it has to expire. The token
//! is self-contained: `base64url(payload) "." base64url(mac)` where the
//! payload is `base64url(professional_id):base64url(user_id):issued_at_millis`
//! and the MAC is HMAC-SHA256 over the payload under a server-held secret.
//! Encoding the identity segments keeps the payload unambiguous even when an
//! id contains the separator. Nothing is stored server-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Validity window for a minted token, in minutes. Hard timeout.
pub const STATE_VALIDITY_MINUTES: i64 = 30;

/// Error type for state token verification.
///
/// Callers must treat both variants as equivalent-severity authorization
/// failures; neither may be distinguished in user-facing output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateTokenError {
    #[error("state token signature invalid")]
    InvalidSignature,

    #[error("state token expired")]
    Expired,
}

/// Identities embedded in a verified state token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateClaims {
    pub professional_id: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
}

/// Mints and verifies signed authorization state tokens.
#[derive(Clone)]
pub struct StateTokenService {
    secret: Vec<u8>,
}

impl StateTokenService {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// Mint a token binding `professional_id` to `user_id` at instant `now`.
    #[must_use]
    pub fn mint(&self, professional_id: &str, user_id: &str, now: DateTime<Utc>) -> String {
        let payload = format!(
            "{}:{}:{}",
            URL_SAFE_NO_PAD.encode(professional_id.as_bytes()),
            URL_SAFE_NO_PAD.encode(user_id.as_bytes()),
            now.timestamp_millis()
        );
        let mac = self.compute_mac(payload.as_bytes());
        format!("{}.{}", URL_SAFE_NO_PAD.encode(payload.as_bytes()), URL_SAFE_NO_PAD.encode(mac))
    }

    /// Verify a token at instant `now`, returning the embedded identities.
    ///
    /// The MAC comparison is constant-time (`Mac::verify_slice`). Signature
    /// failure is checked before expiry so a forged token never learns
    /// whether its timestamp would have been acceptable.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<StateClaims, StateTokenError> {
        let (payload_b64, mac_b64) =
            token.split_once('.').ok_or(StateTokenError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| StateTokenError::InvalidSignature)?;
        let mac =
            URL_SAFE_NO_PAD.decode(mac_b64).map_err(|_| StateTokenError::InvalidSignature)?;

        let mut verifier = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| StateTokenError::InvalidSignature)?;
        verifier.update(&payload);
        verifier.verify_slice(&mac).map_err(|_| StateTokenError::InvalidSignature)?;

        let payload =
            String::from_utf8(payload).map_err(|_| StateTokenError::InvalidSignature)?;
        let claims = parse_payload(&payload).ok_or(StateTokenError::InvalidSignature)?;

        let age = now - claims.issued_at;
        if age > chrono::Duration::minutes(STATE_VALIDITY_MINUTES) {
            return Err(StateTokenError::Expired);
        }

        Ok(claims)
    }

    fn compute_mac(&self, payload: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, so construction cannot fail.
        #[allow(clippy::expect_used)]
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn parse_payload(payload: &str) -> Option<StateClaims> {
    let mut parts = payload.split(':');
    let professional_id = decode_segment(parts.next()?)?;
    let user_id = decode_segment(parts.next()?)?;
    let millis: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let issued_at = DateTime::<Utc>::from_timestamp_millis(millis)?;
    if professional_id.is_empty() || user_id.is_empty() {
        return None;
    }

    Some(StateClaims { professional_id, user_id, issued_at })
}

fn decode_segment(segment: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn service() -> StateTokenService {
        StateTokenService::new(b"test-signing-secret".to_vec())
    }

    #[test]
    fn round_trips_within_validity_window() {
        let svc = service();
        let now = Utc::now();
        let token = svc.mint("prof-1", "user-1", now);

        let claims = svc.verify(&token, now + Duration::minutes(29)).expect("token verifies");
        assert_eq!(claims.professional_id, "prof-1");
        assert_eq!(claims.user_id, "user-1");
    }

    #[test]
    fn ids_with_separators_round_trip_unambiguously() {
        let svc = service();
        let now = Utc::now();
        let token = svc.mint("prof:1", "user:a:b", now);

        let claims = svc.verify(&token, now).expect("token verifies");
        assert_eq!(claims.professional_id, "prof:1");
        assert_eq!(claims.user_id, "user:a:b");
    }

    #[test]
    fn rejects_expired_token() {
        let svc = service();
        let now = Utc::now();
        let token = svc.mint("prof-1", "user-1", now);

        let err = svc.verify(&token, now + Duration::minutes(31)).expect_err("token expired");
        assert_eq!(err, StateTokenError::Expired);
    }

    #[test]
    fn rejects_any_flipped_signature_bit() {
        let svc = service();
        let now = Utc::now();
        let token = svc.mint("prof-1", "user-1", now);
        let (payload_b64, mac_b64) = token.split_once('.').expect("token has two parts");

        let mut mac = URL_SAFE_NO_PAD.decode(mac_b64).expect("mac decodes");
        for byte in 0..mac.len() {
            for bit in 0..8 {
                mac[byte] ^= 1 << bit;
                let tampered = format!("{payload_b64}.{}", URL_SAFE_NO_PAD.encode(&mac));
                assert_eq!(
                    svc.verify(&tampered, now),
                    Err(StateTokenError::InvalidSignature),
                    "flipped bit {bit} of byte {byte} must invalidate the token"
                );
                mac[byte] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn rejects_tampered_payload() {
        let svc = service();
        let now = Utc::now();
        let token = svc.mint("prof-1", "user-1", now);
        let (_, mac_b64) = token.split_once('.').expect("token has two parts");

        let forged_payload =
            URL_SAFE_NO_PAD.encode(format!("prof-2:user-1:{}", now.timestamp_millis()));
        let forged = format!("{forged_payload}.{mac_b64}");
        assert_eq!(svc.verify(&forged, now), Err(StateTokenError::InvalidSignature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let now = Utc::now();
        let token = service().mint("prof-1", "user-1", now);
        let other = StateTokenService::new(b"different-secret".to_vec());
        assert_eq!(other.verify(&token, now), Err(StateTokenError::InvalidSignature));
    }

    #[test]
    fn rejects_garbage_tokens() {
        let svc = service();
        let now = Utc::now();
        for garbage in ["", "not-a-token", "a.b", "a.b.c", "%%%.###"] {
            assert_eq!(svc.verify(garbage, now), Err(StateTokenError::InvalidSignature));
        }
    }
}
