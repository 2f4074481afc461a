use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{HubError, HubResult};

/// Claims carried in a hub access token.
///
/// The hub signs its tokens server-side; the client only reads the payload
/// to learn when the token expires, so the signature is deliberately not
/// verified here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user's email
    pub sub: String,
    /// Numeric user identifier
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    /// Issued-at, seconds since the Unix epoch
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Decode the payload of an access token without verifying its signature
    pub fn decode(token: &str) -> HubResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        // Expiry comparison happens in is_token_expired, not inside the decoder
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|e| HubError::InvalidToken {
            reason: e.to_string(),
        })?;

        Ok(data.claims)
    }
}

/// Check whether a token's expiry claim is in the past.
///
/// A token that cannot be decoded counts as expired: treating garbage as
/// valid would let a broken session linger.
pub fn is_token_expired(token: &str) -> bool {
    match Claims::decode(token) {
        Ok(claims) => claims.exp <= Utc::now().timestamp(),
        Err(_) => true,
    }
}

/// Seconds until the token expires, clamped at zero.
///
/// Undecodable tokens report zero, consistent with [`is_token_expired`].
pub fn time_until_expiry(token: &str) -> i64 {
    match Claims::decode(token) {
        Ok(claims) => (claims.exp - Utc::now().timestamp()).max(0),
        Err(_) => 0,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    /// Build a signed token whose expiry sits `offset_secs` from now
    pub fn make_token(sub: &str, offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            user_id: Some(42),
            exp: now + offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("test token encodes")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::make_token;
    use super::*;

    #[test]
    fn decodes_claims_without_verification() {
        let token = make_token("jean.dupont@smartsolutions.fr", 3600);
        let claims = Claims::decode(&token).unwrap();
        assert_eq!(claims.sub, "jean.dupont@smartsolutions.fr");
        assert_eq!(claims.user_id, Some(42));
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let token = make_token("user@example.com", 3600);
        assert!(!is_token_expired(&token));
        assert!(time_until_expiry(&token) > 3590);
    }

    #[test]
    fn past_expiry_is_expired() {
        let token = make_token("user@example.com", -60);
        assert!(is_token_expired(&token));
        assert_eq!(time_until_expiry(&token), 0);
    }

    #[test]
    fn malformed_token_is_expired() {
        assert!(is_token_expired("not-a-jwt"));
        assert!(is_token_expired(""));
        assert!(is_token_expired("aGVsbG8.aGVsbG8.aGVsbG8"));
        assert_eq!(time_until_expiry("not-a-jwt"), 0);
    }

    #[test]
    fn decode_failure_is_invalid_token_error() {
        let result = Claims::decode("garbage");
        assert!(matches!(result, Err(HubError::InvalidToken { .. })));
    }
}
