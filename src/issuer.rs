// This project was developed with assistance from GitHub Copilot
// Token signing and the issuance policy

use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::pkcs1::EncodeRsaPrivateKey;
use tracing::debug;

use crate::error::IssueError;
use crate::key_management::{EXPIRED_KEY_ID, KeyStore, now_epoch};
use crate::types::{Claims, ManagedKey};

/// Subject placed in every issued token
pub const TOKEN_SUBJECT: &str = "fake-user";

/// Validity of tokens issued with the active key, in seconds
pub const TOKEN_TTL_SECS: i64 = 10 * 60;

/// How far in the past an expired token was issued
pub const EXPIRED_TOKEN_ISSUED_AGO_SECS: i64 = 120;

/// How far in the past an expired token expired
pub const EXPIRED_TOKEN_EXPIRED_AGO_SECS: i64 = 60;

/// Which key a token request should be signed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelector {
    /// The active key with the latest expiry
    Active,
    /// A specific, expected-to-be-expired key
    NamedExpired(String),
}

impl KeySelector {
    /// Selector for the `expired` flag of an auth request
    pub fn from_expired_flag(expired: bool) -> Self {
        if expired {
            KeySelector::NamedExpired(EXPIRED_KEY_ID.to_string())
        } else {
            KeySelector::Active
        }
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySelector::Active => f.write_str("active"),
            KeySelector::NamedExpired(kid) => write!(f, "expired:{kid}"),
        }
    }
}

/// Sign `claims` with `key` as a compact RS256 JWT.
///
/// The key's expiry is not consulted and the claims are not validated.
pub fn sign_with(key: &ManagedKey, claims: &Claims) -> Result<String, IssueError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.kid.clone());

    let der = key.private_key.to_pkcs1_der()?;
    let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

    Ok(encode(&header, claims, &encoding_key)?)
}

/// Claims for a token valid for [`TOKEN_TTL_SECS`] from `now`
pub fn active_claims(now: i64) -> Claims {
    Claims {
        sub: TOKEN_SUBJECT.to_string(),
        iat: now,
        exp: now.saturating_add(TOKEN_TTL_SECS),
    }
}

/// Claims for a token that was issued and expired before `now`
pub fn expired_claims(now: i64) -> Claims {
    Claims {
        sub: TOKEN_SUBJECT.to_string(),
        iat: now.saturating_sub(EXPIRED_TOKEN_ISSUED_AGO_SECS),
        exp: now.saturating_sub(EXPIRED_TOKEN_EXPIRED_AGO_SECS),
    }
}

/// Select a key per `selector`, build the matching claims and sign them
pub fn issue(store: &KeyStore, selector: &KeySelector) -> Result<String, IssueError> {
    issue_at(store, selector, now_epoch())
}

/// [`issue`] evaluated at an explicit time
pub fn issue_at(store: &KeyStore, selector: &KeySelector, now: i64) -> Result<String, IssueError> {
    let (key, claims) = match selector {
        KeySelector::Active => {
            let key = store.latest_active_at(now).ok_or(IssueError::NoActiveKey)?;
            (key, active_claims(now))
        }
        KeySelector::NamedExpired(kid) => {
            let key = store
                .find_by_kid(kid)
                .ok_or_else(|| IssueError::KeyNotFound { kid: kid.clone() })?;
            (key, expired_claims(now))
        }
    };

    let token = sign_with(&key, &claims)?;
    debug!(%selector, kid = %key.kid, exp = claims.exp, "Issued token");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::key_management::ACTIVE_KEY_ID;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header, errors::ErrorKind};

    fn decoding_key(key: &ManagedKey) -> DecodingKey {
        let jwk = key.public_jwk();
        DecodingKey::from_rsa_components(&jwk.n, &jwk.e).expect("bad jwk")
    }

    fn no_exp_check() -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation
    }

    #[test]
    fn test_sign_with_produces_compact_rs256_token() {
        let key = ManagedKey::generate("signer", now_epoch() + 60).unwrap();
        let claims = active_claims(now_epoch());
        let token = sign_with(&key, &claims).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| !p.is_empty() && !p.contains('=')));

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["kid"], "signer");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_claims_saturate_at_time_bounds() {
        let claims = active_claims(i64::MAX);
        assert_eq!(claims.iat, i64::MAX);
        assert_eq!(claims.exp, i64::MAX);

        let claims = expired_claims(i64::MIN);
        assert_eq!(claims.iat, i64::MIN);
        assert_eq!(claims.exp, i64::MIN);
    }

    #[test]
    fn test_signature_round_trip_and_cross_key_rejection() {
        let now = now_epoch();
        let key = ManagedKey::generate("one", now + 60).unwrap();
        let other = ManagedKey::generate("two", now + 60).unwrap();
        let claims = active_claims(now);
        let token = sign_with(&key, &claims).unwrap();

        let decoded = decode::<Claims>(&token, &decoding_key(&key), &no_exp_check()).unwrap();
        assert_eq!(decoded.claims, claims);

        let err = decode::<Claims>(&token, &decoding_key(&other), &no_exp_check()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn test_sign_with_ignores_key_expiry() {
        let key = ManagedKey::generate("stale", now_epoch() - 3600).unwrap();
        let token = sign_with(&key, &active_claims(now_epoch())).unwrap();
        assert!(decode::<Claims>(&token, &decoding_key(&key), &no_exp_check()).is_ok());
    }

    #[test]
    fn test_issue_active_uses_latest_key() {
        let store = KeyStore::seeded(&Config::default()).unwrap();
        let now = now_epoch();
        let token = issue_at(&store, &KeySelector::Active, now).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(ACTIVE_KEY_ID));

        let key = store.find_by_kid(ACTIVE_KEY_ID).unwrap();
        let validation = Validation::new(Algorithm::RS256);
        let claims = decode::<Claims>(&token, &decoding_key(&key), &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.sub, TOKEN_SUBJECT);
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_issue_expired_uses_reserved_key() {
        let store = KeyStore::seeded(&Config::default()).unwrap();
        let now = now_epoch();
        let token = issue_at(&store, &KeySelector::from_expired_flag(true), now).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(EXPIRED_KEY_ID));

        let key = store.find_by_kid(EXPIRED_KEY_ID).unwrap();
        let claims = decode::<Claims>(&token, &decoding_key(&key), &no_exp_check())
            .unwrap()
            .claims;
        assert_eq!(claims.iat, now - 120);
        assert_eq!(claims.exp, now - 60);
        assert!(claims.exp < now_epoch());

        let mut strict = Validation::new(Algorithm::RS256);
        strict.leeway = 0;
        let err = decode::<Claims>(&token, &decoding_key(&key), &strict).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_issue_without_active_key_fails() {
        let store = KeyStore::new();
        store.create_expired_key(EXPIRED_KEY_ID, 60).unwrap();
        let err = issue(&store, &KeySelector::Active).unwrap_err();
        assert!(matches!(err, IssueError::NoActiveKey));
    }

    #[test]
    fn test_issue_expired_without_reserved_key_fails() {
        let store = KeyStore::new();
        store.create_expired_key("some-other-expired", 60).unwrap();
        let selector = KeySelector::NamedExpired(EXPIRED_KEY_ID.to_string());
        let err = issue(&store, &selector).unwrap_err();
        assert!(matches!(err, IssueError::KeyNotFound { ref kid } if kid == EXPIRED_KEY_ID));
    }

    #[test]
    fn test_selector_from_flag() {
        assert_eq!(KeySelector::from_expired_flag(false), KeySelector::Active);
        assert_eq!(
            KeySelector::from_expired_flag(true),
            KeySelector::NamedExpired("expired-key".to_string())
        );
        assert_eq!(KeySelector::Active.to_string(), "active");
    }
}
