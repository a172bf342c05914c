// This project was developed with assistance from GitHub Copilot
// Key management functionality for the JWKS server

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::KeyStoreError;
use crate::types::{ManagedKey, PublicJwk};

/// Modulus size of every generated key
pub const RSA_KEY_BITS: usize = 2048;

/// Kid of the key seeded as currently valid
pub const ACTIVE_KEY_ID: &str = "active-key";

/// Kid of the key seeded as already expired
pub const EXPIRED_KEY_ID: &str = "expired-key";

/// Current wall-clock time in epoch seconds
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

impl ManagedKey {
    /// Generate a fresh RSA key pair expiring at `expires_at`
    pub fn generate(kid: &str, expires_at: i64) -> Result<Self, KeyStoreError> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)?;
        let public_key = RsaPublicKey::from(&private_key);

        Ok(ManagedKey {
            kid: kid.to_string(),
            private_key,
            public_key,
            expires_at,
        })
    }

    /// A key is active only while `expires_at` is strictly in the future
    pub fn is_active_at(&self, now: i64) -> bool {
        self.expires_at > now
    }

    /// Check if the key is currently active
    pub fn is_active(&self) -> bool {
        self.is_active_at(now_epoch())
    }

    /// Export the public half as a JWK
    pub fn public_jwk(&self) -> PublicJwk {
        let n_bytes = self.public_key.n().to_bytes_be();
        let e_bytes = self.public_key.e().to_bytes_be();

        PublicJwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            n: URL_SAFE_NO_PAD.encode(&n_bytes),
            e: URL_SAFE_NO_PAD.encode(&e_bytes),
        }
    }
}

/// In-memory set of signing keys, keyed by kid.
///
/// Iteration is in ascending kid order, which fixes both the JWKS order and
/// the tie-break of [`KeyStore::latest_active`].
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<BTreeMap<String, Arc<ManagedKey>>>,
}

impl KeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one active and one expired key
    pub fn seeded(config: &Config) -> Result<Self, KeyStoreError> {
        let store = Self::new();
        store.create_key(ACTIVE_KEY_ID, config.active_key_ttl_secs)?;
        store.create_expired_key(EXPIRED_KEY_ID, config.expired_key_age_secs)?;
        Ok(store)
    }

    /// Generate a key that expires `ttl_seconds` from now.
    ///
    /// A negative TTL yields an already-expired key. An existing key with the
    /// same kid is replaced.
    pub fn create_key(
        &self,
        kid: &str,
        ttl_seconds: i64,
    ) -> Result<Arc<ManagedKey>, KeyStoreError> {
        let expires_at = now_epoch().saturating_add(ttl_seconds);
        self.insert_generated(kid, expires_at)
    }

    /// Generate a key that expired `seconds_ago` seconds before now
    pub fn create_expired_key(
        &self,
        kid: &str,
        seconds_ago: i64,
    ) -> Result<Arc<ManagedKey>, KeyStoreError> {
        let expires_at = now_epoch().saturating_sub(seconds_ago);
        self.insert_generated(kid, expires_at)
    }

    fn insert_generated(
        &self,
        kid: &str,
        expires_at: i64,
    ) -> Result<Arc<ManagedKey>, KeyStoreError> {
        // Generation is slow; keep it outside the write lock.
        let key = Arc::new(ManagedKey::generate(kid, expires_at)?);
        self.insert(Arc::clone(&key));
        info!(kid = %kid, expires_at, "Created signing key");
        Ok(key)
    }

    /// Insert an already-built key, replacing any key with the same kid
    pub fn insert(&self, key: Arc<ManagedKey>) {
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = keys.insert(key.kid.clone(), key) {
            warn!(kid = %previous.kid, "Replaced existing signing key");
        }
    }

    /// Exact lookup by kid, regardless of expiry
    pub fn find_by_kid(&self, kid: &str) -> Option<Arc<ManagedKey>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(kid).cloned()
    }

    /// The active key with the latest expiry, evaluated against the current time
    pub fn latest_active(&self) -> Option<Arc<ManagedKey>> {
        self.latest_active_at(now_epoch())
    }

    /// The active key with the latest expiry as of `now`.
    ///
    /// Among keys sharing the latest expiry the smallest kid wins.
    pub fn latest_active_at(&self, now: i64) -> Option<Arc<ManagedKey>> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.values()
            .filter(|key| key.is_active_at(now))
            .fold(None, |best: Option<&Arc<ManagedKey>>, key| match best {
                Some(b) if b.expires_at >= key.expires_at => Some(b),
                _ => Some(key),
            })
            .cloned()
    }

    /// Public JWKs of all currently active keys
    pub fn active_public_jwks(&self) -> Vec<PublicJwk> {
        self.active_public_jwks_at(now_epoch())
    }

    /// Public JWKs of all keys active as of `now`, in kid order
    pub fn active_public_jwks_at(&self, now: i64) -> Vec<PublicJwk> {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.values()
            .filter(|key| key.is_active_at(now))
            .map(|key| key.public_jwk())
            .collect()
    }

    /// Number of keys held, expired ones included
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no keys at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
