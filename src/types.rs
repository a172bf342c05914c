// This project was developed with assistance from GitHub Copilot
// Data structures for the JWKS server

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

/// RSA signing key owned by the key store
pub struct ManagedKey {
    pub kid: String,                       // Key ID, unique within the store
    pub(crate) private_key: RsaPrivateKey, // RSA private key
    pub public_key: RsaPublicKey,          // RSA public key
    pub expires_at: i64,                   // Expiry timestamp (epoch seconds)
}

impl std::fmt::Debug for ManagedKey {
    // Private material stays out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedKey")
            .field("kid", &self.kid)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Public half of a managed key in JWK form.
///
/// Only the modulus and exponent are carried; there is deliberately no field
/// that could hold a private RSA parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String, // Key type (RSA)
    pub kid: String, // Key ID
    #[serde(rename = "use")]
    pub key_use: String, // Key usage (sig for signature)
    pub alg: String, // Algorithm (RS256)
    pub n: String,   // Modulus (base64url)
    pub e: String,   // Exponent (base64url)
}

/// JWKS response format
#[derive(Debug, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<PublicJwk>,
}

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expires at
}

/// Auth endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Query parameters for auth endpoint
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub expired: Option<String>,
}

/// Error body returned by the auth endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
