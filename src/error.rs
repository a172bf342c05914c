// This project was developed with assistance from GitHub Copilot
// Error types for key management, token issuance and configuration

use thiserror::Error;

/// Failures while generating or preparing RSA key material.
///
/// These only occur while seeding or creating keys and are fatal at startup.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("RSA key generation failed: {0}")]
    KeyGeneration(#[from] rsa::Error),
}

/// Request-scoped failures of the issuance policy.
#[derive(Debug, Error)]
pub enum IssueError {
    /// No key in the store is currently active.
    #[error("No active key available")]
    NoActiveKey,

    /// A specifically requested key is not in the store.
    #[error("Signing key not found: {kid}")]
    KeyNotFound { kid: String },

    /// The private key could not be serialized for the signer.
    #[error("Private key encoding failed: {0}")]
    KeyEncoding(#[from] rsa::pkcs1::Error),

    /// The JWT library rejected the key or failed to sign.
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}
