//! Signing and verification behind the `CryptoSuite` seam.
//!
//! # Design Decisions
//! - The core only calls `hash`, `sign` and `verify`; curve math lives in `k256`
//! - Signatures are DER-encoded ECDSA over a SHA-256 digest
//! - Private keys never appear in `Debug` output or logs

use std::fmt;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from key handling and signing.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("certificate does not match private key for {msp_id}")]
    KeyMismatch { msp_id: String },

    #[error("unsupported crypto family '{0}'")]
    UnsupportedFamily(String),

    #[error("cannot read key material at {path}: {message}")]
    KeyMaterial { path: String, message: String },
}

/// Handle to private key material. The bytes are never printed.
#[derive(Clone)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse a hex string, with or without `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let trimmed = text.trim();
        let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex::decode(hex_str)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPrivateKey(format!("bad hex: {}", e)))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Signature algorithm family named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoFamily {
    Ecdsa,
}

impl std::str::FromStr for CryptoFamily {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecdsa" => Ok(CryptoFamily::Ecdsa),
            other => Err(CryptoError::UnsupportedFamily(other.to_string())),
        }
    }
}

/// Primitive operations the lifecycle engine depends on.
pub trait CryptoSuite: Send + Sync + fmt::Debug {
    fn family(&self) -> CryptoFamily;

    /// Digest a message.
    fn hash(&self, message: &[u8]) -> Vec<u8>;

    /// Sign a digest produced by [`CryptoSuite::hash`].
    fn sign(&self, digest: &[u8], key: &PrivateKey) -> Result<Vec<u8>, CryptoError>;

    /// Check `signature` over `digest` against an encoded public key.
    fn verify(&self, public_key: &[u8], signature: &[u8], digest: &[u8]) -> bool;

    /// Encoded public key belonging to `key`.
    fn public_key(&self, key: &PrivateKey) -> Result<Vec<u8>, CryptoError>;

    /// Hash then sign.
    fn sign_message(&self, message: &[u8], key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let digest = self.hash(message);
        self.sign(&digest, key)
    }

    /// Hash then verify.
    fn verify_message(&self, public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
        let digest = self.hash(message);
        self.verify(public_key, signature, &digest)
    }
}

/// ECDSA over secp256k1 with SHA-256 digests.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaSuite;

impl EcdsaSuite {
    pub fn new() -> Self {
        Self
    }

    fn signing_key(key: &PrivateKey) -> Result<SigningKey, CryptoError> {
        SigningKey::from_slice(key.expose())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
    }
}

impl CryptoSuite for EcdsaSuite {
    fn family(&self) -> CryptoFamily {
        CryptoFamily::Ecdsa
    }

    fn hash(&self, message: &[u8]) -> Vec<u8> {
        Sha256::digest(message).to_vec()
    }

    fn sign(&self, digest: &[u8], key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let signing_key = Self::signing_key(key)?;
        let signature: Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], signature: &[u8], digest: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(signature) else {
            return false;
        };
        verifying_key.verify_prehash(digest, &signature).is_ok()
    }

    fn public_key(&self, key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let signing_key = Self::signing_key(key)?;
        Ok(signing_key.verifying_key().to_sec1_bytes().to_vec())
    }
}

/// Build the suite named by a configured family string.
pub fn suite_for(family: &str) -> Result<Box<dyn CryptoSuite>, CryptoError> {
    match family.parse::<CryptoFamily>()? {
        CryptoFamily::Ecdsa => Ok(Box::new(EcdsaSuite::new())),
    }
}
