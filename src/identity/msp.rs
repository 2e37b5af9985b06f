//! Signing identity and MSP directory loading.
//!
//! # Security
//! - The private key stays inside [`PrivateKey`] and is never logged
//! - Loading rejects a certificate that does not belong to the key

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::identity::crypto::{CryptoError, CryptoSuite, PrivateKey};
use crate::protocol::codec::{self, CodecError};
use crate::protocol::messages::SerializedIdentity;

/// An enrolled signing identity. Created once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Identity {
    msp_id: String,
    certificate: Vec<u8>,
    private_key: PrivateKey,
}

impl Identity {
    /// Build an identity from in-memory material.
    pub fn new(msp_id: impl Into<String>, certificate: Vec<u8>, private_key: PrivateKey) -> Self {
        Self {
            msp_id: msp_id.into(),
            certificate,
            private_key,
        }
    }

    /// Generate an identity whose certificate is the suite's public key.
    ///
    /// Checks that the private key is usable before returning.
    pub fn from_private_key(
        msp_id: impl Into<String>,
        private_key: PrivateKey,
        suite: &dyn CryptoSuite,
    ) -> Result<Self, CryptoError> {
        let certificate = suite.public_key(&private_key)?;
        Ok(Self::new(msp_id, certificate, private_key))
    }

    /// Load from an MSP directory laid out as `keystore/` + `signcerts/`.
    ///
    /// The newest regular file in each directory wins. Both files hold hex.
    pub fn from_msp_dir(
        msp_id: impl Into<String>,
        msp_path: &Path,
        suite: &dyn CryptoSuite,
    ) -> Result<Self, CryptoError> {
        let msp_id = msp_id.into();
        let key_path = newest_file(&msp_path.join("keystore"))?;
        let cert_path = newest_file(&msp_path.join("signcerts"))?;

        let private_key = PrivateKey::from_hex(&read_text(&key_path)?)?;
        let certificate = hex::decode(read_text(&cert_path)?.trim()).map_err(|e| {
            CryptoError::InvalidPublicKey(format!("{}: bad hex: {}", cert_path.display(), e))
        })?;

        let derived = suite.public_key(&private_key)?;
        if derived != certificate {
            return Err(CryptoError::KeyMismatch { msp_id });
        }

        tracing::info!(
            msp_id = %msp_id,
            keystore = %key_path.display(),
            signcert = %cert_path.display(),
            "Identity loaded"
        );

        Ok(Self::new(msp_id, certificate, private_key))
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Wire form of this identity.
    pub fn serialized(&self) -> SerializedIdentity {
        SerializedIdentity {
            msp_id: self.msp_id.clone(),
            id_bytes: self.certificate.clone(),
        }
    }

    /// Creator bytes embedded in headers and used for the transaction id.
    pub fn creator_bytes(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode("serialized identity", &self.serialized())
    }

    /// Sign arbitrary bytes with this identity.
    pub fn sign(&self, suite: &dyn CryptoSuite, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        suite.sign_message(message, &self.private_key)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn read_text(path: &Path) -> Result<String, CryptoError> {
    fs::read_to_string(path).map_err(|e| CryptoError::KeyMaterial {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn newest_file(dir: &Path) -> Result<PathBuf, CryptoError> {
    let material_err = |message: String| CryptoError::KeyMaterial {
        path: dir.display().to_string(),
        message,
    };

    let entries = fs::read_dir(dir).map_err(|e| material_err(e.to_string()))?;
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| material_err(e.to_string()))?;
        let meta = entry.metadata().map_err(|e| material_err(e.to_string()))?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().map_err(|e| material_err(e.to_string()))?;
        match &newest {
            Some((when, _)) if *when >= modified => {}
            _ => newest = Some((modified, entry.path())),
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| material_err("no key material found".to_string()))
}
