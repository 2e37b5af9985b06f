//! Byte encoding for signed structures.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Encoding or decoding failure.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Encode a message to bytes.
pub fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|source| CodecError::Encode { what, source })
}

/// Decode a message from bytes.
pub fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{BlockchainInfo, SerializedIdentity};

    #[test]
    fn test_encoding_is_stable() {
        let id = SerializedIdentity {
            msp_id: "Org1MSP".into(),
            id_bytes: vec![1, 2, 3],
        };
        let a = encode("identity", &id).unwrap();
        let b = encode("identity", &id.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_error_names_message() {
        let err = decode::<BlockchainInfo>("chain info", b"not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to decode chain info"));
    }
}
