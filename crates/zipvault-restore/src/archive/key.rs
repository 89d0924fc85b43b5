//! Path-safe encoding of record keys.
//!
//! Record keys are arbitrary byte strings, so they are stored as URL-safe
//! base64 without padding. Padded names are still accepted on decode.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::{RestoreError, RestoreResult};

const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a record key as an entry name segment.
pub fn encode_key(key: &[u8]) -> String {
    KEY_ENGINE.encode(key)
}

/// Decode an entry name segment back into the record key.
pub fn decode_key(name: &str) -> RestoreResult<Vec<u8>> {
    KEY_ENGINE
        .decode(name.as_bytes())
        .map_err(|e| RestoreError::KeyDecode {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_key_is_path_safe() {
        let key = b"\xff\xfe/../key?with=chars";
        let encoded = encode_key(key);
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('='));
        assert_eq!(decode_key(&encoded).unwrap(), key.to_vec());
    }

    #[test]
    fn test_decode_accepts_padding() {
        // "Restore Key" with and without trailing '='
        assert_eq!(decode_key("UmVzdG9yZSBLZXk").unwrap(), b"Restore Key");
        assert_eq!(decode_key("UmVzdG9yZSBLZXk=").unwrap(), b"Restore Key");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_key("not base64!").unwrap_err();
        assert!(matches!(err, RestoreError::KeyDecode { .. }));
    }
}
