//! Multikey (`publicKeyMultibase`) encoding
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────────────────────┐
//! │   z     │  Base58btc encoding indicator (multibase)            │
//! ├─────────┼──────────────────────────────────────────────────────┤
//! │ ec 01   │  X25519 public key multicodec (varint 0xec)          │
//! │ ed 01   │  Ed25519 public key multicodec (varint 0xed)         │
//! ├─────────┼──────────────────────────────────────────────────────┤
//! │  ...    │  32-byte public key                                  │
//! └─────────┴──────────────────────────────────────────────────────┘
//! ```

use super::document::KeyType;
use crate::error::{Error, Result};

/// Multicodec prefix for X25519 public keys (0xec in varint encoding)
pub const X25519_MULTICODEC_PREFIX: [u8; 2] = [0xec, 0x01];

/// Multicodec prefix for Ed25519 public keys (0xed in varint encoding)
pub const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

const BASE58BTC_PREFIX: char = 'z';

fn prefix_for(key_type: KeyType) -> [u8; 2] {
    match key_type {
        KeyType::X25519 => X25519_MULTICODEC_PREFIX,
        KeyType::Ed25519 => ED25519_MULTICODEC_PREFIX,
    }
}

/// Encode a raw key as a `z`-prefixed multikey string
pub fn encode_multikey(key_type: KeyType, public_key: &[u8; 32]) -> String {
    let mut multicodec_key = Vec::with_capacity(34);
    multicodec_key.extend_from_slice(&prefix_for(key_type));
    multicodec_key.extend_from_slice(public_key);

    format!(
        "{}{}",
        BASE58BTC_PREFIX,
        bs58::encode(&multicodec_key).into_string()
    )
}

/// Decode a multikey string into its key type and raw bytes
///
/// Only base58btc (`z`) and the X25519/Ed25519 codecs are recognized.
pub fn decode_multikey(value: &str) -> Result<(KeyType, [u8; 32])> {
    let encoded = value.strip_prefix(BASE58BTC_PREFIX).ok_or_else(|| {
        Error::InvalidKey("multibase value must use base58btc ('z')".into())
    })?;

    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| Error::InvalidKey(format!("Invalid base58btc encoding: {}", e)))?;

    if decoded.len() < 2 {
        return Err(Error::InvalidKey("multikey too short".into()));
    }

    let key_type = match [decoded[0], decoded[1]] {
        X25519_MULTICODEC_PREFIX => KeyType::X25519,
        ED25519_MULTICODEC_PREFIX => KeyType::Ed25519,
        other => {
            return Err(Error::InvalidKey(format!(
                "unsupported multicodec prefix {:02x}{:02x}",
                other[0], other[1]
            )))
        }
    };

    let key: [u8; 32] = decoded[2..].try_into().map_err(|_| {
        Error::InvalidKey(format!(
            "Invalid public key length: expected 34 bytes (2 prefix + 32 key), got {}",
            decoded.len()
        ))
    })?;

    Ok((key_type, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x25519_round_trip() {
        let encoded = encode_multikey(KeyType::X25519, &[7u8; 32]);
        assert!(encoded.starts_with("z6LS"));

        let (key_type, key) = decode_multikey(&encoded).unwrap();
        assert_eq!(key_type, KeyType::X25519);
        assert_eq!(key, [7u8; 32]);
    }

    #[test]
    fn test_ed25519_prefix() {
        let encoded = encode_multikey(KeyType::Ed25519, &[0u8; 32]);
        assert!(encoded.starts_with("z6Mk"));
        assert_eq!(decode_multikey(&encoded).unwrap().0, KeyType::Ed25519);
    }

    #[test]
    fn test_rejects_bad_values() {
        // Wrong multibase
        assert!(decode_multikey("m6LSabc").is_err());
        // Not base58
        assert!(decode_multikey("z0OIl").is_err());
        // secp256k1 codec (0xe7)
        let mut bytes = vec![0xe7, 0x01];
        bytes.extend_from_slice(&[1u8; 33]);
        assert!(decode_multikey(&format!("z{}", bs58::encode(&bytes).into_string())).is_err());
        // Truncated key
        let mut short = X25519_MULTICODEC_PREFIX.to_vec();
        short.extend_from_slice(&[1u8; 31]);
        assert!(decode_multikey(&format!("z{}", bs58::encode(&short).into_string())).is_err());
    }
}
