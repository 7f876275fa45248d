//! # Content Encryption Keys
//!
//! A CEK is a single-use 256-bit AES key protecting one file. It is
//! generated fresh per encryption, held only for the duration of that call,
//! and wiped before the call returns.
//!
//! ## Lifetime
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CEK LIFETIME                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  generate() ──► encrypt plaintext ──► wrap for recipient ──► destroy() │
//! │      │                                                          ▲       │
//! │      │                  error / panic / early return            │       │
//! │      └──────────────────────────────────────────────────► Drop ─┘       │
//! │                                                                         │
//! │  Drop zeroizes too, so every exit path wipes the 32 bytes.              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of a content encryption key in bytes (256 bits)
pub const CEK_SIZE: usize = 32;

/// A per-file AES-256-GCM content encryption key
///
/// Never persisted, never logged, never returned from
/// [`encrypt_for_recipient`](crate::seal::encrypt_for_recipient).
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentEncryptionKey([u8; CEK_SIZE]);

impl ContentEncryptionKey {
    /// Generate a fresh CEK from the operating system CSPRNG
    ///
    /// ## Errors
    ///
    /// Returns `RandomSourceFailure` if the OS random source is
    /// unavailable. There is no fallback to a weaker source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; CEK_SIZE];
        if OsRng.try_fill_bytes(&mut bytes).is_err() {
            tracing::error!("OS random source unavailable while generating CEK");
            return Err(Error::RandomSourceFailure);
        }
        Ok(Self(bytes))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; CEK_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, typically the output of a wallet unwrap
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; CEK_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "CEK must be {} bytes, got {}",
                CEK_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw key bytes
    ///
    /// ## Security Warning
    ///
    /// Never log or persist these bytes.
    pub fn as_bytes(&self) -> &[u8; CEK_SIZE] {
        &self.0
    }

    /// Overwrite all key bytes with zero
    ///
    /// Dropping the key does the same; call this to wipe at a precise point.
    pub fn destroy(&mut self) {
        self.0.zeroize();
    }

    /// Whether the key has been wiped
    pub fn is_destroyed(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Debug for ContentEncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentEncryptionKey([REDACTED])")
    }
}

// ============================================================================
// TESTS
// ============================================================================
