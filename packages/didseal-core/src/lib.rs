//! # didseal Core
//!
//! Envelope encryption of files for a recipient identified only by a DID.
//! Content is sealed under a single-use AES-256-GCM key, and that key is
//! wrapped for the recipient's X25519 key-agreement key with ECDH-ES.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DIDSEAL CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │     DID     │  │    Seal     │  │  Envelope   │  │   Services   │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Parse DID │  │ - Encrypt   │  │ - CBOR      │  │ - Resolver   │   │
//! │  │ - Document  │  │   for       │  │ - Legacy    │  │ - Wallet     │   │
//! │  │ - X25519    │  │   recipient │  │ - Storage   │  │ - Storage    │   │
//! │  │   lookup    │  │ - Open      │  │   id        │  │ - Share flow │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌────────────────────────────────┴────────────────────────────────┐   │
//! │  │                            Crypto                               │   │
//! │  │                                                                 │   │
//! │  │  - CEK (generate / destroy)    - AES-256-GCM content cipher     │   │
//! │  │  - ECDH-ES X25519 key wrap     - SHA-256 ids and digests        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Encryption configuration
//! - [`crypto`] - Cryptographic primitives (CEK, cipher, key wrap, hashing)
//! - [`envelope`] - Envelope wire format
//! - [`did`] - DID parsing and key-agreement key resolution
//! - [`seal`] - Sender-side orchestration
//! - [`services`] - Collaborator traits and the share/receive flows
//!
//! ## Trust Boundary
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          TRUST BOUNDARY                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  This crate                         │  Recipient wallet                 │
//! │  ──────────                          │  ────────────────                 │
//! │  holds recipient PUBLIC keys only    │  holds the PRIVATE key            │
//! │  wraps CEKs                          │  unwraps CEKs                     │
//! │  decrypts only with a CEK it is      │                                   │
//! │  handed back by the wallet           │                                   │
//! │                                                                         │
//! │  The service can never decrypt its own output.                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use didseal_core::config::EncryptionConfig;
//! use didseal_core::did::find_public_key_base64;
//! use didseal_core::seal::encrypt_for_recipient;
//! use serde_json::json;
//!
//! # fn main() -> didseal_core::Result<()> {
//! let document = json!({
//!     "id": "did:web:example.com",
//!     "verificationMethod": [{
//!         "id": "did:web:example.com#enc",
//!         "type": "X25519KeyAgreementKey2019",
//!         "publicKeyBase58": "cGfHiC6Kgg3FpFZvgwGcswsCRtp4aBP2fzuXRQPizuN",
//!     }],
//!     "keyAgreement": ["#enc"],
//! });
//!
//! let recipient = find_public_key_base64(&document).expect("X25519 key");
//! let sealed = encrypt_for_recipient(&EncryptionConfig::default(), b"hello", &recipient)?;
//! println!("upload {} bytes as {}", sealed.envelope.len(), sealed.storage_id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod did;
pub mod envelope;
pub mod error;
pub mod seal;
pub mod services;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::EncryptionConfig;
pub use crypto::{ContentEncryptionKey, PlaintextHash, StorageObjectId, WrappedKey};
pub use did::{Did, DidDocument};
pub use envelope::{Algorithm, Envelope};
pub use error::{Error, ErrorClass, Result};
pub use seal::{encrypt_for_recipient, open_envelope, SealedFile};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of didseal-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
