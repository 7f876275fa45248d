//! # Error Handling
//!
//! This module provides the error types for didseal.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Envelope Errors                                                   │
//! │  │   ├── MalformedEnvelope     - Envelope bytes do not parse           │
//! │  │   ├── UnsupportedAlgorithm  - Unknown algorithm tag                 │
//! │  │   ├── PayloadTooLarge       - Plaintext exceeds configured limit    │
//! │  │   └── InvalidDigest         - Storage id / hash is not SHA-256 hex  │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── KeyResolutionFailure  - No usable X25519 key for a DID        │
//! │  │   └── InvalidDid            - Invalid DID syntax                    │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── AuthenticationFailure - AEAD tag did not verify               │
//! │  │   ├── RandomSourceFailure   - CSPRNG unavailable (fatal)            │
//! │  │   ├── InvalidKey            - Invalid key format/length             │
//! │  │   ├── InvalidWrappedKey     - Wrapped-key token does not parse      │
//! │  │   ├── EncryptionFailed      - Encryption operation failed           │
//! │  │   └── KeyDerivationFailed   - Failed to derive a wrapping key       │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageWriteError     - Object upload failed                  │
//! │  │   ├── StorageNotFound       - Object or record missing              │
//! │  │   └── IntegrityMismatch     - Plaintext hash does not match         │
//! │  │                                                                      │
//! │  ├── Remote Errors                                                     │
//! │  │   ├── RemoteRejected        - Collaborator answered 4xx             │
//! │  │   ├── RemoteUnavailable     - Collaborator answered 5xx / timeout   │
//! │  │   └── WalletDecryptFailed   - Wallet could not unwrap (opaque)      │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── SerializationError    - Could not serialize a value           │
//! │      └── Internal              - Should not happen                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Surfacing Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR SURFACING FLOW                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Internal (Rust)            Request Boundary            Client         │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  ErrorClass + public_message  ──────►  4xx  │
//! │                             (full detail logged only)           / 5xx  │
//! │                                                                         │
//! │  Example:                                                              │
//! │  Err(KeyResolutionFailure)  →  400 "no public key found for DID ..."  │
//! │  Err(AuthenticationFailure) →  400 "decryption failed"                 │
//! │  Err(RandomSourceFailure)   →  500 "internal error"                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for didseal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for didseal
///
/// Errors are grouped by domain. The distinction between parse errors and
/// authentication failures is deliberate and must survive to callers, but
/// see [`Error::public_message`] for what a client is allowed to see.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Envelope Errors (100-199)
    // ========================================================================

    /// Envelope bytes could not be parsed, or a required field is absent or
    /// has the wrong length
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope declares an algorithm this implementation does not support
    #[error("Unsupported envelope algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Plaintext exceeds the configured size limit
    #[error("Payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// A digest string is not 64 hex characters
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    // ========================================================================
    // Identity Errors (200-299)
    // ========================================================================

    /// No usable X25519 key-agreement key was found in the DID document
    #[error("No public key found for DID {did}")]
    KeyResolutionFailure {
        /// The DID whose document had no usable key
        did: String,
    },

    /// Invalid DID syntax
    #[error("Invalid DID format: {0}")]
    InvalidDid(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// AEAD tag verification failed.
    ///
    /// Covers wrong key, wrong IV and tampered ciphertext alike.
    #[error("Decryption failed: authentication tag mismatch")]
    AuthenticationFailure,

    /// The operating system CSPRNG is unavailable
    #[error("Random number generation failed")]
    RandomSourceFailure,

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Wrapped-key token does not have the expected compact JWE shape
    #[error("Invalid wrapped key: {0}")]
    InvalidWrappedKey(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrapping key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Failed to write an object to storage
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    /// Object or metadata record not found
    #[error("Item not found: {0}")]
    StorageNotFound(String),

    /// Decrypted plaintext does not match the recorded hash
    #[error("Plaintext hash mismatch for object {storage_id}")]
    IntegrityMismatch {
        /// Storage id of the object that failed verification
        storage_id: String,
    },

    // ========================================================================
    // Remote Collaborator Errors (500-599)
    // ========================================================================

    /// The remote agent rejected the request (4xx)
    #[error("Remote agent rejected request: {0}")]
    RemoteRejected(String),

    /// The remote agent failed or timed out (5xx)
    #[error("Remote agent unavailable: {0}")]
    RemoteUnavailable(String),

    /// The wallet could not unwrap the content key.
    ///
    /// Carries no detail: "wrong key" and "corrupt token" look the same.
    #[error("Wallet decryption failed")]
    WalletDecryptFailed,

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// How an error is surfaced at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Client input problem; reject this one request with a reason
    BadRequest,
    /// Authentication failure; reject with a generic reason
    Unauthenticated,
    /// Unexpected failure; reject with a non-specific message
    Internal,
}

impl ErrorClass {
    /// HTTP status code used for this class
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorClass::BadRequest | ErrorClass::Unauthenticated => 400,
            ErrorClass::Internal => 500,
        }
    }
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Envelope / format
    /// - 200-299: Identity
    /// - 300-399: Crypto
    /// - 400-499: Storage
    /// - 500-599: Remote collaborators
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Envelope (100-199)
            Error::MalformedEnvelope(_) => 100,
            Error::UnsupportedAlgorithm(_) => 101,
            Error::PayloadTooLarge { .. } => 102,
            Error::InvalidDigest(_) => 103,

            // Identity (200-299)
            Error::KeyResolutionFailure { .. } => 200,
            Error::InvalidDid(_) => 201,

            // Crypto (300-399)
            Error::AuthenticationFailure => 300,
            Error::RandomSourceFailure => 301,
            Error::InvalidKey(_) => 302,
            Error::InvalidWrappedKey(_) => 303,
            Error::EncryptionFailed(_) => 304,
            Error::KeyDerivationFailed(_) => 305,

            // Storage (400-499)
            Error::StorageWriteError(_) => 400,
            Error::StorageNotFound(_) => 401,
            Error::IntegrityMismatch { .. } => 402,

            // Remote (500-599)
            Error::RemoteRejected(_) => 500,
            Error::RemoteUnavailable(_) => 501,
            Error::WalletDecryptFailed => 502,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 901,
        }
    }

    /// Classify this error for the request boundary
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::MalformedEnvelope(_)
            | Error::UnsupportedAlgorithm(_)
            | Error::PayloadTooLarge { .. }
            | Error::InvalidDigest(_)
            | Error::KeyResolutionFailure { .. }
            | Error::InvalidDid(_)
            | Error::InvalidKey(_)
            | Error::InvalidWrappedKey(_)
            | Error::StorageNotFound(_)
            | Error::RemoteRejected(_) => ErrorClass::BadRequest,

            Error::AuthenticationFailure | Error::IntegrityMismatch { .. } => {
                ErrorClass::Unauthenticated
            }

            Error::RandomSourceFailure
            | Error::EncryptionFailed(_)
            | Error::KeyDerivationFailed(_)
            | Error::StorageWriteError(_)
            | Error::RemoteUnavailable(_)
            | Error::WalletDecryptFailed
            | Error::Internal(_)
            | Error::SerializationError(_) => ErrorClass::Internal,
        }
    }

    /// Message that is safe to return to a client
    ///
    /// Client-input problems keep their reason. Authentication failures get
    /// one generic message so the response is not an oracle. Internal
    /// failures get nothing specific; log `self` server-side instead.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::BadRequest => self.to_string(),
            ErrorClass::Unauthenticated => "decryption failed".to_string(),
            ErrorClass::Internal => "internal error".to_string(),
        }
    }

    /// Check if the failed operation may succeed on retry
    ///
    /// Only remote unavailability qualifies. The core never retries
    /// internally; retries belong to the network-facing caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RemoteUnavailable(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::MalformedEnvelope("x".into()).code(), 100);
        assert_eq!(Error::KeyResolutionFailure { did: "did:web:a".into() }.code(), 200);
        assert_eq!(Error::AuthenticationFailure.code(), 300);
        assert_eq!(Error::StorageWriteError("x".into()).code(), 400);
        assert_eq!(Error::RemoteRejected("x".into()).code(), 500);
        assert_eq!(Error::Internal("x".into()).code(), 900);
    }

    #[test]
    fn test_parse_and_auth_errors_are_distinct() {
        let parse = Error::MalformedEnvelope("truncated".into());
        let auth = Error::AuthenticationFailure;

        assert_ne!(parse.code(), auth.code());
        assert_eq!(parse.class(), ErrorClass::BadRequest);
        assert_eq!(auth.class(), ErrorClass::Unauthenticated);
    }

    #[test]
    fn test_key_resolution_names_did() {
        let err = Error::KeyResolutionFailure {
            did: "did:web:example.com".into(),
        };

        assert_eq!(err.class().http_status(), 400);
        assert!(err.public_message().contains("did:web:example.com"));
    }

    #[test]
    fn test_auth_failure_message_is_generic() {
        let msg = Error::AuthenticationFailure.public_message();
        assert_eq!(msg, "decryption failed");
        assert!(!msg.contains("tag"));
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = Error::RemoteUnavailable("upstream 503 at 10.0.0.4".into());

        assert_eq!(err.class().http_status(), 500);
        assert_eq!(err.public_message(), "internal error");
        assert!(err.is_retryable());

        assert_eq!(Error::RandomSourceFailure.class(), ErrorClass::Internal);
        assert!(!Error::RandomSourceFailure.is_retryable());
        assert_eq!(Error::WalletDecryptFailed.public_message(), "internal error");
    }

    #[test]
    fn test_remote_rejection_is_client_error() {
        let err = Error::RemoteRejected("POST /v1/wallet/decrypt".into());
        assert_eq!(err.class().http_status(), 400);
        assert!(!err.is_retryable());
    }
}
