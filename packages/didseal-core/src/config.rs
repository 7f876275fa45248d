//! Encryption configuration
//!
//! A plain value passed explicitly to the operations that need it.

use crate::envelope::Algorithm;

/// Default upper bound on a single plaintext (2 GiB)
pub const DEFAULT_MAX_PLAINTEXT_LEN: usize = 2 * 1024 * 1024 * 1024;

/// Configuration for envelope encryption
///
/// ## Example
///
/// ```
/// use didseal_core::config::EncryptionConfig;
///
/// let config = EncryptionConfig::default()
///     .with_legacy_envelopes(true)
///     .with_max_plaintext_len(64 * 1024 * 1024);
/// assert!(config.accept_legacy_envelopes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionConfig {
    /// Content cipher for new envelopes
    pub algorithm: Algorithm,
    /// Whether `VERI`-prefixed concatenated envelopes may be decoded
    pub accept_legacy_envelopes: bool,
    /// Plaintexts larger than this are rejected before encryption
    pub max_plaintext_len: usize,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes256Gcm,
            accept_legacy_envelopes: false,
            max_plaintext_len: DEFAULT_MAX_PLAINTEXT_LEN,
        }
    }
}

impl EncryptionConfig {
    /// Set the content cipher
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Allow or refuse legacy envelopes on decode
    pub fn with_legacy_envelopes(mut self, accept: bool) -> Self {
        self.accept_legacy_envelopes = accept;
        self
    }

    /// Set the plaintext size limit
    pub fn with_max_plaintext_len(mut self, limit: usize) -> Self {
        self.max_plaintext_len = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EncryptionConfig::default();
        assert_eq!(config.algorithm, Algorithm::Aes256Gcm);
        assert!(!config.accept_legacy_envelopes);
        assert_eq!(config.max_plaintext_len, DEFAULT_MAX_PLAINTEXT_LEN);
    }

    #[test]
    fn test_builders() {
        let config = EncryptionConfig::default()
            .with_legacy_envelopes(true)
            .with_max_plaintext_len(10);
        assert!(config.accept_legacy_envelopes);
        assert_eq!(config.max_plaintext_len, 10);
    }
}
