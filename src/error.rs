//! Error types for lcp-issuer.
//!
//! Every variant is a distinct failure mode of license completion or
//! publication packaging. Messages are intentionally minimal: they say
//! *what* failed without echoing key material, passphrases or the
//! plaintext of encrypted profile fields.

use thiserror::Error;

/// Failures of the symmetric cipher and digest layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A key was not 256 bits long or was rejected by `ring`.
    #[error("invalid key")]
    InvalidKey,

    /// Encryption failed. The underlying `ring` operation returned an error.
    #[error("encryption failed")]
    EncryptionFailure,

    /// Decryption failed: wrong key, tampered ciphertext or bad GCM tag.
    #[error("decryption failed")]
    DecryptionFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,
}

/// The single error type for all issuing operations.
#[derive(Debug, Error)]
pub enum IssuerError {
    /// The request body was malformed or did not carry a usable license.
    #[error("malformed license request: {0}")]
    Decode(String),

    /// The content id is unknown or the content store could not serve it.
    #[error("content lookup failed: {0}")]
    ContentLookup(String),

    /// A cipher or digest operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A profile field flagged for encryption does not exist.
    #[error("unknown profile field: {0}")]
    FieldNotFound(String),

    /// The issuer credential is missing or unusable.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The content container could not be read or rewritten.
    #[error("archive error: {0}")]
    Archive(String),

    /// The license store rejected the license.
    #[error("license persistence failed: {0}")]
    Persistence(String),

    /// The issuer configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IssuerError {
    /// Whether the failure is attributable to the caller's request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// HTTP status a hosting server should answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

impl From<zip::result::ZipError> for IssuerError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(IssuerError::Decode("bad json".into()).status_code(), 400);
        assert_eq!(IssuerError::ContentLookup("c1".into()).status_code(), 500);
        assert_eq!(IssuerError::from(CryptoError::InvalidKey).status_code(), 500);
        assert_eq!(IssuerError::FieldNotFound("phone".into()).status_code(), 500);
        assert_eq!(IssuerError::Archive("truncated".into()).status_code(), 500);
    }

    #[test]
    fn test_crypto_message_is_opaque() {
        let err = IssuerError::from(CryptoError::DecryptionFailure);
        assert_eq!(err.to_string(), "decryption failed");
    }
}
