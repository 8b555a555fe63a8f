//! Key hierarchy resolution and key ownership.
//!
//! This module owns two responsibilities:
//! 1. Resolving the *user key* from a license request, either adopted raw
//!    or derived from a passphrase, and wrapping the *content key* under it.
//! 2. Holding key material in types that are opaque, non-cloneable and
//!    zeroised on drop.
//!
//! ## Hierarchy
//!
//! ```text
//! passphrase ──SHA-256──▶ user key ──AES-256-GCM──▶ encryption.content_key.encrypted_value
//!   (or raw user key)         │
//!                             ├──▶ encrypted profile fields
//!                             └──▶ encryption.user_key.key_check
//! ```
//!
//! After [`resolve_user_key`] returns, the request no longer holds the raw
//! key or the passphrase. The only copy lives in the returned [`UserKey`].

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, KEY_LEN};
use crate::error::{CryptoError, IssuerError};
use crate::license::{ContentKeyBlock, UserKeyBlock};

// ---------------------------------------------------------------------------
// User key
// ---------------------------------------------------------------------------

/// The key that wraps the content key and encrypts the per-user fields.
///
/// - Not `Clone`. Exactly one copy exists per completion.
/// - Zeroised on drop, on every exit path of the completion call.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct UserKey {
    bytes: [u8; KEY_LEN],
}

impl UserKey {
    /// Adopt a raw 256-bit key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { bytes })
    }

    /// Derive the key a client computes from its passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self {
            bytes: crypto::sha256(passphrase.as_bytes()),
        }
    }

    /// Encrypt under this key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        crypto::encrypt(&self.bytes, plaintext)
    }

    /// Decrypt under this key. This is the client-side operation.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        crypto::decrypt(&self.bytes, ciphertext)
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UserKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Take the user key out of the request.
///
/// A raw `value` wins over `clear_value`; both are removed from the block
/// whichever one is used. `algorithm` is set to the digest identifier in
/// either case, since it tells the client how to derive the key.
pub fn resolve_user_key(block: &mut UserKeyBlock) -> Result<UserKey, IssuerError> {
    let raw = block.value.take().map(Zeroizing::new);
    let passphrase = block.clear_value.take().map(Zeroizing::new);
    block.algorithm = crypto::DIGEST_ALGORITHM.to_string();

    match (raw, passphrase) {
        (Some(raw), _) => Ok(UserKey::from_bytes(&raw)?),
        (None, Some(passphrase)) => Ok(UserKey::from_passphrase(&passphrase)),
        (None, None) => Err(IssuerError::Decode(
            "user key requires a value or a passphrase".to_string(),
        )),
    }
}

/// Encrypt the content key under the user key into `block`.
pub fn wrap_content_key(
    block: &mut ContentKeyBlock,
    content_key: &[u8],
    user_key: &UserKey,
) -> Result<(), IssuerError> {
    block.value = user_key.encrypt(content_key)?;
    block.algorithm = crypto::CIPHER_ALGORITHM.to_string();
    Ok(())
}
