//! Low-level cryptographic operations.
//!
//! This module and `sign` are the only places in the crate that import
//! `ring`. Every other module encrypts and decrypts exclusively through the
//! functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)
//! - **Digest**: SHA-256, used for passphrase-derived user keys

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::CryptoError;

/// The AEAD algorithm used throughout lcp-issuer.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Identifier written to `encryption.content_key.algorithm`.
pub const CIPHER_ALGORITHM: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";

/// Identifier written to `encryption.user_key.algorithm`.
pub const DIGEST_ALGORITHM: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of a content or user key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A nonce generated for a single encryption operation.
/// Consumed by the single seal it was generated for.
struct OwnedNonce(Nonce);

/// Generate a cryptographically secure random nonce.
///
/// A fresh nonce is generated for every encryption call. There is no nonce
/// caching or counter-based generation.
fn generate_nonce() -> Result<OwnedNonce, CryptoError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; NONCE_LEN];
    rng.fill(&mut buf).map_err(|_| CryptoError::RandomnessFailure)?;
    Ok(OwnedNonce(Nonce::assume_unique_for_key(buf)))
}

fn aead_key(key_bytes: &[u8]) -> Result<LessSafeKey, CryptoError> {
    if key_bytes.len() != KEY_LEN {
        return Err(CryptoError::InvalidKey);
    }
    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| CryptoError::InvalidKey)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt a plaintext payload using AES-256-GCM.
///
/// Returns the nonce prepended to the ciphertext, so the output decrypts
/// without any side channel. Two calls with the same key and plaintext
/// produce different bytes.
///
/// # Layout of returned bytes
/// ```text
/// [ nonce (12 bytes) ][ ciphertext + GCM tag ]
/// ```
pub fn encrypt(key_bytes: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let key = aead_key(key_bytes)?;
    let nonce = generate_nonce()?;

    let mut output = Vec::with_capacity(NONCE_LEN + plaintext.len() + ALGORITHM.tag_len());
    output.extend_from_slice(nonce.0.as_ref());

    // The sealed body needs its own growable buffer for the appended tag.
    let mut body = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce.0, Aad::empty(), &mut body)
        .map_err(|_| CryptoError::EncryptionFailure)?;
    output.extend_from_slice(&body);

    Ok(output)
}

/// Decrypt a payload produced by [`encrypt`].
///
/// If the key is wrong or the ciphertext has been tampered with, the GCM
/// authentication check fails and no partial plaintext is returned.
pub fn decrypt(key_bytes: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let key = aead_key(key_bytes)?;
    if ciphertext.len() < NONCE_LEN + ALGORITHM.tag_len() {
        return Err(CryptoError::DecryptionFailure);
    }

    let nonce_bytes: [u8; NONCE_LEN] = ciphertext[..NONCE_LEN]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailure)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut payload = ciphertext[NONCE_LEN..].to_vec();

    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut payload)
        .map_err(|_| CryptoError::DecryptionFailure)?;

    Ok(plaintext.to_vec())
}

/// SHA-256 of `input`, the one-way derivation for passphrase user keys.
pub fn sha256(input: &[u8]) -> [u8; KEY_LEN] {
    let hash = digest::digest(&digest::SHA256, input);
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(hash.as_ref());
    out
}

/// Generate a cryptographically secure random key.
pub fn generate_random_key() -> Result<[u8; KEY_LEN], CryptoError> {
    let rng = SystemRandom::new();
    let mut key = [0u8; KEY_LEN];
    rng.fill(&mut key).map_err(|_| CryptoError::RandomnessFailure)?;
    Ok(key)
}
