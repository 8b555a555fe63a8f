//! # lcp-issuer
//!
//! Content license completion and protected publication packaging.
//!
//! A caller submits a partial license. Completion resolves the user key
//! (raw or passphrase-derived), wraps the content key under it, encrypts
//! the flagged profile fields, adds a key check the client can verify
//! offline, and signs the result with the issuer credential. The signed
//! license is served on its own or embedded into the content container at
//! `META-INF/license.lcpl`.
//!
//! ## Public API
//!
//! [`Issuer`] is the endpoint-level entry point. The pipeline stages are
//! public modules so that each can be exercised on its own; the
//! collaborators (content store, license store, certificate provider) are
//! traits in [`store`].

pub mod check;
pub mod complete;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fields;
pub mod issuer;
pub mod keys;
pub mod license;
pub mod package;
pub mod request;
pub mod sign;
pub mod store;

pub use complete::complete_license;
pub use config::{CheckRedaction, IssuerConfig};
pub use error::{CryptoError, IssuerError};
pub use issuer::{IssuedResponse, Issuer};
pub use keys::UserKey;
pub use license::License;
pub use sign::IssuerCredential;

/// Generate a random 256-bit content key.
///
/// Content keys are normally minted when content is encrypted for storage;
/// this is the crate's source for them in tests and tooling.
pub fn generate_content_key() -> Result<[u8; crypto::KEY_LEN], IssuerError> {
    Ok(crypto::generate_random_key()?)
}
