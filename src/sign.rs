//! License signing.
//!
//! The signature covers the canonical form of the license: the JSON wire
//! form with the `signature` member removed, object keys sorted and no
//! insignificant whitespace. Both supported algorithms are deterministic,
//! so the same license content always yields the same signature value.

use ring::rand::SystemRandom;
use ring::signature::{
    self, Ed25519KeyPair, KeyPair, RsaKeyPair, UnparsedPublicKey, ED25519,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_SHA256,
};
use serde_json::Value;
use tracing::debug;

use crate::error::IssuerError;
use crate::license::{License, Signature};

/// RSA PKCS#1 v1.5 with SHA-256.
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

/// Ed25519.
pub const ED25519_ALGORITHM: &str = "http://www.w3.org/2021/04/xmldsig-more#eddsa-ed25519";

enum SigningKey {
    Rsa(RsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

/// The issuer's signing credential: a private key plus the DER certificate
/// published alongside each signature.
pub struct IssuerCredential {
    key: SigningKey,
    certificate: Vec<u8>,
}

impl IssuerCredential {
    /// Load an RSA private key from PKCS#8 DER.
    pub fn rsa_pkcs8(private_key: &[u8], certificate: Vec<u8>) -> Result<Self, IssuerError> {
        let key = RsaKeyPair::from_pkcs8(private_key)
            .map_err(|e| IssuerError::Signing(format!("rsa key rejected: {}", e)))?;
        Ok(Self {
            key: SigningKey::Rsa(key),
            certificate,
        })
    }

    /// Load an Ed25519 private key from PKCS#8 DER.
    pub fn ed25519_pkcs8(private_key: &[u8], certificate: Vec<u8>) -> Result<Self, IssuerError> {
        let key = Ed25519KeyPair::from_pkcs8(private_key)
            .map_err(|e| IssuerError::Signing(format!("ed25519 key rejected: {}", e)))?;
        Ok(Self {
            key: SigningKey::Ed25519(key),
            certificate,
        })
    }

    /// Identifier written to `signature.algorithm`.
    pub fn algorithm(&self) -> &'static str {
        match self.key {
            SigningKey::Rsa(_) => RSA_SHA256,
            SigningKey::Ed25519(_) => ED25519_ALGORITHM,
        }
    }

    /// Public half of the key, in the encoding `ring` verifies against.
    pub fn public_key(&self) -> &[u8] {
        match &self.key {
            SigningKey::Rsa(key) => key.public_key().as_ref(),
            SigningKey::Ed25519(key) => key.public_key().as_ref(),
        }
    }

    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IssuerError> {
        match &self.key {
            SigningKey::Rsa(key) => {
                let rng = SystemRandom::new();
                let mut value = vec![0u8; key.public().modulus_len()];
                key.sign(&RSA_PKCS1_SHA256, &rng, message, &mut value)
                    .map_err(|_| IssuerError::Signing("rsa signing failed".to_string()))?;
                Ok(value)
            }
            SigningKey::Ed25519(key) => Ok(key.sign(message).as_ref().to_vec()),
        }
    }
}

impl std::fmt::Debug for IssuerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerCredential")
            .field("algorithm", &self.algorithm())
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}

/// The bytes a signature covers.
pub fn canonical_bytes(license: &License) -> Result<Vec<u8>, IssuerError> {
    let mut value = serde_json::to_value(license)
        .map_err(|e| IssuerError::Signing(format!("license not serializable: {}", e)))?;
    if let Value::Object(members) = &mut value {
        members.remove("signature");
    }
    serde_json::to_vec(&value)
        .map_err(|e| IssuerError::Signing(format!("license not serializable: {}", e)))
}

/// Sign the license and attach the result as `license.signature`.
pub fn sign_license(
    license: &mut License,
    credential: &IssuerCredential,
) -> Result<(), IssuerError> {
    let message = canonical_bytes(license)?;
    let value = credential.sign(&message)?;
    debug!(
        license_id = %license.id,
        algorithm = credential.algorithm(),
        "license signed"
    );
    license.signature = Some(Signature {
        algorithm: credential.algorithm().to_string(),
        certificate: credential.certificate().to_vec(),
        value,
    });
    Ok(())
}

/// Check `license.signature` against a public key.
pub fn verify_license(license: &License, public_key: &[u8]) -> Result<(), IssuerError> {
    let attached = license
        .signature
        .as_ref()
        .ok_or_else(|| IssuerError::Signing("license is unsigned".to_string()))?;
    let algorithm: &'static dyn signature::VerificationAlgorithm =
        match attached.algorithm.as_str() {
            RSA_SHA256 => &RSA_PKCS1_2048_8192_SHA256,
            ED25519_ALGORITHM => &ED25519,
            other => {
                return Err(IssuerError::Signing(format!(
                    "unsupported signature algorithm: {}",
                    other
                )))
            }
        };
    let message = canonical_bytes(license)?;
    UnparsedPublicKey::new(algorithm, public_key)
        .verify(&message, &attached.value)
        .map_err(|_| IssuerError::Signing("signature mismatch".to_string()))
}
