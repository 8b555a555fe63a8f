//! Key check construction.
//!
//! The check is the license id encrypted under the user key. A client that
//! derives a candidate key decrypts it and compares the result with the
//! license id; the server never discloses the key itself.

use crate::error::IssuerError;
use crate::keys::UserKey;
use crate::license::License;

/// Store `encrypt(user_key, license.id)` as `encryption.user_key.key_check`.
pub fn build_key_check(license: &mut License, user_key: &UserKey) -> Result<(), IssuerError> {
    let check = user_key.encrypt(license.id.as_bytes())?;
    license.encryption.user_key.check = Some(check);
    Ok(())
}

/// Client-side verification of a candidate user key.
///
/// Returns `false` for a wrong key, a missing check, or a check that does
/// not decrypt to the license id.
pub fn verify_user_key(license: &License, candidate: &UserKey) -> bool {
    let Some(check) = license.encryption.user_key.check.as_deref() else {
        return false;
    };
    match candidate.decrypt(check) {
        Ok(plaintext) => plaintext == license.id.as_bytes(),
        Err(_) => false,
    }
}
