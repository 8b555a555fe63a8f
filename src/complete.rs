//! License completion.
//!
//! Sequences the pipeline that turns a license request into a signed
//! license:
//!
//! 1. Look up the content item (collaborator)
//! 2. Prepare server-owned fields and assign the content id
//! 3. Resolve the user key and wrap the content key
//! 4. Encrypt flagged profile fields
//! 5. Build the key check
//! 6. Sign
//!
//! Each stage mutates only the fields it owns:
//!
//! | stage    | writes                                              |
//! |----------|-----------------------------------------------------|
//! | prepare  | `id`, `issued`, `provider`, `encryption.profile`, `content_id` |
//! | keys     | `encryption.content_key`, `encryption.user_key.{algorithm,value,clear_value}` |
//! | fields   | the flagged slots of `user`                         |
//! | check    | `encryption.user_key.check`                         |
//! | sign     | `signature`                                         |
//!
//! The user key exists only as a local of [`complete_license`] and is
//! zeroised when the function returns, on success and on every error path.
//! The license is taken by value: a failed completion drops it instead of
//! handing back a half-mutated value.

use tracing::{debug, info, instrument};

use crate::check;
use crate::config::IssuerConfig;
use crate::error::IssuerError;
use crate::fields;
use crate::keys;
use crate::license::License;
use crate::sign::{self, IssuerCredential};
use crate::store::ContentStore;

/// Complete `license` for `content_id`.
#[instrument(skip_all, fields(content_id = %content_id))]
pub fn complete_license(
    mut license: License,
    content_id: &str,
    content: &dyn ContentStore,
    credential: &IssuerCredential,
    config: &IssuerConfig,
) -> Result<License, IssuerError> {
    let item = content.get(content_id)?;

    license.prepare(config);
    license.content_id = content_id.to_string();
    debug!(license_id = %license.id, "license prepared");

    let user_key = keys::resolve_user_key(&mut license.encryption.user_key)?;
    keys::wrap_content_key(
        &mut license.encryption.content_key,
        &item.encryption_key,
        &user_key,
    )?;
    drop(item);
    debug!("content key wrapped");

    fields::encrypt_fields(&mut license.user, &user_key)?;
    check::build_key_check(&mut license, &user_key)?;
    drop(user_key);

    // Nothing that can reconstruct the user key may reach the signer.
    if !license.encryption.user_key.is_scrubbed() {
        return Err(IssuerError::Signing(
            "user key material present at signing".to_string(),
        ));
    }
    sign::sign_license(&mut license, credential)?;

    info!(license_id = %license.id, "license completed");
    Ok(license)
}
