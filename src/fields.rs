//! Selective encryption of user profile fields.
//!
//! The request lists profile fields by name in `user.encrypted`. Each name
//! maps to a typed slot on [`UserInfo`] through [`ProfileField`]; there is
//! no lookup by reflection. All names are resolved before anything is
//! encrypted, so an unknown name leaves the profile untouched.

use std::collections::BTreeSet;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use crate::error::IssuerError;
use crate::keys::UserKey;
use crate::license::UserInfo;

/// A profile field that may be flagged for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Id,
    Email,
    Name,
}

impl ProfileField {
    pub const ALL: [ProfileField; 3] = [Self::Id, Self::Email, Self::Name];

    /// The normalized (lowercase) name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Email => "email",
            Self::Name => "name",
        }
    }

    pub fn get(self, user: &UserInfo) -> &str {
        match self {
            Self::Id => &user.id,
            Self::Email => &user.email,
            Self::Name => &user.name,
        }
    }

    pub fn set(self, user: &mut UserInfo, value: String) {
        match self {
            Self::Id => user.id = value,
            Self::Email => user.email = value,
            Self::Name => user.name = value,
        }
    }
}

impl FromStr for ProfileField {
    type Err = IssuerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| IssuerError::FieldNotFound(name.to_string()))
    }
}

/// Resolve the flagged names. Duplicates collapse to one entry.
pub fn resolve_fields(names: &[String]) -> Result<BTreeSet<ProfileField>, IssuerError> {
    names.iter().map(|name| name.parse()).collect()
}

/// Replace every flagged field with base64 of its ciphertext under `user_key`.
pub fn encrypt_fields(user: &mut UserInfo, user_key: &UserKey) -> Result<(), IssuerError> {
    let fields = resolve_fields(&user.encrypted)?;

    let mut sealed = Vec::with_capacity(fields.len());
    for field in fields {
        let ciphertext = user_key.encrypt(field.get(user).as_bytes())?;
        sealed.push((field, BASE64.encode(ciphertext)));
    }
    for (field, value) in sealed {
        debug!(field = field.name(), "profile field encrypted");
        field.set(user, value);
    }
    Ok(())
}
