//! The license document.
//!
//! A `License` arrives partially filled from the caller, is mutated through
//! the completion pipeline and leaves as the signed wire document. Byte
//! fields travel as standard base64 text.
//!
//! The raw user key (`user_key.value`) and the passphrase
//! (`user_key.clear_value`) are input-only: they deserialize but are never
//! serialized, and they are zeroized when the block is dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::config::IssuerConfig;

/// Link relation the packager fills with the content's public location.
pub const PUBLICATION_LINK: &str = "publication";

/// A content license.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct License {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(default)]
    pub id: String,
    #[serde(default = "Utc::now")]
    pub issued: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub encryption: Encryption,
    #[serde(default)]
    pub links: BTreeMap<String, Link>,
    #[serde(default)]
    pub user: UserInfo,
    #[serde(default)]
    pub rights: UserRights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// The content this license unlocks. Not part of the wire form.
    #[serde(skip)]
    pub content_id: String,
}

impl License {
    /// Stamp the server-owned fields onto a fresh request.
    ///
    /// The id is always replaced: callers never choose license ids.
    pub fn prepare(&mut self, config: &IssuerConfig) {
        self.id = Uuid::new_v4().to_string();
        self.issued = Utc::now();
        if self.provider.is_empty() {
            self.provider = config.provider.clone();
        }
        if self.encryption.profile.is_empty() {
            self.encryption.profile = config.profile.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Encryption {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile: String,
    #[serde(default)]
    pub content_key: ContentKeyBlock,
    #[serde(default)]
    pub user_key: UserKeyBlock,
}

/// The content key, wrapped under the user key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentKeyBlock {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub algorithm: String,
    #[serde(
        rename = "encrypted_value",
        default,
        with = "base64_bytes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub value: Vec<u8>,
}

/// How the client obtains the user key, and how it checks it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserKeyBlock {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text_hint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub algorithm: String,
    #[serde(
        rename = "key_check",
        default,
        with = "base64_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub check: Option<Vec<u8>>,
    /// Raw user key supplied by the caller. Input only.
    #[serde(default, with = "base64_opt", skip_serializing)]
    pub value: Option<Vec<u8>>,
    /// Passphrase supplied by the caller. Input only.
    #[serde(default, skip_serializing)]
    pub clear_value: Option<String>,
}

impl UserKeyBlock {
    /// True once neither the raw key nor the passphrase is held.
    pub fn is_scrubbed(&self) -> bool {
        self.value.is_none() && self.clear_value.is_none()
    }
}

impl std::fmt::Debug for UserKeyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKeyBlock")
            .field("text_hint", &self.text_hint)
            .field("algorithm", &self.algorithm)
            .field("check", &self.check.as_ref().map(Vec::len))
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("clear_value", &self.clear_value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Drop for UserKeyBlock {
    fn drop(&mut self) {
        self.value.zeroize();
        self.clear_value.zeroize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// User profile. Fields named in `encrypted` leave as base64 ciphertext.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

/// Issuer signature over the canonical form of the license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub algorithm: String,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub certificate: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

mod base64_opt {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.is_empty() => BASE64
                .decode(text.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_only_fields_never_serialize() {
        let mut license = License::default();
        license.encryption.user_key.value = Some(vec![9u8; 32]);
        license.encryption.user_key.clear_value = Some("open sesame".into());

        let json = serde_json::to_string(&license).unwrap();
        assert!(!json.contains("clear_value"));
        assert!(!json.contains("open sesame"));
        assert!(!json.contains("\"value\""));
    }

    #[test]
    fn test_decode_request_shape() {
        let json = r#"{
            "provider": "https://books.example.com",
            "encryption": {
                "user_key": {
                    "text_hint": "Enter your email address",
                    "clear_value": "hello",
                    "value": "AAECAw=="
                }
            },
            "user": {"email": "user@example.com", "encrypted": ["email"]},
            "rights": {"print": 10}
        }"#;
        let license: License = serde_json::from_str(json).unwrap();
        let user_key = &license.encryption.user_key;
        assert_eq!(user_key.clear_value.as_deref(), Some("hello"));
        assert_eq!(user_key.value.as_deref(), Some(&[0u8, 1, 2, 3][..]));
        assert_eq!(license.user.encrypted, vec!["email".to_string()]);
        assert_eq!(license.rights.print, Some(10));
    }

    #[test]
    fn test_prepare_assigns_server_fields() {
        let config = IssuerConfig::default();
        let mut license = License {
            id: "caller-chosen".into(),
            ..License::default()
        };
        license.prepare(&config);
        assert_ne!(license.id, "caller-chosen");
        assert!(Uuid::parse_str(&license.id).is_ok());
        assert_eq!(license.provider, config.provider);
        assert_eq!(license.encryption.profile, config.profile);
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let mut block = UserKeyBlock::default();
        block.clear_value = Some("hunter2".into());
        assert!(!format!("{:?}", block).contains("hunter2"));
    }
}
