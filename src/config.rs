//! Issuer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IssuerError;

/// What happens to `encryption.user_key.key_check` in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRedaction {
    /// Remove the check from the response copy. The stored copy keeps it.
    Strip,
    /// Leave the check in place.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IssuerConfig {
    /// Provider URI stamped on licenses that arrive without one.
    pub provider: String,
    /// Encryption profile stamped on licenses that arrive without one.
    pub profile: String,
    /// Media type of the content container and of the `publication` link.
    pub publication_media_type: String,
    /// Check handling for the license-only response.
    pub license_check: CheckRedaction,
    /// Check handling for the license embedded in a protected publication.
    pub publication_check: CheckRedaction,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            provider: "http://localhost/lcp".to_string(),
            profile: "http://readium.org/lcp/basic-profile".to_string(),
            publication_media_type: "application/epub+zip".to_string(),
            license_check: CheckRedaction::Strip,
            publication_check: CheckRedaction::Keep,
        }
    }
}

impl IssuerConfig {
    /// Parse a JSON document. Missing keys take their default.
    pub fn from_json(text: &str) -> Result<Self, IssuerError> {
        serde_json::from_str(text).map_err(|e| IssuerError::Config(e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IssuerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| IssuerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }
}
