//! Request body decoding.
//!
//! A license request arrives either as a JSON document, or as a JSON
//! document carried in the `data` field of a URL-encoded form.

use url::form_urlencoded;

use crate::error::IssuerError;
use crate::license::License;

/// Content type that selects form decoding.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field that carries the JSON document.
pub const FORM_FIELD: &str = "data";

/// Decode a license request body.
pub fn decode_license(content_type: Option<&str>, body: &[u8]) -> Result<License, IssuerError> {
    let decoded: Result<License, serde_json::Error> = if is_form(content_type) {
        serde_json::from_str(&form_value(body, FORM_FIELD)?)
    } else {
        serde_json::from_slice(body)
    };
    decoded.map_err(|e| IssuerError::Decode(e.to_string()))
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Value of the first `field` in a URL-encoded form body.
fn form_value(body: &[u8], field: &str) -> Result<String, IssuerError> {
    form_urlencoded::parse(body)
        .find(|(name, _)| name == field)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| IssuerError::Decode(format!("form field `{}` missing", field)))
}
