//! Per-endpoint key check redaction.

mod common;

use lcp_issuer::check::verify_user_key;
use lcp_issuer::issuer::{LICENSE_FILE_NAME, LICENSE_MEDIA_TYPE};
use lcp_issuer::request::FORM_CONTENT_TYPE;
use lcp_issuer::sign::verify_license;
use lcp_issuer::{CheckRedaction, IssuerConfig, License, UserKey};

use common::{harness, passphrase_request};

fn issue(config: IssuerConfig) -> (License, License, common::Harness) {
    let h = harness(config);
    let response = h
        .issuer
        .issue_license("c1", Some("application/json"), passphrase_request("hello").as_bytes())
        .unwrap();
    let returned: License = serde_json::from_slice(&response.body).unwrap();
    let stored = h.licenses.get(&returned.id).unwrap();
    (returned, stored, h)
}

#[test]
fn test_license_response_headers() {
    let h = harness(IssuerConfig::default());
    let response = h
        .issuer
        .issue_license("c1", None, passphrase_request("hello").as_bytes())
        .unwrap();
    assert_eq!(response.content_type, LICENSE_MEDIA_TYPE);
    assert_eq!(
        response.content_disposition,
        format!("attachment; filename=\"{}\"", LICENSE_FILE_NAME)
    );
}

#[test]
fn test_license_path_strips_check_by_default() {
    let (returned, stored, h) = issue(IssuerConfig::default());

    // 1. The response carries no check, the stored copy does.
    assert!(returned.encryption.user_key.check.is_none());
    assert!(verify_user_key(&stored, &UserKey::from_passphrase("hello")));

    // 2. Both copies carry a valid signature.
    verify_license(&returned, h.credential.public_key()).unwrap();
    verify_license(&stored, h.credential.public_key()).unwrap();
}

#[test]
fn test_license_path_keep_policy() {
    let config = IssuerConfig {
        license_check: CheckRedaction::Keep,
        ..IssuerConfig::default()
    };
    let (returned, stored, _) = issue(config);
    assert_eq!(returned.encryption.user_key.check, stored.encryption.user_key.check);
    assert_eq!(returned.signature, stored.signature);
}

#[test]
fn test_form_encoded_request() {
    let h = harness(IssuerConfig::default());
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("data", &passphrase_request("hello"))
        .finish();
    let response = h
        .issuer
        .issue_license("c1", Some(FORM_CONTENT_TYPE), body.as_bytes())
        .unwrap();
    let returned: License = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(returned.rights.print, Some(10));
    assert_eq!(h.licenses.len(), 1);
}

#[test]
fn test_malformed_request_is_client_error() {
    let h = harness(IssuerConfig::default());
    let err = h
        .issuer
        .issue_license("c1", Some("application/json"), b"{\"encryption\": ")
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(h.licenses.is_empty());
}
