mod common;

use std::io::{Cursor, Read};

use lcp_issuer::license::PUBLICATION_LINK;
use lcp_issuer::package::LICENSE_PATH;
use lcp_issuer::sign::verify_license;
use lcp_issuer::{IssuerConfig, License};
use zip::ZipArchive;

use common::{harness, harness_with_blob, passphrase_request, sample_epub};

/// Name, CRC and raw (still compressed) bytes of every entry.
fn raw_entries(bytes: &[u8]) -> Vec<(String, u32, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index_raw(i).unwrap();
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw).unwrap();
            (entry.name().to_string(), entry.crc32(), raw)
        })
        .collect()
}

#[test]
fn test_existing_entries_preserved_byte_for_byte() {
    let source = sample_epub();
    let h = harness(IssuerConfig::default());

    let response = h
        .issuer
        .issue_protected_publication("c1", None, passphrase_request("hello").as_bytes())
        .unwrap();

    let before = raw_entries(&source);
    let after = raw_entries(&response.body);

    // 1. Exactly one entry was added, at the end.
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(after.last().unwrap().0, LICENSE_PATH);

    // 2. The archive comment survived.
    let archive = ZipArchive::new(Cursor::new(response.body.as_slice())).unwrap();
    assert_eq!(archive.comment(), b"sample publication");
}

#[test]
fn test_embedded_license_is_the_signed_license() {
    let h = harness(IssuerConfig::default());
    let response = h
        .issuer
        .issue_protected_publication("c1", None, passphrase_request("hello").as_bytes())
        .unwrap();

    let mut archive = ZipArchive::new(Cursor::new(response.body)).unwrap();
    let mut text = String::new();
    archive
        .by_name(LICENSE_PATH)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    let embedded: License = serde_json::from_str(&text).unwrap();

    // The publication link is covered by the signature.
    let link = &embedded.links[PUBLICATION_LINK];
    assert_eq!(link.href, "https://cdn.example.com/moby-dick.epub");
    assert_eq!(link.media_type, "application/epub+zip");
    verify_license(&embedded, h.credential.public_key()).unwrap();

    // The stored license is the same document.
    let stored = h.licenses.get(&embedded.id).unwrap();
    assert_eq!(stored.signature, embedded.signature);
    assert_eq!(stored.content_id, "c1");
}

#[test]
fn test_publication_response_headers() {
    let h = harness(IssuerConfig::default());
    let response = h
        .issuer
        .issue_protected_publication("c1", None, passphrase_request("hello").as_bytes())
        .unwrap();
    assert_eq!(response.content_type, "application/epub+zip");
    assert_eq!(
        response.content_disposition,
        "attachment; filename=\"moby-dick.epub\""
    );
}

#[test]
fn test_malformed_container_persists_nothing() {
    let h = harness_with_blob(IssuerConfig::default(), b"PK\x03\x04 truncated".to_vec());
    let err = h
        .issuer
        .issue_protected_publication("c1", None, passphrase_request("hello").as_bytes())
        .unwrap_err();

    assert!(matches!(err, lcp_issuer::IssuerError::Archive(_)));
    assert_eq!(err.status_code(), 500);
    assert!(h.licenses.is_empty());
}
