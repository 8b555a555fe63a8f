//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use lcp_issuer::store::{ContentItem, MemoryContentStore, MemoryLicenseStore};
use lcp_issuer::{Issuer, IssuerConfig, IssuerCredential};
use zeroize::Zeroizing;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const RSA_KEY: &[u8] = include_bytes!("../fixtures/issuer_rsa.pk8");
pub const RSA_CERT: &[u8] = include_bytes!("../fixtures/issuer_rsa.crt.der");

/// Raw content key of content item `c1`.
pub const CONTENT_KEY: [u8; 32] = [0x42; 32];

pub fn credential() -> Arc<IssuerCredential> {
    Arc::new(IssuerCredential::rsa_pkcs8(RSA_KEY, RSA_CERT.to_vec()).unwrap())
}

/// A small EPUB-shaped container with one stored and two deflated entries.
pub fn sample_epub() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(br#"<container><rootfiles><rootfile full-path="OEBPS/content.opf"/></rootfiles></container>"#)
        .unwrap();
    zip.start_file("OEBPS/chapter1.xhtml", deflated).unwrap();
    zip.write_all(&b"<p>It was a dark and stormy night.</p>\n".repeat(200))
        .unwrap();
    zip.set_comment("sample publication");
    zip.finish().unwrap().into_inner()
}

pub fn content_store(blob: Vec<u8>) -> Arc<MemoryContentStore> {
    let store = MemoryContentStore::new();
    store.insert(
        "c1",
        ContentItem {
            encryption_key: Zeroizing::new(CONTENT_KEY.to_vec()),
            location: "/srv/content/moby-dick.epub".to_string(),
            public_url: "https://cdn.example.com/moby-dick.epub".to_string(),
        },
        blob,
    );
    Arc::new(store)
}

pub struct Harness {
    pub issuer: Issuer,
    pub licenses: Arc<MemoryLicenseStore>,
    pub credential: Arc<IssuerCredential>,
}

pub fn harness(config: IssuerConfig) -> Harness {
    harness_with_blob(config, sample_epub())
}

pub fn harness_with_blob(config: IssuerConfig, blob: Vec<u8>) -> Harness {
    let licenses = Arc::new(MemoryLicenseStore::new());
    let credential = credential();
    let issuer = Issuer::new(
        config,
        content_store(blob),
        licenses.clone(),
        credential.clone(),
    );
    Harness {
        issuer,
        licenses,
        credential,
    }
}

/// A license request protected by a passphrase.
pub fn passphrase_request(passphrase: &str) -> String {
    serde_json::json!({
        "encryption": {
            "user_key": {
                "text_hint": "Your library card number",
                "clear_value": passphrase
            }
        },
        "user": {
            "id": "reader-7",
            "email": "user@example.com",
            "name": "Ada",
            "encrypted": ["email"]
        },
        "rights": {"print": 10, "copy": 2048}
    })
    .to_string()
}
