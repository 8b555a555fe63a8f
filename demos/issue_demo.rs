//! Minimal example: issue a license and a protected publication.
//!
//! Run with: `cargo run --example issue_demo`
//! Set `RUST_LOG=lcp_issuer=debug` to watch the pipeline stages.
//!
//! - A content item is registered with its raw content key
//! - A passphrase-protected license is issued and stored as JSON lines
//! - The same request produces an EPUB with the license embedded

use std::io::{Cursor, Write};
use std::sync::Arc;

use lcp_issuer::check::verify_user_key;
use lcp_issuer::store::{ContentItem, FileLicenseStore, MemoryContentStore};
use lcp_issuer::{generate_content_key, Issuer, IssuerConfig, IssuerCredential, License, UserKey};
use ring::rand::SystemRandom;
use ring::signature::Ed25519KeyPair;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;
use zip::write::SimpleFileOptions;

fn sample_epub() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/epub+zip")?;
    zip.start_file("OEBPS/chapter1.xhtml", SimpleFileOptions::default())?;
    zip.write_all(b"<p>Call me Ishmael.</p>")?;
    Ok(zip.finish()?.into_inner())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Setup
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new())
        .map_err(|_| "key generation failed")?;
    let credential = Arc::new(IssuerCredential::ed25519_pkcs8(pkcs8.as_ref(), Vec::new())?);

    let content = Arc::new(MemoryContentStore::new());
    content.insert(
        "moby-dick",
        ContentItem {
            encryption_key: Zeroizing::new(generate_content_key()?.to_vec()),
            location: "books/moby-dick.epub".into(),
            public_url: "https://cdn.example.com/moby-dick.epub".into(),
        },
        sample_epub()?,
    );

    let store_path = std::env::temp_dir().join("lcp_issuer_licenses.jsonl");
    let licenses = Arc::new(FileLicenseStore::new(&store_path)?);
    let issuer = Issuer::new(IssuerConfig::default(), content, licenses, credential);

    let request = r#"{
        "encryption": {"user_key": {"text_hint": "Your favourite whale", "clear_value": "moby"}},
        "user": {"email": "ishmael@example.com", "encrypted": ["email"]},
        "rights": {"print": 10}
    }"#;

    // 2. License only
    let response = issuer.issue_license("moby-dick", None, request.as_bytes())?;
    let license: License = serde_json::from_slice(&response.body)?;
    println!("Issued license {} ({})", license.id, response.content_disposition);
    println!("Encrypted email: {}", license.user.email);

    // 3. Protected publication
    let response = issuer.issue_protected_publication("moby-dick", None, request.as_bytes())?;
    println!(
        "Packaged publication: {} bytes, {}",
        response.body.len(),
        response.content_disposition
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(response.body))?;
    let embedded: License =
        serde_json::from_reader(archive.by_name(lcp_issuer::package::LICENSE_PATH)?)?;
    println!(
        "Passphrase check: {}",
        verify_user_key(&embedded, &UserKey::from_passphrase("moby"))
    );
    println!("Stored licenses appended to: {}", store_path.display());

    Ok(())
}
