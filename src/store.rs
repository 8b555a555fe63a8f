//! Collaborator boundaries: content lookup, license persistence and the
//! signing credential.
//!
//! The core only talks to these traits. In-memory implementations are
//! provided for tests and demos; `FileLicenseStore` appends licenses as
//! JSON lines.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use zeroize::Zeroizing;

use crate::error::IssuerError;
use crate::license::License;
use crate::sign::IssuerCredential;

/// A content item as the content store describes it.
#[derive(Clone)]
pub struct ContentItem {
    /// Raw symmetric key protecting the content. Zeroised on drop.
    pub encryption_key: Zeroizing<Vec<u8>>,
    /// Stored location; its last path segment names the download.
    pub location: String,
    /// Externally reachable URL of the container.
    pub public_url: String,
}

impl ContentItem {
    /// The file name a packaged download is offered under.
    pub fn file_name(&self) -> &str {
        self.location
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.location)
    }
}

impl std::fmt::Debug for ContentItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentItem")
            .field("encryption_key", &"<redacted>")
            .field("location", &self.location)
            .field("public_url", &self.public_url)
            .finish()
    }
}

/// Content index and blob storage.
pub trait ContentStore: Send + Sync {
    /// Look up a content item. Unknown ids fail with `ContentLookup`.
    fn get(&self, content_id: &str) -> Result<ContentItem, IssuerError>;

    /// Fetch the raw container bytes.
    fn get_blob(&self, content_id: &str) -> Result<Vec<u8>, IssuerError>;
}

/// Persistence for completed licenses. Insertion is atomic per license id:
/// a second license with an id already stored fails with `Persistence`.
pub trait LicenseStore: Send + Sync {
    fn add(&self, license: &License) -> Result<(), IssuerError>;
}

/// Source of the issuer's signing credential.
pub trait CertificateProvider: Send + Sync {
    fn credential(&self) -> Result<&IssuerCredential, IssuerError>;
}

impl CertificateProvider for IssuerCredential {
    fn credential(&self) -> Result<&IssuerCredential, IssuerError> {
        Ok(self)
    }
}

fn unknown_content(content_id: &str) -> IssuerError {
    IssuerError::ContentLookup(format!("unknown content id: {}", content_id))
}

fn poisoned<T>(_: PoisonError<T>) -> IssuerError {
    IssuerError::Persistence("store lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// In-memory content store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryContentStore {
    items: Mutex<HashMap<String, (ContentItem, Vec<u8>)>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content item and its container bytes.
    pub fn insert(&self, content_id: &str, item: ContentItem, blob: Vec<u8>) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(content_id.to_string(), (item, blob));
    }
}

impl ContentStore for MemoryContentStore {
    fn get(&self, content_id: &str) -> Result<ContentItem, IssuerError> {
        let items = self
            .items
            .lock()
            .map_err(|_| IssuerError::ContentLookup("content index lock poisoned".to_string()))?;
        items
            .get(content_id)
            .map(|(item, _)| item.clone())
            .ok_or_else(|| unknown_content(content_id))
    }

    fn get_blob(&self, content_id: &str) -> Result<Vec<u8>, IssuerError> {
        let items = self
            .items
            .lock()
            .map_err(|_| IssuerError::ContentLookup("content index lock poisoned".to_string()))?;
        items
            .get(content_id)
            .map(|(_, blob)| blob.clone())
            .ok_or_else(|| unknown_content(content_id))
    }
}

// ---------------------------------------------------------------------------
// In-memory license store
// ---------------------------------------------------------------------------

/// Keeps licenses keyed by id. A second license with the same id is rejected.
#[derive(Default)]
pub struct MemoryLicenseStore {
    licenses: Mutex<HashMap<String, License>>,
}

impl MemoryLicenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, license_id: &str) -> Option<License> {
        self.licenses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(license_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.licenses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LicenseStore for MemoryLicenseStore {
    fn add(&self, license: &License) -> Result<(), IssuerError> {
        let mut licenses = self.licenses.lock().map_err(poisoned)?;
        if licenses.contains_key(&license.id) {
            return Err(IssuerError::Persistence(format!(
                "license already exists: {}",
                license.id
            )));
        }
        licenses.insert(license.id.clone(), license.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in store: file
// ---------------------------------------------------------------------------

/// Writes licenses as JSON lines (one per license) to a file.
/// Creates the file if it doesn't exist; appends if it does. Ids already
/// present in the file count as taken.
pub struct FileLicenseStore {
    inner: Mutex<FileState>,
}

struct FileState {
    file: File,
    ids: HashSet<String>,
}

#[derive(serde::Deserialize)]
struct StoredId {
    id: String,
}

impl FileLicenseStore {
    /// Open or create a file for append-only license storage.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut ids = HashSet::new();
        for line in BufReader::new(&file).lines() {
            let line = line?;
            if let Ok(stored) = serde_json::from_str::<StoredId>(&line) {
                ids.insert(stored.id);
            }
        }

        Ok(Self {
            inner: Mutex::new(FileState { file, ids }),
        })
    }
}

impl LicenseStore for FileLicenseStore {
    fn add(&self, license: &License) -> Result<(), IssuerError> {
        let mut line = serde_json::to_vec(license)
            .map_err(|e| IssuerError::Persistence(e.to_string()))?;
        line.push(b'\n');

        let mut state = self.inner.lock().map_err(poisoned)?;
        let FileState { file, ids } = &mut *state;
        if ids.contains(&license.id) {
            return Err(IssuerError::Persistence(format!(
                "license already exists: {}",
                license.id
            )));
        }
        // A single write keeps each record on one line under concurrent adds.
        file.write_all(&line)
            .and_then(|_| file.flush())
            .map_err(|e| IssuerError::Persistence(e.to_string()))?;
        ids.insert(license.id.clone());
        Ok(())
    }
}
