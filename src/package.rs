//! Protected publication packaging.
//!
//! Embeds a signed license into a content container (a ZIP archive, e.g.
//! EPUB). The operation is a pure addition: every existing entry is copied
//! with its compressed bytes, CRC and position untouched, and one new entry
//! is appended at [`LICENSE_PATH`].

use std::io::{Cursor, Read, Seek, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::IssuerError;
use crate::license::{License, Link, PUBLICATION_LINK};
use crate::store::ContentItem;

/// Reserved archive path of the embedded license.
pub const LICENSE_PATH: &str = "META-INF/license.lcpl";

/// An opened content container, ready to receive a license.
pub struct Publication<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Publication<R> {
    /// Open the container. Malformed input fails with `ArchiveError`.
    pub fn open(reader: R) -> Result<Self, IssuerError> {
        let archive = ZipArchive::new(reader)?;
        if archive.index_for_name(LICENSE_PATH).is_some() {
            return Err(IssuerError::Archive(format!(
                "container already holds {}",
                LICENSE_PATH
            )));
        }
        Ok(Self { archive })
    }

    /// Number of entries in the source container.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Write the container plus the license entry to `writer`.
    pub fn embed<W: Write + Seek>(
        mut self,
        license_json: &[u8],
        writer: W,
    ) -> Result<W, IssuerError> {
        let mut zip = ZipWriter::new(writer);
        zip.set_raw_comment(self.archive.comment().to_vec().into_boxed_slice());

        for index in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(index)?;
            zip.raw_copy_file(entry)?;
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(LICENSE_PATH, options)?;
        zip.write_all(license_json)
            .map_err(|e| IssuerError::Archive(e.to_string()))?;
        debug!(
            entries = self.archive.len() + 1,
            license_len = license_json.len(),
            "license embedded"
        );

        Ok(zip.finish()?)
    }
}

/// Point the license's `publication` link at the content.
pub fn attach_publication_link(
    license: &mut License,
    content_id: &str,
    item: &ContentItem,
    media_type: &str,
) {
    license.content_id = content_id.to_string();
    license.links.insert(
        PUBLICATION_LINK.to_string(),
        Link {
            href: item.public_url.clone(),
            media_type: media_type.to_string(),
            ..Link::default()
        },
    );
}

/// Serialize `license` and embed it into the container in `raw`.
pub fn package_license(raw: &[u8], license: &License) -> Result<Vec<u8>, IssuerError> {
    let publication = Publication::open(Cursor::new(raw))?;
    let license_json = wire_bytes(license)?;
    let out = publication.embed(&license_json, Cursor::new(Vec::new()))?;
    Ok(out.into_inner())
}

/// The wire form of a license, as served and as embedded.
pub fn wire_bytes(license: &License) -> Result<Vec<u8>, IssuerError> {
    let mut bytes =
        serde_json::to_vec(license).map_err(|e| IssuerError::Archive(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}
