//! The issuing endpoints.
//!
//! `Issuer` ties request decoding, completion, persistence and packaging
//! together for the two ways a license leaves the server: as a bare license
//! document, or embedded in its protected publication.
//!
//! Check redaction is a per-endpoint policy ([`IssuerConfig::license_check`]
//! and [`IssuerConfig::publication_check`]). It applies to the copy that is
//! returned, never to the stored copy. Because the signature covers the
//! check, a stripped copy is signed again so that every emitted license
//! verifies.

use std::io::Cursor;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::complete;
use crate::config::{CheckRedaction, IssuerConfig};
use crate::error::IssuerError;
use crate::license::License;
use crate::package::{self, Publication};
use crate::request;
use crate::sign;
use crate::store::{CertificateProvider, ContentStore, LicenseStore};

/// Media type of a license document.
pub const LICENSE_MEDIA_TYPE: &str = "application/vnd.readium.lcp.license.1-0+json";

/// Download name of a license document.
pub const LICENSE_FILE_NAME: &str = "license.lcpl";

/// A response ready to be written by the hosting server.
#[derive(Debug, Clone)]
pub struct IssuedResponse {
    pub content_type: String,
    pub content_disposition: String,
    pub body: Vec<u8>,
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', ""))
}

/// License issuing service. Holds no per-request state.
pub struct Issuer {
    config: IssuerConfig,
    content: Arc<dyn ContentStore>,
    licenses: Arc<dyn LicenseStore>,
    certificates: Arc<dyn CertificateProvider>,
}

impl Issuer {
    pub fn new(
        config: IssuerConfig,
        content: Arc<dyn ContentStore>,
        licenses: Arc<dyn LicenseStore>,
        certificates: Arc<dyn CertificateProvider>,
    ) -> Self {
        Self {
            config,
            content,
            licenses,
            certificates,
        }
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Complete a decoded request without persisting it.
    pub fn complete(&self, license: License, content_id: &str) -> Result<License, IssuerError> {
        let credential = self.certificates.credential()?;
        complete::complete_license(
            license,
            content_id,
            self.content.as_ref(),
            credential,
            &self.config,
        )
    }

    /// Issue a bare license for `content_id`.
    ///
    /// The returned copy is redacted and serialized before the license is
    /// persisted, so any failure leaves the store untouched.
    #[instrument(skip_all, fields(content_id = %content_id))]
    pub fn issue_license(
        &self,
        content_id: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<IssuedResponse, IssuerError> {
        let request = request::decode_license(content_type, body).inspect_err(|e| {
            warn!(error = %e, "license request rejected");
        })?;

        let license = self.complete(request, content_id)?;
        let response = self.redact(&license, self.config.license_check)?;
        let body = package::wire_bytes(&response)?;

        // Persisting is the last step that can fail.
        self.licenses.add(&license)?;
        info!(license_id = %license.id, "license issued");

        Ok(IssuedResponse {
            content_type: LICENSE_MEDIA_TYPE.to_string(),
            content_disposition: attachment(LICENSE_FILE_NAME),
            body,
        })
    }

    /// Issue a license and return it embedded in the content container.
    ///
    /// The container is opened before anything else happens, and the new
    /// archive is fully built before the license is persisted, so a
    /// malformed container leaves no stored license behind.
    #[instrument(skip_all, fields(content_id = %content_id))]
    pub fn issue_protected_publication(
        &self,
        content_id: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<IssuedResponse, IssuerError> {
        let mut request = request::decode_license(content_type, body).inspect_err(|e| {
            warn!(error = %e, "publication request rejected");
        })?;

        let item = self.content.get(content_id)?;
        let raw = self.content.get_blob(content_id)?;
        let publication = Publication::open(Cursor::new(raw.as_slice()))?;

        // The link goes in before signing so the signature covers it.
        package::attach_publication_link(
            &mut request,
            content_id,
            &item,
            &self.config.publication_media_type,
        );
        let license = self.complete(request, content_id)?;
        let embedded = self.redact(&license, self.config.publication_check)?;
        let container = publication
            .embed(&package::wire_bytes(&embedded)?, Cursor::new(Vec::new()))?
            .into_inner();

        self.licenses.add(&license)?;
        info!(
            license_id = %license.id,
            size = container.len(),
            "protected publication issued"
        );

        Ok(IssuedResponse {
            content_type: self.config.publication_media_type.clone(),
            content_disposition: attachment(item.file_name()),
            body: container,
        })
    }

    fn redact(&self, license: &License, policy: CheckRedaction) -> Result<License, IssuerError> {
        let mut copy = license.clone();
        if policy == CheckRedaction::Strip {
            copy.encryption.user_key.check = None;
            sign::sign_license(&mut copy, self.certificates.credential()?)?;
        }
        Ok(copy)
    }
}
