//! # Document Store Accessors
//!
//! Fetch the Status Document associated with a License Document, and the
//! License Document associated with a Status Document. Both go through the
//! injected [`Transport`]; every exchange is logged at `debug`.

use lsd_core::template::{self, TemplateParams};
use lsd_core::{DocumentError, ErrorDocument, LicenseDocument, Link, StatusDocument};
use serde_json::Value;

use crate::config::DeviceIdentity;
use crate::error::InteractionError;
use crate::transport::{HttpMethod, HttpResponse, Transport};

/// Result of asking the server for a License Document.
#[derive(Debug, Clone, PartialEq)]
pub enum LicenseFetch {
    /// HTTP 200 with a JSON body.
    Document(Value),
    /// Any other status code. The body is not interpreted.
    NoDocument { status: u16 },
}

impl LicenseFetch {
    /// Decode the fetched license, or report that there was none.
    pub fn into_license(self) -> Result<LicenseDocument, InteractionError> {
        match self {
            Self::Document(value) => Ok(LicenseDocument::from_value(value)?),
            Self::NoDocument { status } => Err(InteractionError::NoDocument {
                what: "License Document",
                status,
            }),
        }
    }
}

/// Percent-encode a query value.
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Accessors for the documents linked from each other.
pub struct DocumentStore {
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}

impl DocumentStore {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue one request through the transport.
    pub fn send(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, InteractionError> {
        tracing::debug!(%method, url, "sending request");
        let response = self.transport.send(method, url).map_err(|e| {
            tracing::warn!(%method, url, error = %e, "request failed");
            e
        })?;
        tracing::debug!(
            %method,
            url,
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );
        Ok(response)
    }

    /// URL of the Status Document for this device.
    ///
    /// The status link is not templated: `id` and `name` are appended as
    /// literal query parameters. A templated link is expanded instead.
    pub fn status_url(
        license: &LicenseDocument,
        device: &DeviceIdentity,
    ) -> Result<String, InteractionError> {
        let href = &license.status_link()?.href;
        let id = encode_query_value(&device.id);
        let name = encode_query_value(&device.name);
        if template::is_templated(href) {
            return Ok(template::expand(href, &TemplateParams::device(&id, &name))?);
        }
        let sep = if href.contains('?') { '&' } else { '?' };
        Ok(format!("{href}{sep}id={id}&name={name}"))
    }

    /// GET the Status Document and return it undecoded.
    ///
    /// A 4xx/5xx answer is reported with the server's error document.
    pub fn fetch_status_value(
        &self,
        license: &LicenseDocument,
        device: &DeviceIdentity,
    ) -> Result<Value, InteractionError> {
        let url = Self::status_url(license, device)?;
        let response = self.send(HttpMethod::Get, &url)?;
        match response.status {
            200 => parse_json("Status Document", &response.body),
            400..=599 => Err(protocol_error(&response)),
            status => Err(InteractionError::UnknownResponse { status }),
        }
    }

    /// GET and decode the Status Document.
    pub fn fetch_status_document(
        &self,
        license: &LicenseDocument,
        device: &DeviceIdentity,
    ) -> Result<StatusDocument, InteractionError> {
        let value = self.fetch_status_value(license, device)?;
        Ok(StatusDocument::from_value(value)?)
    }

    /// GET the License Document linked from `status`.
    pub fn fetch_license_document(
        &self,
        status: &StatusDocument,
    ) -> Result<LicenseFetch, InteractionError> {
        let url = resolve_plain(status.link("license")?)?;
        let response = self.send(HttpMethod::Get, &url)?;
        if !response.is_ok() {
            tracing::warn!(%url, status = response.status, "license link did not return a document");
            return Ok(LicenseFetch::NoDocument {
                status: response.status,
            });
        }
        Ok(LicenseFetch::Document(parse_json(
            "License Document",
            &response.body,
        )?))
    }
}

/// A link followed without parameters: templates collapse to nothing.
fn resolve_plain(link: &Link) -> Result<String, InteractionError> {
    if template::is_templated(&link.href) {
        Ok(template::expand(&link.href, &TemplateParams::default())?)
    } else {
        Ok(link.href.clone())
    }
}

pub(crate) fn parse_json(kind: &'static str, body: &str) -> Result<Value, InteractionError> {
    serde_json::from_str(body)
        .map_err(|source| InteractionError::Decode(DocumentError::Decode { kind, source }))
}

/// Map a 4xx/5xx response to a `Server` error carrying its error document.
pub(crate) fn protocol_error(response: &HttpResponse) -> InteractionError {
    match ErrorDocument::from_json(&response.body) {
        Ok(doc) => InteractionError::Server {
            status: response.status,
            error_type: doc.error_type.unwrap_or_else(|| "(no error type)".to_string()),
            title: doc.title.unwrap_or_else(|| "(no error title)".to_string()),
        },
        Err(e) => InteractionError::Decode(e),
    }
}
