//! # Protocol Documents
//!
//! Typed views over the three JSON documents exchanged with an LSD server:
//!
//! - **License Document** — the license grant bundled with the publication
//!   (`META-INF/license.lcpl`), pointing at its Status Document.
//! - **Status Document** — the server-held state of one license, with the
//!   hypermedia links for each interaction.
//! - **Error Document** — the problem body returned on 4xx/5xx.
//!
//! Documents are never mutated locally. Each typed view keeps the raw JSON
//! it was decoded from, so structural validation and display operate on
//! exactly what the server sent. Timestamps are kept as strings and only
//! normalized when an invariant needs them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::temporal::Timestamp;

/// Media type of an LCP License Document, as used on typed `renew` links.
pub const LCP_LICENSE_MEDIA_TYPE: &str = "application/vnd.readium.lcp.license-1.0+json";

/// Later spelling of [`LCP_LICENSE_MEDIA_TYPE`] adopted by LCP 1.0 final.
pub const LCP_LICENSE_MEDIA_TYPE_V1: &str = "application/vnd.readium.lcp.license.v1.0+json";

/// Media type of a License Status Document.
pub const LSD_MEDIA_TYPE: &str = "application/vnd.readium.license.status.v1.0+json";

/// Whether `media_type` names an LCP License Document.
pub fn is_license_media_type(media_type: &str) -> bool {
    media_type == LCP_LICENSE_MEDIA_TYPE || media_type == LCP_LICENSE_MEDIA_TYPE_V1
}

// ─── Status values ───────────────────────────────────────────────────

/// The `status` field of a Status Document.
///
/// ```text
/// ready ──register──▶ active ──renew──▶ active
///   │                   │
///   └──return──▶ cancelled   └──return──▶ returned
/// ```
///
/// Values outside the ones the client reasons about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LicenseStatus {
    Ready,
    Active,
    Revoked,
    Returned,
    Cancelled,
    Expired,
    /// Any other protocol value, passed through opaquely.
    Other(String),
}

impl LicenseStatus {
    /// Whether no further interaction can change this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Returned | Self::Cancelled | Self::Revoked | Self::Expired
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for LicenseStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ready" => Self::Ready,
            "active" => Self::Active,
            "revoked" => Self::Revoked,
            "returned" => Self::Returned,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            _ => Self::Other(s),
        }
    }
}

impl From<LicenseStatus> for String {
    fn from(status: LicenseStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Links ───────────────────────────────────────────────────────────

/// A hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URI, possibly a URI template.
    pub href: String,
    /// Media type of the target, used to choose among links of one relation.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Whether `href` is a URI template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

/// Links grouped by relation, in document order.
///
/// Accepts both the keyed form (`{"status": {...}, "renew": [{...}]}`) and
/// the array form with a `rel` member on each link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap {
    by_rel: BTreeMap<String, Vec<Link>>,
}

impl LinkMap {
    /// All links of a relation.
    pub fn get(&self, rel: &str) -> &[Link] {
        self.by_rel.get(rel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first link of a relation.
    pub fn first(&self, rel: &str) -> Option<&Link> {
        self.get(rel).first()
    }

    /// The first link of a relation whose media type satisfies `accept`.
    pub fn by_type(&self, rel: &str, accept: impl Fn(&str) -> bool) -> Option<&Link> {
        self.get(rel)
            .iter()
            .find(|l| l.media_type.as_deref().is_some_and(&accept))
    }

    /// Relation names present, sorted.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.by_rel.keys().map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Link),
    Many(Vec<Link>),
}

#[derive(Deserialize)]
struct RelLink {
    rel: String,
    #[serde(flatten)]
    link: Link,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLinks {
    Keyed(BTreeMap<String, OneOrMany>),
    Listed(Vec<RelLink>),
}

impl<'de> Deserialize<'de> for LinkMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut by_rel: BTreeMap<String, Vec<Link>> = BTreeMap::new();
        match RawLinks::deserialize(deserializer)? {
            RawLinks::Keyed(map) => {
                for (rel, links) in map {
                    let links = match links {
                        OneOrMany::One(link) => vec![link],
                        OneOrMany::Many(links) => links,
                    };
                    by_rel.insert(rel, links);
                }
            }
            RawLinks::Listed(list) => {
                for RelLink { rel, link } in list {
                    by_rel.entry(rel).or_default().push(link);
                }
            }
        }
        Ok(Self { by_rel })
    }
}

// ─── License Document ────────────────────────────────────────────────

/// `rights` block of a License Document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Rights {
    /// License expiry.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
}

/// A License Document.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub issued: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub rights: Rights,
    #[serde(default)]
    pub links: LinkMap,
    #[serde(skip)]
    raw: Value,
}

impl LicenseDocument {
    const KIND: &'static str = "License Document";

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|source| DocumentError::Decode { kind: Self::KIND, source })?;
        Self::from_value(value)
    }

    /// Decode from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_value(value.clone())
            .map_err(|source| DocumentError::Decode { kind: Self::KIND, source })?;
        doc.raw = value;
        Ok(doc)
    }

    /// The JSON this document was decoded from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The `status` link pointing at the associated Status Document.
    pub fn status_link(&self) -> Result<&Link, DocumentError> {
        self.links.first("status").ok_or(DocumentError::MissingField {
            kind: Self::KIND,
            field: "links.status.href",
        })
    }

    /// Last modification instant: `updated`, or `issued` for a license
    /// that has never been modified.
    pub fn last_modified(&self) -> Result<Timestamp, DocumentError> {
        match (&self.updated, &self.issued) {
            (Some(updated), _) => parse_field(Self::KIND, "updated", updated),
            (None, Some(issued)) => parse_field(Self::KIND, "issued", issued),
            (None, None) => Err(DocumentError::MissingField {
                kind: Self::KIND,
                field: "updated",
            }),
        }
    }

    /// The normalized `rights.end`, if the license has an expiry.
    pub fn rights_end(&self) -> Result<Option<Timestamp>, DocumentError> {
        self.rights
            .end
            .as_deref()
            .map(|end| parse_field(Self::KIND, "rights.end", end))
            .transpose()
    }
}

// ─── Status Document ─────────────────────────────────────────────────

/// `updated` block of a Status Document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdated {
    /// Last time the License Document changed.
    pub license: String,
    /// Last time the status changed.
    pub status: String,
}

/// A License Status Document.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    pub id: Option<String>,
    pub status: LicenseStatus,
    pub updated: StatusUpdated,
    #[serde(default)]
    pub links: LinkMap,
    #[serde(skip)]
    raw: Value,
}

impl StatusDocument {
    const KIND: &'static str = "Status Document";

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|source| DocumentError::Decode { kind: Self::KIND, source })?;
        Self::from_value(value)
    }

    /// Decode from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_value(value.clone())
            .map_err(|source| DocumentError::Decode { kind: Self::KIND, source })?;
        doc.raw = value;
        Ok(doc)
    }

    /// The JSON this document was decoded from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Normalized `updated.status`.
    pub fn status_updated(&self) -> Result<Timestamp, DocumentError> {
        parse_field(Self::KIND, "updated.status", &self.updated.status)
    }

    /// Normalized `updated.license`.
    pub fn license_updated(&self) -> Result<Timestamp, DocumentError> {
        parse_field(Self::KIND, "updated.license", &self.updated.license)
    }

    /// The first link of `rel`, or a missing-field error naming it.
    pub fn link(&self, rel: &'static str) -> Result<&Link, DocumentError> {
        self.links.first(rel).ok_or(DocumentError::MissingField {
            kind: Self::KIND,
            field: rel,
        })
    }
}

// ─── Error Document ──────────────────────────────────────────────────

/// Problem body returned with 4xx/5xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDocument {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorDocument {
    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text).map_err(|source| DocumentError::Decode {
            kind: "Error Document",
            source,
        })
    }
}

fn parse_field(
    kind: &'static str,
    field: &'static str,
    value: &str,
) -> Result<Timestamp, DocumentError> {
    Timestamp::parse(value).map_err(|source| DocumentError::InvalidTimestamp { kind, field, source })
}
