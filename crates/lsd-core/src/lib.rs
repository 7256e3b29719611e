//! # lsd-core — Foundational Types for the LSD Conformance Client
//!
//! I/O-free building blocks shared by every other crate in the workspace:
//!
//! - [`temporal`]: the Timestamp Normalizer. Both ISO-8601 shapes LSD
//!   servers emit (`Z` suffix, numeric offset) normalize to one UTC
//!   [`Timestamp`]; all temporal invariants compare these, never strings.
//!
//! - [`template`]: the Link Resolver. Expands `{?id,name,end}` query
//!   templates on interaction links.
//!
//! - [`document`]: typed License, Status and Error Documents, with link
//!   maps that accept both the keyed and the `rel`-array link layouts.
//!
//! - [`interaction`]: the five interaction kinds.
//!
//! ## Crate Policy
//!
//! - No network or filesystem access.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod interaction;
pub mod template;
pub mod temporal;

pub use document::{
    is_license_media_type, ErrorDocument, LicenseDocument, LicenseStatus, Link, LinkMap, Rights,
    StatusDocument, StatusUpdated, LCP_LICENSE_MEDIA_TYPE, LCP_LICENSE_MEDIA_TYPE_V1,
    LSD_MEDIA_TYPE,
};
pub use error::{DocumentError, TemplateError, TimestampError};
pub use interaction::Interaction;
pub use template::{expand, TemplateParams};
pub use temporal::Timestamp;
