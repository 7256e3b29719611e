//! # Error Types
//!
//! Errors raised by the pure (I/O-free) building blocks of the client.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! - Timestamp errors carry the offending input verbatim.
//! - Template errors carry the template that could not be expanded.
//! - Document errors name the document kind and the offending field.

use thiserror::Error;

/// A timestamp string did not match either accepted ISO-8601 shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The string is not `YYYY-MM-DDTHH:MM:SSZ` or `YYYY-MM-DDTHH:MM:SS±HH:MM`.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A link template could not be expanded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No `{...}` expansion block was found in the template.
    #[error("malformed URI template {template:?}: no query expansion block")]
    MalformedTemplate {
        /// The template as published by the server.
        template: String,
    },
}

/// A protocol document could not be decoded or lacks a required value.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The body was not JSON, or the JSON did not have the expected shape.
    #[error("cannot decode {kind}: {source}")]
    Decode {
        /// Which document was being decoded.
        kind: &'static str,
        /// Underlying decoder error.
        source: serde_json::Error,
    },

    /// A field needed for evaluation is absent.
    #[error("{kind} has no {field}")]
    MissingField {
        /// Which document was inspected.
        kind: &'static str,
        /// JSON path of the missing field.
        field: &'static str,
    },

    /// A timestamp field holds an unparseable value.
    #[error("{kind} field {field}: {source}")]
    InvalidTimestamp {
        /// Which document was inspected.
        kind: &'static str,
        /// JSON path of the timestamp field.
        field: &'static str,
        /// Normalizer error.
        source: TimestampError,
    },
}
