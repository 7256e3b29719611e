//! Interaction error types.
//!
//! Every failure an interaction can meet is an [`InteractionError`]. None
//! of them escape the engine's public entry points: they are converted
//! into a non-conformant [`Verdict`](crate::Verdict) whose message is the
//! error's `Display` text.

use lsd_core::{DocumentError, Interaction, LicenseStatus, TemplateError, Timestamp, TimestampError};

use crate::transport::TransportError;

/// Failure classes reported in verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Decode,
    MalformedTemplate,
    InvalidTimestamp,
    PreconditionFailed,
    InvariantViolation,
    Server,
    UnknownResponse,
}

/// Errors from a single interaction.
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    /// Connection failure, timeout, or unusable URL.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Non-JSON or malformed body, or a required member missing.
    #[error(transparent)]
    Decode(DocumentError),

    /// The server answered the document request with something other than 200.
    #[error("no {what} available: server response is {status}")]
    NoDocument { what: &'static str, status: u16 },

    /// An interaction link has no expandable query template.
    #[error(transparent)]
    MalformedTemplate(#[from] TemplateError),

    /// A timestamp, from the server or the caller, does not parse.
    #[error("{context}: {source}")]
    InvalidTimestamp {
        context: String,
        source: TimestampError,
    },

    /// The interaction is not legal from the current state.
    #[error("{interaction}: precondition failed: {reason}")]
    PreconditionFailed {
        interaction: Interaction,
        reason: String,
    },

    /// A 200 response broke a protocol invariant.
    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),

    /// 4xx/5xx with a protocol error document.
    #[error("Server response is {status}\n{error_type}\n{title}")]
    Server {
        status: u16,
        error_type: String,
        title: String,
    },

    /// A status code the protocol does not define for this interaction.
    #[error("Unknown response code {status}.")]
    UnknownResponse { status: u16 },
}

impl InteractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) | Self::NoDocument { .. } => ErrorKind::Decode,
            Self::MalformedTemplate(_) => ErrorKind::MalformedTemplate,
            Self::InvalidTimestamp { .. } => ErrorKind::InvalidTimestamp,
            Self::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::Server { .. } => ErrorKind::Server,
            Self::UnknownResponse { .. } => ErrorKind::UnknownResponse,
        }
    }

    pub(crate) fn precondition(interaction: Interaction, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            interaction,
            reason: reason.into(),
        }
    }
}

impl From<DocumentError> for InteractionError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::InvalidTimestamp {
                kind,
                field,
                source,
            } => Self::InvalidTimestamp {
                context: format!("{kind} {field}"),
                source,
            },
            other => Self::Decode(other),
        }
    }
}

/// A server response that breaks a protocol invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Register returned 200 without activating, or without advancing
    /// `updated.status`.
    #[error(
        "Server response is 200\nWrong response received. \
         (status: {status}, updated.status: {before} -> {after})"
    )]
    RegisterWrongResponse {
        status: LicenseStatus,
        before: Timestamp,
        after: Timestamp,
    },

    /// Renew returned 200 without advancing `updated.license`.
    #[error("Updated date in status document is not updated ({before} -> {after})")]
    StatusLicenseNotUpdated { before: Timestamp, after: Timestamp },

    /// The renewed license does not end on the requested date.
    #[error(
        "End date in Rights in license document is difference with End date \
         (requested {requested}, got {})",
        display_opt(.actual)
    )]
    EndDateMismatch {
        requested: Timestamp,
        actual: Option<Timestamp>,
    },

    /// The renewed license's `updated` did not advance, or disagrees with
    /// the Status Document's `updated.license`.
    #[error(
        "License updated timestamp is not updated \
         (before {before}, after {after}, status document {status_document})"
    )]
    LicenseNotUpdated {
        before: Timestamp,
        after: Timestamp,
        status_document: Timestamp,
    },

    /// Return did not perform exactly one of `ready → cancelled`,
    /// `active → returned`.
    #[error("Status in status document is not valid. before: {before} current: {after}")]
    StatusTransition {
        before: LicenseStatus,
        after: LicenseStatus,
    },

    /// Return did not advance the License Document's `updated`.
    #[error("Timestamp about license updated in lsd is not updated ({before} -> {after})")]
    ReturnLicenseNotUpdated { before: Timestamp, after: Timestamp },

    /// The returned license's `updated` disagrees with `updated.license`.
    #[error(
        "Timestamp about license updated in lcp is not updated \
         (license {license}, status document {status_document})"
    )]
    ReturnLicenseMismatch {
        license: Timestamp,
        status_document: Timestamp,
    },

    /// Return did not advance `updated.status`.
    #[error("Timestamp about status updated is not updated ({before} -> {after})")]
    StatusNotUpdated { before: Timestamp, after: Timestamp },
}

fn display_opt(ts: &Option<Timestamp>) -> String {
    ts.map_or_else(|| "no end date".to_string(), |t| t.to_string())
}
