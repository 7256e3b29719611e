//! Interaction verdicts.

use std::fmt;

use lsd_core::Interaction;

use crate::error::{ErrorKind, InteractionError};

/// Verdict text for a response that passed every check.
pub const SERVER_RESPONSE_OK: &str = "Server response is 200";

/// The outcome of one interaction: a message for the operator and
/// whether the server behaved conformantly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub interaction: Interaction,
    pub message: String,
    /// Why the interaction is non-conformant, if it is.
    pub failure: Option<ErrorKind>,
}

impl Verdict {
    pub fn pass(interaction: Interaction, message: impl Into<String>) -> Self {
        Self {
            interaction,
            message: message.into(),
            failure: None,
        }
    }

    pub fn fail(interaction: Interaction, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            interaction,
            message: message.into(),
            failure: Some(kind),
        }
    }

    /// Build the verdict for a finished interaction and log it.
    pub fn from_outcome(
        interaction: Interaction,
        outcome: Result<String, InteractionError>,
    ) -> Self {
        match outcome {
            Ok(message) => {
                tracing::info!(%interaction, verdict = %message, "interaction conformant");
                Self::pass(interaction, message)
            }
            Err(e) => {
                let kind = e.kind();
                tracing::warn!(%interaction, ?kind, error = %e, "interaction non-conformant");
                Self::fail(interaction, kind, e.to_string())
            }
        }
    }

    pub fn is_conformant(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
