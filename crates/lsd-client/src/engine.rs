//! # Interaction Engine
//!
//! One operation per LSD interaction. Each follows the same two phases:
//!
//! 1. **Request**: take a fresh Status Document snapshot, check the
//!    status precondition, resolve the interaction link with the device
//!    (and end date) parameters, and issue the call.
//! 2. **Evaluate**: compare the pre- and post-call documents against the
//!    protocol invariants. The first failing check decides the verdict.
//!
//! The evaluation steps are plain functions ([`evaluate_register`],
//! [`evaluate_renew`], [`evaluate_return`]) so they can be exercised
//! without a server.
//!
//! ## State Machine
//!
//! ```text
//! ready  ──register──▶ active
//! active ──renew─────▶ active   (rights.end updated)
//! ready  ──return────▶ cancelled
//! active ──return────▶ returned
//! ```
//!
//! Any other attempted transition is rejected before a request is sent.
//!
//! ## Pacing
//!
//! Servers stamp `updated.*` with one-second granularity. Renew and return
//! wait [`ClientConfig::mutation_delay`] after the snapshot so the pre- and
//! post-call instants differ.

use lsd_core::template::{self, TemplateParams};
use lsd_core::{
    is_license_media_type, Interaction, LicenseDocument, LicenseStatus, StatusDocument,
    Timestamp, LCP_LICENSE_MEDIA_TYPE,
};
use lsd_schema::{DocumentValidator, ValidationReport};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ErrorKind, InteractionError, InvariantViolation};
use crate::store::{encode_query_value, protocol_error, DocumentStore, LicenseFetch};
use crate::transport::{HttpMethod, HttpResponse, HttpTransport, Transport, TransportError};
use crate::verdict::{Verdict, SERVER_RESPONSE_OK};

/// A fetched Status Document and its structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCheck {
    pub document: Value,
    pub report: ValidationReport,
}

impl StatusCheck {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }

    /// The raw `status` member.
    pub fn status(&self) -> Option<&str> {
        self.document.get("status").and_then(Value::as_str)
    }

    /// Verdict for the `fetch` interaction.
    pub fn verdict(&self) -> Verdict {
        if !self.is_valid() {
            return Verdict::fail(Interaction::Fetch, ErrorKind::Decode, self.report.diagnostic());
        }
        Verdict::pass(
            Interaction::Fetch,
            format!("Status is {}", self.status().unwrap_or("(none)")),
        )
    }
}

/// Drives LSD interactions for one device.
pub struct InteractionEngine {
    store: DocumentStore,
    validator: Box<dyn DocumentValidator>,
    config: ClientConfig,
}

impl std::fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("validator", &self.validator.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InteractionEngine {
    pub fn new(
        config: ClientConfig,
        transport: impl Transport + 'static,
        validator: impl DocumentValidator + 'static,
    ) -> Self {
        Self {
            store: DocumentStore::new(Box::new(transport)),
            validator: Box::new(validator),
            config,
        }
    }

    /// Engine over a blocking `reqwest` transport built from `config`.
    pub fn with_http(
        config: ClientConfig,
        validator: impl DocumentValidator + 'static,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport, validator))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Fetch the Status Document for `license` and validate its structure.
    ///
    /// # Errors
    ///
    /// Transport, decode, and protocol errors. An invalid document is not
    /// an error; inspect [`StatusCheck::report`].
    pub fn fetch_status(&self, license: &LicenseDocument) -> Result<StatusCheck, InteractionError> {
        let document = self.store.fetch_status_value(license, &self.config.device)?;
        let report = self.validator.validate(&document);
        tracing::info!(
            validator = self.validator.name(),
            valid = report.is_valid(),
            "validated status document"
        );
        Ok(StatusCheck { document, report })
    }

    /// GET the License Document linked from `status`.
    pub fn fetch_license(&self, status: &StatusDocument) -> Result<LicenseFetch, InteractionError> {
        self.store.fetch_license_document(status)
    }

    /// Activate the license for this device.
    pub fn register(&self, license: &LicenseDocument) -> Verdict {
        Verdict::from_outcome(Interaction::Register, self.try_register(license))
    }

    /// Extend the license to `end`, an ISO-8601 timestamp.
    pub fn renew(&self, license: &LicenseDocument, end: &str) -> Verdict {
        Verdict::from_outcome(Interaction::Renew, self.try_renew(license, end))
    }

    /// Return (or cancel) the license.
    pub fn return_license(&self, license: &LicenseDocument) -> Verdict {
        Verdict::from_outcome(Interaction::Return, self.try_return(license))
    }

    fn try_register(&self, license: &LicenseDocument) -> Result<String, InteractionError> {
        let before = self.snapshot(license)?;
        require_status(Interaction::Register, &before, &[LicenseStatus::Ready])?;

        let url = self.resolve(before.link("register")?.href.as_str(), None)?;
        let response = self.store.send(HttpMethod::Post, &url)?;
        evaluate_register(&before, &response)
    }

    fn try_renew(&self, license: &LicenseDocument, end: &str) -> Result<String, InteractionError> {
        let requested = Timestamp::parse(end).map_err(|source| InteractionError::InvalidTimestamp {
            context: "requested end date".to_string(),
            source,
        })?;

        let before = self.snapshot(license)?;
        require_status(Interaction::Renew, &before, &[LicenseStatus::Active])?;

        let link = before
            .links
            .by_type("renew", is_license_media_type)
            .ok_or_else(|| {
                InteractionError::precondition(
                    Interaction::Renew,
                    format!("status document has no renew link of type {LCP_LICENSE_MEDIA_TYPE}"),
                )
            })?;
        let url = self.resolve(&link.href, Some(end))?;

        self.pace();
        let response = self.store.send(HttpMethod::Put, &url)?;
        let after = mutation_response(&response)?;
        let new_license = self.store.fetch_license_document(&after)?.into_license()?;

        evaluate_renew(&before, &after, license, &new_license, requested)?;
        Ok(SERVER_RESPONSE_OK.to_string())
    }

    fn try_return(&self, license: &LicenseDocument) -> Result<String, InteractionError> {
        let before = self.snapshot(license)?;
        if before.status.is_terminal() {
            return Err(InteractionError::precondition(
                Interaction::Return,
                format!("license is already {}", before.status),
            ));
        }
        require_status(
            Interaction::Return,
            &before,
            &[LicenseStatus::Ready, LicenseStatus::Active],
        )?;

        let url = self.resolve(before.link("return")?.href.as_str(), None)?;

        self.pace();
        let response = self.store.send(HttpMethod::Put, &url)?;
        let after = mutation_response(&response)?;
        let new_license = self.store.fetch_license_document(&after)?.into_license()?;

        evaluate_return(&before, &after, license, &new_license)?;
        Ok(SERVER_RESPONSE_OK.to_string())
    }

    fn snapshot(&self, license: &LicenseDocument) -> Result<StatusDocument, InteractionError> {
        self.store.fetch_status_document(license, &self.config.device)
    }

    /// Expand an interaction link with the encoded device parameters.
    fn resolve(&self, href: &str, end: Option<&str>) -> Result<String, InteractionError> {
        let id = encode_query_value(&self.config.device.id);
        let name = encode_query_value(&self.config.device.name);
        let end = end.map(encode_query_value);

        let mut params = TemplateParams::device(&id, &name);
        if let Some(end) = end.as_deref() {
            params = params.with_end(end);
        }
        Ok(template::expand(href, &params)?)
    }

    fn pace(&self) {
        let delay = self.config.mutation_delay;
        if !delay.is_zero() {
            tracing::debug!(?delay, "pausing before mutation");
            std::thread::sleep(delay);
        }
    }
}

fn require_status(
    interaction: Interaction,
    snapshot: &StatusDocument,
    allowed: &[LicenseStatus],
) -> Result<(), InteractionError> {
    if allowed.contains(&snapshot.status) {
        return Ok(());
    }
    let expected: Vec<&str> = allowed.iter().map(LicenseStatus::as_str).collect();
    Err(InteractionError::precondition(
        interaction,
        format!(
            "license status is {}, expected {}",
            snapshot.status,
            expected.join(" or ")
        ),
    ))
}

/// Decode a renew/return answer: 200 carries the new Status Document,
/// any 4xx/5xx an error document.
fn mutation_response(response: &HttpResponse) -> Result<StatusDocument, InteractionError> {
    match response.status {
        200 => Ok(StatusDocument::from_json(&response.body)?),
        400..=599 => Err(protocol_error(response)),
        status => Err(InteractionError::UnknownResponse { status }),
    }
}

/// Evaluate a register response against the pre-call snapshot.
///
/// 200 must carry `status = active` with a strictly later
/// `updated.status`. 400 and 5xx surface the server's error document.
pub fn evaluate_register(
    before: &StatusDocument,
    response: &HttpResponse,
) -> Result<String, InteractionError> {
    match response.status {
        200 => {
            let after = StatusDocument::from_json(&response.body)?;
            let (old, new) = (before.status_updated()?, after.status_updated()?);
            if after.status != LicenseStatus::Active || !new.strictly_after(&old) {
                return Err(InvariantViolation::RegisterWrongResponse {
                    status: after.status,
                    before: old,
                    after: new,
                }
                .into());
            }
            Ok(SERVER_RESPONSE_OK.to_string())
        }
        400 | 500..=599 => Err(protocol_error(response)),
        status => Err(InteractionError::UnknownResponse { status }),
    }
}

/// Check a successful renew, in order:
///
/// 1. `updated.license` of the Status Document strictly increased.
/// 2. The new license's `rights.end` equals `requested`.
/// 3. The new license's `updated` strictly increased and equals the
///    Status Document's `updated.license`.
pub fn evaluate_renew(
    before: &StatusDocument,
    after: &StatusDocument,
    old_license: &LicenseDocument,
    new_license: &LicenseDocument,
    requested: Timestamp,
) -> Result<(), InteractionError> {
    let (old_lsd, new_lsd) = (before.license_updated()?, after.license_updated()?);
    if !new_lsd.strictly_after(&old_lsd) {
        return Err(InvariantViolation::StatusLicenseNotUpdated {
            before: old_lsd,
            after: new_lsd,
        }
        .into());
    }

    let actual = new_license.rights_end()?;
    if actual != Some(requested) {
        return Err(InvariantViolation::EndDateMismatch { requested, actual }.into());
    }

    let (old_lcp, new_lcp) = (old_license.last_modified()?, new_license.last_modified()?);
    if !new_lcp.strictly_after(&old_lcp) || new_lcp != new_lsd {
        return Err(InvariantViolation::LicenseNotUpdated {
            before: old_lcp,
            after: new_lcp,
            status_document: new_lsd,
        }
        .into());
    }
    Ok(())
}

/// Check a successful return, in order:
///
/// 1. Exactly one of `ready → cancelled` and `active → returned` happened.
/// 2. The License Document's `updated` strictly increased.
/// 3. It equals the Status Document's `updated.license`.
/// 4. `updated.status` strictly increased.
pub fn evaluate_return(
    before: &StatusDocument,
    after: &StatusDocument,
    old_license: &LicenseDocument,
    new_license: &LicenseDocument,
) -> Result<(), InteractionError> {
    let cancelled =
        before.status == LicenseStatus::Ready && after.status == LicenseStatus::Cancelled;
    let returned =
        before.status == LicenseStatus::Active && after.status == LicenseStatus::Returned;
    if !(cancelled ^ returned) {
        return Err(InvariantViolation::StatusTransition {
            before: before.status.clone(),
            after: after.status.clone(),
        }
        .into());
    }

    let (old_lcp, new_lcp) = (old_license.last_modified()?, new_license.last_modified()?);
    if !new_lcp.strictly_after(&old_lcp) {
        return Err(InvariantViolation::ReturnLicenseNotUpdated {
            before: old_lcp,
            after: new_lcp,
        }
        .into());
    }

    let new_lsd = after.license_updated()?;
    if new_lcp != new_lsd {
        return Err(InvariantViolation::ReturnLicenseMismatch {
            license: new_lcp,
            status_document: new_lsd,
        }
        .into());
    }

    let (old_status, new_status) = (before.status_updated()?, after.status_updated()?);
    if !new_status.strictly_after(&old_status) {
        return Err(InvariantViolation::StatusNotUpdated {
            before: old_status,
            after: new_status,
        }
        .into());
    }
    Ok(())
}
