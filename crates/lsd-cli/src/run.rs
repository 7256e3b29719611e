//! Run orchestration.
//!
//! One run drives a single requested interaction. The Status Document is
//! fetched and validated first; an invalid document halts the run before
//! any interaction. `renew` and `return` start from an activated license,
//! so they run `register` first and report it on a `register: ` line.

use anyhow::Context;
use colored::Colorize;
use lsd_client::{ErrorKind, InteractionEngine, InteractionError, LicenseFetch, Verdict};
use lsd_core::{Interaction, LicenseDocument, StatusDocument};

/// How one output line counts towards the run result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Conformant,
    NonConformant,
    /// Reported but not judged, e.g. a document dump.
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Info,
            text: text.into(),
        }
    }

    fn verdict(verdict: &Verdict) -> Self {
        Self {
            kind: if verdict.is_conformant() {
                LineKind::Conformant
            } else {
                LineKind::NonConformant
            },
            text: verdict.message.clone(),
        }
    }
}

/// Everything a run printed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<Line>,
}

impl Report {
    fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn is_conformant(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.kind != LineKind::NonConformant)
    }

    /// 0 when every judged line is conformant, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_conformant() {
            0
        } else {
            1
        }
    }

    /// Render for the terminal, green for conformant and red for
    /// non-conformant lines.
    pub fn render(&self, color: bool) -> String {
        self.lines
            .iter()
            .map(|line| match (color, line.kind) {
                (true, LineKind::Conformant) => line.text.green().to_string(),
                (true, LineKind::NonConformant) => line.text.red().to_string(),
                _ => line.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drive `interaction` for `license`.
///
/// # Errors
///
/// Only when the initial Status Document cannot be obtained or decoded.
/// Every other failure is a non-conformant line in the report.
pub fn run(
    engine: &InteractionEngine,
    license: &LicenseDocument,
    interaction: Interaction,
    end: Option<&str>,
) -> anyhow::Result<Report> {
    let mut report = Report::default();

    let check = engine
        .fetch_status(license)
        .context("cannot fetch the Status Document")?;
    report.push(Line {
        kind: if check.is_valid() {
            LineKind::Conformant
        } else {
            LineKind::NonConformant
        },
        text: check.report.diagnostic(),
    });
    if !check.is_valid() {
        tracing::warn!(%interaction, "status document is invalid; skipping interaction");
        return Ok(report);
    }

    match interaction {
        Interaction::Fetch => {
            report.push(Line::info(serde_json::to_string_pretty(&check.document)?));
            report.push(Line::verdict(&check.verdict()));
        }
        Interaction::FetchLicense => {
            let status = StatusDocument::from_value(check.document)
                .context("cannot decode the Status Document")?;
            let line = match engine.fetch_license(&status) {
                Ok(LicenseFetch::Document(body)) => {
                    Line::info(serde_json::to_string_pretty(&body)?)
                }
                Ok(LicenseFetch::NoDocument { status }) => fetch_license_failure(
                    InteractionError::NoDocument {
                        what: "License Document",
                        status,
                    },
                ),
                Err(e) => fetch_license_failure(e),
            };
            report.push(line);
        }
        Interaction::Register => {
            report.push(Line::verdict(&engine.register(license)));
        }
        Interaction::Renew => {
            let end = end.context("renew requires an end date")?;
            report.push(preparatory_register(engine, license));
            report.push(Line::verdict(&engine.renew(license, end)));
        }
        Interaction::Return => {
            report.push(preparatory_register(engine, license));
            report.push(Line::verdict(&engine.return_license(license)));
        }
    }
    Ok(report)
}

fn fetch_license_failure(e: InteractionError) -> Line {
    Line::verdict(&Verdict::from_outcome(Interaction::FetchLicense, Err(e)))
}

/// Register before renew/return. A license that is already past `ready`
/// fails the precondition; that is expected and is not held against the
/// server.
fn preparatory_register(engine: &InteractionEngine, license: &LicenseDocument) -> Line {
    let verdict = engine.register(license);
    let mut line = Line::verdict(&verdict);
    if verdict.failure == Some(ErrorKind::PreconditionFailed) {
        line.kind = LineKind::Info;
    }
    if !line.text.starts_with("register: ") {
        line.text = format!("register: {}", line.text);
    }
    line
}
