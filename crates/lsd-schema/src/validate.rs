//! # Schema Validation
//!
//! The [`DocumentValidator`] capability and its JSON Schema backend.
//!
//! A Status Document that fails validation is a normal outcome for a
//! conformance client, not an error: validators return a
//! [`ValidationReport`] and never fail on a non-conforming document. Only
//! loading or compiling the schema itself can fail.
//!
//! ## Schema Resolution
//!
//! The LSD schema ships with this crate
//! (`schemas/status-document.schema.json`) and is available through
//! [`SchemaValidator::bundled`]. A different schema, e.g. one tracking an
//! older revision of the LSD specification, can be loaded from disk with
//! [`SchemaValidator::from_file`]. Only `#/...` references internal to the
//! schema are resolved.

use std::fmt;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

/// The bundled LSD 1.0 Status Document schema.
pub const STATUS_DOCUMENT_SCHEMA: &str = include_str!("../schemas/status-document.schema.json");

/// Diagnostic for a conforming document.
pub const SYNTAX_CORRECT: &str = "Syntax is correct.";

/// Diagnostic headline for a non-conforming document.
pub const SYNTAX_INVALID: &str = "Syntax is invalid.";

/// Structural validation of a Status Document.
///
/// Implementations must be `Send + Sync` so an engine holding one can be
/// moved onto a blocking worker thread.
pub trait DocumentValidator: Send + Sync {
    /// Short name of the backend, used in logs.
    fn name(&self) -> &str;

    /// Check `document` and report whether it conforms.
    fn validate(&self, document: &Value) -> ValidationReport;
}

impl<T: DocumentValidator + ?Sized> DocumentValidator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn validate(&self, document: &Value) -> ValidationReport {
        (**self).validate(document)
    }
}

/// Error while loading or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The schema file could not be read or is not JSON.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The schema is JSON but not a valid JSON Schema.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

/// A single structural violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating field in the document.
    pub instance_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// A report for a conforming document.
    pub fn valid() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// A report listing `violations`; valid if the list is empty.
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// One-line verdict, `Syntax is correct.` or `Syntax is invalid.`.
    pub fn summary(&self) -> &'static str {
        if self.is_valid() {
            SYNTAX_CORRECT
        } else {
            SYNTAX_INVALID
        }
    }

    /// Summary followed by one line per violation.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())?;
        for v in &self.violations {
            write!(f, "\n{v}")?;
        }
        Ok(())
    }
}

/// A [`DocumentValidator`] backed by the `jsonschema` crate.
pub struct SchemaValidator {
    schema_name: String,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile the bundled LSD schema.
    pub fn bundled() -> Result<Self, SchemaValidationError> {
        let schema: Value = serde_json::from_str(STATUS_DOCUMENT_SCHEMA).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: "status-document.schema.json".into(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        Self::from_value("status-document.schema.json", &schema)
    }

    /// Load and compile a schema file.
    ///
    /// # Errors
    ///
    /// `SchemaLoadError` if the file cannot be read or parsed as JSON,
    /// `ValidatorBuildError` if it is not a valid JSON Schema.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let path = path.as_ref();
        let schema_name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            }
        })?;
        let schema: Value = serde_json::from_str(&content).map_err(|e| {
            SchemaValidationError::SchemaLoadError {
                schema_name: schema_name.clone(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        Self::from_value(schema_name, &schema)
    }

    /// Compile an in-memory schema.
    pub fn from_value(
        schema_name: impl Into<String>,
        schema: &Value,
    ) -> Result<Self, SchemaValidationError> {
        let schema_name = schema_name.into();
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(schema)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(schema = %schema_name, "compiled status document schema");
        Ok(Self {
            schema_name,
            validator,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }
}

impl DocumentValidator for SchemaValidator {
    fn name(&self) -> &str {
        "json-schema"
    }

    fn validate(&self, document: &Value) -> ValidationReport {
        let violations = self
            .validator
            .iter_errors(document)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        ValidationReport::from_violations(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ready_status() -> Value {
        json!({
            "id": "lsd-1",
            "status": "ready",
            "updated": {"license": "2016-07-11T14:53:40Z", "status": "2016-07-11T14:53:40Z"},
            "links": {
                "license": {"href": "http://h/licenses/1"},
                "register": {"href": "http://h/register{?id,name}", "templated": true},
                "return": {"href": "http://h/return{?id,name}"},
                "renew": [{"href": "http://h/renew{?end,id,name}", "type": "application/vnd.readium.lcp.license-1.0+json"}]
            }
        })
    }

    #[test]
    fn bundled_schema_compiles() {
        let v = SchemaValidator::bundled().unwrap();
        assert_eq!(v.schema_name(), "status-document.schema.json");
        assert_eq!(v.name(), "json-schema");
    }

    #[test]
    fn accepts_conforming_document() {
        let report = SchemaValidator::bundled().unwrap().validate(&ready_status());
        assert!(report.is_valid(), "{report}");
        assert_eq!(report.diagnostic(), SYNTAX_CORRECT);
    }

    #[test]
    fn rejects_missing_license_link() {
        let mut doc = ready_status();
        doc["links"].as_object_mut().unwrap().remove("license");
        let report = SchemaValidator::bundled().unwrap().validate(&doc);
        assert!(!report.is_valid());
        assert!(report.diagnostic().starts_with(SYNTAX_INVALID));
        assert!(report.violations().iter().any(|v| v.instance_path == "/links"));
    }

    #[test]
    fn rejects_unknown_top_level_field() {
        let mut doc = ready_status();
        doc["message"] = json!("hello");
        assert!(!SchemaValidator::bundled().unwrap().validate(&doc).is_valid());
    }

    #[test]
    fn rejects_link_without_href() {
        let mut doc = ready_status();
        doc["links"]["register"] = json!({"templated": true});
        let report = SchemaValidator::bundled().unwrap().validate(&doc);
        assert!(!report.is_valid());
    }

    #[test]
    fn from_value_rejects_invalid_schema() {
        let err = SchemaValidator::from_value("bad", &json!({"type": 12})).unwrap_err();
        assert!(matches!(err, SchemaValidationError::ValidatorBuildError { .. }));
    }

    #[test]
    fn from_file_loads_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lsd.schema.json");
        std::fs::write(&path, STATUS_DOCUMENT_SCHEMA).unwrap();
        let v = SchemaValidator::from_file(&path).unwrap();
        assert!(v.validate(&ready_status()).is_valid());
    }

    #[test]
    fn from_file_missing_is_load_error() {
        let err = SchemaValidator::from_file("/nonexistent/lsd.schema.json").unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaLoadError { .. }));
    }

    #[test]
    fn violation_display_format() {
        let v = Violation {
            instance_path: "/links".into(),
            message: "\"license\" is a required property".into(),
        };
        assert_eq!(v.to_string(), "  /links: \"license\" is a required property");
        let root = Violation {
            instance_path: String::new(),
            message: "oops".into(),
        };
        assert_eq!(root.to_string(), "  (root): oops");
    }
}
