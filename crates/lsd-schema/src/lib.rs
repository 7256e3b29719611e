//! # lsd-schema — Status Document Validation
//!
//! Structural validation of License Status Documents behind a single
//! pluggable capability, [`DocumentValidator`], with two interchangeable
//! backends:
//!
//! - [`SchemaValidator`]: a compiled JSON Schema (Draft 2020-12), either
//!   the bundled LSD schema or one loaded from disk.
//! - [`ShapeValidator`]: explicit checks on the top-level field set, link
//!   relations and link members, and `updated` members.
//!
//! With the bundled schema, both accept and reject the same documents. An
//! invalid document yields a [`ValidationReport`] with a diagnostic; it is
//! never an error.

pub mod shape;
pub mod validate;

pub use shape::ShapeValidator;
pub use validate::{
    DocumentValidator, SchemaValidationError, SchemaValidator, ValidationReport, Violation,
    STATUS_DOCUMENT_SCHEMA, SYNTAX_CORRECT, SYNTAX_INVALID,
};
