//! # lsd-cli — LSD Conformance Client Binary
//!
//! Library half of the `lsd-client` binary, split out so the run
//! orchestration and package access are testable without a process.
//!
//! - [`package`]: reads the License Document from a publication package.
//! - [`run`]: drives one interaction and collects the printed report.

pub mod package;
pub mod run;

pub use package::{read_license, PackageError, LICENSE_ENTRY};
pub use run::{run, Line, LineKind, Report};
