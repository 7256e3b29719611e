//! # lsd-client — LSD Interaction Engine
//!
//! Drives the License Status Document interactions against a server and
//! judges each response against the protocol invariants.
//!
//! - [`transport`]: the [`Transport`] capability and its blocking
//!   `reqwest` implementation, [`HttpTransport`].
//! - [`store`]: Document Store Accessors, the Status Document for a
//!   license and the License Document for a status.
//! - [`engine`]: [`InteractionEngine`] with `register`, `renew`,
//!   `return_license`, `fetch_status` and `fetch_license`.
//! - [`verdict`]: the per-interaction [`Verdict`].
//!
//! Errors never escape the mutating interactions: every failure becomes a
//! non-conformant verdict. Only `fetch_status` and `fetch_license` return
//! a `Result`, since a caller cannot proceed without those documents.
//!
//! ```no_run
//! use lsd_client::{ClientConfig, DeviceIdentity, InteractionEngine};
//! use lsd_core::LicenseDocument;
//! use lsd_schema::ShapeValidator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let license = LicenseDocument::from_json(&std::fs::read_to_string("license.lcpl")?)?;
//! let config = ClientConfig::from_env(DeviceIdentity::new("device-1", "reader")?)?;
//! let engine = InteractionEngine::with_http(config, ShapeValidator::new())?;
//! println!("{}", engine.register(&license));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod transport;
pub mod verdict;

pub use config::{ClientConfig, ConfigError, DeviceIdentity};
pub use engine::{evaluate_register, evaluate_renew, evaluate_return, InteractionEngine, StatusCheck};
pub use error::{ErrorKind, InteractionError, InvariantViolation};
pub use store::{DocumentStore, LicenseFetch};
pub use transport::{HttpMethod, HttpResponse, HttpTransport, Transport, TransportError};
pub use verdict::{Verdict, SERVER_RESPONSE_OK};
