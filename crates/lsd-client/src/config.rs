//! Client configuration.
//!
//! Everything an interaction needs besides the documents themselves is
//! carried here and handed to the engine at construction: the device
//! identity presented to the server, HTTP settings, and the pacing
//! interval observed before mutating requests.

use std::str::FromStr;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default pause between the pre-call snapshot and a renew/return request.
///
/// LSD servers stamp `updated.*` with one-second granularity, and the
/// invariants require strict increase.
pub const DEFAULT_MUTATION_DELAY: Duration = Duration::from_secs(1);

/// Smallest pause accepted from the environment or the command line.
pub const MIN_MUTATION_DELAY: Duration = Duration::from_secs(1);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("lsd-client/", env!("CARGO_PKG_VERSION"));

/// The reading device presented to the server.
///
/// Both values are opaque strings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

impl DeviceIdentity {
    /// # Errors
    ///
    /// `ConfigError::MissingDevice` if either value is empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, ConfigError> {
        let (id, name) = (id.into(), name.into());
        if id.is_empty() {
            return Err(ConfigError::MissingDevice("id"));
        }
        if name.is_empty() {
            return Err(ConfigError::MissingDevice("name"));
        }
        Ok(Self { id, name })
    }
}

/// Configuration for an [`InteractionEngine`](crate::InteractionEngine).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub device: DeviceIdentity,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pause before renew and return requests.
    pub mutation_delay: Duration,
}

impl ClientConfig {
    /// Configuration with default HTTP settings and pacing.
    pub fn new(device: DeviceIdentity) -> Self {
        Self {
            device,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            mutation_delay: DEFAULT_MUTATION_DELAY,
        }
    }

    /// Load settings from environment variables.
    ///
    /// Variables:
    /// - `LSD_TIMEOUT_SECS` (default: 30)
    /// - `LSD_MUTATION_DELAY_MS` (default: 1000)
    /// - `LSD_USER_AGENT` (default: `lsd-client/<version>`)
    pub fn from_env(device: DeviceIdentity) -> Result<Self, ConfigError> {
        Self::from_lookup(device, |var| std::env::var(var).ok())
    }

    fn from_lookup(
        device: DeviceIdentity,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new(device);
        if let Some(secs) = parse_var::<u64>(&lookup, "LSD_TIMEOUT_SECS")? {
            config = config.try_with_timeout_secs("LSD_TIMEOUT_SECS", secs)?;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "LSD_MUTATION_DELAY_MS")? {
            config = config.try_with_mutation_delay_ms("LSD_MUTATION_DELAY_MS", ms)?;
        }
        if let Some(agent) = lookup("LSD_USER_AGENT") {
            config.user_agent = agent;
        }
        Ok(config)
    }

    /// Set the timeout from a user-supplied value named `var`.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` for a zero timeout.
    pub fn try_with_timeout_secs(self, var: &'static str, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                var,
                value: secs.to_string(),
                reason: "timeout must be at least one second".into(),
            });
        }
        Ok(self.with_timeout_secs(secs))
    }

    /// Set the mutation delay from a user-supplied value named `var`.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` below [`MIN_MUTATION_DELAY`].
    pub fn try_with_mutation_delay_ms(
        self,
        var: &'static str,
        ms: u64,
    ) -> Result<Self, ConfigError> {
        let delay = Duration::from_millis(ms);
        if delay < MIN_MUTATION_DELAY {
            return Err(ConfigError::InvalidValue {
                var,
                value: ms.to_string(),
                reason: format!(
                    "mutation delay must be at least {} ms",
                    MIN_MUTATION_DELAY.as_millis()
                ),
            });
        }
        Ok(self.with_mutation_delay(delay))
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the mutation delay without bounds checks. Tests use this to run
    /// without pacing.
    pub fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay = delay;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("device {0} must not be empty")]
    MissingDevice(&'static str),
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
