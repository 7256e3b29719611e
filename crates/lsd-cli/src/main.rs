//! # lsd-client entry point
//!
//! Checks an LSD server for conformance: reads the License Document from a
//! publication, fetches and validates its Status Document, drives the
//! requested interaction and prints one verdict per line.
//!
//! Exit codes: 0 conformant, 1 invalid document or non-conformant verdict,
//! 2 when the run could not start (unreadable package, no Status Document).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lsd_cli::{read_license, run, LICENSE_ENTRY};
use lsd_client::{ClientConfig, ConfigError, DeviceIdentity, InteractionEngine};
use lsd_core::Interaction;
use lsd_schema::{DocumentValidator, SchemaValidator, ShapeValidator};

/// LSD conformance client.
///
/// Drives one License Status Document interaction against the server named
/// in a publication's license and reports whether the server's responses
/// honor the protocol.
#[derive(Parser, Debug)]
#[command(name = "lsd-client", version, about, long_about = None)]
struct Cli {
    /// Interaction to run.
    #[arg(short, long, value_parser = parse_interaction)]
    interaction: Interaction,

    /// Device identifier presented to the server.
    #[arg(short = 'd', long = "device-id")]
    device_id: String,

    /// Device name presented to the server.
    #[arg(short = 'n', long = "device-name")]
    device_name: String,

    /// Requested license end date (ISO 8601). Required for renew.
    #[arg(short, long, required_if_eq("interaction", "renew"))]
    end: Option<String>,

    /// Validate the Status Document against this JSON Schema instead of
    /// the bundled one.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Validate with explicit field-set checks instead of JSON Schema.
    #[arg(long, conflicts_with = "schema")]
    shape_only: bool,

    /// Request timeout in seconds (overrides LSD_TIMEOUT_SECS).
    #[arg(long)]
    timeout: Option<u64>,

    /// Pause before renew and return, in milliseconds (overrides
    /// LSD_MUTATION_DELAY_MS).
    #[arg(long)]
    mutation_delay_ms: Option<u64>,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Disable colored verdicts.
    #[arg(long)]
    no_color: bool,

    /// Path of the License Document inside the package.
    #[arg(long, default_value = LICENSE_ENTRY)]
    license_entry: String,

    /// Publication package (EPUB or other ZIP container).
    package: PathBuf,
}

fn parse_interaction(s: &str) -> Result<Interaction, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("lsd-client v{} starting", env!("CARGO_PKG_VERSION"));

    match execute(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn execute(cli: &Cli) -> anyhow::Result<u8> {
    let license = read_license(&cli.package, &cli.license_entry)
        .with_context(|| format!("cannot read the license from {}", cli.package.display()))?;

    let device = DeviceIdentity::new(cli.device_id.as_str(), cli.device_name.as_str())?;
    let config = with_overrides(ClientConfig::from_env(device)?, cli)?;

    let engine = InteractionEngine::with_http(config, validator(cli)?)?;
    let report = run(&engine, &license, cli.interaction, cli.end.as_deref())?;

    println!("{}", report.render(!cli.no_color));
    Ok(report.exit_code())
}

/// Command-line values win over the environment and share its bounds.
fn with_overrides(mut config: ClientConfig, cli: &Cli) -> Result<ClientConfig, ConfigError> {
    if let Some(secs) = cli.timeout {
        config = config.try_with_timeout_secs("--timeout", secs)?;
    }
    if let Some(ms) = cli.mutation_delay_ms {
        config = config.try_with_mutation_delay_ms("--mutation-delay-ms", ms)?;
    }
    Ok(config)
}

fn validator(cli: &Cli) -> anyhow::Result<Box<dyn DocumentValidator>> {
    if cli.shape_only {
        return Ok(Box::new(ShapeValidator::new()));
    }
    let validator = match &cli.schema {
        Some(path) => SchemaValidator::from_file(path)?,
        None => SchemaValidator::bundled()?,
    };
    Ok(Box::new(validator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cli_parse_register() {
        let cli = Cli::try_parse_from([
            "lsd-client", "-i", "register", "-d", "dev-1", "-n", "Reader", "book.epub",
        ])
        .unwrap();
        assert_eq!(cli.interaction, Interaction::Register);
        assert_eq!(cli.device_id, "dev-1");
        assert_eq!(cli.device_name, "Reader");
        assert_eq!(cli.package, PathBuf::from("book.epub"));
        assert_eq!(cli.license_entry, "META-INF/license.lcpl");
        assert!(cli.end.is_none());
    }

    #[test]
    fn cli_parse_fetch_license() {
        let cli = Cli::try_parse_from([
            "lsd-client", "-i", "fetch_license", "-d", "d", "-n", "n", "book.epub",
        ])
        .unwrap();
        assert_eq!(cli.interaction, Interaction::FetchLicense);
    }

    #[test]
    fn cli_renew_requires_end() {
        assert!(Cli::try_parse_from([
            "lsd-client", "-i", "renew", "-d", "d", "-n", "n", "book.epub",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "lsd-client", "-i", "renew", "-d", "d", "-n", "n", "-e", "2021-01-01T00:00:00Z",
            "book.epub",
        ])
        .unwrap();
        assert_eq!(cli.end.as_deref(), Some("2021-01-01T00:00:00Z"));
    }

    #[test]
    fn cli_rejects_unknown_interaction() {
        assert!(Cli::try_parse_from([
            "lsd-client", "-i", "activate", "-d", "d", "-n", "n", "book.epub",
        ])
        .is_err());
    }

    #[test]
    fn cli_schema_and_shape_only_conflict() {
        assert!(Cli::try_parse_from([
            "lsd-client", "-i", "fetch", "-d", "d", "-n", "n", "--schema", "s.json",
            "--shape-only", "book.epub",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_verbosity_and_overrides() {
        let cli = Cli::try_parse_from([
            "lsd-client", "-vv", "-i", "return", "-d", "d", "-n", "n", "--timeout", "5",
            "--mutation-delay-ms", "1500", "--no-color", "book.epub",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.mutation_delay_ms, Some(1500));
        assert!(cli.no_color);
    }

    #[test]
    fn overrides_share_config_bounds() {
        let device = DeviceIdentity::new("d", "n").unwrap();
        let parse = |extra: &[&str]| {
            let mut args = vec!["lsd-client", "-i", "return", "-d", "d", "-n", "n"];
            args.extend_from_slice(extra);
            args.push("book.epub");
            Cli::try_parse_from(args).unwrap()
        };

        let cli = parse(&["--timeout", "5", "--mutation-delay-ms", "1500"]);
        let config = with_overrides(ClientConfig::new(device.clone()), &cli).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.mutation_delay, Duration::from_millis(1500));

        let cli = parse(&["--mutation-delay-ms", "0"]);
        let err = with_overrides(ClientConfig::new(device.clone()), &cli).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "--mutation-delay-ms", .. }));

        let cli = parse(&["--timeout", "0"]);
        let err = with_overrides(ClientConfig::new(device), &cli).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "--timeout", .. }));
    }
}
