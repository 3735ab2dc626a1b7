//! `fieldseal` — command-line entry point.
//!
//! ```text
//! fieldseal keygen
//! fieldseal seal | open | seal-records | open-records | reseal-records
//! ```
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Run the command: print a new key, or stream stdin to stdout.
//!
//! Exit status follows [`ServiceError::exit_code`]; any rejected line makes
//! the run fail after the remaining lines have been processed.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use common::ServiceError;
use fieldseal::batch::{self, Mode};
use fieldseal::crypto::{Key, KeySize};
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{info, warn};

use config::Config;

const USAGE: &str =
    "usage: fieldseal <keygen|seal|open|seal-records|open-records|reseal-records>";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<ServiceError>()
            .map_or(1, ServiceError::exit_code);
        eprintln!("ERROR: {e:#}");
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let command = std::env::args()
        .nth(1)
        .ok_or_else(|| ServiceError::BadInput(USAGE.into()))?;

    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env()
        .map_err(|e| ServiceError::Misconfigured(format!("{e:#}")))
        .context("configuration invalid")?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = %command,
        "fieldseal starting"
    );

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    match command.as_str() {
        "keygen" => keygen(&cfg).await,
        other => {
            let mode: Mode = other
                .parse()
                .map_err(|e: ServiceError| ServiceError::BadInput(format!("{e}; {USAGE}")))?;
            stream(mode, &cfg).await
        }
    }
}

/// Print a fresh base64 key of `KEY_BITS` bits.
async fn keygen(cfg: &Config) -> Result<()> {
    let size = KeySize::from_bits(cfg.key_bits).map_err(ServiceError::from)?;
    let key = Key::generate(size).map_err(ServiceError::from)?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(key.to_base64().as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    info!(bits = size.bits(), "key generated");
    Ok(())
}

/// Stream stdin through `mode` to stdout.
async fn stream(mode: Mode, cfg: &Config) -> Result<()> {
    let key = cfg.key()?;
    let rules = cfg.rules()?;
    if mode.uses_records() && rules.is_empty() {
        warn!(mode = %mode, "FIELDS is empty; records pass through unchanged");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let summary = batch::run(mode, &key, &rules, stdin, tokio::io::stdout())
        .await
        .context("batch I/O failed")?;

    if !summary.is_clean() {
        return Err(ServiceError::Rejected(format!(
            "{} of {} lines rejected",
            summary.rejected,
            summary.rejected + summary.processed
        ))
        .into());
    }
    Ok(())
}
