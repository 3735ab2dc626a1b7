//! Configuration loading and validation for the `fieldseal` binary.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is invalid.

use anyhow::{Context, Result};
use common::ServiceError;
use fieldseal::crypto::{Key, KeySize};
use fieldseal::fields::{parse_rules, FieldRule};
use serde::Deserialize;

/// Validated `fieldseal` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64 raw AES key (16 or 32 bytes). **Required** for every command
    /// except `keygen`.
    #[serde(default)]
    pub crypto_key_b64: Option<String>,

    /// Size of keys produced by `keygen`: 128 or 256.
    #[serde(default = "default_key_bits")]
    pub key_bits: u16,

    /// Comma-separated field rules for the record modes,
    /// e.g. `name_enc=trim_upper,email_enc=lower`.
    #[serde(default)]
    pub fields: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_key_bits() -> u16 {
    256
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "crypto_key_b64",
                &self.crypto_key_b64.as_ref().map(|_| "[REDACTED]"),
            )
            .field("key_bits", &self.key_bits)
            .field("fields", &self.fields)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    /// Load and validate configuration from an explicit environment source.
    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if KeySize::from_bits(self.key_bits).is_err() {
            anyhow::bail!("KEY_BITS must be 128 or 256");
        }
        if let Some(key) = &self.crypto_key_b64 {
            if key.trim().is_empty() {
                anyhow::bail!("CRYPTO_KEY_B64 must not be empty when set");
            }
        }
        parse_rules(&self.fields).context("FIELDS is invalid")?;
        Ok(())
    }

    /// Decode the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Misconfigured`] if `CRYPTO_KEY_B64` is missing,
    /// not base64, or not 16/32 bytes once decoded.
    pub fn key(&self) -> Result<Key> {
        let text = self.crypto_key_b64.as_deref().ok_or_else(|| {
            ServiceError::Misconfigured("CRYPTO_KEY_B64 is required".into())
        })?;
        Key::from_base64(text)
            .map_err(ServiceError::from)
            .context("CRYPTO_KEY_B64 is unusable")
    }

    /// Parse the configured field rules.
    pub fn rules(&self) -> Result<Vec<FieldRule>> {
        parse_rules(&self.fields)
            .map_err(|e| ServiceError::Misconfigured(e.to_string()))
            .context("FIELDS is invalid")
    }
}
